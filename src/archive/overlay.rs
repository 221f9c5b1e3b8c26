//! Combined entry view across archives
//!
//! Overlays several parsed archives into one hash-addressed namespace.
//! Later archives shadow earlier ones, so callers push base game archives
//! first and mods after them.

use super::{Archive, DirEntry};
use crate::error::{Error, Result};

#[derive(Default)]
pub struct CombinedView {
    archives: Vec<Box<dyn Archive>>,
}

impl CombinedView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parsed archive as the topmost layer
    pub fn push(&mut self, archive: Box<dyn Archive>) {
        self.archives.push(archive);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.archives.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    /// Index of the topmost layer containing a file entry for `path`
    fn layer_of(&self, path: &str) -> Option<usize> {
        self.archives
            .iter()
            .rposition(|archive| archive.contains_file(path))
    }

    /// Whether any layer contains a file entry for `path`
    #[must_use]
    pub fn contains_file(&self, path: &str) -> bool {
        self.layer_of(path).is_some()
    }

    /// Directory lookup; the topmost layer containing the directory wins
    #[must_use]
    pub fn find_dir(&self, path: &str) -> Option<&DirEntry> {
        self.archives
            .iter()
            .rev()
            .find_map(|archive| archive.find_dir(path))
    }

    /// Read a file from the topmost layer that contains it
    pub fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        let layer = self
            .layer_of(path)
            .ok_or_else(|| Error::FileNotFound(path.to_string()))?;
        self.archives[layer].read_file(path)
    }

    /// Like [`Self::read_file`], returning `None` when no layer has the entry
    pub fn read_file_opt(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.layer_of(path) {
            Some(layer) => self.archives[layer].read_file(path).map(Some),
            None => Ok(None),
        }
    }

    /// Whether the layer that holds `path` synthesizes texture containers
    /// for texture-object entries (HashFS v2 layers do)
    #[must_use]
    pub fn synthesizes_textures(&self, path: &str) -> bool {
        self.layer_of(path)
            .is_some_and(|layer| self.archives[layer].synthesizes_textures())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use super::*;

    /// In-memory archive for overlay semantics tests
    struct FakeArchive {
        path: PathBuf,
        files: HashMap<String, Vec<u8>>,
        tobj: bool,
    }

    impl FakeArchive {
        fn new(files: &[(&str, &str)], tobj: bool) -> Self {
            Self {
                path: PathBuf::from("fake.scs"),
                files: files
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
                    .collect(),
                tobj,
            }
        }
    }

    impl Archive for FakeArchive {
        fn path(&self) -> &Path {
            &self.path
        }

        fn is_valid(&self) -> bool {
            true
        }

        fn parse_entries(&mut self) -> Result<()> {
            Ok(())
        }

        fn contains_file(&self, path: &str) -> bool {
            self.files.contains_key(path)
        }

        fn find_dir(&self, _path: &str) -> Option<&DirEntry> {
            None
        }

        fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| Error::FileNotFound(path.to_string()))
        }

        fn synthesizes_textures(&self) -> bool {
            self.tobj
        }

        fn file_count(&self) -> usize {
            self.files.len()
        }
    }

    #[test]
    fn later_layers_shadow_earlier_ones() {
        let mut view = CombinedView::new();
        view.push(Box::new(FakeArchive::new(
            &[("def/city.sii", "base"), ("base_only.txt", "base")],
            true,
        )));
        view.push(Box::new(FakeArchive::new(&[("def/city.sii", "mod")], false)));

        assert_eq!(view.read_file("def/city.sii").unwrap(), b"mod");
        assert_eq!(view.read_file("base_only.txt").unwrap(), b"base");
        assert!(view.read_file_opt("missing.txt").unwrap().is_none());
    }

    #[test]
    fn texture_synthesis_follows_the_winning_layer() {
        let mut view = CombinedView::new();
        view.push(Box::new(FakeArchive::new(&[("icon.tobj", "v2")], true)));
        view.push(Box::new(FakeArchive::new(&[("icon.tobj", "zip")], false)));

        assert!(!view.synthesizes_textures("icon.tobj"));
        assert!(!view.synthesizes_textures("missing"));
    }
}
