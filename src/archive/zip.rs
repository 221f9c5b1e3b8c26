//! ZIP container reader
//!
//! Some distributions and most mods ship plain ZIP archives instead of the
//! HashFS containers. Entry names are normalized and hashed with salt 0 so
//! the container joins the same hash-addressed namespace as the others;
//! directory stores are derived from the file paths.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::hash::hash_key;
use super::{Archive, DirEntry};

pub struct ZipReader {
    path: PathBuf,
    zip: ::zip::ZipArchive<File>,
    entries: Option<EntryStores>,
}

#[derive(Debug, Default)]
struct EntryStores {
    dirs: HashMap<u64, DirEntry>,
    files: HashMap<u64, usize>,
}

/// Directory path to (subdir names, file names)
type DirTree = BTreeMap<String, (BTreeSet<String>, BTreeSet<String>)>;

impl ZipReader {
    /// Open a ZIP container
    pub fn from_file(path: PathBuf, file: File) -> Result<Self> {
        let zip = ::zip::ZipArchive::new(file)?;
        Ok(Self {
            path,
            zip,
            entries: None,
        })
    }

    fn build_entries(&mut self) -> Result<EntryStores> {
        let mut stores = EntryStores::default();
        let mut tree = DirTree::new();

        for index in 0..self.zip.len() {
            let entry = self.zip.by_index_raw(index)?;
            let name = normalize(entry.name());
            let is_dir = entry.is_dir();
            drop(entry);

            if name.is_empty() {
                continue;
            }
            if is_dir {
                tree.entry(name).or_default();
                continue;
            }

            let hash = hash_key(&name, 0);
            if stores.files.insert(hash, index).is_some() {
                return Err(Error::DuplicateEntryHash(hash));
            }

            // Register the file and every ancestor directory in the tree
            let (parent, file_name) = split_parent(&name);
            tree.entry(parent.to_string())
                .or_default()
                .1
                .insert(file_name.to_string());
            register_ancestors(&mut tree, parent);
        }

        for (dir_path, (subdirs, files)) in tree {
            let dir = DirEntry {
                subdirs: subdirs.into_iter().collect(),
                files: files.into_iter().collect(),
            };
            stores.dirs.insert(hash_key(&dir_path, 0), dir);
        }

        tracing::debug!(
            archive = %self.path.display(),
            files = stores.files.len(),
            dirs = stores.dirs.len(),
            "parsed zip entries"
        );
        Ok(stores)
    }

    fn stores(&self) -> Option<&EntryStores> {
        self.entries.as_ref()
    }
}

impl Archive for ZipReader {
    fn path(&self) -> &Path {
        &self.path
    }

    fn is_valid(&self) -> bool {
        // Central directory already parsed on open
        true
    }

    fn parse_entries(&mut self) -> Result<()> {
        if self.entries.is_some() {
            return Ok(());
        }
        let stores = self.build_entries()?;
        self.entries = Some(stores);
        Ok(())
    }

    fn contains_file(&self, path: &str) -> bool {
        self.stores()
            .is_some_and(|s| s.files.contains_key(&hash_key(path, 0)))
    }

    fn find_dir(&self, path: &str) -> Option<&DirEntry> {
        self.stores()?.dirs.get(&hash_key(path, 0))
    }

    fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        let index = self
            .stores()
            .and_then(|s| s.files.get(&hash_key(path, 0)))
            .copied()
            .ok_or_else(|| Error::FileNotFound(path.to_string()))?;
        let mut entry = self.zip.by_index(index)?;
        let mut out = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut out)?;
        Ok(out)
    }

    fn file_count(&self) -> usize {
        self.stores().map_or(0, |s| s.files.len())
    }
}

/// Normalize a zip entry name into an archive-internal path
fn normalize(name: &str) -> String {
    name.replace('\\', "/")
        .trim_matches('/')
        .to_string()
}

/// Split a normalized path into (parent, file name); the root parent is ""
fn split_parent(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((parent, name)) => (parent, name),
        None => ("", path),
    }
}

/// Walk up from `dir`, inserting each directory into its parent's subdir set
fn register_ancestors(tree: &mut DirTree, mut dir: &str) {
    while !dir.is_empty() {
        let (parent, name) = split_parent(dir);
        tree.entry(parent.to_string())
            .or_default()
            .0
            .insert(name.to_string());
        dir = parent;
    }
    tree.entry(String::new()).or_default();
}
