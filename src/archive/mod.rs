//! Game archive containers
//!
//! Three container formats coexist: the versioned SCS format (HashFS v1 and
//! v2) and plain ZIP. Files inside any container are addressed by the
//! CityHash64 of their virtual path, salted per archive. [`open`] sniffs the
//! container kind and returns the matching reader behind the [`Archive`]
//! trait; [`overlay::CombinedView`] layers several archives into one
//! namespace.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub mod hashfs_v1;
pub mod hashfs_v2;
pub mod meta;
pub mod overlay;
pub mod tobj;
pub mod zip;

pub use overlay::CombinedView;

/// Magic tag shared by both HashFS revisions
pub const SCS_MAGIC: [u8; 4] = *b"SCS#";

/// The only supported hash method tag
pub const HASH_METHOD_CITY: [u8; 4] = *b"CITY";

/// A directory entry: the names of its immediate children
#[derive(Debug, Clone, Default)]
pub struct DirEntry {
    pub subdirs: Vec<String>,
    pub files: Vec<String>,
}

/// One open archive container.
///
/// The archive owns its file descriptor for its entire lifetime; entries are
/// value records carrying offsets, and all reads go through the archive
/// (dropping the archive releases the descriptor on every exit path).
pub trait Archive {
    /// Path of the backing file on disk
    fn path(&self) -> &Path;

    /// Header-level validity check
    fn is_valid(&self) -> bool;

    /// Parse entry stores. Idempotent; cached after the first call.
    fn parse_entries(&mut self) -> Result<()>;

    /// The archive's hash salt
    fn salt(&self) -> u16 {
        0
    }

    /// Whether a file entry exists for this archive-internal path
    fn contains_file(&self, path: &str) -> bool;

    /// Look up a directory entry by archive-internal path
    fn find_dir(&self, path: &str) -> Option<&DirEntry>;

    /// Read a file entry's contents by archive-internal path
    fn read_file(&mut self, path: &str) -> Result<Vec<u8>>;

    /// True when texture-object entries synthesize complete texture
    /// containers on read (HashFS v2 only)
    fn synthesizes_textures(&self) -> bool {
        false
    }

    /// Number of file entries (after `parse_entries`)
    fn file_count(&self) -> usize;
}

/// Open an archive file, dispatching on its leading bytes.
///
/// `"SCS#"` with version 1 or 2 selects the matching HashFS reader; anything
/// else is handed to the ZIP reader.
///
/// # Errors
/// Fails on I/O errors, an SCS container with an unknown version, or a
/// non-SCS file that is not a readable ZIP archive.
pub fn open(path: impl Into<PathBuf>) -> Result<Box<dyn Archive>> {
    let path = path.into();
    let mut file = File::open(&path)?;
    let mut probe = [0u8; 6];
    file.read_exact(&mut probe)?;

    if probe[..4] == SCS_MAGIC {
        let version = u16::from_le_bytes([probe[4], probe[5]]);
        return match version {
            1 => Ok(Box::new(hashfs_v1::HashFsV1::from_file(path, file)?)),
            2 => Ok(Box::new(hashfs_v2::HashFsV2::from_file(path, file)?)),
            other => Err(Error::UnsupportedVersion(other)),
        };
    }

    Ok(Box::new(zip::ZipReader::from_file(path, file)?))
}
