//! HashFS v1 container reader
//!
//! The first container revision keeps a flat entry table: every 32-byte
//! record carries its payload offset, sizes and flags directly, with no
//! shared metadata pool. Directory listings are newline-separated names with
//! a leading `*` marking subdirectories.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::compression::{self, CompressionMethod};
use crate::error::{Error, Result};
use crate::hash::hash_key;
use super::{Archive, DirEntry, HASH_METHOD_CITY, SCS_MAGIC};

/// Size of the fixed header at offset 0
pub const HEADER_SIZE: usize = 20;
/// Size of one entry record
const ENTRY_SIZE: usize = 32;

const FLAG_DIRECTORY: u32 = 0x1;
const FLAG_COMPRESSED: u32 = 0x2;

#[derive(Debug, Clone)]
pub struct V1Header {
    pub magic: [u8; 4],
    pub version: u16,
    pub salt: u16,
    pub hash_method: [u8; 4],
    pub entry_count: u32,
    pub entry_table_offset: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct V1File {
    pub offset: u64,
    pub size: u32,
    pub compressed_size: u32,
    pub compressed: bool,
}

#[derive(Debug, Default)]
struct EntryStores {
    dirs: HashMap<u64, DirEntry>,
    files: HashMap<u64, V1File>,
}

pub struct HashFsV1 {
    path: PathBuf,
    file: File,
    header: V1Header,
    entries: Option<EntryStores>,
}

impl HashFsV1 {
    /// Open a v1 container whose magic and version were already sniffed
    pub fn from_file(path: PathBuf, mut file: File) -> Result<Self> {
        file.seek(SeekFrom::Start(0))?;
        let mut raw = [0u8; HEADER_SIZE];
        file.read_exact(&mut raw)?;

        let mut cursor = Cursor::new(&raw);
        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic)?;
        let version = cursor.read_u16::<LittleEndian>()?;
        let salt = cursor.read_u16::<LittleEndian>()?;
        let mut hash_method = [0u8; 4];
        cursor.read_exact(&mut hash_method)?;
        let header = V1Header {
            magic,
            version,
            salt,
            hash_method,
            entry_count: cursor.read_u32::<LittleEndian>()?,
            entry_table_offset: cursor.read_u32::<LittleEndian>()?,
        };

        Ok(Self {
            path,
            file,
            header,
            entries: None,
        })
    }

    fn validate_header(&self) -> Result<()> {
        if self.header.magic != SCS_MAGIC {
            return Err(Error::InvalidMagic(self.header.magic));
        }
        if self.header.version != 1 {
            return Err(Error::UnsupportedVersion(self.header.version));
        }
        if self.header.hash_method != HASH_METHOD_CITY {
            return Err(Error::UnknownHashMethod(self.header.hash_method));
        }
        Ok(())
    }

    fn read_payload(&mut self, entry: &V1File) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(entry.offset))?;
        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.file.read_exact(&mut raw)?;
        let method = if entry.compressed {
            CompressionMethod::Zlib
        } else {
            CompressionMethod::None
        };
        compression::decompress(&raw, entry.size as usize, method)
    }

    fn build_entries(&mut self) -> Result<EntryStores> {
        self.file
            .seek(SeekFrom::Start(u64::from(self.header.entry_table_offset)))?;
        let mut raw = vec![0u8; self.header.entry_count as usize * ENTRY_SIZE];
        self.file.read_exact(&mut raw)?;

        let mut dirs = Vec::new();
        let mut stores = EntryStores::default();
        let mut cursor = Cursor::new(&raw);
        for _ in 0..self.header.entry_count {
            let hash = cursor.read_u64::<LittleEndian>()?;
            let offset = cursor.read_u64::<LittleEndian>()?;
            let flags = cursor.read_u32::<LittleEndian>()?;
            let _crc = cursor.read_u32::<LittleEndian>()?;
            let size = cursor.read_u32::<LittleEndian>()?;
            let compressed_size = cursor.read_u32::<LittleEndian>()?;

            let entry = V1File {
                offset,
                size,
                compressed_size,
                compressed: flags & FLAG_COMPRESSED != 0,
            };
            if flags & FLAG_DIRECTORY != 0 {
                dirs.push((hash, entry));
            } else if stores.files.insert(hash, entry).is_some() {
                return Err(Error::DuplicateEntryHash(hash));
            }
        }

        for (hash, entry) in dirs {
            let listing = self.read_payload(&entry)?;
            let dir = parse_dir_listing(&listing)?;
            if stores.dirs.insert(hash, dir).is_some() {
                return Err(Error::DuplicateEntryHash(hash));
            }
        }

        tracing::debug!(
            archive = %self.path.display(),
            files = stores.files.len(),
            dirs = stores.dirs.len(),
            "parsed hashfs v1 entries"
        );
        Ok(stores)
    }

    fn stores(&self) -> Option<&EntryStores> {
        self.entries.as_ref()
    }
}

impl Archive for HashFsV1 {
    fn path(&self) -> &Path {
        &self.path
    }

    fn is_valid(&self) -> bool {
        self.validate_header().is_ok()
    }

    fn parse_entries(&mut self) -> Result<()> {
        if self.entries.is_some() {
            return Ok(());
        }
        self.validate_header()?;
        let stores = self.build_entries()?;
        self.entries = Some(stores);
        Ok(())
    }

    fn salt(&self) -> u16 {
        self.header.salt
    }

    fn contains_file(&self, path: &str) -> bool {
        self.stores()
            .is_some_and(|s| s.files.contains_key(&hash_key(path, self.header.salt)))
    }

    fn find_dir(&self, path: &str) -> Option<&DirEntry> {
        self.stores()?.dirs.get(&hash_key(path, self.header.salt))
    }

    fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        let entry = self
            .stores()
            .and_then(|s| s.files.get(&hash_key(path, self.header.salt)))
            .copied()
            .ok_or_else(|| Error::FileNotFound(path.to_string()))?;
        self.read_payload(&entry)
    }

    fn file_count(&self) -> usize {
        self.stores().map_or(0, |s| s.files.len())
    }
}

/// Parse a newline-separated directory listing; `*` marks subdirectories
fn parse_dir_listing(data: &[u8]) -> Result<DirEntry> {
    let text = std::str::from_utf8(data)
        .map_err(|e| Error::MalformedEntry(format!("directory listing is not UTF-8: {e}")))?;
    let mut dir = DirEntry::default();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        if let Some(subdir) = line.strip_prefix('*') {
            dir.subdirs.push(subdir.to_string());
        } else {
            dir.files.push(line.to_string());
        }
    }
    Ok(dir)
}
