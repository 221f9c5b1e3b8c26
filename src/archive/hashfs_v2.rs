//! HashFS v2 container reader
//!
//! The v2 container stores a compressed entry table and a compressed
//! metadata table. Entry records reference runs of typed metadata headers;
//! single-metadata entries are plain files or directories, three-metadata
//! entries are texture objects whose read synthesizes a complete DDS
//! container from the raw pixel payload.

use std::collections::{BTreeSet, HashMap};
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::fs::File;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::compression;
use crate::error::{Error, Result};
use crate::hash::hash_key;
use super::meta::{
    tag, GeometryMeta, ImageMeta, Metadata, MetadataHeader, PlainKind, PlainPointer, SampleMeta,
};
use super::{tobj, Archive, DirEntry, HASH_METHOD_CITY, SCS_MAGIC};

/// Size of the fixed header at offset 0
pub const HEADER_SIZE: usize = 49;
/// Size of one entry record
const ENTRY_SIZE: usize = 16;

#[derive(Debug, Clone)]
pub struct V2Header {
    pub magic: [u8; 4],
    pub version: u16,
    pub salt: u16,
    pub hash_method: [u8; 4],
    pub entry_count: u32,
    pub entry_table_size: u32,
    pub entry_table_offset: u64,
    pub metadata_size: u32,
    pub metadata_table_size: u32,
    pub metadata_table_offset: u64,
    pub security_descriptor_offset: u32,
    pub platform: u8,
}

impl V2Header {
    fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic)?;
        let version = cursor.read_u16::<LittleEndian>()?;
        let salt = cursor.read_u16::<LittleEndian>()?;
        let mut hash_method = [0u8; 4];
        cursor.read_exact(&mut hash_method)?;
        Ok(Self {
            magic,
            version,
            salt,
            hash_method,
            entry_count: cursor.read_u32::<LittleEndian>()?,
            entry_table_size: cursor.read_u32::<LittleEndian>()?,
            entry_table_offset: cursor.read_u64::<LittleEndian>()?,
            metadata_size: cursor.read_u32::<LittleEndian>()?,
            metadata_table_size: cursor.read_u32::<LittleEndian>()?,
            metadata_table_offset: cursor.read_u64::<LittleEndian>()?,
            security_descriptor_offset: cursor.read_u32::<LittleEndian>()?,
            platform: cursor.read_u8()?,
        })
    }
}

/// Raw 16-byte entry record
#[derive(Debug, Clone, Copy)]
struct EntryRecord {
    hash: u64,
    metadata_index: u32,
    metadata_count: u16,
    flags: u8,
}

impl EntryRecord {
    fn is_directory(&self) -> bool {
        self.flags & 0x1 != 0
    }
}

/// A materialized file entry
#[derive(Debug, Clone)]
pub enum V2File {
    Plain(PlainPointer),
    /// Texture object: reading synthesizes a DDS container around the
    /// mip-tail payload
    TextureObject {
        image: ImageMeta,
        sample: SampleMeta,
        tail: PlainPointer,
    },
}

#[derive(Debug, Default)]
struct EntryStores {
    dirs: HashMap<u64, DirEntry>,
    files: HashMap<u64, V2File>,
}

pub struct HashFsV2 {
    path: PathBuf,
    file: File,
    header: V2Header,
    entries: Option<EntryStores>,
}

impl HashFsV2 {
    /// Open a v2 container whose magic and version were already sniffed
    pub fn from_file(path: PathBuf, mut file: File) -> Result<Self> {
        file.seek(SeekFrom::Start(0))?;
        let mut raw = [0u8; HEADER_SIZE];
        file.read_exact(&mut raw)?;
        let header = V2Header::parse(&raw)?;
        Ok(Self {
            path,
            file,
            header,
            entries: None,
        })
    }

    pub fn header(&self) -> &V2Header {
        &self.header
    }

    fn validate_header(&self) -> Result<()> {
        if self.header.magic != SCS_MAGIC {
            return Err(Error::InvalidMagic(self.header.magic));
        }
        if self.header.version != 2 {
            return Err(Error::UnsupportedVersion(self.header.version));
        }
        if self.header.hash_method != HASH_METHOD_CITY {
            return Err(Error::UnknownHashMethod(self.header.hash_method));
        }
        Ok(())
    }

    /// Read a table at `offset`, decompressing iff the stored size differs
    /// from the expected uncompressed size
    fn read_table(&mut self, offset: u64, stored_size: u32, expected_size: u32) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut raw = vec![0u8; stored_size as usize];
        self.file.read_exact(&mut raw)?;
        if stored_size == expected_size {
            return Ok(raw);
        }
        compression::inflate_zlib(&raw, expected_size as usize)
    }

    /// Read and decompress the payload a plain pointer describes
    fn read_plain(&mut self, plain: &PlainPointer) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(plain.offset))?;
        let mut raw = vec![0u8; plain.compressed_size as usize];
        self.file.read_exact(&mut raw)?;
        compression::decompress(&raw, plain.uncompressed_size as usize, plain.method)
    }

    fn build_entries(&mut self) -> Result<EntryStores> {
        let entry_table = self.read_table(
            self.header.entry_table_offset,
            self.header.entry_table_size,
            self.header.entry_count * ENTRY_SIZE as u32,
        )?;
        let metadata_table = self.read_table(
            self.header.metadata_table_offset,
            self.header.metadata_table_size,
            self.header.metadata_size,
        )?;

        let mut records = Vec::with_capacity(self.header.entry_count as usize);
        let mut cursor = Cursor::new(&entry_table);
        for _ in 0..self.header.entry_count {
            let hash = cursor.read_u64::<LittleEndian>()?;
            let metadata_index = cursor.read_u32::<LittleEndian>()?;
            let metadata_count = cursor.read_u16::<LittleEndian>()?;
            let flags = cursor.read_u8()?;
            let _reserved = cursor.read_u8()?;
            records.push(EntryRecord {
                hash,
                metadata_index,
                metadata_count,
                flags,
            });
        }

        let mut metadata_map: HashMap<u32, Metadata> = HashMap::new();
        let mut skipped: BTreeSet<u8> = BTreeSet::new();
        for record in &records {
            for i in 0..u32::from(record.metadata_count) {
                let key = record.metadata_index + i;
                let header = read_metadata_header(&metadata_table, key)?;
                let payload = metadata_payload(&metadata_table, &header);
                match header.kind {
                    tag::IMG => {
                        metadata_map.insert(key, Metadata::Image(ImageMeta::parse(payload)?));
                    }
                    tag::SAMPLE => {
                        metadata_map.insert(key, Metadata::Sample(SampleMeta::parse(payload)?));
                    }
                    tag::PMA_INFO | tag::PMG_INFO => {
                        metadata_map.insert(key, Metadata::Geometry(GeometryMeta::parse(payload)?));
                    }
                    tag::PLAIN => {
                        let plain = PlainPointer::parse(PlainKind::File, payload)?;
                        metadata_map.insert(key, Metadata::Plain(plain));
                    }
                    tag::DIRECTORY => {
                        let plain = PlainPointer::parse(PlainKind::Directory, payload)?;
                        metadata_map.insert(key, Metadata::Plain(plain));
                    }
                    tag::MIP_TAIL => {
                        let plain = PlainPointer::parse(PlainKind::MipTail, payload)?;
                        metadata_map.insert(key, Metadata::Plain(plain));
                    }
                    tag::MIP_PROXY | tag::MIP_0 | tag::MIP_1 | tag::INLINE_DIRECTORY => {
                        skipped.insert(header.kind);
                    }
                    other => return Err(Error::UnknownMetadataType(other)),
                }
            }
        }
        if !skipped.is_empty() {
            let tags: Vec<String> = skipped.iter().map(|t| format!("{t:#04x}")).collect();
            tracing::warn!(
                archive = %self.path.display(),
                "skipped metadata types: {}",
                tags.join(", ")
            );
        }

        let mut stores = EntryStores::default();
        for record in &records {
            match record.metadata_count {
                1 => {
                    let Some(Metadata::Plain(plain)) = metadata_map.get(&record.metadata_index)
                    else {
                        // Entries whose sole metadata was a skipped type carry
                        // nothing addressable; drop them.
                        if metadata_map.contains_key(&record.metadata_index) {
                            return Err(Error::MalformedEntry(format!(
                                "entry {:#018x}: single metadata is not a plain payload",
                                record.hash
                            )));
                        }
                        continue;
                    };
                    if record.is_directory() {
                        if plain.kind != PlainKind::Directory {
                            return Err(Error::MalformedEntry(format!(
                                "entry {:#018x}: directory flag without directory metadata",
                                record.hash
                            )));
                        }
                        let listing = self.read_plain(plain)?;
                        let dir = parse_dir_listing(&listing)?;
                        if stores.dirs.insert(record.hash, dir).is_some() {
                            return Err(Error::DuplicateEntryHash(record.hash));
                        }
                    } else {
                        if plain.kind == PlainKind::Directory {
                            return Err(Error::MalformedEntry(format!(
                                "entry {:#018x}: directory metadata without directory flag",
                                record.hash
                            )));
                        }
                        if stores
                            .files
                            .insert(record.hash, V2File::Plain(*plain))
                            .is_some()
                        {
                            return Err(Error::DuplicateEntryHash(record.hash));
                        }
                    }
                }
                3 => {
                    if record.is_directory() {
                        return Err(Error::MalformedEntry(format!(
                            "entry {:#018x}: three-metadata entry flagged as directory",
                            record.hash
                        )));
                    }
                    let entry = build_texture_object(record, &metadata_map)?;
                    if stores.files.insert(record.hash, entry).is_some() {
                        return Err(Error::DuplicateEntryHash(record.hash));
                    }
                }
                other => {
                    return Err(Error::MalformedEntry(format!(
                        "entry {:#018x}: unsupported metadata count {other}",
                        record.hash
                    )))
                }
            }
        }

        tracing::debug!(
            archive = %self.path.display(),
            files = stores.files.len(),
            dirs = stores.dirs.len(),
            "parsed hashfs v2 entries"
        );
        Ok(stores)
    }

    fn stores(&self) -> Option<&EntryStores> {
        self.entries.as_ref()
    }

    /// Look up a file entry by archive-internal path
    pub fn find_file(&self, path: &str) -> Option<&V2File> {
        self.stores()?.files.get(&hash_key(path, self.header.salt))
    }

    fn read_entry(&mut self, entry: &V2File) -> Result<Vec<u8>> {
        match entry {
            V2File::Plain(plain) => self.read_plain(plain),
            V2File::TextureObject { image, tail, .. } => {
                let payload = self.read_plain(tail)?;
                Ok(tobj::synthesize(image, &payload))
            }
        }
    }
}

impl Archive for HashFsV2 {
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
        self.find_file(path).is_some()
    }

    fn find_dir(&self, path: &str) -> Option<&DirEntry> {
        self.stores()?.dirs.get(&hash_key(path, self.header.salt))
    }

    fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        let entry = self
            .find_file(path)
            .cloned()
            .ok_or_else(|| Error::FileNotFound(path.to_string()))?;
        self.read_entry(&entry)
    }

    fn synthesizes_textures(&self) -> bool {
        true
    }

    fn file_count(&self) -> usize {
        self.stores().map_or(0, |s| s.files.len())
    }
}

fn read_metadata_header(table: &[u8], index: u32) -> Result<MetadataHeader> {
    let offset = index as usize * 4;
    let Some(raw) = table.get(offset..offset + 4) else {
        return Err(Error::MalformedEntry(format!(
            "metadata header {index} out of table bounds"
        )));
    };
    Ok(MetadataHeader::parse(u32::from_le_bytes(
        raw.try_into().unwrap(),
    )))
}

fn metadata_payload<'a>(table: &'a [u8], header: &MetadataHeader) -> &'a [u8] {
    table.get(header.payload_offset()..).unwrap_or(&[])
}

fn build_texture_object(
    record: &EntryRecord,
    metadata_map: &HashMap<u32, Metadata>,
) -> Result<V2File> {
    let mut image = None;
    let mut sample = None;
    let mut tail = None;
    for i in 0..u32::from(record.metadata_count) {
        match metadata_map.get(&(record.metadata_index + i)) {
            Some(Metadata::Image(img)) if image.is_none() => image = Some(*img),
            Some(Metadata::Sample(s)) if sample.is_none() => sample = Some(*s),
            Some(Metadata::Plain(p)) if p.kind == PlainKind::MipTail && tail.is_none() => {
                tail = Some(*p);
            }
            _ => {
                return Err(Error::MalformedEntry(format!(
                    "entry {:#018x}: texture object needs exactly one IMG, SAMPLE and MIP_TAIL",
                    record.hash
                )))
            }
        }
    }
    match (image, sample, tail) {
        (Some(image), Some(sample), Some(tail)) => Ok(V2File::TextureObject {
            image,
            sample,
            tail,
        }),
        _ => Err(Error::MalformedEntry(format!(
            "entry {:#018x}: incomplete texture object metadata",
            record.hash
        ))),
    }
}

/// Parse a decompressed directory listing: name count, per-name lengths,
/// then the names back to back. A leading `/` marks a subdirectory.
fn parse_dir_listing(data: &[u8]) -> Result<DirEntry> {
    let mut cursor = Cursor::new(data);
    let count = cursor.read_u32::<LittleEndian>()? as usize;
    let mut lengths = vec![0u8; count];
    cursor.read_exact(&mut lengths)?;

    let mut dir = DirEntry::default();
    for &len in &lengths {
        let mut name = vec![0u8; len as usize];
        cursor.read_exact(&mut name)?;
        let name = String::from_utf8(name)?;
        if let Some(subdir) = name.strip_prefix('/') {
            dir.subdirs.push(subdir.to_string());
        } else {
            dir.files.push(name);
        }
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_listing_splits_subdirs_and_files() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&3u32.to_le_bytes());
        let names = ["/road", "city.mat", "/company"];
        for n in names {
            raw.push(n.len() as u8);
        }
        for n in names {
            raw.extend_from_slice(n.as_bytes());
        }

        let dir = parse_dir_listing(&raw).unwrap();
        assert_eq!(dir.subdirs, vec!["road", "company"]);
        assert_eq!(dir.files, vec!["city.mat"]);
    }

    #[test]
    fn truncated_dir_listing_is_an_error() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&2u32.to_le_bytes());
        raw.push(4);
        assert!(parse_dir_listing(&raw).is_err());
    }
}
