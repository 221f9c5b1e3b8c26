//! Shared helpers for integration tests: synthetic archive builders

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;
use tempfile::TempDir;

use truckmaps::hash::hash_key;

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// Wrap raw deflate tiles into a tile stream (single tile)
pub fn tile_stream(plain: &[u8]) -> Vec<u8> {
    let tile = deflate(plain);
    let mut out = Vec::new();
    out.write_u8(0x04).unwrap();
    out.write_u8(!0x04).unwrap();
    out.write_u16::<LittleEndian>(1).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(plain.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(tile.len() as u32).unwrap();
    out.extend_from_slice(&tile);
    out
}

/// Compression method for a builder file
#[derive(Clone, Copy, PartialEq)]
pub enum Method {
    Stored,
    Zlib,
    Tiled,
}

pub struct TobjSpec {
    pub width: u16,
    pub height: u16,
    pub mipmaps: u32,
    pub format: u32,
    pub cubemap: bool,
}

enum BuilderEntry {
    File {
        path: String,
        plain: Vec<u8>,
        method: Method,
    },
    Dir {
        path: String,
        names: Vec<String>,
    },
    Tobj {
        path: String,
        spec: TobjSpec,
        payload: Vec<u8>,
    },
    /// An entry whose single metadata record is a skipped type
    SkippedMeta { path: String },
}

/// Builds HashFS v2 archive files matching the reader's binary layout
pub struct V2Builder {
    salt: u16,
    entries: Vec<BuilderEntry>,
}

impl V2Builder {
    pub fn new(salt: u16) -> Self {
        Self {
            salt,
            entries: Vec::new(),
        }
    }

    pub fn file(mut self, path: &str, data: &[u8], method: Method) -> Self {
        self.entries.push(BuilderEntry::File {
            path: path.to_string(),
            plain: data.to_vec(),
            method,
        });
        self
    }

    /// Directory with the given child names; subdirectory names carry a `/`
    pub fn dir(mut self, path: &str, names: &[&str]) -> Self {
        self.entries.push(BuilderEntry::Dir {
            path: path.to_string(),
            names: names.iter().map(|n| (*n).to_string()).collect(),
        });
        self
    }

    pub fn tobj(mut self, path: &str, spec: TobjSpec, payload: &[u8]) -> Self {
        self.entries.push(BuilderEntry::Tobj {
            path: path.to_string(),
            spec,
            payload: payload.to_vec(),
        });
        self
    }

    pub fn skipped_meta(mut self, path: &str) -> Self {
        self.entries.push(BuilderEntry::SkippedMeta {
            path: path.to_string(),
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        const HEADER_SIZE: usize = 49;

        // Payload region, 16-aligned records
        let mut payloads: Vec<u8> = Vec::new();
        let base = HEADER_SIZE.div_ceil(16) * 16;
        let append_payload = |payloads: &mut Vec<u8>, bytes: &[u8]| -> u32 {
            while (base + payloads.len()) % 16 != 0 {
                payloads.push(0);
            }
            let offset = base + payloads.len();
            payloads.extend_from_slice(bytes);
            (offset / 16) as u32
        };

        // Metadata table as 4-byte words
        let mut meta: Vec<u32> = Vec::new();
        let plain_words = |quotient: u32, stored: usize, plain: usize, tag: u8| -> [u32; 4] {
            [
                stored as u32 | (u32::from(tag) << 4) << 24,
                plain as u32,
                0,
                quotient,
            ]
        };

        // Entry records
        struct Record {
            hash: u64,
            meta_index: u32,
            meta_count: u16,
            flags: u8,
        }
        let mut records: Vec<Record> = Vec::new();

        for entry in &self.entries {
            match entry {
                BuilderEntry::File {
                    path,
                    plain,
                    method,
                } => {
                    let (stored, tag) = match method {
                        Method::Stored => (plain.clone(), 0u8),
                        Method::Zlib => (zlib(plain), 1),
                        Method::Tiled => (tile_stream(plain), 3),
                    };
                    let quotient = append_payload(&mut payloads, &stored);
                    let payload_index = meta.len() as u32 + 1;
                    let header = payload_index | (u32::from(0x80u8) << 24);
                    meta.push(header);
                    meta.extend(plain_words(quotient, stored.len(), plain.len(), tag));
                    records.push(Record {
                        hash: hash_key(path, self.salt),
                        meta_index: payload_index - 1,
                        meta_count: 1,
                        flags: 0,
                    });
                }
                BuilderEntry::Dir { path, names } => {
                    let mut listing = Vec::new();
                    listing
                        .write_u32::<LittleEndian>(names.len() as u32)
                        .unwrap();
                    for name in names {
                        listing.push(name.len() as u8);
                    }
                    for name in names {
                        listing.extend_from_slice(name.as_bytes());
                    }
                    let stored = zlib(&listing);
                    let quotient = append_payload(&mut payloads, &stored);
                    let payload_index = meta.len() as u32 + 1;
                    let header = payload_index | (u32::from(0x81u8) << 24);
                    meta.push(header);
                    meta.extend(plain_words(quotient, stored.len(), listing.len(), 1));
                    records.push(Record {
                        hash: hash_key(path, self.salt),
                        meta_index: payload_index - 1,
                        meta_count: 1,
                        flags: 1,
                    });
                }
                BuilderEntry::Tobj {
                    path,
                    spec,
                    payload,
                } => {
                    let stored = zlib(payload);
                    let quotient = append_payload(&mut payloads, &stored);
                    let meta_index = meta.len() as u32;
                    // Three consecutive headers: IMG, SAMPLE, MIP_TAIL
                    let img_payload = meta_index + 3;
                    let sample_payload = img_payload + 2;
                    let tail_payload = sample_payload + 1;
                    meta.push(img_payload | (1u32 << 24));
                    meta.push(sample_payload | (2u32 << 24));
                    meta.push(tail_payload | (u32::from(0x84u8) << 24));
                    // IMG payload: width-1, height-1, packed
                    let packed: u32 = (spec.mipmaps - 1)
                        | (spec.format << 4)
                        | (u32::from(spec.cubemap) << 12);
                    meta.push(
                        u32::from(spec.width - 1) | (u32::from(spec.height - 1) << 16),
                    );
                    meta.push(packed);
                    // SAMPLE payload
                    meta.push(0x15);
                    meta.extend(plain_words(quotient, stored.len(), payload.len(), 1));
                    records.push(Record {
                        hash: hash_key(path, self.salt),
                        meta_index,
                        meta_count: 3,
                        flags: 0,
                    });
                }
                BuilderEntry::SkippedMeta { path } => {
                    let header_index = meta.len() as u32;
                    meta.push(3u32 << 24); // MIP_PROXY, payload index 0
                    records.push(Record {
                        hash: hash_key(path, self.salt),
                        meta_index: header_index,
                        meta_count: 1,
                        flags: 0,
                    });
                }
            }
        }

        let mut meta_bytes = Vec::with_capacity(meta.len() * 4);
        for word in &meta {
            meta_bytes.write_u32::<LittleEndian>(*word).unwrap();
        }

        let mut entry_bytes = Vec::with_capacity(records.len() * 16);
        for record in &records {
            entry_bytes.write_u64::<LittleEndian>(record.hash).unwrap();
            entry_bytes
                .write_u32::<LittleEndian>(record.meta_index)
                .unwrap();
            entry_bytes
                .write_u16::<LittleEndian>(record.meta_count)
                .unwrap();
            entry_bytes.write_u8(record.flags).unwrap();
            entry_bytes.write_u8(0).unwrap();
        }

        let entry_table = zlib(&entry_bytes);
        let meta_table = zlib(&meta_bytes);
        let entry_table_offset = (base + payloads.len()) as u64;
        let meta_table_offset = entry_table_offset + entry_table.len() as u64;

        let mut out = Vec::new();
        out.extend_from_slice(b"SCS#");
        out.write_u16::<LittleEndian>(2).unwrap();
        out.write_u16::<LittleEndian>(self.salt).unwrap();
        out.extend_from_slice(b"CITY");
        out.write_u32::<LittleEndian>(records.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(entry_table.len() as u32).unwrap();
        out.write_u64::<LittleEndian>(entry_table_offset).unwrap();
        out.write_u32::<LittleEndian>(meta_bytes.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(meta_table.len() as u32).unwrap();
        out.write_u64::<LittleEndian>(meta_table_offset).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap(); // security descriptor
        out.write_u8(0).unwrap(); // platform
        assert_eq!(out.len(), HEADER_SIZE);

        out.resize(base, 0);
        out.extend_from_slice(&payloads);
        out.extend_from_slice(&entry_table);
        out.extend_from_slice(&meta_table);
        out
    }

    pub fn write_to(&self, dir: &TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

/// Write a ZIP archive with the given entries
pub fn build_zip(dir: &TempDir, name: &str, files: &[(&str, &[u8])]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    for (entry_name, data) in files {
        writer.start_file(*entry_name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
    path
}
