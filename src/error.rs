//! Error types for truckmaps

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid archive magic: expected SCS#, found {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("Unsupported archive version: {0} (supported: 1-2)")]
    UnsupportedVersion(u16),

    #[error("Unknown hash method: {0:?} (expected CITY)")]
    UnknownHashMethod([u8; 4]),

    #[error("Unknown metadata type tag: {0}")]
    UnknownMetadataType(u8),

    #[error("Duplicate entry hash in archive: {0:#018x}")]
    DuplicateEntryHash(u64),

    #[error("Malformed entry: {0}")]
    MalformedEntry(String),

    #[error("Decompression failed: {0}")]
    DecompressionError(String),

    #[error("Unsupported compression method: {0}")]
    UnsupportedCompression(&'static str),

    #[error("Unknown compression tag: {0}")]
    UnknownCompressionTag(u8),

    #[error("Size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("File not found in archive set: {0}")]
    FileNotFound(String),

    #[error("Directory not found in archive set: {0}")]
    DirNotFound(String),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Material descriptor error: {0}")]
    MatError(String),

    #[error("Texture decode error: {0}")]
    TextureError(String),

    #[error("Malformed sector key: {0}")]
    MalformedSectorKey(String),

    #[error("Sector parse error in {file}: {message}")]
    SectorParse { file: String, message: String },

    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
