//! Per-entry compression dispatch
//!
//! Archive entries carry a method tag in the upper nibble of their flags
//! byte. Tags 0 (none), 1 (zlib) and 3 (tiled deflate) are fully supported;
//! headerless zlib and zstd are rejected on first use.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{Error, Result};

pub mod gdeflate;

/// Compression method used for an entry payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    None,
    Zlib,
    HeaderlessZlib,
    TiledDeflate,
    Zstd,
}

impl CompressionMethod {
    /// Parse a method from the upper nibble of an entry flags byte
    pub fn from_flags(flags: u8) -> Result<Self> {
        Self::from_tag(flags >> 4)
    }

    /// Parse a method from its raw tag value
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(CompressionMethod::None),
            1 => Ok(CompressionMethod::Zlib),
            2 => Ok(CompressionMethod::HeaderlessZlib),
            3 => Ok(CompressionMethod::TiledDeflate),
            4 => Ok(CompressionMethod::Zstd),
            other => Err(Error::UnknownCompressionTag(other)),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionMethod::None => "none",
            CompressionMethod::Zlib => "zlib",
            CompressionMethod::HeaderlessZlib => "headerless-zlib",
            CompressionMethod::TiledDeflate => "tiled-deflate",
            CompressionMethod::Zstd => "zstd",
        }
    }
}

/// Decompress an entry payload according to its method tag.
///
/// `uncompressed_size` is the size declared by the entry table; every
/// supported method must produce exactly that many bytes. Payloads whose
/// compressed and declared sizes are equal are stored, regardless of tag.
///
/// # Errors
/// Returns an error on size mismatch, corrupt streams, or a method this
/// reader does not support (headerless zlib, zstd).
pub fn decompress(data: &[u8], uncompressed_size: usize, method: CompressionMethod) -> Result<Vec<u8>> {
    // Equal sizes means the payload was stored uncompressed.
    if data.len() == uncompressed_size {
        return Ok(data.to_vec());
    }

    match method {
        CompressionMethod::None => Err(Error::SizeMismatch {
            expected: uncompressed_size,
            actual: data.len(),
        }),
        CompressionMethod::Zlib => inflate_zlib(data, uncompressed_size),
        CompressionMethod::TiledDeflate => gdeflate::decompress(data, uncompressed_size),
        CompressionMethod::HeaderlessZlib => Err(Error::UnsupportedCompression("headerless-zlib")),
        CompressionMethod::Zstd => Err(Error::UnsupportedCompression("zstd")),
    }
}

/// Standard zlib inflate; the output length must match the declared size
pub(crate) fn inflate_zlib(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(uncompressed_size);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::DecompressionError(format!("zlib: {e}")))?;
    if out.len() != uncompressed_size {
        return Err(Error::SizeMismatch {
            expected: uncompressed_size,
            actual: out.len(),
        });
    }
    Ok(out)
}
