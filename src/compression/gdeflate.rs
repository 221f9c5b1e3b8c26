//! Tiled parallel-deflate payloads
//!
//! GPU-oriented archives frame deflate data into independently compressed
//! tiles so that decompression can fan out. The payload starts with a 12-byte
//! tile-stream header, followed by a table of per-tile compressed sizes and
//! the concatenated raw deflate tiles. Every tile inflates to the full tile
//! size except the last, which inflates to `last_tile_size`.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Size of the tile-stream header preceding the tile data
pub const STREAM_HEADER_SIZE: usize = 12;

/// Base tile size; shifted left by the header's tile-size index
const BASE_TILE_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy)]
struct TileStreamHeader {
    id: u8,
    magic: u8,
    tile_count: u16,
    tile_size_index: u32,
    last_tile_size: u32,
}

impl TileStreamHeader {
    fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < STREAM_HEADER_SIZE {
            return Err(Error::DecompressionError(format!(
                "tile stream header truncated: {} bytes",
                data.len()
            )));
        }
        let mut cursor = Cursor::new(data);
        let header = Self {
            id: cursor.read_u8()?,
            magic: cursor.read_u8()?,
            tile_count: cursor.read_u16::<LittleEndian>()?,
            tile_size_index: cursor.read_u32::<LittleEndian>()?,
            last_tile_size: cursor.read_u32::<LittleEndian>()?,
        };
        // The magic byte is the id's complement
        if header.magic != !header.id {
            return Err(Error::DecompressionError(format!(
                "bad tile stream magic: id {:#04x}, magic {:#04x}",
                header.id, header.magic
            )));
        }
        Ok(header)
    }

    fn tile_size(&self) -> usize {
        BASE_TILE_SIZE << self.tile_size_index
    }
}

/// Decompress a tiled-deflate payload (tile-stream header included).
///
/// # Errors
/// Returns an error if the stream header is malformed, a tile fails to
/// inflate, or the reassembled output does not match the declared size.
pub fn decompress(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    let header = TileStreamHeader::parse(data)?;
    let body = &data[STREAM_HEADER_SIZE..];

    let tile_count = header.tile_count as usize;
    let sizes_len = tile_count * 4;
    if body.len() < sizes_len {
        return Err(Error::DecompressionError(format!(
            "tile size table truncated: want {sizes_len} bytes, have {}",
            body.len()
        )));
    }

    let mut cursor = Cursor::new(&body[..sizes_len]);
    let mut tiles = Vec::with_capacity(tile_count);
    let mut offset = sizes_len;
    for i in 0..tile_count {
        let compressed = cursor.read_u32::<LittleEndian>()? as usize;
        if offset + compressed > body.len() {
            return Err(Error::DecompressionError(format!(
                "tile {i} extends past payload end"
            )));
        }
        let expected = if i + 1 == tile_count {
            header.last_tile_size as usize
        } else {
            header.tile_size()
        };
        tiles.push((&body[offset..offset + compressed], expected));
        offset += compressed;
    }

    // Tiles are independent deflate streams; inflate them in parallel.
    let inflated: Vec<Result<Vec<u8>>> = tiles
        .par_iter()
        .enumerate()
        .map(|(i, (tile, expected))| inflate_tile(i, tile, *expected))
        .collect();

    let mut out = Vec::with_capacity(uncompressed_size);
    for tile in inflated {
        out.extend_from_slice(&tile?);
    }
    if out.len() != uncompressed_size {
        return Err(Error::SizeMismatch {
            expected: uncompressed_size,
            actual: out.len(),
        });
    }
    Ok(out)
}

fn inflate_tile(index: usize, tile: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(tile);
    let mut out = Vec::with_capacity(expected);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::DecompressionError(format!("tile {index}: {e}")))?;
    if out.len() != expected {
        return Err(Error::DecompressionError(format!(
            "tile {index}: inflated to {} bytes, expected {expected}",
            out.len()
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use byteorder::WriteBytesExt;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;

    use super::*;

    /// Build a tile stream from plain data, splitting at the given tile size index
    fn build_stream(plain: &[u8], tile_size_index: u32) -> Vec<u8> {
        let tile_size = BASE_TILE_SIZE << tile_size_index;
        let chunks: Vec<&[u8]> = plain.chunks(tile_size).collect();
        let last_tile_size = chunks.last().map_or(0, |c| c.len()) as u32;

        let packed: Vec<Vec<u8>> = chunks
            .iter()
            .map(|chunk| {
                let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
                enc.write_all(chunk).unwrap();
                enc.finish().unwrap()
            })
            .collect();

        let mut out = Vec::new();
        out.write_u8(0x04).unwrap();
        out.write_u8(!0x04).unwrap();
        out.write_u16::<LittleEndian>(chunks.len() as u16).unwrap();
        out.write_u32::<LittleEndian>(tile_size_index).unwrap();
        out.write_u32::<LittleEndian>(last_tile_size).unwrap();
        for tile in &packed {
            out.write_u32::<LittleEndian>(tile.len() as u32).unwrap();
        }
        for tile in &packed {
            out.extend_from_slice(tile);
        }
        out
    }

    #[test]
    fn single_tile_roundtrips() {
        let plain: Vec<u8> = (0..4096u32).flat_map(|v| v.to_le_bytes()).collect();
        let stream = build_stream(&plain, 0);
        let out = decompress(&stream, plain.len()).unwrap();
        assert_eq!(out, plain);
    }

    #[test]
    fn multi_tile_roundtrips() {
        // Two full tiles plus a short tail
        let plain: Vec<u8> = (0..(2 * BASE_TILE_SIZE + 777))
            .map(|i| (i % 251) as u8)
            .collect();
        let stream = build_stream(&plain, 0);
        let out = decompress(&stream, plain.len()).unwrap();
        assert_eq!(out, plain);
    }

    #[test]
    fn header_must_be_stripped_exactly_once() {
        // Decoding without the 12-byte header present fails; with it, succeeds.
        let plain = vec![0xabu8; 1000];
        let stream = build_stream(&plain, 0);
        assert!(decompress(&stream[STREAM_HEADER_SIZE..], plain.len()).is_err());
        assert!(decompress(&stream, plain.len()).is_ok());
    }

    #[test]
    fn corrupt_magic_is_rejected() {
        let plain = vec![1u8; 64];
        let mut stream = build_stream(&plain, 0);
        stream[1] ^= 0xff;
        assert!(decompress(&stream, plain.len()).is_err());
    }

    #[test]
    fn truncated_tile_is_rejected() {
        let plain = vec![7u8; 5000];
        let stream = build_stream(&plain, 0);
        assert!(decompress(&stream[..stream.len() - 4], plain.len()).is_err());
    }
}
