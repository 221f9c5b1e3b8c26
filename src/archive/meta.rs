//! HashFS v2 metadata records
//!
//! The metadata table is a heterogeneous pool of typed records. Each entry
//! record points at a run of 4-byte headers; a header's low 24 bits index the
//! typed payload (in 4-byte units) inside the same table, the high byte is
//! the type tag.

use byteorder::{ByteOrder, LittleEndian};

use crate::compression::CompressionMethod;
use crate::error::{Error, Result};

/// Metadata type tags
pub mod tag {
    pub const IMG: u8 = 1;
    pub const SAMPLE: u8 = 2;
    pub const MIP_PROXY: u8 = 3;
    pub const INLINE_DIRECTORY: u8 = 4;
    pub const PMA_INFO: u8 = 5;
    pub const PMG_INFO: u8 = 6;
    pub const PLAIN: u8 = 0x80;
    pub const DIRECTORY: u8 = 0x81;
    pub const MIP_0: u8 = 0x82;
    pub const MIP_1: u8 = 0x83;
    pub const MIP_TAIL: u8 = 0x84;
}

/// Parsed 4-byte metadata header
#[derive(Debug, Clone, Copy)]
pub struct MetadataHeader {
    /// Payload position in 4-byte units, relative to the metadata table
    pub index: u32,
    /// Type tag
    pub kind: u8,
}

impl MetadataHeader {
    pub fn parse(raw: u32) -> Self {
        Self {
            index: raw & 0x00ff_ffff,
            kind: (raw >> 24) as u8,
        }
    }

    /// Byte offset of the payload inside the metadata table
    pub fn payload_offset(&self) -> usize {
        self.index as usize * 4
    }
}

/// Sub-kind of a 16-byte plain payload pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlainKind {
    File,
    Directory,
    MipTail,
}

/// Where an entry's bytes live and how they are compressed
#[derive(Debug, Clone, Copy)]
pub struct PlainPointer {
    pub kind: PlainKind,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub method: CompressionMethod,
    /// Absolute file offset (already multiplied out of the stored quotient)
    pub offset: u64,
}

impl PlainPointer {
    /// Parse the 16-byte plain payload
    pub fn parse(kind: PlainKind, data: &[u8]) -> Result<Self> {
        if data.len() < 16 {
            return Err(Error::MalformedEntry(format!(
                "plain payload truncated: {} bytes",
                data.len()
            )));
        }
        let a = LittleEndian::read_u32(&data[0..4]);
        let b = LittleEndian::read_u32(&data[4..8]);
        // data[8..12] reserved
        let quotient = LittleEndian::read_u32(&data[12..16]);

        Ok(Self {
            kind,
            compressed_size: a & 0x00ff_ffff,
            method: CompressionMethod::from_flags((a >> 24) as u8)?,
            uncompressed_size: b & 0x00ff_ffff,
            offset: u64::from(quotient) * 16,
        })
    }
}

/// 8-byte image descriptor for texture-object entries
#[derive(Debug, Clone, Copy)]
pub struct ImageMeta {
    pub width: u32,
    pub height: u32,
    pub mipmap_count: u32,
    /// DXGI pixel format
    pub format: u32,
    pub cubemap: bool,
    pub array_count: u32,
    pub pitch_alignment: u32,
    pub image_alignment: u32,
}

impl ImageMeta {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(Error::MalformedEntry(format!(
                "image descriptor truncated: {} bytes",
                data.len()
            )));
        }
        let width = u32::from(LittleEndian::read_u16(&data[0..2])) + 1;
        let height = u32::from(LittleEndian::read_u16(&data[2..4])) + 1;
        let packed = LittleEndian::read_u32(&data[4..8]);
        Ok(Self {
            width,
            height,
            mipmap_count: (packed & 0xf) + 1,
            format: (packed >> 4) & 0xff,
            cubemap: (packed >> 12) & 0x3 != 0,
            array_count: ((packed >> 14) & 0x3f) + 1,
            pitch_alignment: (packed >> 20) & 0xf,
            image_alignment: (packed >> 24) & 0xf,
        })
    }
}

/// 4-byte sampler descriptor; filter and address mode bits
#[derive(Debug, Clone, Copy)]
pub struct SampleMeta {
    pub raw: u32,
}

impl SampleMeta {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::MalformedEntry(format!(
                "sampler descriptor truncated: {} bytes",
                data.len()
            )));
        }
        Ok(Self {
            raw: LittleEndian::read_u32(&data[0..4]),
        })
    }

    pub fn mag_filter(&self) -> u32 {
        self.raw & 0x1
    }

    pub fn min_filter(&self) -> u32 {
        (self.raw >> 1) & 0x1
    }

    pub fn mip_filter(&self) -> u32 {
        (self.raw >> 2) & 0x3
    }

    pub fn address_u(&self) -> u32 {
        (self.raw >> 4) & 0x7
    }

    pub fn address_v(&self) -> u32 {
        (self.raw >> 7) & 0x7
    }

    pub fn address_w(&self) -> u32 {
        (self.raw >> 10) & 0x7
    }
}

/// 8-byte geometry/animation info payload (PMA_INFO / PMG_INFO); carried but
/// never interpreted
#[derive(Debug, Clone, Copy)]
pub struct GeometryMeta {
    pub words: [u32; 2],
}

impl GeometryMeta {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(Error::MalformedEntry(format!(
                "geometry info truncated: {} bytes",
                data.len()
            )));
        }
        Ok(Self {
            words: [
                LittleEndian::read_u32(&data[0..4]),
                LittleEndian::read_u32(&data[4..8]),
            ],
        })
    }
}

/// One recognized metadata record
#[derive(Debug, Clone, Copy)]
pub enum Metadata {
    Image(ImageMeta),
    Sample(SampleMeta),
    Plain(PlainPointer),
    Geometry(GeometryMeta),
}
