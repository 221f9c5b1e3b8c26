//! Texture-container synthesis for texture-object entries
//!
//! A texture-object entry stores only the raw pixel payload plus an image
//! descriptor; downstream decoders expect a self-describing DDS file. This
//! module rebuilds one: "DDS " magic, the 124-byte legacy header, the 20-byte
//! DX10 extension, then the payload unchanged.

use byteorder::{LittleEndian, WriteBytesExt};

use super::meta::ImageMeta;

/// Output size before the pixel payload: magic + legacy header + DX10 extension
pub const PREFIX_SIZE: usize = 4 + 124 + 20;

// Legacy header flags
const DDSD_CAPS: u32 = 0x1;
const DDSD_HEIGHT: u32 = 0x2;
const DDSD_WIDTH: u32 = 0x4;
const DDSD_PIXELFORMAT: u32 = 0x1000;
const DDSD_MIPMAPCOUNT: u32 = 0x20000;
const DDSD_LINEARSIZE: u32 = 0x80000;

const DDPF_FOURCC: u32 = 0x4;

const DDSCAPS_COMPLEX: u32 = 0x8;
const DDSCAPS_TEXTURE: u32 = 0x1000;
const DDSCAPS_MIPMAP: u32 = 0x40_0000;
const DDSCAPS2_CUBEMAP_ALL: u32 = 0xfe00;

// DX10 extension values
const DDS_DIMENSION_TEXTURE2D: u32 = 3;
const DDS_RESOURCE_MISC_TEXTURECUBE: u32 = 0x4;

/// Build a complete DDS container around a raw pixel payload.
///
/// The legacy header's pitch-or-linear-size field carries the payload
/// length; the DX10 extension carries the descriptor's DXGI format and the
/// cubemap misc flag iff the descriptor's cubemap bit was set.
#[must_use]
pub fn synthesize(image: &ImageMeta, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(PREFIX_SIZE + payload.len());
    out.extend_from_slice(b"DDS ");

    let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | DDSD_LINEARSIZE;
    if image.mipmap_count > 1 {
        flags |= DDSD_MIPMAPCOUNT;
    }
    let mut caps = DDSCAPS_TEXTURE;
    if image.mipmap_count > 1 {
        caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
    }
    let caps2 = if image.cubemap {
        caps |= DDSCAPS_COMPLEX;
        DDSCAPS2_CUBEMAP_ALL
    } else {
        0
    };

    // 124-byte legacy header
    out.write_u32::<LittleEndian>(124).unwrap();
    out.write_u32::<LittleEndian>(flags).unwrap();
    out.write_u32::<LittleEndian>(image.height).unwrap();
    out.write_u32::<LittleEndian>(image.width).unwrap();
    out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap(); // depth
    out.write_u32::<LittleEndian>(image.mipmap_count).unwrap();
    for _ in 0..11 {
        out.write_u32::<LittleEndian>(0).unwrap(); // reserved
    }
    // 32-byte pixel format: fourCC only, masks and bitcount zero
    out.write_u32::<LittleEndian>(32).unwrap();
    out.write_u32::<LittleEndian>(DDPF_FOURCC).unwrap();
    out.extend_from_slice(b"DX10");
    for _ in 0..5 {
        out.write_u32::<LittleEndian>(0).unwrap();
    }
    out.write_u32::<LittleEndian>(caps).unwrap();
    out.write_u32::<LittleEndian>(caps2).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap(); // caps3
    out.write_u32::<LittleEndian>(0).unwrap(); // caps4
    out.write_u32::<LittleEndian>(0).unwrap(); // reserved2

    // 20-byte DX10 extension
    out.write_u32::<LittleEndian>(image.format).unwrap();
    out.write_u32::<LittleEndian>(DDS_DIMENSION_TEXTURE2D).unwrap();
    out.write_u32::<LittleEndian>(if image.cubemap {
        DDS_RESOURCE_MISC_TEXTURECUBE
    } else {
        0
    })
    .unwrap();
    out.write_u32::<LittleEndian>(1).unwrap(); // array size
    out.write_u32::<LittleEndian>(0).unwrap(); // misc flags 2

    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::super::meta::ImageMeta;
    use super::*;

    fn image(width: u32, height: u32, mipmaps: u32, format: u32, cubemap: bool) -> ImageMeta {
        ImageMeta {
            width,
            height,
            mipmap_count: mipmaps,
            format,
            cubemap,
            array_count: 1,
            pitch_alignment: 0,
            image_alignment: 0,
        }
    }

    #[test]
    fn output_layout_matches_container_format() {
        let payload = vec![0x7fu8; 4096];
        let out = synthesize(&image(256, 256, 9, 0x1c, false), &payload);

        assert_eq!(out.len(), 148 + payload.len());
        assert_eq!(&out[0..4], b"DDS ");
        // header size, dimensions, linear size, mipmaps
        assert_eq!(u32::from_le_bytes(out[4..8].try_into().unwrap()), 124);
        assert_eq!(u32::from_le_bytes(out[12..16].try_into().unwrap()), 256);
        assert_eq!(u32::from_le_bytes(out[16..20].try_into().unwrap()), 256);
        assert_eq!(
            u32::from_le_bytes(out[20..24].try_into().unwrap()),
            payload.len() as u32
        );
        assert_eq!(u32::from_le_bytes(out[28..32].try_into().unwrap()), 9);
        // pixel format fourCC at offset 84
        assert_eq!(&out[84..88], b"DX10");
        // DX10 extension: format, dimension, misc
        assert_eq!(u32::from_le_bytes(out[128..132].try_into().unwrap()), 0x1c);
        assert_eq!(u32::from_le_bytes(out[132..136].try_into().unwrap()), 3);
        assert_eq!(u32::from_le_bytes(out[136..140].try_into().unwrap()), 0);
        assert_eq!(&out[148..], payload.as_slice());
    }

    #[test]
    fn cubemap_bit_sets_misc_flag() {
        let out = synthesize(&image(64, 64, 1, 0x57, true), &[0u8; 64]);
        let misc = u32::from_le_bytes(out[136..140].try_into().unwrap());
        assert_eq!(misc, DDS_RESOURCE_MISC_TEXTURECUBE);

        let out = synthesize(&image(64, 64, 1, 0x57, false), &[0u8; 64]);
        let misc = u32::from_le_bytes(out[136..140].try_into().unwrap());
        assert_eq!(misc, 0);
    }

    #[test]
    fn reference_parser_recovers_descriptor() {
        // Round-trip through the ddsfile crate as the reference DDS parser.
        let payload = vec![0u8; 256 * 256 * 4];
        let out = synthesize(&image(256, 256, 1, 28, false), &payload);
        let dds = ddsfile::Dds::read(Cursor::new(&out)).unwrap();
        assert_eq!(dds.get_width(), 256);
        assert_eq!(dds.get_height(), 256);
        assert_eq!(
            dds.get_dxgi_format(),
            Some(ddsfile::DxgiFormat::R8G8B8A8_UNorm)
        );
    }
}
