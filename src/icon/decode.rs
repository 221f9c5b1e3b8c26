//! Texture container decoding
//!
//! The extraction pipeline hands fully self-describing DDS containers to a
//! [`TextureDecoder`]; the shipped [`DdsDecoder`] covers the formats UI icons
//! actually use (BC compressed and 8-bit RGBA variants). The trait keeps the
//! pipeline testable with fakes.

use ddsfile::{D3DFormat, Dds, DxgiFormat};

use crate::error::{Error, Result};

/// A decoded RGBA raster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterIcon {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 pixels, row major
    pub rgba: Vec<u8>,
}

impl RasterIcon {
    /// Encode as a PNG blob
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let image = image::RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
            .ok_or_else(|| Error::TextureError("raster size mismatch".to_string()))?;
        let mut out = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| Error::TextureError(format!("png encode: {e}")))?;
        Ok(out.into_inner())
    }
}

/// Decodes a texture container blob into an RGBA raster
pub trait TextureDecoder {
    /// Decode `container`; `aux` carries SDF coefficient rows when the
    /// source material declared them.
    fn decode(&self, container: &[u8], aux: Option<&[f32]>) -> Result<RasterIcon>;
}

/// DDS decoder for the icon formats shipped in game archives
#[derive(Debug, Default)]
pub struct DdsDecoder;

impl TextureDecoder for DdsDecoder {
    fn decode(&self, container: &[u8], _aux: Option<&[f32]>) -> Result<RasterIcon> {
        let dds = Dds::read(std::io::Cursor::new(container))
            .map_err(|e| Error::TextureError(format!("dds parse: {e}")))?;
        let width = dds.get_width() as usize;
        let height = dds.get_height() as usize;
        let data = dds
            .get_data(0)
            .map_err(|e| Error::TextureError(format!("dds data: {e}")))?;

        let rgba = if let Some(dxgi) = dds.get_dxgi_format() {
            decode_dxgi(data, width, height, dxgi)?
        } else if let Some(d3d) = dds.get_d3d_format() {
            decode_d3d(data, width, height, d3d)?
        } else {
            return Err(Error::TextureError("unknown DDS format".to_string()));
        };

        Ok(RasterIcon {
            width: width as u32,
            height: height as u32,
            rgba,
        })
    }
}

fn decode_dxgi(data: &[u8], width: usize, height: usize, format: DxgiFormat) -> Result<Vec<u8>> {
    match format {
        DxgiFormat::R8G8B8A8_UNorm | DxgiFormat::R8G8B8A8_UNorm_sRGB => {
            Ok(data[..width * height * 4].to_vec())
        }
        DxgiFormat::B8G8R8A8_UNorm | DxgiFormat::B8G8R8A8_UNorm_sRGB => {
            let mut rgba = data[..width * height * 4].to_vec();
            for chunk in rgba.chunks_exact_mut(4) {
                chunk.swap(0, 2);
            }
            Ok(rgba)
        }
        DxgiFormat::BC1_UNorm | DxgiFormat::BC1_UNorm_sRGB => decode_bc(data, width, height, BcFormat::Bc1),
        DxgiFormat::BC2_UNorm | DxgiFormat::BC2_UNorm_sRGB => decode_bc(data, width, height, BcFormat::Bc2),
        DxgiFormat::BC3_UNorm | DxgiFormat::BC3_UNorm_sRGB => decode_bc(data, width, height, BcFormat::Bc3),
        DxgiFormat::BC4_UNorm => decode_bc(data, width, height, BcFormat::Bc4),
        DxgiFormat::BC5_UNorm => decode_bc(data, width, height, BcFormat::Bc5),
        DxgiFormat::BC7_UNorm | DxgiFormat::BC7_UNorm_sRGB => decode_bc(data, width, height, BcFormat::Bc7),
        other => Err(Error::TextureError(format!(
            "unsupported DXGI format: {other:?}"
        ))),
    }
}

fn decode_d3d(data: &[u8], width: usize, height: usize, format: D3DFormat) -> Result<Vec<u8>> {
    match format {
        D3DFormat::A8R8G8B8 => {
            let mut rgba = Vec::with_capacity(width * height * 4);
            for chunk in data[..width * height * 4].chunks_exact(4) {
                rgba.extend_from_slice(&[chunk[1], chunk[2], chunk[3], chunk[0]]);
            }
            Ok(rgba)
        }
        D3DFormat::DXT1 => decode_bc(data, width, height, BcFormat::Bc1),
        D3DFormat::DXT2 | D3DFormat::DXT3 => decode_bc(data, width, height, BcFormat::Bc2),
        D3DFormat::DXT4 | D3DFormat::DXT5 => decode_bc(data, width, height, BcFormat::Bc3),
        other => Err(Error::TextureError(format!(
            "unsupported D3D format: {other:?}"
        ))),
    }
}

#[derive(Clone, Copy)]
enum BcFormat {
    Bc1,
    Bc2,
    Bc3,
    Bc4,
    Bc5,
    Bc7,
}

impl BcFormat {
    const fn block_size(self) -> usize {
        match self {
            Self::Bc1 | Self::Bc4 => 8,
            Self::Bc2 | Self::Bc3 | Self::Bc5 | Self::Bc7 => 16,
        }
    }
}

/// Decode BC blocks to RGBA via bcdec_rs, clipping partial edge blocks
fn decode_bc(data: &[u8], width: usize, height: usize, format: BcFormat) -> Result<Vec<u8>> {
    let mut rgba = vec![0u8; width * height * 4];
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let block_size = format.block_size();

    // 4x4 RGBA block scratch; pitch is 16 bytes per row
    let mut block_rgba = [0u8; 64];
    let block_pitch = 16;

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let offset = (by * blocks_x + bx) * block_size;
            let Some(block) = data.get(offset..offset + block_size) else {
                return Err(Error::TextureError("BC data truncated".to_string()));
            };
            match format {
                BcFormat::Bc1 => bcdec_rs::bc1(block, &mut block_rgba, block_pitch),
                BcFormat::Bc2 => bcdec_rs::bc2(block, &mut block_rgba, block_pitch),
                BcFormat::Bc3 => bcdec_rs::bc3(block, &mut block_rgba, block_pitch),
                BcFormat::Bc4 => bcdec_rs::bc4(block, &mut block_rgba, block_pitch, false),
                BcFormat::Bc5 => bcdec_rs::bc5(block, &mut block_rgba, block_pitch, false),
                BcFormat::Bc7 => bcdec_rs::bc7(block, &mut block_rgba, block_pitch),
            }
            for py in 0..4 {
                for px in 0..4 {
                    let fx = bx * 4 + px;
                    let fy = by * 4 + py;
                    if fx >= width || fy >= height {
                        continue;
                    }
                    let src = (py * 4 + px) * 4;
                    let dst = (fy * width + fx) * 4;
                    rgba[dst..dst + 4].copy_from_slice(&block_rgba[src..src + 4]);
                }
            }
        }
    }
    Ok(rgba)
}
