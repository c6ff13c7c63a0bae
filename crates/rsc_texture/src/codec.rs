//! Conversion between texture resources and RGBA8 rasters

use rsc_container::{ResourceInfo, ResourceNode, TextureMeta};
use tracing::{instrument, warn};

use crate::error::{Error, Result, TextureWarning};
use crate::format::{decode_texels, encode_texels, PixelFormat};
use crate::image::{Palette, RgbaImage};
use crate::swizzle::{unswizzle, SwizzleMode, UnitGrid};

/// Largest storage area decoded in memory, 16384 x 16384 texels
const MAX_TEXELS: u64 = 1 << 28;

/// Decompresses block compressed texel data
///
/// `blocks` holds the 4x4 blocks row major. `width` and `height` are the texel
/// dimensions rounded up to multiples of four, the result must be `width * height`
/// RGBA8 pixels.
pub trait BlockDecompressor {
    fn decompress(
        &self,
        format: PixelFormat,
        blocks: &[u8],
        width: u32,
        height: u32,
    ) -> Option<Vec<u8>>;
}

/// A decoded texture and everything noticed along the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTexture {
    pub image: RgbaImage,

    /// Set for palette textures
    pub palette: Option<Palette>,

    pub warnings: Vec<TextureWarning>,
}

impl DecodedTexture {
    fn note(&mut self, warning: TextureWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }
}

/// Dimensions the texel data is stored at
pub fn storage_dimensions(meta: &TextureMeta) -> (u32, u32) {
    let (width, height) = (u32::from(meta.width), u32::from(meta.height));
    if meta.is_pow2() {
        (width.next_power_of_two(), height.next_power_of_two())
    } else {
        (width, height)
    }
}

/// Decode a texture, compressed formats are reported as unsupported
pub fn decode(meta: &TextureMeta, resource: &ResourceNode) -> Result<DecodedTexture> {
    decode_with(meta, resource, None)
}

/// Decode a texture, handing compressed formats to `decompressor`
#[instrument(skip_all, fields(format = meta.format, width = meta.width, height = meta.height), err)]
pub fn decode_with(
    meta: &TextureMeta,
    resource: &ResourceNode,
    decompressor: Option<&dyn BlockDecompressor>,
) -> Result<DecodedTexture> {
    let (storage_width, storage_height) = storage_dimensions(meta);
    if u64::from(storage_width) * u64::from(storage_height) > MAX_TEXELS {
        return Err(Error::DimensionsTooLarge {
            width: storage_width,
            height: storage_height,
        });
    }

    let mut decoded = DecodedTexture {
        image: RgbaImage::new(u32::from(meta.width), u32::from(meta.height)),
        palette: None,
        warnings: Vec::new(),
    };

    let pixel_entry = if meta.has_palette() {
        match resource.split_entry(meta.palette_id as usize) {
            Some((palette, rest)) => {
                let (palette, present) = Palette::from_bgra(palette.data);
                if present < Palette::ENTRIES {
                    decoded.note(TextureWarning::ShortPalette(present));
                }
                decoded.palette = Some(palette);
                rest.first().copied()
            }
            None => {
                decoded.note(TextureWarning::MissingPalette(meta.palette_id));
                resource.entry(0)
            }
        }
    } else {
        resource.entry(0)
    };
    let data = match pixel_entry {
        Some(entry) => entry.data,
        None => {
            decoded.note(TextureWarning::MissingPixelData);
            &[]
        }
    };

    let format = match PixelFormat::try_from(meta.format) {
        Ok(format) => format,
        Err(code) => {
            decoded.note(TextureWarning::UnsupportedPixelFormat(code));
            return Ok(decoded);
        }
    };
    if format == PixelFormat::Indexed8 && decoded.palette.is_none() && !meta.has_palette() {
        decoded.note(TextureWarning::MissingPalette(meta.palette_id));
    }

    let grid = UnitGrid::new(format, storage_width, storage_height);
    let linear = match SwizzleMode::from(meta.swizzle) {
        SwizzleMode::Morton => {
            if data.len() < grid.tiled_len() {
                decoded.note(TextureWarning::ShortPixelData {
                    expected: grid.tiled_len(),
                    actual: data.len(),
                });
            }
            unswizzle(&grid, data)
        }
        mode => {
            if let SwizzleMode::Unknown(mode) = mode {
                decoded.note(TextureWarning::UnsupportedSwizzleMode(mode));
            }
            restride(&mut decoded, format, &grid, meta.scanline, storage_width, storage_height, data)
        }
    };

    // Texel grid covering the padded storage
    let padded_width = storage_width.next_multiple_of(4);
    let padded_height = storage_height.next_multiple_of(4);
    let raster = if format.is_compressed() {
        let pixels = decompressor
            .and_then(|d| d.decompress(format, &linear, padded_width, padded_height))
            .filter(|p| p.len() == padded_width as usize * padded_height as usize * 4);
        match pixels {
            Some(mut pixels) => {
                fix_channels(format, &mut pixels);
                RgbaImage::from_raw(padded_width, padded_height, pixels)?
            }
            None => {
                decoded.note(TextureWarning::UnsupportedPixelFormat(format.code()));
                return Ok(decoded);
            }
        }
    } else {
        let mut raster = RgbaImage::new(padded_width, padded_height);
        decode_texels(format, &linear, decoded.palette.as_ref(), &mut raster.pixels)
            .ok_or_else(|| Error::Format(format!("no texel decoder for {format}")))?;
        raster
    };

    decoded.image = raster.crop(0, 0, u32::from(meta.width), u32::from(meta.height));
    Ok(decoded)
}

/// Copy linear rows of stored data into a packed grid
fn restride(
    decoded: &mut DecodedTexture,
    format: PixelFormat,
    grid: &UnitGrid,
    scanline: u32,
    width: u32,
    height: u32,
    data: &[u8],
) -> Vec<u8> {
    let (row_units, row_count) = if format.is_compressed() {
        (width.div_ceil(4) as usize, height.div_ceil(4) as usize)
    } else {
        (width as usize, height as usize)
    };
    let packed = row_units * format.unit_size();
    let stride = if scanline as usize >= packed {
        scanline as usize
    } else {
        packed
    };

    let expected = row_count.saturating_sub(1) * stride + packed;
    if row_count > 0 && data.len() < expected {
        decoded.note(TextureWarning::ShortPixelData {
            expected,
            actual: data.len(),
        });
    }

    let mut linear = vec![0u8; grid.linear_len()];
    for row in 0..row_count {
        let start = row * stride;
        if start >= data.len() {
            break;
        }
        let end = (start + packed).min(data.len());
        let to = row * grid.row_len();
        linear[to..to + end - start].copy_from_slice(&data[start..end]);
    }
    linear
}

/// Channel fix-ups for formats with fewer than four stored channels
fn fix_channels(format: PixelFormat, pixels: &mut [u8]) {
    match format {
        PixelFormat::Bc4 => pixels.chunks_exact_mut(4).for_each(|p| {
            p[1] = p[0];
            p[2] = p[0];
        }),
        PixelFormat::Bc5 => pixels.chunks_exact_mut(4).for_each(|p| {
            p[2] = 0xFF;
            p[3] = 0xFF;
        }),
        _ => {}
    }
}

/// Encode a raster as a linear `Argb8888` texture resource called `name`
#[instrument(skip(image), fields(width = image.width, height = image.height), err)]
pub fn encode(image: &RgbaImage, name: &str) -> Result<(TextureMeta, ResourceNode)> {
    let too_large = || Error::DimensionsTooLarge {
        width: image.width,
        height: image.height,
    };
    let width = u16::try_from(image.width).map_err(|_| too_large())?;
    let height = u16::try_from(image.height).map_err(|_| too_large())?;
    if image.pixels.len() != image.width as usize * image.height as usize * 4 {
        return Err(Error::BufferSize {
            expected: image.width as usize * image.height as usize * 4,
            actual: image.pixels.len(),
        });
    }

    let format = PixelFormat::Argb8888;
    let texels = encode_texels(format, &image.pixels)
        .ok_or_else(|| Error::Format(format!("no texel encoder for {format}")))?;
    let scanline = image.width * 4;

    let meta = TextureMeta {
        format: format.code(),
        width,
        height,
        palette: 0,
        swizzle: 1,
        flags: 0,
        palette_id: 0,
        scanline,
        unknown: [0; 3],
    };

    let mut resource = ResourceNode::new(name);
    resource.push_entry(
        ResourceInfo([
            image.width,
            image.height,
            texels.len() as u32,
            format.code(),
            0,
            0,
            0,
            0,
        ]),
        texels,
    );

    Ok((meta, resource))
}
