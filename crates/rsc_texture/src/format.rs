//! Pixel formats and per texel transcoding to and from RGBA8.

use byteorder::{ByteOrder, LittleEndian};
use derive_more::derive::Display;

use crate::image::Palette;

/// Pixel format code stored in a texture header
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PixelFormat {
    /// 32 bit, bytes stored B, G, R, A
    Argb8888 = 0x00,
    /// 16 bit, no alpha
    Bgr565 = 0x01,
    /// 16 bit, 1 bit alpha
    Bgra5551 = 0x02,
    /// 16 bit, 4 bits per channel
    Bgra4444 = 0x03,
    /// 8 bit index into a 256 entry palette
    Indexed8 = 0x04,
    Bc1 = 0x10,
    Bc2 = 0x11,
    Bc3 = 0x12,
    /// Single channel block compression
    Bc4 = 0x13,
    /// Two channel block compression
    Bc5 = 0x14,
}

impl TryFrom<u32> for PixelFormat {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => PixelFormat::Argb8888,
            0x01 => PixelFormat::Bgr565,
            0x02 => PixelFormat::Bgra5551,
            0x03 => PixelFormat::Bgra4444,
            0x04 => PixelFormat::Indexed8,
            0x10 => PixelFormat::Bc1,
            0x11 => PixelFormat::Bc2,
            0x12 => PixelFormat::Bc3,
            0x13 => PixelFormat::Bc4,
            0x14 => PixelFormat::Bc5,
            unknown => return Err(unknown),
        })
    }
}

impl PixelFormat {
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Whether units are 4x4 compressed blocks rather than single texels
    pub fn is_compressed(self) -> bool {
        matches!(
            self,
            PixelFormat::Bc1
                | PixelFormat::Bc2
                | PixelFormat::Bc3
                | PixelFormat::Bc4
                | PixelFormat::Bc5
        )
    }

    /// Bytes per unit, a texel or a 4x4 block
    pub fn unit_size(self) -> usize {
        match self {
            PixelFormat::Argb8888 => 4,
            PixelFormat::Bgr565 | PixelFormat::Bgra5551 | PixelFormat::Bgra4444 => 2,
            PixelFormat::Indexed8 => 1,
            PixelFormat::Bc1 | PixelFormat::Bc4 => 8,
            PixelFormat::Bc2 | PixelFormat::Bc3 | PixelFormat::Bc5 => 16,
        }
    }

    /// Expand one stored texel to RGBA8
    ///
    /// Returns `None` for block compressed formats. Indexed texels without a palette
    /// come out as opaque grey levels.
    pub fn decode_texel(self, raw: &[u8], palette: Option<&Palette>) -> Option<[u8; 4]> {
        let wide = || LittleEndian::read_u16(raw);
        Some(match self {
            PixelFormat::Argb8888 => [raw[2], raw[1], raw[0], raw[3]],
            PixelFormat::Bgr565 => {
                let v = wide();
                [expand(v >> 11, 5), expand(v >> 5, 6), expand(v, 5), 0xFF]
            }
            PixelFormat::Bgra5551 => {
                let v = wide();
                [
                    expand(v >> 10, 5),
                    expand(v >> 5, 5),
                    expand(v, 5),
                    expand(v >> 15, 1),
                ]
            }
            PixelFormat::Bgra4444 => {
                let v = wide();
                [
                    expand(v >> 8, 4),
                    expand(v >> 4, 4),
                    expand(v, 4),
                    expand(v >> 12, 4),
                ]
            }
            PixelFormat::Indexed8 => match palette {
                Some(palette) => palette[raw[0] as usize],
                None => [raw[0], raw[0], raw[0], 0xFF],
            },
            _ => return None,
        })
    }

    /// Quantize one RGBA8 texel into this format's stored bytes
    ///
    /// Returns `None` for formats which cannot be produced texel by texel.
    pub fn encode_texel(self, [r, g, b, a]: [u8; 4], out: &mut [u8]) -> Option<()> {
        let value = match self {
            PixelFormat::Argb8888 => {
                out[..4].copy_from_slice(&[b, g, r, a]);
                return Some(());
            }
            PixelFormat::Bgr565 => (quantize(r, 5) << 11) | (quantize(g, 6) << 5) | quantize(b, 5),
            PixelFormat::Bgra5551 => {
                (quantize(a, 1) << 15) | (quantize(r, 5) << 10) | (quantize(g, 5) << 5) | quantize(b, 5)
            }
            PixelFormat::Bgra4444 => {
                (quantize(a, 4) << 12) | (quantize(r, 4) << 8) | (quantize(g, 4) << 4) | quantize(b, 4)
            }
            _ => return None,
        };
        LittleEndian::write_u16(&mut out[..2], value);
        Some(())
    }
}

/// Decode a run of texels into RGBA8, `out` holds four bytes per texel of `data`
pub fn decode_texels(
    format: PixelFormat,
    data: &[u8],
    palette: Option<&Palette>,
    out: &mut [u8],
) -> Option<()> {
    for (raw, rgba) in data
        .chunks_exact(format.unit_size())
        .zip(out.chunks_exact_mut(4))
    {
        rgba.copy_from_slice(&format.decode_texel(raw, palette)?);
    }
    Some(())
}

/// Encode RGBA8 texels into a format, `None` if the format has no texel encoder
pub fn encode_texels(format: PixelFormat, rgba: &[u8]) -> Option<Vec<u8>> {
    let size = format.unit_size();
    let mut out = vec![0u8; rgba.len() / 4 * size];
    for (texel, raw) in rgba.chunks_exact(4).zip(out.chunks_exact_mut(size)) {
        format.encode_texel([texel[0], texel[1], texel[2], texel[3]], raw)?;
    }
    Some(out)
}

/// Widen the low `bits` of `value` to eight bits by bit replication
pub(crate) fn expand(value: u16, bits: u32) -> u8 {
    let value = u32::from(value) & ((1 << bits) - 1);
    let mut result = value << (8 - bits);
    let mut filled = bits;
    while filled < 8 {
        result |= result >> filled;
        filled *= 2;
    }
    result as u8
}

fn quantize(channel: u8, bits: u32) -> u16 {
    u16::from(channel) >> (8 - bits)
}
