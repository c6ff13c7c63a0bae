//! Types for reading and writing glyph tables
//!

use std::io::Cursor;

use binrw::{BinRead, BinWrite};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use tracing::{instrument, trace};
use widestring::{U16Str, U16String};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::position::{pack_position, unpack_position, MAX_POSITION};

const MAGIC: &[u8; 4] = b"FNTG";

/// Fixed leading fields of a glyph table
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little, magic = b"FNTG")]
struct FontHeader {
    unknown: u32,
    bit_count: u32,
    name_length: u32,
    name_ptr: u32,
    glyph_count: u32,
    bbox_ptr: u32,
    bitmap_ptr: u32,
    index_ptr: u32,
    scale: u32,
    name_list_ptr: u32,
}

impl FontHeader {
    const SIZE: usize = 0x2C;
}

/// One 8 byte entry of the bounding box table
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
struct BoundingBox {
    position: [u8; 3],
    width: u8,
    height: u8,
    left: i8,
    right: i8,
    vertical: i8,
}

impl BoundingBox {
    const SIZE: usize = 8;
}

/// Spacing adjustments applied around a glyph
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Kerning {
    pub left: i8,
    pub right: i8,
    pub vertical: i8,
}

/// A glyph's code point, atlas rectangle and kerning
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlyphRecord {
    pub codepoint: u32,
    pub x: u16,
    pub y: u16,
    pub width: u8,
    pub height: u8,
    pub kerning: Kerning,
}

/// The decoded contents of a font resource
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlyphTable {
    pub name: String,

    /// Unknown purpose, kept as is
    pub unknown: u32,

    /// Number of code points covered by the presence bitmap
    pub bit_count: u32,

    pub scale: u32,

    /// Glyphs in ascending code point order
    pub glyphs: Vec<GlyphRecord>,
}

impl Default for GlyphTable {
    fn default() -> Self {
        GlyphTable {
            name: String::new(),
            unknown: 0,
            bit_count: Self::DEFAULT_BIT_COUNT,
            scale: 0,
            glyphs: Vec::new(),
        }
    }
}

/// Index table bucket of a code point: 0 alone, then runs of four starting at 1
pub fn bucket(codepoint: u32) -> u32 {
    codepoint.div_ceil(4)
}

/// Whether `data` starts like a glyph table
pub fn is_font(data: &[u8]) -> bool {
    data.starts_with(MAGIC)
}

fn slice<'a>(data: &'a [u8], offset: usize, length: usize, what: &str) -> Result<&'a [u8]> {
    offset
        .checked_add(length)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            Error::format(
                offset,
                format!("{what} of {length:#x} bytes exceeds table length {:#x}", data.len()),
            )
        })
}

fn pointer(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::format(value, "glyph table exceeds 4 GiB"))
}

impl GlyphTable {
    /// Presence bits of the fonts seen in the wild
    pub const DEFAULT_BIT_COUNT: u32 = 55_296;

    /// The glyphs sorted by code point, checked against the table's limits
    fn checked_glyphs(&self) -> Result<Vec<GlyphRecord>> {
        let mut glyphs = self.glyphs.clone();
        glyphs.sort_by_key(|g| g.codepoint);
        for pair in glyphs.windows(2) {
            if pair[0].codepoint == pair[1].codepoint {
                return Err(Error::DuplicateGlyphIndex {
                    codepoint: pair[0].codepoint,
                });
            }
        }
        for glyph in &glyphs {
            if glyph.codepoint >= self.bit_count {
                return Err(Error::CodepointOutOfRange {
                    codepoint: glyph.codepoint,
                    bit_count: self.bit_count,
                });
            }
            if glyph.x > MAX_POSITION || glyph.y > MAX_POSITION {
                return Err(Error::AtlasOverflow {
                    codepoint: glyph.codepoint,
                    x: glyph.x.into(),
                    y: glyph.y.into(),
                });
            }
        }
        Ok(glyphs)
    }

    /// Serialize the table, glyphs are written in code point order
    #[instrument(skip(self), fields(name = %self.name, glyphs = self.glyphs.len()), err)]
    pub fn encode(&self) -> Result<Vec<u8>> {
        let glyphs = self.checked_glyphs()?;

        let mut index = Vec::new();
        let mut last_bucket = None;
        for (row, glyph) in glyphs.iter().enumerate() {
            let bucket = bucket(glyph.codepoint);
            if last_bucket != Some(bucket) {
                index.push(pointer(row)?);
                last_bucket = Some(bucket);
            }
        }

        let bitmap_len = self.bit_count.div_ceil(8) as usize;
        let index_ptr = (FontHeader::SIZE + bitmap_len).next_multiple_of(4);
        let bbox_ptr = index_ptr + index.len() * 4;
        let name_list_ptr = bbox_ptr + glyphs.len() * BoundingBox::SIZE;
        let name_ptr = name_list_ptr + 16;
        let name = U16String::from_str(&self.name);

        let header = FontHeader {
            unknown: self.unknown,
            bit_count: self.bit_count,
            name_length: pointer(name.len() * 2)?,
            name_ptr: pointer(name_ptr)?,
            glyph_count: pointer(glyphs.len())?,
            bbox_ptr: pointer(bbox_ptr)?,
            bitmap_ptr: FontHeader::SIZE as u32,
            index_ptr: pointer(index_ptr)?,
            scale: self.scale,
            name_list_ptr: pointer(name_list_ptr)?,
        };

        let mut out = Cursor::new(Vec::with_capacity(name_ptr + name.len() * 2 + 2));
        header.write(&mut out)?;

        let mut bitmap = vec![0u8; bitmap_len];
        for glyph in &glyphs {
            let c = glyph.codepoint as usize;
            bitmap[c / 8] |= 1 << (c % 8);
        }
        let buf = out.get_mut();
        buf.extend_from_slice(&bitmap);
        buf.resize(index_ptr, 0);
        for row in &index {
            buf.write_u32::<LittleEndian>(*row)?;
        }
        out.set_position(bbox_ptr as u64);

        for glyph in &glyphs {
            BoundingBox {
                position: pack_position(glyph.x, glyph.y),
                width: glyph.width,
                height: glyph.height,
                left: glyph.kerning.left,
                right: glyph.kerning.right,
                vertical: glyph.kerning.vertical,
            }
            .write(&mut out)?;
        }

        let buf = out.get_mut();
        for _ in 0..4 {
            buf.write_u32::<LittleEndian>(header.name_ptr)?;
        }
        for unit in name.as_slice() {
            buf.write_u16::<LittleEndian>(*unit)?;
        }
        buf.write_u16::<LittleEndian>(0)?;

        Ok(out.into_inner())
    }

    /// Parse a serialized table
    #[instrument(skip_all, err)]
    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = FontHeader::read(&mut Cursor::new(data)).map_err(|e| match e {
            binrw::Error::BadMagic { .. } => Error::NotAFont,
            e => Error::format(0, format!("truncated header: {e}")),
        })?;
        trace!(?header, "read glyph table header");

        let bitmap = slice(
            data,
            header.bitmap_ptr as usize,
            header.bit_count.div_ceil(8) as usize,
            "presence bitmap",
        )?;
        let glyph_count = header.glyph_count as usize;
        let bboxes = slice(
            data,
            header.bbox_ptr as usize,
            glyph_count * BoundingBox::SIZE,
            "bounding box table",
        )?;

        let mut glyphs = Vec::with_capacity(glyph_count);
        let mut last_bucket = None;
        let mut next_index = 0usize;
        let mut row = 0usize;
        for codepoint in (0..header.bit_count).filter(|c| bitmap[*c as usize / 8] & (1 << (c % 8)) != 0) {
            let bucket = bucket(codepoint);
            if last_bucket == Some(bucket) {
                row += 1;
            } else {
                let offset = header.index_ptr as usize + next_index * 4;
                row = LittleEndian::read_u32(slice(data, offset, 4, "index table entry")?) as usize;
                next_index += 1;
                last_bucket = Some(bucket);
            }

            if row >= glyph_count {
                return Err(Error::format(
                    header.bbox_ptr as usize,
                    format!("glyph U+{codepoint:04X} uses row {row} of {glyph_count}"),
                ));
            }

            let bbox = BoundingBox::read(&mut Cursor::new(&bboxes[row * BoundingBox::SIZE..]))?;
            let (x, y) = unpack_position(bbox.position);
            glyphs.push(GlyphRecord {
                codepoint,
                x,
                y,
                width: bbox.width,
                height: bbox.height,
                kerning: Kerning {
                    left: bbox.left,
                    right: bbox.right,
                    vertical: bbox.vertical,
                },
            });
        }

        if glyphs.len() != glyph_count {
            return Err(Error::format(
                header.bitmap_ptr as usize,
                format!(
                    "presence bitmap marks {} glyphs, header declares {glyph_count}",
                    glyphs.len()
                ),
            ));
        }

        let name_bytes = slice(
            data,
            header.name_ptr as usize,
            header.name_length as usize,
            "font name",
        )?;
        let units = name_bytes
            .chunks_exact(2)
            .map(LittleEndian::read_u16)
            .collect::<Vec<_>>();
        let name = U16Str::from_slice(&units)
            .to_string()
            .map_err(|e| Error::format(header.name_ptr as usize, e.to_string()))?;

        Ok(GlyphTable {
            name,
            unknown: header.unknown,
            bit_count: header.bit_count,
            scale: header.scale,
            glyphs,
        })
    }

    pub fn glyph(&self, codepoint: u32) -> Option<&GlyphRecord> {
        self.glyphs.iter().find(|g| g.codepoint == codepoint)
    }
}
