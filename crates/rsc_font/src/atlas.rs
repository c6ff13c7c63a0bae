//! Packing glyph images into a font atlas

use bon::Builder;
use indexmap::IndexMap;
use rsc_texture::RgbaImage;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::position::MAX_POSITION;
use crate::resource::FontResource;
use crate::table::{GlyphRecord, GlyphTable, Kerning};

/// Widest atlas a glyph position can address
pub const MAX_ATLAS_WIDTH: u32 = 4096;

/// Largest glyph edge a bounding box can describe
pub const MAX_GLYPH_EDGE: u32 = u8::MAX as u32;

/// A glyph to be placed in the atlas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphImage {
    pub codepoint: u32,
    pub kerning: Kerning,
    pub image: RgbaImage,
}

/// Builds a font from individual glyph images
///
/// Glyphs are placed left to right in code point order, wrapping into a new row when
/// the atlas width is reached.
///
/// ```
/// # fn doit() -> rsc_font::error::Result<()>
/// # {
/// use rsc_font::{FontPacker, GlyphImage, Kerning};
/// use rsc_texture::RgbaImage;
///
/// let packer = FontPacker::builder().name("ui").atlas_width(64).build();
/// let font = packer.pack(&[GlyphImage {
///     codepoint: 'A' as u32,
///     kerning: Kerning::default(),
///     image: RgbaImage::new(8, 12),
/// }])?;
///
/// assert_eq!(font.table.glyphs.len(), 1);
/// assert_eq!(font.atlas.width, 64);
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Debug, Clone, Builder)]
pub struct FontPacker {
    /// Name of the font resource
    #[builder(into)]
    pub name: String,

    #[builder(default = 1024)]
    pub atlas_width: u32,

    #[builder(default)]
    pub unknown: u32,

    #[builder(default)]
    pub scale: u32,

    #[builder(default = GlyphTable::DEFAULT_BIT_COUNT)]
    pub bit_count: u32,

    /// Empty pixels between neighbouring glyphs
    #[builder(default = 1)]
    pub padding: u32,
}

impl FontPacker {
    /// Check every glyph, then lay out and compose the atlas.
    ///
    /// Nothing is produced unless every glyph fits.
    #[instrument(skip_all, fields(name = %self.name, glyphs = glyphs.len()), err)]
    pub fn pack(&self, glyphs: &[GlyphImage]) -> Result<FontResource> {
        if self.atlas_width == 0 || self.atlas_width > MAX_ATLAS_WIDTH {
            return Err(Error::InvalidAtlasWidth(self.atlas_width));
        }

        let mut by_codepoint = IndexMap::with_capacity(glyphs.len());
        for glyph in glyphs {
            let (width, height) = (glyph.image.width, glyph.image.height);
            if width > MAX_GLYPH_EDGE || height > MAX_GLYPH_EDGE {
                return Err(Error::GlyphTooLarge {
                    codepoint: glyph.codepoint,
                    width,
                    height,
                });
            }
            if glyph.codepoint >= self.bit_count {
                return Err(Error::CodepointOutOfRange {
                    codepoint: glyph.codepoint,
                    bit_count: self.bit_count,
                });
            }
            if by_codepoint.insert(glyph.codepoint, glyph).is_some() {
                return Err(Error::DuplicateGlyphIndex {
                    codepoint: glyph.codepoint,
                });
            }
        }
        by_codepoint.sort_keys();

        let mut records = Vec::with_capacity(by_codepoint.len());
        let (mut x, mut y, mut row_height) = (0u32, 0u32, 0u32);
        for (&codepoint, glyph) in &by_codepoint {
            let (width, height) = (glyph.image.width, glyph.image.height);
            if width > self.atlas_width {
                return Err(Error::AtlasOverflow { codepoint, x: 0, y });
            }
            if x + width > self.atlas_width {
                x = 0;
                y += row_height + self.padding;
                row_height = 0;
            }
            if x > u32::from(MAX_POSITION) || y > u32::from(MAX_POSITION) {
                return Err(Error::AtlasOverflow { codepoint, x, y });
            }

            records.push(GlyphRecord {
                codepoint,
                x: x as u16,
                y: y as u16,
                width: width as u8,
                height: height as u8,
                kerning: glyph.kerning,
            });
            x += width + self.padding;
            row_height = row_height.max(height);
        }

        let mut atlas = RgbaImage::new(self.atlas_width, (y + row_height).max(1));
        for (record, glyph) in records.iter().zip(by_codepoint.values()) {
            atlas.blit(&glyph.image, record.x.into(), record.y.into());
        }
        debug!(
            width = atlas.width,
            height = atlas.height,
            "composed font atlas"
        );

        Ok(FontResource {
            table: GlyphTable {
                name: self.name.clone(),
                unknown: self.unknown,
                bit_count: self.bit_count,
                scale: self.scale,
                glyphs: records,
            },
            atlas,
            atlas_warnings: Vec::new(),
        })
    }
}
