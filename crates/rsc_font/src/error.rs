//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent warpper for [`rsc_container::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    ContainerError(#[from] rsc_container::error::Error),

    /// Transparent warpper for [`rsc_texture::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    TextureError(#[from] rsc_texture::error::Error),

    /// The data does not start with the glyph table magic
    #[error("not a font resource")]
    #[diagnostic(code(rsc_font::not_a_font))]
    NotAFont,

    /// Glyph images are limited to 255x255 pixels
    #[error("glyph U+{codepoint:04X} is {width}x{height}, at most 255x255 is supported")]
    #[diagnostic(code(rsc_font::glyph_too_large))]
    GlyphTooLarge {
        codepoint: u32,
        width: u32,
        height: u32,
    },

    /// Two glyphs share a code point
    #[error("glyph U+{codepoint:04X} is defined more than once")]
    #[diagnostic(code(rsc_font::duplicate_glyph))]
    DuplicateGlyphIndex { codepoint: u32 },

    /// A code point beyond the presence bitmap
    #[error("glyph U+{codepoint:04X} is outside the {bit_count} code points of the font")]
    #[diagnostic(code(rsc_font::codepoint_out_of_range))]
    CodepointOutOfRange { codepoint: u32, bit_count: u32 },

    /// A glyph position which does not fit the 12 bit coordinates
    #[error("glyph U+{codepoint:04X} at ({x}, {y}) is outside the 4096x4096 atlas")]
    #[diagnostic(
        code(rsc_font::atlas_overflow),
        help("use a wider atlas or fewer glyphs")
    )]
    AtlasOverflow { codepoint: u32, x: u32, y: u32 },

    #[error("atlas width {0} must be between 1 and 4096")]
    InvalidAtlasWidth(u32),

    /// The font resource has no `TXMT` child holding its atlas
    #[error("font {0:?} has no atlas texture")]
    #[diagnostic(code(rsc_font::missing_atlas))]
    MissingAtlas(String),

    /// The glyph table violates its layout
    #[error("invalid glyph table at offset {offset:#x}: {reason}")]
    #[diagnostic(code(rsc_font::format))]
    Format { offset: u64, reason: String },
}

impl Error {
    pub(crate) fn format(offset: usize, reason: impl Into<String>) -> Self {
        Error::Format {
            offset: offset as u64,
            reason: reason.into(),
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
