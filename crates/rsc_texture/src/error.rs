//! Error and warning types that can be emitted from this library

use derive_more::derive::Display;
use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`rsc_container::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    ContainerError(#[from] rsc_container::error::Error),

    /// Dimensions which cannot be stored in a texture header or decoded in memory
    #[error("texture of {width}x{height} texels is too large")]
    #[diagnostic(code(rsc_texture::dimensions_too_large))]
    DimensionsTooLarge { width: u32, height: u32 },

    /// A raster whose pixel buffer does not match its dimensions
    #[error("pixel buffer is {actual} bytes, {expected} expected")]
    BufferSize { expected: usize, actual: usize },

    /// The block is not a texture with a resource child
    #[error("{0}")]
    #[diagnostic(code(rsc_texture::format))]
    Format(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;

/// Anomalies tolerated while decoding a texture
///
/// Decoding never aborts on these, a best effort raster is returned alongside them.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum TextureWarning {
    #[display("unsupported pixel format {_0:#x}, returning a blank raster")]
    UnsupportedPixelFormat(u32),

    #[display("unsupported swizzle mode {_0}, using texel data as stored")]
    UnsupportedSwizzleMode(u8),

    #[display("pixel data is {actual:#x} bytes but {expected:#x} are needed, padding with zeros")]
    ShortPixelData { expected: usize, actual: usize },

    #[display("palette holds {_0} entries, filling the rest with transparent black")]
    ShortPalette(usize),

    #[display("palette entry {_0} does not exist")]
    MissingPalette(u32),

    #[display("texture has no pixel data")]
    MissingPixelData,
}
