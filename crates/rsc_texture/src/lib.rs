//! This library converts **texture resources** of block tree containers to and from
//! RGBA8 rasters.
//!
//! # Texture Format Documentation
//!
//! A texture is a `TXMT` block (see [`rsc_container::TextureMeta`]) owning one `RSRC`
//! child. The texel data is the first resource-info entry of the child, unless the
//! texture uses a palette, in which case entry `palette_id` holds 256 B, G, R, A
//! quadruples and the texel data is the first of the remaining entries.
//!
//! ## Pixel Formats
//!
//! | Code   | Format     | Bytes per unit | Unit  |
//! |--------|------------|----------------|-------|
//! | 0x00   | `Argb8888` | 4              | texel |
//! | 0x01   | `Bgr565`   | 2              | texel |
//! | 0x02   | `Bgra5551` | 2              | texel |
//! | 0x03   | `Bgra4444` | 2              | texel |
//! | 0x04   | `Indexed8` | 1              | texel |
//! | 0x10   | `Bc1`      | 8              | 4x4   |
//! | 0x11   | `Bc2`      | 16             | 4x4   |
//! | 0x12   | `Bc3`      | 16             | 4x4   |
//! | 0x13   | `Bc4`      | 8              | 4x4   |
//! | 0x14   | `Bc5`      | 16             | 4x4   |
//!
//! Block compressed formats are decoded through a [`codec::BlockDecompressor`]. With
//! the default `bcdec` feature, [`Bcdec`] decompresses all five of them.
//!
//! ## Storage
//!
//! - **Power of two**: with header flag bit 0 set the texels are stored at the next
//!   power of two of both dimensions and cropped on decode
//! - **Swizzle**: modes 0, 2 and 6 store 8x8 unit tiles in Morton order, mode 1 stores
//!   rows linearly with a `scanline` byte stride. See [`swizzle`].
//!

#[cfg(feature = "bcdec")]
pub mod bcdec;
pub mod codec;
pub mod error;
pub mod format;
pub mod image;
pub mod node;
pub mod swizzle;

#[cfg(feature = "bcdec")]
pub use bcdec::Bcdec;
pub use codec::{decode, decode_with, encode, BlockDecompressor, DecodedTexture};
pub use error::TextureWarning;
pub use format::PixelFormat;
pub use image::{Palette, RgbaImage};
pub use node::{replace, texture_nodes, TextureNode};
