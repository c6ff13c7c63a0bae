//! This library reads and writes **bitmap fonts** stored in block tree containers.
//!
//! A font is an `RSRC` block whose inline data is a glyph table, with a `TXMT` child
//! holding the atlas every glyph is cut out of.
//!
//! # Glyph Table Format Documentation
//!
//! | Offset (bytes) | Field         | Description                                       |
//! |----------------|---------------|---------------------------------------------------|
//! | 0x0000         | Magic         | 4 bytes: `FNTG`                                   |
//! | 0x0004         | Unknown       | 4 bytes: preserved                                |
//! | 0x0008         | Bit count     | 4 bytes: code points covered by the bitmap        |
//! | 0x000C         | Name length   | 4 bytes: UTF-16 name length in bytes              |
//! | 0x0010         | Name          | 4 bytes: pointer to the name                      |
//! | 0x0014         | Glyph count   | 4 bytes                                           |
//! | 0x0018         | Boxes         | 4 bytes: pointer to the bounding box table        |
//! | 0x001C         | Bitmap        | 4 bytes: pointer to the presence bitmap (0x2C)    |
//! | 0x0020         | Index         | 4 bytes: pointer to the sparse index table        |
//! | 0x0024         | Scale         | 4 bytes: preserved                                |
//! | 0x0028         | Name list     | 4 bytes: pointer to four copies of the name pointer |
//!
//! ## Sections
//!
//! - **Presence bitmap**: one bit per code point, bit `c % 8` of byte `c / 8`. Padded to
//!   four bytes.
//! - **Index table**: one `u32` per occupied bucket, the bounding box row of the bucket's
//!   first glyph. Code point `c` falls into bucket `(c + 3) / 4`, later glyphs of a bucket
//!   use the rows following the first.
//! - **Bounding boxes**: 8 bytes per glyph in code point order: packed position (see
//!   [`position`]), width, height, then left, right and vertical kerning as `i8`.
//! - **Name**: UTF-16LE followed by a NUL code unit.
//!
//! ## Additional Information
//!
//! - **Endianness**: Little-endian for all multi-byte integers
//!

pub mod atlas;
pub mod error;
pub mod position;
pub mod resource;
pub mod table;

pub use atlas::{FontPacker, GlyphImage};
pub use position::{pack_position, unpack_position};
pub use resource::{fonts, is_font_node, FontResource};
pub use table::{is_font, GlyphRecord, GlyphTable, Kerning};
