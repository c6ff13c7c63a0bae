//! Base types for the fixed size records of a container.

use std::fmt;

use binrw::{BinRead, BinWrite};

/// Four character block identifier
#[derive(BinRead, BinWrite, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[brw(little)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    /// Container header block
    pub const HEADER: Tag = Tag(*b"HEAD");
    /// Texture metadata block
    pub const TEXTURE: Tag = Tag(*b"TXMT");
    /// Resource block
    pub const RESOURCE: Tag = Tag(*b"RSRC");
    /// Closes a child list
    pub const TERMINATOR: Tag = Tag(*b"END\0");

    /// Build a tag from the first four bytes of `bytes`
    pub(crate) fn from_slice(bytes: &[u8]) -> Tag {
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&bytes[..4]);
        Tag(tag)
    }

    /// Whether all four characters are ASCII
    pub fn is_ascii(&self) -> bool {
        self.0.is_ascii()
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for Tag {
    fn from(value: [u8; 4]) -> Self {
        Tag(value)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag(\"{}\")", self)
    }
}

/// Header preceding every block in the structure store
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct BlockHeader {
    /// Block type
    pub tag: Tag,

    /// Length of this block's own payload, children are not included
    pub length: u32,

    /// Unknown purpose, kept as is
    pub flags: u32,
}

impl BlockHeader {
    pub const SIZE: usize = 12;
}

/// Payload of the `HEAD` block
///
/// The store sizes are recomputed each time the container is saved.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct ContainerHeader {
    /// Format version, not interpreted
    pub version: u32,

    /// Unknown purpose
    pub unknown: u32,

    /// Size in bytes of the secondary-index store
    pub index_size: u32,

    /// Size in bytes of the bulk store
    pub bulk_size: u32,
}

impl ContainerHeader {
    pub const SIZE: usize = 16;
}

/// Payload of the `TXMT` block
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct TextureMeta {
    /// Pixel format code
    pub format: u32,

    /// Display width in texels
    pub width: u16,

    /// Display height in texels
    pub height: u16,

    /// Nonzero when the texels index into a palette
    pub palette: u8,

    /// Tiling mode of the stored texels
    pub swizzle: u8,

    /// Bit 0 is set when storage dimensions are rounded up to powers of two
    pub flags: u16,

    /// Resource-info entry holding the palette
    pub palette_id: u32,

    /// Stored bytes per row for linear texel data
    pub scanline: u32,

    /// Unknown purpose
    pub unknown: [u32; 3],
}

impl TextureMeta {
    pub const SIZE: usize = 32;

    /// Storage dimensions are rounded up to the next power of two
    pub const FLAG_POW2: u16 = 0x0001;

    pub fn has_palette(&self) -> bool {
        self.palette != 0
    }

    pub fn is_pow2(&self) -> bool {
        self.flags & Self::FLAG_POW2 != 0
    }
}

/// A single 32 byte resource-info record
///
/// The meaning of the eight values depends on the resource kind, they are carried
/// through untouched.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[brw(little)]
pub struct ResourceInfo(pub [u32; 8]);

impl ResourceInfo {
    pub const SIZE: usize = 32;
}

/// Fixed leading fields of an `RSRC` payload
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub(crate) struct ResourceHeader {
    pub name_count: u32,
    pub names_offset: u32,
    pub info_count: u32,
    pub fallback_count: u32,
    pub adjust_size: u32,
    pub data_length: u32,
}

impl ResourceHeader {
    pub const SIZE: usize = 24;
}

/// Location of an external segment in the bulk store
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub(crate) struct SegmentPointer {
    pub offset: u32,
    pub length: u32,
}

impl SegmentPointer {
    pub const SIZE: usize = 8;
}
