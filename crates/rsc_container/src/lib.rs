//! This library handles reading from and creating block tree **resource containers**.
//!
//! # Container Format Documentation
//!
//! A container is a tree of tagged blocks. One container is spread over up to three
//! files sharing a path stem:
//!
//! | File       | Store            | Required | Contents                                    |
//! |------------|------------------|----------|---------------------------------------------|
//! | `<stem>`   | structure        | yes      | the block tree itself                       |
//! | `<stem>i`  | secondary-index  | no       | NUL terminated resource names               |
//! | `<stem>v`  | bulk             | no       | large external payloads (pixel data, ...)   |
//!
//! ## Block Structure
//!
//! Every block starts with a 12 byte header followed by its own payload, then its
//! children back to back, then a terminator block closing the child list. The top level
//! of the structure store is also closed by a terminator.
//!
//! | Offset (bytes) | Field   | Description                                            |
//! |----------------|---------|--------------------------------------------------------|
//! | 0x0000         | Tag     | 4 bytes: ASCII block type                              |
//! | 0x0004         | Length  | 4 bytes: payload length, excluding nested children     |
//! | 0x0008         | Flags   | 4 bytes: preserved verbatim                            |
//! | 0x000C         | Payload | (Length) bytes                                         |
//!
//! ### Block Types
//!
//! - **`HEAD`**: container header, records the sizes of the secondary-index and bulk
//!   stores. See [`types::ContainerHeader`].
//! - **`TXMT`**: texture metadata. Always owns a single `RSRC` child holding the texel
//!   data. See [`types::TextureMeta`].
//! - **`RSRC`**: resource node with a name list, 32 byte resource-info records, pointers
//!   to segments of the bulk store and an inline data blob. See [`node::ResourceNode`].
//! - **`END\0`**: terminator, zero length.
//!
//! Any other tag is kept as an opaque payload so unknown blocks survive a round trip.
//!
//! ## Additional Information
//!
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Pointers**: offsets into the secondary-index and bulk stores are recomputed on save
//!

pub mod container;
pub mod error;
pub mod node;
pub mod patch;
pub mod read;
pub mod store;
pub mod types;
pub mod write;

pub use container::ContainerFile;
pub use node::{BlockNode, Payload, ResourceEntry, ResourceNode};
pub use store::{LoadOptions, Store, Stores};
pub use types::{ContainerHeader, ResourceInfo, Tag, TextureMeta};
