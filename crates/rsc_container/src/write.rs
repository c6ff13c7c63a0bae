//! Types for serializing a block tree into its stores
//!

use std::io::{Cursor, Write};

use binrw::BinWrite;
use byteorder::{LittleEndian, WriteBytesExt};
use tracing::trace;

use crate::error::{Error, Result};
use crate::node::{BlockNode, Payload, ResourceNode};
use crate::patch::PatchSite;
use crate::store::{Store, StoreWriter, Stores};
use crate::types::{BlockHeader, ContainerHeader, Tag};

const RESOURCE_ALIGNMENT: usize = 16;

/// Store sizes recorded in a `HEAD` block, filled in once every store is complete
struct HeaderSites {
    index_size: PatchSite,
    bulk_size: PatchSite,
}

/// Depth first writer producing the three stores of a container
#[derive(Default)]
pub(crate) struct TreeWriter {
    stores: StoreWriter,
    headers: Vec<HeaderSites>,
}

impl TreeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the top level nodes followed by the closing terminator and resolve every
    /// deferred field
    pub fn write_all(mut self, nodes: &[BlockNode]) -> Result<Stores> {
        self.write_nodes(nodes)?;

        let index_size = self.stores.len(Store::Index)?;
        let bulk_size = self.stores.len(Store::Bulk)?;
        for sites in &self.headers {
            self.stores.structure.resolve(sites.index_size, index_size);
            self.stores.structure.resolve(sites.bulk_size, bulk_size);
        }

        self.stores.finish()
    }

    fn write_nodes(&mut self, nodes: &[BlockNode]) -> Result<()> {
        for node in nodes {
            self.write_node(node)?;
        }
        self.write_terminator()
    }

    fn write_terminator(&mut self) -> Result<()> {
        let mut buf = Vec::with_capacity(BlockHeader::SIZE);
        BlockHeader {
            tag: Tag::TERMINATOR,
            length: 0,
            flags: 0,
        }
        .write(&mut Cursor::new(&mut buf))?;
        self.stores.structure.write_all(&buf)?;
        Ok(())
    }

    fn write_node(&mut self, node: &BlockNode) -> Result<()> {
        let offset = self.stores.structure.len() as u64;
        match node.payload.tag() {
            Some(Tag::TERMINATOR) => {
                return Err(Error::format(
                    offset,
                    "terminator blocks are implicit and cannot appear in a child list",
                ))
            }
            Some(tag) if tag != node.tag => {
                return Err(Error::format(
                    offset,
                    format!("block tagged {} carries a {} payload", node.tag, tag),
                ))
            }
            None if [Tag::HEADER, Tag::TEXTURE, Tag::RESOURCE, Tag::TERMINATOR]
                .contains(&node.tag) =>
            {
                return Err(Error::format(
                    offset,
                    format!("block tagged {} carries opaque data", node.tag),
                ))
            }
            _ if !node.tag.is_ascii() => {
                return Err(Error::format(
                    offset,
                    format!("tag {} is not ASCII", node.tag),
                ))
            }
            _ => {}
        }

        let structure = &mut self.stores.structure;
        structure.write_all(node.tag.as_bytes())?;
        let length = structure.reserve_u32("block length");
        structure.write_u32::<LittleEndian>(node.flags)?;

        let start = structure.len();
        self.write_payload(&node.payload, offset)?;
        let payload_length = self.stores.structure.len() - start;
        let payload_length =
            u32::try_from(payload_length).map_err(|_| Error::StoreOverflow(Store::Structure))?;
        self.stores.structure.resolve(length, payload_length);
        trace!(tag = %node.tag, offset, length = payload_length, "wrote block");

        self.write_nodes(&node.children)
    }

    fn write_payload(&mut self, payload: &Payload, offset: u64) -> Result<()> {
        match payload {
            Payload::Header(header) => self.write_header(header)?,
            Payload::Texture(meta) => {
                let mut buf = Vec::new();
                meta.write(&mut Cursor::new(&mut buf))?;
                self.stores.structure.write_all(&buf)?;
            }
            Payload::Resource(resource) => self.write_resource(resource, offset)?,
            Payload::Unknown(data) => self.stores.structure.write_all(data)?,
            Payload::Terminator => {}
        }
        Ok(())
    }

    fn write_header(&mut self, header: &ContainerHeader) -> Result<()> {
        let structure = &mut self.stores.structure;
        structure.write_u32::<LittleEndian>(header.version)?;
        structure.write_u32::<LittleEndian>(header.unknown)?;
        let index_size = structure.reserve_u32("index store size");
        let bulk_size = structure.reserve_u32("bulk store size");
        self.headers.push(HeaderSites {
            index_size,
            bulk_size,
        });
        Ok(())
    }

    fn write_resource(&mut self, resource: &ResourceNode, offset: u64) -> Result<()> {
        resource.validate().map_err(|e| match e {
            Error::Format { reason, .. } => Error::format(offset, reason),
            e => e,
        })?;

        let names_offset = if resource.names.is_empty() {
            0
        } else {
            let mut joined = Vec::new();
            for name in &resource.names {
                if name.as_bytes().contains(&0) {
                    return Err(Error::format(
                        offset,
                        format!("resource name {name:?} contains a NUL byte"),
                    ));
                }
                joined.extend_from_slice(name.as_bytes());
                joined.push(0);
            }
            self.stores.allocate(Store::Index, &joined)?
        };

        let mut pointers = Vec::with_capacity(resource.segments.len());
        for segment in &resource.segments {
            if segment.is_empty() {
                pointers.push((0, 0));
                continue;
            }
            let length =
                u32::try_from(segment.len()).map_err(|_| Error::StoreOverflow(Store::Bulk))?;
            pointers.push((self.stores.allocate(Store::Bulk, segment)?, length));
        }

        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(resource.names.len() as u32)?;
        buf.write_u32::<LittleEndian>(names_offset)?;
        buf.write_u32::<LittleEndian>(resource.infos.len() as u32)?;
        buf.write_u32::<LittleEndian>(resource.fallback_count)?;
        buf.write_u32::<LittleEndian>(resource.adjust_size as u32)?;
        buf.write_u32::<LittleEndian>(
            u32::try_from(resource.data.len()).map_err(|_| Error::StoreOverflow(Store::Structure))?,
        )?;
        {
            let mut cursor = Cursor::new(&mut buf);
            cursor.set_position(cursor.get_ref().len() as u64);
            for info in &resource.infos {
                info.write(&mut cursor)?;
            }
        }
        for (segment_offset, segment_length) in pointers {
            buf.write_u32::<LittleEndian>(segment_offset)?;
            buf.write_u32::<LittleEndian>(segment_length)?;
        }
        buf.extend_from_slice(&resource.data);
        if resource.adjust_size {
            let padded = buf.len().next_multiple_of(RESOURCE_ALIGNMENT);
            buf.resize(padded, 0);
        }

        self.stores.structure.write_all(&buf)?;
        Ok(())
    }
}
