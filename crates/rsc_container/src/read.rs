//! Types for parsing the block tree out of the structure store
//!

use std::io::Cursor;

use binrw::BinRead;
use tracing::{debug, trace, warn};
use winnow::binary::le_u32;
use winnow::combinator::seq;
use winnow::prelude::*;
use winnow::token::take;
use winnow::PResult;

use crate::error::{Error, Result};
use crate::node::{BlockNode, Payload, ResourceNode};
use crate::store::{Resolver, Store};
use crate::types::{
    BlockHeader, ContainerHeader, ResourceHeader, ResourceInfo, SegmentPointer, Tag, TextureMeta,
};

/// Nesting depth beyond which a structure store is rejected
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
struct RawBlock<'a> {
    tag: Tag,
    length: u32,
    flags: u32,
    payload: &'a [u8],
}

fn parse_block<'s>(s: &mut &'s [u8]) -> PResult<RawBlock<'s>> {
    seq!(RawBlock {
        tag: take(4usize).map(Tag::from_slice).verify(Tag::is_ascii),
        length: le_u32,
        flags: le_u32,
        payload: take(length),
    })
    .parse_next(s)
}

/// Depth first reader over the structure store
pub(crate) struct TreeReader<'a> {
    resolver: Resolver<'a>,
    data: &'a [u8],
    input: &'a [u8],
}

impl<'a> TreeReader<'a> {
    pub fn new(data: &'a [u8], resolver: Resolver<'a>) -> Self {
        TreeReader {
            resolver,
            data,
            input: data,
        }
    }

    fn offset(&self) -> u64 {
        (self.data.len() - self.input.len()) as u64
    }

    /// Read the whole top level, which must be followed by nothing but the terminator
    pub fn read_all(mut self) -> Result<Vec<BlockNode>> {
        let nodes = self.read_nodes(0)?;
        if !self.input.is_empty() {
            return Err(Error::format(
                self.offset(),
                format!("{} trailing bytes after top level terminator", self.input.len()),
            ));
        }
        Ok(nodes)
    }

    /// Read sibling blocks until the terminator closing the current level
    fn read_nodes(&mut self, depth: usize) -> Result<Vec<BlockNode>> {
        if depth > MAX_DEPTH {
            return Err(Error::format(
                self.offset(),
                format!("blocks nested deeper than {MAX_DEPTH} levels"),
            ));
        }

        let mut nodes = Vec::new();
        loop {
            let start = self.offset();
            if self.input.is_empty() {
                return Err(Error::format(start, "missing terminator block"));
            }

            let block = parse_block(&mut self.input).map_err(|_| {
                Error::format(
                    start,
                    "truncated block or tag with non-ASCII characters",
                )
            })?;
            trace!(tag = %block.tag, length = block.length, offset = start, "read block");

            let payload = self.dispatch(&block, start + BlockHeader::SIZE as u64)?;
            if payload == Payload::Terminator {
                break;
            }

            let children = self.read_nodes(depth + 1)?;
            nodes.push(BlockNode {
                tag: block.tag,
                flags: block.flags,
                payload,
                children,
            });
        }
        Ok(nodes)
    }

    fn dispatch(&self, block: &RawBlock<'a>, offset: u64) -> Result<Payload> {
        Ok(match block.tag {
            Tag::TERMINATOR => {
                if !block.payload.is_empty() {
                    warn!(offset, length = block.length, "terminator carries a payload, ignoring it");
                }
                Payload::Terminator
            }
            Tag::HEADER => Payload::Header(read_record::<ContainerHeader>(block.payload, offset)?),
            Tag::TEXTURE => Payload::Texture(read_record::<TextureMeta>(block.payload, offset)?),
            Tag::RESOURCE => Payload::Resource(self.read_resource(block.payload, offset)?),
            tag => {
                debug!(%tag, offset, "keeping unrecognized block as opaque data");
                Payload::Unknown(block.payload.to_vec())
            }
        })
    }

    fn read_resource(&self, payload: &[u8], offset: u64) -> Result<ResourceNode> {
        let mut cursor = Cursor::new(payload);
        let header = ResourceHeader::read(&mut cursor).map_err(|e| binrw_error(e, offset))?;

        let info_count = header.info_count as usize;
        let table_end = ResourceHeader::SIZE
            + info_count * (ResourceInfo::SIZE + SegmentPointer::SIZE)
            + header.data_length as usize;
        if table_end > payload.len() {
            return Err(Error::format(
                offset,
                format!(
                    "resource declares {info_count} entries and {:#x} data bytes but payload is {:#x} bytes",
                    header.data_length,
                    payload.len()
                ),
            ));
        }
        if header.fallback_count > header.info_count {
            return Err(Error::format(
                offset,
                format!(
                    "resource declares {} fallback entries but only has {info_count}",
                    header.fallback_count
                ),
            ));
        }

        let infos = (0..info_count)
            .map(|_| ResourceInfo::read(&mut cursor))
            .collect::<binrw::BinResult<Vec<_>>>()
            .map_err(|e| binrw_error(e, offset))?;
        let pointers = (0..info_count)
            .map(|_| SegmentPointer::read(&mut cursor))
            .collect::<binrw::BinResult<Vec<_>>>()
            .map_err(|e| binrw_error(e, offset))?;

        let data_start = cursor.position() as usize;
        let data = payload[data_start..data_start + header.data_length as usize].to_vec();

        let trailing = payload.len() - table_end;
        let adjust_size = header.adjust_size != 0;
        if (adjust_size && trailing >= 16) || (!adjust_size && trailing != 0) {
            return Err(Error::format(
                offset + table_end as u64,
                format!("{trailing} unexpected bytes after resource data"),
            ));
        }

        let names = self
            .resolver
            .strings(Store::Index, header.names_offset, header.name_count)?;
        let segments = pointers
            .iter()
            .map(|p| {
                self.resolver
                    .resolve(Store::Bulk, p.offset, p.length)
                    .map(<[u8]>::to_vec)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ResourceNode {
            names,
            infos,
            segments,
            fallback_count: header.fallback_count,
            adjust_size,
            data,
        })
    }
}

/// Read a fixed size record which must span the whole payload
fn read_record<T>(payload: &[u8], offset: u64) -> Result<T>
where
    T: for<'b> BinRead<Args<'b> = ()>,
{
    let mut cursor = Cursor::new(payload);
    let record = T::read_options(&mut cursor, binrw::Endian::Little, ())
        .map_err(|e| binrw_error(e, offset))?;
    if cursor.position() as usize != payload.len() {
        return Err(Error::format(
            offset,
            format!(
                "payload is {:#x} bytes, record uses {:#x}",
                payload.len(),
                cursor.position()
            ),
        ));
    }
    Ok(record)
}

fn binrw_error(error: binrw::Error, offset: u64) -> Error {
    Error::format(offset, error.to_string())
}
