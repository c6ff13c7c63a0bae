//! In memory block tree.

use crate::error::{Error, Result};
use crate::types::{ContainerHeader, ResourceInfo, Tag, TextureMeta};

/// Interpreted payload of a block, selected by its tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Header(ContainerHeader),
    Texture(TextureMeta),
    Resource(ResourceNode),
    Terminator,
    /// Payload of an unrecognized tag, kept byte for byte
    Unknown(Vec<u8>),
}

impl Payload {
    /// The tag a structured payload is stored under
    pub fn tag(&self) -> Option<Tag> {
        match self {
            Payload::Header(_) => Some(Tag::HEADER),
            Payload::Texture(_) => Some(Tag::TEXTURE),
            Payload::Resource(_) => Some(Tag::RESOURCE),
            Payload::Terminator => Some(Tag::TERMINATOR),
            Payload::Unknown(_) => None,
        }
    }
}

/// A block and its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNode {
    pub tag: Tag,
    pub flags: u32,
    pub payload: Payload,
    pub children: Vec<BlockNode>,
}

impl BlockNode {
    /// Create a node for a structured payload
    ///
    /// # Panics
    ///
    /// Panics on [`Payload::Unknown`], which has no tag of its own. Use
    /// [`BlockNode::unknown`] instead.
    pub fn new(payload: Payload) -> Self {
        let tag = payload
            .tag()
            .expect("unknown payloads must be created with BlockNode::unknown");
        BlockNode {
            tag,
            flags: 0,
            payload,
            children: Vec::new(),
        }
    }

    /// Create a node carrying opaque bytes under an arbitrary tag
    pub fn unknown(tag: Tag, data: Vec<u8>) -> Self {
        BlockNode {
            tag,
            flags: 0,
            payload: Payload::Unknown(data),
            children: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_children(mut self, children: Vec<BlockNode>) -> Self {
        self.children = children;
        self
    }

    pub fn resource(&self) -> Option<&ResourceNode> {
        match &self.payload {
            Payload::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn resource_mut(&mut self) -> Option<&mut ResourceNode> {
        match &mut self.payload {
            Payload::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn texture(&self) -> Option<&TextureMeta> {
        match &self.payload {
            Payload::Texture(t) => Some(t),
            _ => None,
        }
    }

    /// Depth first iteration over this node and all of its descendants
    pub fn iter(&self) -> Nodes<'_> {
        Nodes { stack: vec![self] }
    }
}

/// Depth first, pre-order iterator over a block tree
pub struct Nodes<'a> {
    stack: Vec<&'a BlockNode>,
}

impl<'a> Nodes<'a> {
    pub(crate) fn from_slice(nodes: &'a [BlockNode]) -> Self {
        Nodes {
            stack: nodes.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a BlockNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Payload of an `RSRC` block
///
/// `infos` and `segments` are parallel lists; entry `i` is described by `infos[i]` and
/// its external data is `segments[i]`. The last `fallback_count` entries are fallback
/// entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceNode {
    /// Resource names, stored in the secondary-index store
    pub names: Vec<String>,

    /// Format specific records
    pub infos: Vec<ResourceInfo>,

    /// External data for each record, stored in the bulk store
    pub segments: Vec<Vec<u8>>,

    /// Number of trailing fallback entries
    pub fallback_count: u32,

    /// Pad the payload length to a multiple of 16 bytes
    pub adjust_size: bool,

    /// Inline resource data
    pub data: Vec<u8>,
}

/// A borrowed resource-info record and its external data
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceEntry<'a> {
    pub index: usize,
    pub info: &'a ResourceInfo,
    pub data: &'a [u8],
}

impl ResourceNode {
    pub fn new(name: impl Into<String>) -> Self {
        ResourceNode {
            names: vec![name.into()],
            ..Default::default()
        }
    }

    /// First name of the resource
    pub fn name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Append an entry, keeping `infos` and `segments` in step
    pub fn push_entry(&mut self, info: ResourceInfo, data: Vec<u8>) {
        self.infos.push(info);
        self.segments.push(data);
    }

    pub fn entries(&self) -> impl Iterator<Item = ResourceEntry<'_>> {
        self.infos
            .iter()
            .zip(&self.segments)
            .enumerate()
            .map(|(index, (info, data))| ResourceEntry { index, info, data })
    }

    pub fn entry(&self, index: usize) -> Option<ResourceEntry<'_>> {
        Some(ResourceEntry {
            index,
            info: self.infos.get(index)?,
            data: self.segments.get(index)?,
        })
    }

    /// Number of entries which are not fallback entries
    pub fn normal_count(&self) -> usize {
        self.infos.len().saturating_sub(self.fallback_count as usize)
    }

    /// Take entry `index` out of the entry list without modifying the node.
    ///
    /// Returns the entry and every other entry in their original order.
    pub fn split_entry(&self, index: usize) -> Option<(ResourceEntry<'_>, Vec<ResourceEntry<'_>>)> {
        let entry = self.entry(index)?;
        let rest = self.entries().filter(|e| e.index != index).collect();
        Some((entry, rest))
    }

    /// Check the invariants between the entry lists
    pub fn validate(&self) -> Result<()> {
        if self.infos.len() != self.segments.len() {
            return Err(Error::format(
                0,
                format!(
                    "resource has {} info records but {} segments",
                    self.infos.len(),
                    self.segments.len()
                ),
            ));
        }
        if self.fallback_count as usize > self.infos.len() {
            return Err(Error::format(
                0,
                format!(
                    "resource declares {} fallback entries but only has {}",
                    self.fallback_count,
                    self.infos.len()
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::node::{BlockNode, Payload, ResourceNode};
    use crate::types::{ContainerHeader, ResourceInfo, Tag, TextureMeta};

    fn resource_with_entries(count: u32) -> ResourceNode {
        let mut resource = ResourceNode::new("sample");
        for i in 0..count {
            resource.push_entry(ResourceInfo([i; 8]), vec![i as u8; 2]);
        }
        resource
    }

    #[test]
    fn split_entry_keeps_node() {
        let resource = resource_with_entries(3);
        let before = resource.clone();

        let (entry, rest) = resource.split_entry(1).unwrap();
        assert_eq!(entry.index, 1);
        assert_eq!(entry.data, &[1, 1]);
        assert_eq!(rest.iter().map(|e| e.index).collect::<Vec<_>>(), vec![0, 2]);

        assert_eq!(resource, before);
        assert!(resource.split_entry(3).is_none());
    }

    #[test]
    fn normal_and_fallback_counts() {
        let mut resource = resource_with_entries(3);
        resource.fallback_count = 1;
        assert_eq!(resource.normal_count(), 2);
        assert!(resource.validate().is_ok());

        resource.fallback_count = 4;
        assert!(resource.validate().is_err());
    }

    #[test]
    fn mismatched_segments() {
        let mut resource = resource_with_entries(2);
        resource.segments.pop();
        assert!(resource.validate().is_err());
    }

    #[test]
    fn depth_first_order() {
        let tree = BlockNode::new(Payload::Header(ContainerHeader::default())).with_children(vec![
            BlockNode::new(Payload::Texture(TextureMeta::default()))
                .with_children(vec![BlockNode::new(Payload::Resource(ResourceNode::new("a")))]),
            BlockNode::unknown(Tag(*b"MISC"), vec![1, 2]),
        ]);

        let tags = tree.iter().map(|n| n.tag).collect::<Vec<_>>();
        assert_eq!(
            tags,
            vec![Tag::HEADER, Tag::TEXTURE, Tag::RESOURCE, Tag(*b"MISC")]
        );
    }
}
