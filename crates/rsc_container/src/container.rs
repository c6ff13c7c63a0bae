//! Loading and saving whole containers
//!

use std::path::Path;

use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::node::{BlockNode, Nodes, Payload, ResourceNode};
use crate::read::TreeReader;
use crate::store::{LoadOptions, Resolver, Store, Stores};
use crate::types::ContainerHeader;
use crate::write::TreeWriter;

/// An in memory container: the top level blocks with every external byte materialized
///
/// ```
/// # fn doit() -> rsc_container::error::Result<()>
/// # {
/// use rsc_container::{BlockNode, ContainerFile, LoadOptions, Payload, ResourceNode};
///
/// let mut container = ContainerFile::new();
/// container.push(BlockNode::new(Payload::Resource(ResourceNode::new("hello"))));
///
/// let stores = container.to_stores()?;
/// let loaded = ContainerFile::from_stores(&stores, LoadOptions::default())?;
/// assert_eq!(loaded.resource_names(), vec!["hello"]);
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerFile {
    pub nodes: Vec<BlockNode>,
}

impl ContainerFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the stores sharing `stem` and parse them
    #[instrument(skip_all, fields(stem = %stem.as_ref().display()), err)]
    pub fn load(stem: impl AsRef<Path>, options: LoadOptions) -> Result<Self> {
        let stores = Stores::read(stem)?;
        Self::from_stores(&stores, options)
    }

    /// Parse a container from store bytes already in memory
    pub fn from_stores(stores: &Stores, options: LoadOptions) -> Result<Self> {
        let structure = stores.get(Store::Structure).unwrap_or_default();
        let nodes = TreeReader::new(structure, Resolver::new(stores, options)).read_all()?;
        let container = ContainerFile { nodes };
        container.check_store_sizes(stores);
        debug!(blocks = container.iter().count(), "parsed container");
        Ok(container)
    }

    /// Serialize into store bytes, recomputing every length and pointer
    pub fn to_stores(&self) -> Result<Stores> {
        TreeWriter::new().write_all(&self.nodes)
    }

    /// Write the stores to files sharing `stem`
    #[instrument(skip_all, fields(stem = %stem.as_ref().display()), err)]
    pub fn save(&self, stem: impl AsRef<Path>) -> Result<()> {
        self.to_stores()?.write(stem)
    }

    pub fn push(&mut self, node: BlockNode) {
        self.nodes.push(node);
    }

    /// Depth first iteration over every block
    pub fn iter(&self) -> Nodes<'_> {
        Nodes::from_slice(&self.nodes)
    }

    /// The first `HEAD` block's payload
    pub fn header(&self) -> Option<&ContainerHeader> {
        self.iter().find_map(|node| match &node.payload {
            Payload::Header(header) => Some(header),
            _ => None,
        })
    }

    /// First name of every resource, in tree order
    pub fn resource_names(&self) -> Vec<&str> {
        self.iter()
            .filter_map(BlockNode::resource)
            .filter_map(ResourceNode::name)
            .collect()
    }

    /// The first block holding a resource called `name`
    pub fn find(&self, name: &str) -> Option<&BlockNode> {
        self.iter()
            .find(|node| node.resource().is_some_and(|r| r.has_name(name)))
    }

    /// The first block holding a resource called `name`, mutably
    pub fn find_mut(&mut self, name: &str) -> Option<&mut BlockNode> {
        fn search<'a>(nodes: &'a mut [BlockNode], name: &str) -> Option<&'a mut BlockNode> {
            for node in nodes {
                if node.resource().is_some_and(|r| r.has_name(name)) {
                    return Some(node);
                }
                if let Some(found) = search(&mut node.children, name) {
                    return Some(found);
                }
            }
            None
        }
        search(&mut self.nodes, name)
    }

    /// The resource called `name`
    pub fn find_resource(&self, name: &str) -> Result<&ResourceNode> {
        self.find(name)
            .and_then(BlockNode::resource)
            .ok_or_else(|| Error::ResourceMismatch(name.into()))
    }

    fn check_store_sizes(&self, stores: &Stores) {
        let Some(header) = self.header() else {
            return;
        };
        let actual = |store| stores.get(store).map_or(0, |d| d.len()) as u32;
        for (store, recorded) in [
            (Store::Index, header.index_size),
            (Store::Bulk, header.bulk_size),
        ] {
            if recorded != actual(store) {
                warn!(
                    %store,
                    recorded,
                    actual = actual(store),
                    "header store size does not match, it is recomputed on save"
                );
            }
        }
    }
}
