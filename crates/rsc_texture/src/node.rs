//! Texture blocks inside a container

use rsc_container::{BlockNode, ContainerFile, Payload, ResourceNode, Tag, TextureMeta};
use tracing::debug;

use crate::codec::{self, BlockDecompressor, DecodedTexture};
use crate::error::{Error, Result};
use crate::image::RgbaImage;

/// A `TXMT` block and the resource holding its texel data
#[derive(Debug, Copy, Clone)]
pub struct TextureNode<'a> {
    pub node: &'a BlockNode,
    pub meta: &'a TextureMeta,
    pub resource: &'a ResourceNode,
}

impl<'a> TextureNode<'a> {
    /// View `node` as a texture, `None` unless it is a `TXMT` block with an `RSRC` child
    pub fn from_node(node: &'a BlockNode) -> Option<Self> {
        let meta = node.texture()?;
        let resource = node.children.iter().find_map(BlockNode::resource)?;
        Some(TextureNode {
            node,
            meta,
            resource,
        })
    }

    /// Build a `TXMT` block with its `RSRC` child holding `image`
    pub fn build(name: &str, image: &RgbaImage) -> Result<BlockNode> {
        let (meta, resource) = codec::encode(image, name)?;
        Ok(BlockNode::new(Payload::Texture(meta))
            .with_children(vec![BlockNode::new(Payload::Resource(resource))]))
    }

    pub fn name(&self) -> Option<&'a str> {
        self.resource.name()
    }

    pub fn decode(&self) -> Result<DecodedTexture> {
        codec::decode(self.meta, self.resource)
    }

    pub fn decode_with(&self, decompressor: &dyn BlockDecompressor) -> Result<DecodedTexture> {
        codec::decode_with(self.meta, self.resource, Some(decompressor))
    }
}

/// Every texture in a container, in tree order
pub fn texture_nodes(container: &ContainerFile) -> impl Iterator<Item = TextureNode<'_>> {
    container.iter().filter_map(TextureNode::from_node)
}

fn is_texture_named(node: &BlockNode, name: &str) -> bool {
    TextureNode::from_node(node).is_some_and(|t| t.resource.has_name(name))
}

fn find_texture_mut<'a>(nodes: &'a mut [BlockNode], name: &str) -> Option<&'a mut BlockNode> {
    for node in nodes {
        if is_texture_named(node, name) {
            return Some(node);
        }
        if let Some(found) = find_texture_mut(&mut node.children, name) {
            return Some(found);
        }
    }
    None
}

/// Replace the texture called `name` with `image`
///
/// The block flags, every resource name and the unknown header fields are kept, the
/// texel data is re-encoded as linear `Argb8888`.
pub fn replace(container: &mut ContainerFile, name: &str, image: &RgbaImage) -> Result<()> {
    let node = find_texture_mut(&mut container.nodes, name)
        .ok_or_else(|| rsc_container::error::Error::ResourceMismatch(name.into()))?;

    let (mut meta, mut resource) = codec::encode(image, name)?;
    if let Payload::Texture(old) = &node.payload {
        meta.unknown = old.unknown;
    }
    node.payload = Payload::Texture(meta);

    let child = node
        .children
        .iter_mut()
        .find(|child| child.tag == Tag::RESOURCE)
        .ok_or_else(|| Error::Format(format!("texture {name:?} lost its resource block")))?;
    if let Some(old) = child.resource() {
        resource.names = old.names.clone();
    }
    child.payload = Payload::Resource(resource);

    debug!(name, width = image.width, height = image.height, "replaced texture");
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rsc_container::{BlockNode, ContainerFile, LoadOptions, Payload, Tag};

    use crate::error::{Error, Result};
    use crate::image::RgbaImage;
    use crate::node::{replace, texture_nodes, TextureNode};

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_raw(width, height, rgba.repeat((width * height) as usize)).unwrap()
    }

    #[test]
    fn build_and_discover() -> Result<()> {
        let mut container = ContainerFile::new();
        container.push(TextureNode::build("red", &solid(2, 2, [0xFF, 0, 0, 0xFF]))?);
        container.push(
            BlockNode::unknown(Tag(*b"MISC"), vec![])
                .with_children(vec![TextureNode::build("blue", &solid(1, 3, [0, 0, 0xFF, 0xFF]))?]),
        );

        let stores = container.to_stores()?;
        let loaded = ContainerFile::from_stores(&stores, LoadOptions::default())?;

        let names = texture_nodes(&loaded)
            .map(|t| t.name().unwrap_or_default().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["red", "blue"]);

        let blue = texture_nodes(&loaded).nth(1).unwrap().decode()?;
        assert_eq!(blue.image, solid(1, 3, [0, 0, 0xFF, 0xFF]));

        Ok(())
    }

    #[test]
    fn replace_keeps_flags_and_names() -> Result<()> {
        let mut texture = TextureNode::build("icon", &solid(1, 1, [1, 2, 3, 4]))?.with_flags(0x44);
        if let Payload::Texture(meta) = &mut texture.payload {
            meta.unknown = [7, 8, 9];
        }
        texture.children[0].resource_mut().unwrap().names.push("icon_alt".into());
        let mut container = ContainerFile {
            nodes: vec![texture],
        };

        replace(&mut container, "icon", &solid(3, 2, [9, 9, 9, 9]))?;

        let texture = TextureNode::from_node(&container.nodes[0]).unwrap();
        assert_eq!(texture.node.flags, 0x44);
        assert_eq!((texture.meta.width, texture.meta.height), (3, 2));
        assert_eq!(texture.meta.unknown, [7, 8, 9]);
        assert_eq!(texture.resource.names, vec!["icon", "icon_alt"]);
        assert_eq!(texture.decode()?.image, solid(3, 2, [9, 9, 9, 9]));

        Ok(())
    }

    #[test]
    fn replace_missing() {
        let mut container = ContainerFile::new();
        let result = replace(&mut container, "ghost", &solid(1, 1, [0; 4]));

        assert!(matches!(
            result,
            Err(Error::ContainerError(rsc_container::error::Error::ResourceMismatch(_)))
        ));
    }
}
