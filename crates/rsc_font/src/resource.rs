//! Fonts as container blocks: a glyph table resource with an atlas texture child

use rsc_container::{BlockNode, ContainerFile, Payload, ResourceNode};
use rsc_texture::{Bcdec, RgbaImage, TextureNode, TextureWarning};
use tracing::{instrument, warn};

use crate::error::{Error, Result};
use crate::table::{is_font, GlyphRecord, GlyphTable};

/// Color of the glyph outlines drawn by [`FontResource::debug_image`]
const OUTLINE: [u8; 4] = [0xFF, 0x00, 0xFF, 0xFF];

/// A glyph table and its decoded atlas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontResource {
    pub table: GlyphTable,
    pub atlas: RgbaImage,

    /// Noticed while decoding the atlas, empty for freshly packed fonts
    pub atlas_warnings: Vec<TextureWarning>,
}

/// Whether `node` is a resource block holding a glyph table
pub fn is_font_node(node: &BlockNode) -> bool {
    node.resource().is_some_and(|r| is_font(&r.data))
}

/// Every font block of a container, in tree order
pub fn fonts(container: &ContainerFile) -> impl Iterator<Item = &BlockNode> {
    container.iter().filter(|node| is_font_node(node))
}

impl FontResource {
    /// Name of the atlas texture of a font called `name`
    pub fn atlas_name(name: &str) -> String {
        format!("{name}.atlas")
    }

    /// Build the `RSRC` block holding the glyph table, with the atlas as a `TXMT` child
    pub fn into_node(self) -> Result<BlockNode> {
        let mut resource = ResourceNode::new(self.table.name.clone());
        resource.data = self.table.encode()?;

        let atlas = TextureNode::build(&Self::atlas_name(&self.table.name), &self.atlas)?;
        Ok(BlockNode::new(Payload::Resource(resource)).with_children(vec![atlas]))
    }

    /// Decode a font block and its atlas
    #[instrument(skip_all, fields(name = node.resource().and_then(ResourceNode::name)), err)]
    pub fn from_node(node: &BlockNode) -> Result<Self> {
        let resource = node.resource().ok_or(Error::NotAFont)?;
        let table = GlyphTable::decode(&resource.data)?;

        let texture = node
            .children
            .iter()
            .find_map(TextureNode::from_node)
            .ok_or_else(|| Error::MissingAtlas(table.name.clone()))?;
        let decoded = texture.decode_with(&Bcdec)?;
        if !decoded.warnings.is_empty() {
            warn!(
                warnings = decoded.warnings.len(),
                "font atlas decoded with warnings"
            );
        }

        Ok(FontResource {
            table,
            atlas: decoded.image,
            atlas_warnings: decoded.warnings,
        })
    }

    /// Every glyph with its image cropped out of the atlas
    pub fn glyph_images(&self) -> Vec<(GlyphRecord, RgbaImage)> {
        self.table
            .glyphs
            .iter()
            .map(|g| {
                let image = self.atlas.crop(
                    g.x.into(),
                    g.y.into(),
                    g.width.into(),
                    g.height.into(),
                );
                (*g, image)
            })
            .collect()
    }

    /// A copy of the atlas with every glyph's bounding box outlined
    pub fn debug_image(&self) -> RgbaImage {
        let mut image = self.atlas.clone();
        for glyph in &self.table.glyphs {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (left, top) = (u32::from(glyph.x), u32::from(glyph.y));
            let right = left + u32::from(glyph.width) - 1;
            let bottom = top + u32::from(glyph.height) - 1;
            for x in left..=right {
                image.set_pixel(x, top, OUTLINE);
                image.set_pixel(x, bottom, OUTLINE);
            }
            for y in top..=bottom {
                image.set_pixel(left, y, OUTLINE);
                image.set_pixel(right, y, OUTLINE);
            }
        }
        image
    }
}
