use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use rsc_container::{BlockNode, ContainerFile, ContainerHeader, Payload};
use rsc_font::{FontPacker, GlyphImage, GlyphTable, Kerning};
use rsc_texture::{RgbaImage, TextureNode};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::commands::extract::GLYPHS_FILE;
use crate::raster::read_png;
use crate::target::{self, container_of, InputKind, Inputs};

#[derive(Args)]
pub struct PackArgs {
    #[command(flatten)]
    inputs: Inputs,

    /// Width of the composed font atlases
    #[arg(long, value_name = "PIXELS", default_value_t = 1024)]
    atlas_width: u32,

    /// Delete each extracted directory once it has been packed
    #[arg(long, default_value_t = false)]
    delete_original: bool,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

/// Code point of a glyph file named `U+XXXX.png`
fn glyph_codepoint(path: &Path) -> Option<u32> {
    if !path.extension()?.eq_ignore_ascii_case("png") {
        return None;
    }
    let hex = path.file_stem()?.to_str()?.strip_prefix("U+")?;
    u32::from_str_radix(hex, 16).ok()
}

fn is_png(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

fn entries(directory: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
}

impl PackArgs {
    pub fn handle(&self) -> Result<()> {
        let inputs = self.inputs.resolve(InputKind::Extracted)?;
        target::run(&inputs, |path| {
            let summary = self.pack(path)?;
            if self.delete_original {
                target::remove_input(path, InputKind::Extracted)?;
            }
            Ok(summary)
        })
    }

    fn pack(&self, directory: &Path) -> Result<String> {
        let stem = container_of(directory)?;
        if stem.exists() && !self.overwrite {
            return Err(miette!(
                "{} already exists, pass --overwrite to replace it",
                stem.display()
            ));
        }

        let mut container = ContainerFile::new();
        container.push(BlockNode::new(Payload::Header(ContainerHeader {
            version: 1,
            ..Default::default()
        })));

        let (mut textures, mut fonts) = (0, 0);
        for entry in entries(directory) {
            let path = entry.path();
            if entry.file_type().is_dir() && path.join(GLYPHS_FILE).is_file() {
                container.push(self.pack_font(path)?);
                fonts += 1;
            } else if entry.file_type().is_file() && is_png(path) {
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .ok_or_else(|| miette!("unable to convert {} to a string", path.display()))?;
                debug!(name, "packing texture");
                let image = read_png(path)?;
                container.push(
                    TextureNode::build(name, &image)
                        .context(format!("path: {}", path.display()))?,
                );
                textures += 1;
            }
        }

        if textures + fonts == 0 {
            return Err(miette!("{} holds no textures or fonts", directory.display()));
        }

        info!("writing {}", stem.display());
        container
            .save(&stem)
            .context(format!("path: {}", stem.display()))?;
        Ok(format!("{textures} textures and {fonts} fonts into {}", stem.display()))
    }

    /// Build a font from `glyphs.json` and the `U+XXXX.png` files next to it.
    ///
    /// Glyphs listed without an image must be empty, images without an entry get no
    /// kerning.
    fn pack_font(&self, directory: &Path) -> Result<BlockNode> {
        let json = directory.join(GLYPHS_FILE);
        let file = File::open(&json)
            .into_diagnostic()
            .context(format!("path: {}", json.display()))?;
        let table: GlyphTable = serde_json::from_reader(BufReader::new(file))
            .into_diagnostic()
            .context(format!("parsing {}", json.display()))?;

        let mut images = BTreeMap::new();
        for entry in entries(directory) {
            if let Some(codepoint) = glyph_codepoint(entry.path()) {
                images.insert(codepoint, read_png(entry.path())?);
            }
        }

        let mut glyphs = Vec::with_capacity(table.glyphs.len().max(images.len()));
        for record in &table.glyphs {
            let image = match images.remove(&record.codepoint) {
                Some(image) => image,
                None if record.width == 0 || record.height == 0 => {
                    RgbaImage::new(record.width.into(), record.height.into())
                }
                None => {
                    return Err(miette!(
                        "glyph U+{:04X} of {} has no image",
                        record.codepoint,
                        json.display()
                    ))
                }
            };
            glyphs.push(GlyphImage {
                codepoint: record.codepoint,
                kerning: record.kerning,
                image,
            });
        }
        glyphs.extend(images.into_iter().map(|(codepoint, image)| GlyphImage {
            codepoint,
            kerning: Kerning::default(),
            image,
        }));

        info!("packing font {} with {} glyphs", table.name, glyphs.len());
        let font = FontPacker::builder()
            .name(table.name.clone())
            .atlas_width(self.atlas_width)
            .unknown(table.unknown)
            .scale(table.scale)
            .bit_count(table.bit_count)
            .build()
            .pack(&glyphs)
            .context(format!("path: {}", directory.display()))?;

        font.into_node()
            .context(format!("path: {}", directory.display()))
    }
}
