use std::collections::HashSet;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

use clap::Args;
use itertools::Itertools;
use miette::{miette, Context, IntoDiagnostic, Result};
use rsc_container::{BlockNode, ContainerFile, ResourceNode};
use rsc_font::{fonts, FontResource};
use rsc_texture::{texture_nodes, Bcdec, TextureNode};
use tracing::{error, info, warn};

use crate::commands::load;
use crate::raster::{create, write_png};
use crate::target::{self, extracted_dir, InputKind, Inputs};

/// Glyph metrics and font parameters inside a font's directory
pub const GLYPHS_FILE: &str = "glyphs.json";

/// Atlas with outlined glyphs inside a font's directory
pub const DEBUG_FILE: &str = "debug.png";

#[derive(Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    inputs: Inputs,

    /// Also write each font's atlas with every glyph outlined
    #[arg(long, default_value_t = false)]
    debug_image: bool,

    /// Fail when a referenced secondary store is missing
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Delete each container once it has been extracted
    #[arg(long, default_value_t = false)]
    delete_original: bool,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

/// File name of the PNG holding glyph `codepoint`
pub fn glyph_file(codepoint: u32) -> String {
    format!("U+{codepoint:04X}.png")
}

/// A resource name usable as a single path component
fn file_stem(name: &str) -> Result<&str> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(miette!("resource name {name:?} is not a valid file name"));
    }
    Ok(name)
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let inputs = self.inputs.resolve(InputKind::Container)?;
        target::run(&inputs, |path| {
            let summary = self.extract(path)?;
            if self.delete_original {
                target::remove_input(path, InputKind::Container)?;
            }
            Ok(summary)
        })
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let container = load(path, self.strict)?;

        let directory = extracted_dir(path)?;
        if directory.exists() && !self.overwrite {
            return Err(miette!(
                "{} already exists, pass --overwrite to replace its contents",
                directory.display()
            ));
        }
        fs::create_dir_all(&directory)
            .into_diagnostic()
            .context(format!("creating {}", directory.display()))?;

        let Extracted {
            count,
            warnings,
            failures,
        } = self.extract_all(&container, &directory);
        if !failures.is_empty() {
            for (name, report) in &failures {
                error!(resource = %name, "{report:?}");
            }
            return Err(miette!(
                "{} of {count} resources failed:\n{}",
                failures.len(),
                failures
                    .iter()
                    .map(|(name, report)| format!("{name}: {report}"))
                    .join("\n")
            ));
        }

        let mut summary = format!("{count} resources into {}", directory.display());
        if warnings > 0 {
            summary.push_str(&format!("\n{warnings} decode warnings, see the log"));
        }
        Ok(summary)
    }

    /// Extract every font and every texture which is not a font atlas
    fn extract_all(&self, container: &ContainerFile, directory: &Path) -> Extracted {
        let mut extracted = Extracted::default();

        let mut atlases = HashSet::new();
        for (i, node) in fonts(container).enumerate() {
            let name = resource_name(node, "font", i);
            atlases.insert(FontResource::atlas_name(&name));
            let outcome = self.extract_font(node, &name, directory);
            extracted.record(name, outcome);
        }

        for (i, texture) in texture_nodes(container).enumerate() {
            let name = texture
                .name()
                .map_or_else(|| format!("texture_{i}"), String::from);
            if atlases.contains(&name) {
                continue;
            }
            let outcome = self.extract_texture(&texture, &name, directory);
            extracted.record(name, outcome);
        }

        extracted
    }

    /// Write one texture, returning the number of decode warnings
    fn extract_texture(&self, texture: &TextureNode<'_>, name: &str, directory: &Path) -> Result<usize> {
        let path = directory.join(format!("{}.png", file_stem(name)?));
        let decoded = texture.decode_with(&Bcdec)?;

        info!("writing {}", path.display());
        write_png(&path, &decoded.image, self.overwrite)?;
        Ok(decoded.warnings.len())
    }

    /// Write one font's glyphs and table, returning the number of atlas decode warnings
    fn extract_font(&self, node: &BlockNode, name: &str, directory: &Path) -> Result<usize> {
        let font = FontResource::from_node(node)?;
        let font_dir = directory.join(file_stem(name)?);
        fs::create_dir_all(&font_dir)
            .into_diagnostic()
            .context(format!("creating {}", font_dir.display()))?;

        for (record, image) in font.glyph_images() {
            if record.width == 0 || record.height == 0 {
                continue;
            }
            write_png(&font_dir.join(glyph_file(record.codepoint)), &image, self.overwrite)?;
        }

        let glyphs = font_dir.join(GLYPHS_FILE);
        info!("writing {}", glyphs.display());
        serde_json::to_writer_pretty(BufWriter::new(create(&glyphs, self.overwrite)?), &font.table)
            .into_diagnostic()
            .context(format!("writing {}", glyphs.display()))?;

        if self.debug_image {
            write_png(&font_dir.join(DEBUG_FILE), &font.debug_image(), self.overwrite)?;
        }
        Ok(font.atlas_warnings.len())
    }
}

/// Tally of one container's extraction
#[derive(Default)]
struct Extracted {
    count: usize,
    warnings: usize,
    failures: Vec<(String, miette::Report)>,
}

impl Extracted {
    fn record(&mut self, name: String, outcome: Result<usize>) {
        self.count += 1;
        match outcome {
            Ok(0) => {}
            Ok(warnings) => {
                warn!(resource = %name, warnings, "decoded with warnings");
                self.warnings += warnings;
            }
            Err(report) => self.failures.push((name, report)),
        }
    }
}

fn resource_name(node: &BlockNode, kind: &str, index: usize) -> String {
    node.resource()
        .and_then(ResourceNode::name)
        .map_or_else(|| format!("{kind}_{index}"), String::from)
}
