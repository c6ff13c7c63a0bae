use std::path::Path;

use miette::{Context, Result};
use rsc_container::{ContainerFile, LoadOptions};

pub mod extract;
pub mod name;
pub mod pack;
pub mod replace;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Extract the textures and fonts of containers into directories
    Extract(extract::ExtractArgs),
    /// Pack extracted directories into new containers
    ///
    /// Each container is rebuilt from scratch with a version 1 header. Block order,
    /// unrecognized blocks, block flags and unknown texture header bytes of the original
    /// are not kept. Use `replace` to change textures in place.
    Pack(pack::PackArgs),
    /// Replace a named texture of containers with a PNG
    Replace(replace::ReplaceArgs),
    /// List the resource names of containers
    Name(name::NameArgs),
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Extract(extract) => extract.handle(),
            Commands::Pack(pack) => pack.handle(),
            Commands::Replace(replace) => replace.handle(),
            Commands::Name(name) => name.handle(),
        }
    }
}

fn load(path: &Path, strict: bool) -> Result<ContainerFile> {
    ContainerFile::load(path, LoadOptions::builder().strict(strict).build())
        .context(format!("path: {}", path.display()))
}
