use std::path::PathBuf;

use clap::Args;
use miette::{Context, Result};
use tracing::info;

use crate::commands::load;
use crate::raster::read_png;
use crate::target::{self, InputKind, Inputs};

#[derive(Args)]
pub struct ReplaceArgs {
    #[command(flatten)]
    inputs: Inputs,

    /// Name of the texture resource to replace
    #[arg(short, long, value_name = "NAME")]
    resource: String,

    /// The replacement PNG
    #[arg(short, long, value_name = "FILE")]
    image: PathBuf,

    /// Fail when a referenced secondary store is missing
    #[arg(long, default_value_t = false)]
    strict: bool,
}

impl ReplaceArgs {
    pub fn handle(&self) -> Result<()> {
        let image = read_png(&self.image)?;
        let inputs = self.inputs.resolve(InputKind::Container)?;

        target::run(&inputs, |path| {
            let mut container = load(path, self.strict)?;
            rsc_texture::replace(&mut container, &self.resource, &image)
                .context(format!("path: {}", path.display()))?;

            info!("writing {}", path.display());
            container
                .save(path)
                .context(format!("path: {}", path.display()))?;
            Ok(format!(
                "replaced {} with {}x{} pixels",
                self.resource, image.width, image.height
            ))
        })
    }
}
