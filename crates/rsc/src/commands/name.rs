use clap::Args;
use itertools::Itertools;
use miette::Result;

use crate::commands::load;
use crate::target::{self, InputKind, Inputs};

#[derive(Args)]
pub struct NameArgs {
    #[command(flatten)]
    inputs: Inputs,

    /// Fail when a referenced secondary store is missing
    #[arg(long, default_value_t = false)]
    strict: bool,
}

impl NameArgs {
    pub fn handle(&self) -> Result<()> {
        let inputs = self.inputs.resolve(InputKind::Container)?;
        target::run(&inputs, |path| {
            let container = load(path, self.strict)?;
            Ok(container.resource_names().iter().join("\n"))
        })
    }
}
