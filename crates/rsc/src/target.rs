//! Input selection and batch execution shared by every command

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use rayon::prelude::*;
use rsc_container::Store;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Suffix of the directory a container is extracted into
pub const EXTRACTED_SUFFIX: &str = ".extracted";

/// Where the inputs of a command come from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct Target {
    /// A single input
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Every input directly inside a directory
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Every input directly inside the current directory
    #[arg(long, default_value_t = false)]
    pub cwd: bool,
}

#[derive(Args, Debug, Clone)]
pub struct Inputs {
    #[command(flatten)]
    pub target: Target,

    /// Only pick files with this extension when scanning a directory
    #[arg(short, long, value_name = "EXT")]
    pub extension: Option<String>,
}

/// What a command consumes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// A container, addressed by its structure store
    Container,

    /// A directory written by `extract`
    Extracted,
}

impl InputKind {
    fn accepts(self, path: &Path, extension: Option<&str>) -> bool {
        match self {
            InputKind::Container => {
                path.is_file()
                    && !is_companion(path)
                    && extension.map_or(true, |ext| {
                        path.extension()
                            .is_some_and(|e| e.eq_ignore_ascii_case(ext.trim_start_matches('.')))
                    })
            }
            InputKind::Extracted => {
                path.is_dir()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.ends_with(EXTRACTED_SUFFIX))
            }
        }
    }
}

/// Whether `path` is the index or bulk store of a container next to it
fn is_companion(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    [Store::Index, Store::Bulk].into_iter().any(|store| {
        name.strip_suffix(store.suffix())
            .filter(|stem| !stem.is_empty())
            .is_some_and(|stem| path.with_file_name(stem).is_file())
    })
}

impl Inputs {
    /// Resolve the selected inputs of `kind`, sorted by name
    pub fn resolve(&self, kind: InputKind) -> Result<Vec<PathBuf>> {
        let directory = match (&self.target.file, &self.target.directory) {
            (Some(file), _) => return Ok(vec![file.clone()]),
            (None, Some(directory)) => directory.clone(),
            (None, None) => std::env::current_dir().into_diagnostic()?,
        };

        let inputs = WalkDir::new(&directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| kind.accepts(p, self.extension.as_deref()))
            .collect::<Vec<_>>();

        if inputs.is_empty() {
            return Err(miette!("no inputs found in {}", directory.display()));
        }
        debug!(count = inputs.len(), "resolved inputs");
        Ok(inputs)
    }
}

/// Run `action` on every input in parallel and print one line per input.
///
/// A failing input does not stop the others. The summary returned by `action` is
/// printed under the input's line.
pub fn run<F>(inputs: &[PathBuf], action: F) -> Result<()>
where
    F: Fn(&Path) -> Result<String> + Sync,
{
    let outcomes = inputs
        .par_iter()
        .map(|path| (path, action(path)))
        .collect::<Vec<_>>();

    let mut failed = 0;
    for (path, outcome) in &outcomes {
        match outcome {
            Ok(summary) => {
                println!("✅ {}", path.display().green());
                for line in summary.lines() {
                    println!("   {line}");
                }
            }
            Err(report) => {
                failed += 1;
                println!("❌ {}", path.display().red());
                eprintln!("{report:?}");
            }
        }
    }

    if failed > 0 {
        return Err(miette!("{failed} of {} inputs failed", outcomes.len()));
    }
    Ok(())
}

/// Delete a converted input, every store of a container or a whole extracted directory
pub fn remove_input(path: &Path, kind: InputKind) -> Result<()> {
    info!("deleting {}", path.display());
    match kind {
        InputKind::Container => {
            for store in [Store::Structure, Store::Index, Store::Bulk] {
                let store_path = store.path(path);
                if store_path.is_file() {
                    fs::remove_file(&store_path)
                        .into_diagnostic()
                        .context(format!("path: {}", store_path.display()))?;
                }
            }
            Ok(())
        }
        InputKind::Extracted => fs::remove_dir_all(path)
            .into_diagnostic()
            .context(format!("path: {}", path.display())),
    }
}

/// `<container>.extracted` next to the container
pub fn extracted_dir(container: &Path) -> Result<PathBuf> {
    let mut name = container
        .file_name()
        .ok_or_else(|| miette!("{} has no file name", container.display()))?
        .to_os_string();
    name.push(EXTRACTED_SUFFIX);
    Ok(container.with_file_name(name))
}

/// The container an extracted directory was produced from
pub fn container_of(extracted: &Path) -> Result<PathBuf> {
    let stem = extracted
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(EXTRACTED_SUFFIX))
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            miette!(
                "{} is not named <container>{EXTRACTED_SUFFIX}",
                extracted.display()
            )
        })?;
    Ok(extracted.with_file_name(stem))
}
