//! `cask build` — build an image from a Caskfile.

use std::path::PathBuf;

use clap::Args;

use cask_common::config::CaskConfig;
use cask_common::constants::{DEFAULT_BUILDFILE, LEGACY_BUILDFILE};
use cask_common::types::ImageReference;
use cask_image::ImageStore;

use crate::output::format_bytes;

/// Arguments for the `build` command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Name and optional tag for the image, in name[:tag] format.
    #[arg(short = 't', long = "tag", value_name = "NAME[:TAG]")]
    pub tag: String,

    /// Buildfile name, relative to PATH (defaults to Caskfile, then
    /// Dockerfile).
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Build context directory.
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

/// Executes the `build` command.
///
/// # Errors
///
/// Returns an error if no buildfile can be found, the reference is
/// malformed, or parsing/evaluation fails.
pub fn execute(args: BuildArgs, config: &CaskConfig) -> anyhow::Result<i32> {
    let reference = ImageReference::parse(&args.tag)?;
    let buildfile = resolve_buildfile(&args)?;

    let store = ImageStore::open(config.images_dir());
    let record = store.build(&buildfile, &reference, &args.path)?;

    println!(
        "Built {} ({}, {})",
        record.reference,
        record.id,
        format_bytes(record.size_bytes)
    );
    Ok(0)
}

fn resolve_buildfile(args: &BuildArgs) -> anyhow::Result<PathBuf> {
    if let Some(file) = &args.file {
        return Ok(args.path.join(file));
    }
    for candidate in [DEFAULT_BUILDFILE, LEGACY_BUILDFILE] {
        let path = args.path.join(candidate);
        if path.is_file() {
            return Ok(path);
        }
    }
    anyhow::bail!(
        "no {DEFAULT_BUILDFILE} or {LEGACY_BUILDFILE} in {}; use -f to name one",
        args.path.display()
    )
}
