//! `cask pull` — resolve an image reference against the local store.
//!
//! There is no registry protocol: pull succeeds silently when the image
//! is already materialized and fails otherwise.

use clap::Args;

use cask_common::config::CaskConfig;
use cask_common::types::ImageReference;
use cask_image::ImageStore;

/// Arguments for the `pull` command.
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Image reference in name[:tag] format.
    pub reference: String,
}

/// Executes the `pull` command.
///
/// # Errors
///
/// Returns an error when the image is not present locally; downloading
/// is not implemented.
pub fn execute(args: PullArgs, config: &CaskConfig) -> anyhow::Result<i32> {
    let reference = ImageReference::parse(&args.reference)?;
    let store = ImageStore::open(config.images_dir());

    match store.locate(&reference) {
        Ok(record) => {
            tracing::info!(reference = %reference, id = %record.id, "image already present");
            Ok(0)
        }
        Err(e) => {
            anyhow::bail!("{e}; registry pull is not implemented")
        }
    }
}
