//! `cask images` — list images in the local store.

use clap::Args;

use cask_common::config::CaskConfig;
use cask_image::ImageStore;

use crate::output::{format_bytes, short_id};

/// Arguments for the `images` command.
#[derive(Args, Debug)]
pub struct ImagesArgs {}

/// Executes the `images` command.
///
/// # Errors
///
/// Returns an error if the store directory cannot be read.
pub fn execute(_args: ImagesArgs, config: &CaskConfig) -> anyhow::Result<i32> {
    let store = ImageStore::open(config.images_dir());
    let images = store.list()?;

    println!(
        "{:<20} {:<15} {:<15} {:<10} PATH",
        "REPOSITORY", "TAG", "IMAGE ID", "SIZE"
    );
    for image in &images {
        println!(
            "{:<20} {:<15} {:<15} {:<10} {}",
            image.reference.name,
            image.reference.tag,
            short_id(&image.id),
            format_bytes(image.size_bytes),
            image.rootfs.display()
        );
    }
    Ok(0)
}
