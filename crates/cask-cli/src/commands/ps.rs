//! `cask ps` — list containers.

use clap::Args;

use cask_common::config::CaskConfig;
use cask_runtime::metadata;

use crate::output::truncate_command;

/// Arguments for the `ps` command.
#[derive(Args, Debug)]
pub struct PsArgs {}

/// Executes the `ps` command.
///
/// Reads the per-container metadata files and prints a snapshot; records
/// that fail to parse are skipped by the listing layer.
///
/// # Errors
///
/// Returns an error if the containers directory cannot be read.
pub fn execute(_args: PsArgs, config: &CaskConfig) -> anyhow::Result<i32> {
    let containers = metadata::list_containers(&config.containers_dir())?;

    println!(
        "{:<15} {:<25} {:<22} STATUS",
        "CONTAINER ID", "IMAGE", "COMMAND"
    );
    for container in &containers {
        println!(
            "{:<15} {:<25} {:<22} {}",
            container.id.short(),
            container.image,
            truncate_command(&container.command.join(" "), 20),
            container.status
        );
    }
    Ok(0)
}
