//! `cask run` — run a command in a new container.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use cask_common::config::CaskConfig;
use cask_common::error::CaskError;
use cask_common::types::{ImageReference, ResourceLimits};
use cask_image::ImageStore;
use cask_runtime::supervisor::{RunOptions, Supervisor};

use crate::output::parse_bytes;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Memory limit, e.g. 512m or 1g.
    #[arg(short = 'm', long = "memory", value_name = "LIMIT")]
    pub memory: Option<String>,

    /// CPU shares (relative weight).
    #[arg(short = 'c', long = "cpu-shares", value_name = "SHARES")]
    pub cpu_shares: Option<u64>,

    /// Image reference (name[:tag]) or path to a rootfs directory.
    pub image: String,

    /// Command and arguments to run (defaults to /bin/sh).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Executes the `run` command.
///
/// Resolves the image, runs the supervisor to completion, and returns the
/// containerized command's exit code.
///
/// # Errors
///
/// Returns an error when the image cannot be resolved or the run fails
/// for any reason other than the command's own non-zero exit.
pub fn execute(args: RunArgs, config: &CaskConfig) -> anyhow::Result<i32> {
    let limits = ResourceLimits {
        memory_bytes: args
            .memory
            .as_deref()
            .map(parse_bytes)
            .transpose()
            .context("parsing memory limit")?,
        cpu_shares: args.cpu_shares,
    };

    let store = ImageStore::open(config.images_dir());
    let rootfs = resolve_rootfs(&store, &args.image)?;

    let supervisor = Supervisor::new(config.containers_dir());
    match supervisor.run(RunOptions {
        image: args.image,
        rootfs,
        command: args.command,
        limits,
    }) {
        Ok(_record) => Ok(0),
        Err(CaskError::ChildFailed { status }) => Ok(status),
        Err(e) => Err(e.into()),
    }
}

/// Resolves the IMAGE argument: the local store first, then a literal
/// rootfs directory path.
fn resolve_rootfs(store: &ImageStore, image: &str) -> anyhow::Result<PathBuf> {
    match ImageReference::parse(image).and_then(|reference| store.locate(&reference)) {
        Ok(record) => Ok(record.rootfs),
        Err(CaskError::NotFound { .. } | CaskError::Usage { .. }) => {
            let path = Path::new(image);
            if path.is_dir() {
                Ok(path.to_path_buf())
            } else {
                anyhow::bail!(
                    "image '{image}' not found locally; build it first or pass a rootfs directory"
                )
            }
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prefers_the_store_over_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ImageStore::open(dir.path().join("images"));
        let rootfs = store.root().join("alpine:latest/rootfs");
        std::fs::create_dir_all(&rootfs).expect("rootfs");

        let resolved = resolve_rootfs(&store, "alpine").expect("resolve");
        assert_eq!(resolved, std::fs::canonicalize(rootfs).expect("canon"));
    }

    #[test]
    fn resolve_falls_back_to_a_rootfs_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ImageStore::open(dir.path().join("images"));
        let rootfs = dir.path().join("my-rootfs");
        std::fs::create_dir_all(&rootfs).expect("rootfs");

        let resolved =
            resolve_rootfs(&store, rootfs.to_str().expect("utf-8")).expect("resolve");
        assert_eq!(resolved, rootfs);
    }

    #[test]
    fn resolve_missing_image_mentions_not_found_locally() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ImageStore::open(dir.path().join("images"));

        let err = resolve_rootfs(&store, "ghost").expect_err("must fail");
        assert!(err.to_string().contains("not found locally"));
    }
}
