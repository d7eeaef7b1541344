//! CLI command definitions and dispatch.

pub mod build;
pub mod containerize;
pub mod images;
pub mod ps;
pub mod pull;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cask_common::config::CaskConfig;

/// cask — educational container runtime for Linux.
#[derive(Parser, Debug)]
#[command(name = "cask", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Base directory holding the images/ and containers/ trees.
    #[arg(long, global = true, default_value = ".")]
    pub data_dir: PathBuf,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command in a new container.
    Run(run::RunArgs),
    /// Resolve an image reference against the local store.
    Pull(pull::PullArgs),
    /// Build an image from a Caskfile.
    Build(build::BuildArgs),
    /// List images.
    Images(images::ImagesArgs),
    /// List containers.
    Ps(ps::PsArgs),
    /// Internal re-entry point executed inside the container.
    #[command(hide = true)]
    Containerize(containerize::ContainerizeArgs),
}

/// Dispatches the parsed CLI command and returns the process exit code.
///
/// # Errors
///
/// Returns an error if the command execution fails; `run` and
/// `containerize` forward the containerized command's own exit code
/// through the `Ok` value instead.
pub fn execute(cli: Cli) -> anyhow::Result<i32> {
    let config = CaskConfig::with_data_dir(cli.data_dir);
    match cli.command {
        Command::Run(args) => run::execute(args, &config),
        Command::Pull(args) => pull::execute(args, &config),
        Command::Build(args) => build::execute(args, &config),
        Command::Images(args) => images::execute(args, &config),
        Command::Ps(args) => ps::execute(args, &config),
        Command::Containerize(args) => containerize::execute(args),
    }
}
