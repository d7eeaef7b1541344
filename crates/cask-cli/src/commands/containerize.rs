//! `cask containerize` — internal init-phase entry point.
//!
//! Invoked by the supervisor as `/usr/local/bin/cask containerize CMD…`
//! after the child has been chrooted into the container rootfs and placed
//! in its new namespaces. Not intended for direct user invocation.

use clap::Args;

use cask_runtime::init;

/// Arguments for the `containerize` command.
#[derive(Args, Debug)]
pub struct ContainerizeArgs {
    /// Command and arguments to execute inside the container.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub command: Vec<String>,
}

/// Executes the init phase and forwards the command's exit code.
///
/// # Errors
///
/// Returns an error when a required mount fails or the command cannot be
/// executed.
pub fn execute(args: ContainerizeArgs) -> anyhow::Result<i32> {
    Ok(init::containerize(&args.command)?)
}
