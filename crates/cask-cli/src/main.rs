//! # cask — educational container runtime
//!
//! Single binary for building images from Caskfiles and running commands
//! inside kernel-enforced isolation (namespaces, chroot, cgroups).

#![allow(
    clippy::unnecessary_wraps,
    clippy::needless_pass_by_value,
    clippy::print_stdout,
    clippy::print_stderr
)]

mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap renders help/version on stdout and usage errors on
            // stderr; the latter exit with status 1.
            let is_usage_error = e.use_stderr();
            let _ = e.print();
            std::process::exit(i32::from(is_usage_error));
        }
    };

    match commands::execute(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
