//! # cask-runtime
//!
//! The container lifecycle engine, split across two execution phases that
//! share one binary:
//!
//! - **Supervisor phase** ([`supervisor`]): runs on the host. Stages a
//!   per-container rootfs from an image, configures cgroups, spawns the
//!   child into fresh namespaces with a chrooted root, and blocks until it
//!   exits.
//! - **Init phase** ([`init`]): runs as the re-invoked binary inside the
//!   new namespaces and root. Mounts the pseudo-filesystems, sets the
//!   hostname, and execs the user command.
//!
//! Per-container state lives in `containers/<id>/metadata/container.json`
//! ([`metadata`]); the JSON files are the source of truth for listings.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod init;
pub mod metadata;
pub mod supervisor;
