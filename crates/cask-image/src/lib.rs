//! # cask-image
//!
//! The local image store and the buildfile evaluator.
//!
//! An image is a directory `images/<name>:<tag>/` containing a `rootfs/`
//! subtree (the chroot target) and a `metadata/image.info` sidecar. The
//! store only indexes directories that are already materialized; there is
//! no registry protocol. `build` is the one way the store creates content
//! itself, by evaluating a parsed Caskfile against a fresh rootfs.

pub mod evaluator;
pub mod store;

pub use store::{ImageRecord, ImageStore};
