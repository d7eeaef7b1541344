//! # cask-core
//!
//! Low-level Linux isolation primitives for the cask runtime.
//!
//! This crate provides safe abstractions over:
//! - **Namespaces**: UTS, PID, mount, network, and IPC isolation.
//! - **Cgroups**: memory and CPU limits on both the v1 and v2 hierarchies.
//! - **Filesystem**: bind mounts and the pseudo-filesystems a container
//!   needs (`proc`, `sysfs`, `/dev` tmpfs, `devpts`).
//!
//! Syscall wrappers are Linux-only; on other platforms they return errors
//! so the higher layers can surface a clear message instead of panicking.

pub mod cgroup;
pub mod filesystem;
pub mod namespace;
