//! Mount syscall wrappers for container filesystem setup.
//!
//! The supervisor bind-mounts an image rootfs onto the container's mount
//! point; the init phase mounts the pseudo-filesystems (`/proc`, `/sys`,
//! a `/dev` tmpfs, and optionally `devpts`) inside the new mount namespace.
//! Unmounts are always lazy (`MNT_DETACH`) so teardown cannot wedge on a
//! busy tree.

use std::path::Path;

use cask_common::error::Result;

/// Mount options for the `/dev` tmpfs.
pub const DEV_TMPFS_OPTIONS: &str = "mode=755,size=65536k";

/// Mount options for the `devpts` instance.
pub const DEVPTS_OPTIONS: &str = "newinstance,ptmxmode=0666,mode=0620,gid=5";

/// Recursively bind-mounts `source` onto `target`.
///
/// The recursive flag carries any submounts of the source tree along, so an
/// image rootfs that itself contains mounts stays intact.
///
/// # Errors
///
/// Returns an error naming the source path if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn bind_mount_recursive(source: &Path, target: &Path) -> Result<()> {
    use nix::mount::{mount, MsFlags};

    mount(
        Some(source),
        target,
        None::<&str>,
        MsFlags::MS_BIND | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| cask_common::error::CaskError::os(format!("bind mounting {}", source.display()), e))?;
    tracing::debug!(source = %source.display(), target = %target.display(), "rootfs bind mounted");
    Ok(())
}

/// Mounts a `proc` instance at `target`.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn mount_proc(target: &Path) -> Result<()> {
    use nix::mount::{mount, MsFlags};

    mount(
        Some("proc"),
        target,
        Some("proc"),
        MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| mount_error(target, e))?;
    Ok(())
}

/// Mounts a `sysfs` instance at `target`.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn mount_sysfs(target: &Path) -> Result<()> {
    use nix::mount::{mount, MsFlags};

    mount(
        Some("sysfs"),
        target,
        Some("sysfs"),
        MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| mount_error(target, e))?;
    Ok(())
}

/// Mounts a small tmpfs for `/dev` at `target`.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn mount_dev_tmpfs(target: &Path) -> Result<()> {
    use nix::mount::{mount, MsFlags};

    mount(
        Some("tmpfs"),
        target,
        Some("tmpfs"),
        MsFlags::MS_NOSUID | MsFlags::MS_STRICTATIME,
        Some(DEV_TMPFS_OPTIONS),
    )
    .map_err(|e| mount_error(target, e))?;
    Ok(())
}

/// Mounts a private `devpts` instance at `target`.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn mount_devpts(target: &Path) -> Result<()> {
    use nix::mount::{mount, MsFlags};

    mount(
        Some("devpts"),
        target,
        Some("devpts"),
        MsFlags::MS_NOSUID | MsFlags::MS_NOEXEC,
        Some(DEVPTS_OPTIONS),
    )
    .map_err(|e| mount_error(target, e))?;
    Ok(())
}

/// Lazily unmounts `target` with `MNT_DETACH`.
///
/// # Errors
///
/// Returns an error if the `umount2(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn unmount_detached(target: &Path) -> Result<()> {
    use nix::mount::{umount2, MntFlags};

    umount2(target, MntFlags::MNT_DETACH)
        .map_err(|e| cask_common::error::CaskError::os(format!("unmounting {}", target.display()), e))?;
    tracing::debug!(target = %target.display(), "unmounted (lazy)");
    Ok(())
}

#[cfg(target_os = "linux")]
fn mount_error(target: &Path, errno: nix::Error) -> cask_common::error::CaskError {
    cask_common::error::CaskError::os(
        format!("mounting {} in container", target.display()),
        errno,
    )
}

#[cfg(not(target_os = "linux"))]
mod stubs {
    use super::Result;
    use std::path::Path;

    fn unsupported() -> cask_common::error::CaskError {
        cask_common::error::CaskError::Usage {
            message: "Linux required to run containers".into(),
        }
    }

    /// Stub for non-Linux platforms; always fails.
    ///
    /// # Errors
    ///
    /// Always returns an error — mounts require Linux.
    pub fn bind_mount_recursive(_source: &Path, _target: &Path) -> Result<()> {
        Err(unsupported())
    }

    /// Stub for non-Linux platforms; always fails.
    ///
    /// # Errors
    ///
    /// Always returns an error — mounts require Linux.
    pub fn mount_proc(_target: &Path) -> Result<()> {
        Err(unsupported())
    }

    /// Stub for non-Linux platforms; always fails.
    ///
    /// # Errors
    ///
    /// Always returns an error — mounts require Linux.
    pub fn mount_sysfs(_target: &Path) -> Result<()> {
        Err(unsupported())
    }

    /// Stub for non-Linux platforms; always fails.
    ///
    /// # Errors
    ///
    /// Always returns an error — mounts require Linux.
    pub fn mount_dev_tmpfs(_target: &Path) -> Result<()> {
        Err(unsupported())
    }

    /// Stub for non-Linux platforms; always fails.
    ///
    /// # Errors
    ///
    /// Always returns an error — mounts require Linux.
    pub fn mount_devpts(_target: &Path) -> Result<()> {
        Err(unsupported())
    }

    /// Stub for non-Linux platforms; always fails.
    ///
    /// # Errors
    ///
    /// Always returns an error — unmounts require Linux.
    pub fn unmount_detached(_target: &Path) -> Result<()> {
        Err(unsupported())
    }
}

#[cfg(not(target_os = "linux"))]
pub use stubs::*;
