//! Init phase: in-container setup and exec.
//!
//! This code runs in the process the supervisor created with `clone(2)`:
//! already chrooted into the container rootfs, a member of the five fresh
//! namespaces from birth, and PID 1 of the new PID namespace. That last
//! part matters for the mounts below — a procfs instance shows the PID
//! namespace of the task that mounted it, so `/proc` only shows container
//! processes because the mounting process is itself namespaced. What
//! remains is making the root usable: mount `/proc`, `/sys`, and a `/dev`
//! tmpfs (fatal on failure, with a reverse-order rollback), optionally a
//! `devpts` instance, set the hostname, build a minimal environment from
//! scratch, and exec the user command. The command's exit code becomes
//! this process's exit code.

use cask_common::constants::{CONTAINER_HOSTNAME, CONTAINER_PATH};
use cask_common::error::{CaskError, Result};

/// The environment exported to the containerized process.
///
/// Built from scratch; nothing leaks in from the host environment.
#[must_use]
pub fn container_environment() -> Vec<(String, String)> {
    vec![
        ("PATH".into(), CONTAINER_PATH.into()),
        ("HOME".into(), "/".into()),
        ("PWD".into(), "/".into()),
        ("TERM".into(), "xterm".into()),
    ]
}

/// Applies the bash special case: a command named `bash` (or ending in
/// `/bash`) is rewritten to the absolute `/bin/bash` when that path
/// exists, sidestepping PATH resolution inside minimal images.
fn prefer_bash(argv0: &str, bash_exists: bool) -> String {
    if bash_exists && (argv0 == "bash" || argv0.ends_with("/bash")) {
        "/bin/bash".to_string()
    } else {
        argv0.to_string()
    }
}

/// Runs the init phase and returns the exit code to propagate.
///
/// # Errors
///
/// Returns an error when a required mount fails (after rolling back the
/// mounts that had already succeeded) or when the command cannot be
/// executed at all. Hostname and `devpts` failures are warnings only.
#[cfg(target_os = "linux")]
pub fn containerize(command: &[String]) -> Result<i32> {
    use std::path::Path;

    use cask_core::filesystem::mount;
    use cask_core::namespace;

    let Some(argv0) = command.first() else {
        return Err(CaskError::Usage {
            message: "no command provided to execute in container".into(),
        });
    };

    mount_pseudo_filesystems()?;

    let devpts_mounted = match setup_devpts() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "could not mount /dev/pts");
            false
        }
    };

    if let Err(e) = namespace::set_hostname(CONTAINER_HOSTNAME) {
        tracing::warn!(error = %e, "could not set container hostname");
    }

    let argv0 = prefer_bash(argv0, Path::new("/bin/bash").exists());
    tracing::debug!(command = %argv0, "executing container command");

    let status = std::process::Command::new(&argv0)
        .args(&command[1..])
        .env_clear()
        .envs(container_environment())
        .status();

    // Reverse of the mount order, lazy so busy trees cannot wedge exit.
    if devpts_mounted {
        let _ = mount::unmount_detached(Path::new("/dev/pts"));
    }
    for target in ["/dev", "/sys", "/proc"] {
        let _ = mount::unmount_detached(Path::new(target));
    }

    let status = status.map_err(|e| CaskError::os(format!("executing {argv0}"), e))?;
    Ok(status.code().unwrap_or(1))
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — the init phase requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn containerize(_command: &[String]) -> Result<i32> {
    Err(CaskError::Usage {
        message: "Linux required to run containers".into(),
    })
}

/// Mounts `/proc`, `/sys`, and the `/dev` tmpfs, in that order.
///
/// On failure, everything mounted so far is detached in reverse order
/// before the error is returned.
#[cfg(target_os = "linux")]
fn mount_pseudo_filesystems() -> Result<()> {
    use std::path::Path;

    use cask_core::filesystem::mount;

    type MountFn = fn(&Path) -> Result<()>;
    let mounts: [(&str, MountFn); 3] = [
        ("/proc", mount::mount_proc),
        ("/sys", mount::mount_sysfs),
        ("/dev", mount::mount_dev_tmpfs),
    ];

    let mut mounted: Vec<&Path> = Vec::new();
    for (target, mount_fn) in mounts {
        let target = Path::new(target);
        if let Err(e) = mount_fn(target) {
            for succeeded in mounted.into_iter().rev() {
                let _ = mount::unmount_detached(succeeded);
            }
            return Err(e);
        }
        mounted.push(target);
    }
    Ok(())
}

/// Creates `/dev/pts` and mounts a private `devpts` instance there.
#[cfg(target_os = "linux")]
fn setup_devpts() -> Result<()> {
    use std::path::Path;

    let dev_pts = Path::new("/dev/pts");
    std::fs::create_dir_all(dev_pts).map_err(|e| CaskError::io(dev_pts, e))?;
    cask_core::filesystem::mount::mount_devpts(dev_pts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_is_built_from_scratch() {
        let env = container_environment();
        let get = |key: &str| {
            env.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .expect("key present")
        };
        assert_eq!(
            get("PATH"),
            "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"
        );
        assert_eq!(get("HOME"), "/");
        assert_eq!(get("PWD"), "/");
        assert_eq!(get("TERM"), "xterm");
        assert_eq!(env.len(), 4);
    }

    #[test]
    fn bash_is_rewritten_to_the_absolute_path_when_present() {
        assert_eq!(prefer_bash("bash", true), "/bin/bash");
        assert_eq!(prefer_bash("/usr/bin/bash", true), "/bin/bash");
    }

    #[test]
    fn bash_is_left_alone_when_absent() {
        assert_eq!(prefer_bash("bash", false), "bash");
    }

    #[test]
    fn non_bash_commands_are_never_rewritten() {
        assert_eq!(prefer_bash("/bin/sh", true), "/bin/sh");
        assert_eq!(prefer_bash("bashful", true), "bashful");
        assert_eq!(prefer_bash("/bin/echo", true), "/bin/echo");
    }
}
