//! Linux namespace management for container isolation.
//!
//! The runtime gives every container a fresh UTS, PID, mount, network, and
//! IPC namespace. User namespaces are deliberately not used: the runtime
//! performs no UID remapping.

use cask_common::error::Result;

/// Which namespaces to create for a container.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct NamespaceConfig {
    /// Isolate the hostname (UTS namespace).
    pub uts: bool,
    /// Isolate process IDs.
    pub pid: bool,
    /// Isolate the mount table.
    pub mount: bool,
    /// Create an unconfigured network namespace.
    pub network: bool,
    /// Isolate System V IPC and POSIX message queues.
    pub ipc: bool,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            uts: true,
            pid: true,
            mount: true,
            network: true,
            ipc: true,
        }
    }
}

#[cfg(target_os = "linux")]
impl NamespaceConfig {
    /// Returns the `CLONE_NEW*` flag set for the configured namespaces.
    #[must_use]
    pub fn clone_flags(&self) -> nix::sched::CloneFlags {
        use nix::sched::CloneFlags;

        let mut flags = CloneFlags::empty();
        if self.uts {
            flags |= CloneFlags::CLONE_NEWUTS;
        }
        if self.pid {
            flags |= CloneFlags::CLONE_NEWPID;
        }
        if self.mount {
            flags |= CloneFlags::CLONE_NEWNS;
        }
        if self.network {
            flags |= CloneFlags::CLONE_NEWNET;
        }
        if self.ipc {
            flags |= CloneFlags::CLONE_NEWIPC;
        }
        flags
    }

}

/// Sets the hostname inside the current UTS namespace.
///
/// # Errors
///
/// Returns an error if `sethostname(2)` fails.
#[cfg(target_os = "linux")]
pub fn set_hostname(hostname: &str) -> Result<()> {
    nix::unistd::sethostname(hostname)
        .map_err(|e| cask_common::error::CaskError::os("setting container hostname", e))?;
    tracing::debug!(hostname, "hostname set");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — UTS namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn set_hostname(_hostname: &str) -> Result<()> {
    Err(cask_common::error::CaskError::Usage {
        message: "Linux required to run containers".into(),
    })
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use nix::sched::CloneFlags;

    #[test]
    fn default_config_requests_all_five_namespaces() {
        let flags = NamespaceConfig::default().clone_flags();
        assert!(flags.contains(CloneFlags::CLONE_NEWUTS));
        assert!(flags.contains(CloneFlags::CLONE_NEWPID));
        assert!(flags.contains(CloneFlags::CLONE_NEWNS));
        assert!(flags.contains(CloneFlags::CLONE_NEWNET));
        assert!(flags.contains(CloneFlags::CLONE_NEWIPC));
    }

    #[test]
    fn disabled_namespaces_are_excluded_from_flags() {
        let config = NamespaceConfig {
            network: false,
            ipc: false,
            ..NamespaceConfig::default()
        };
        let flags = config.clone_flags();
        assert!(!flags.contains(CloneFlags::CLONE_NEWNET));
        assert!(!flags.contains(CloneFlags::CLONE_NEWIPC));
        assert!(flags.contains(CloneFlags::CLONE_NEWPID));
    }
}
