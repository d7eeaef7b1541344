//! Supervisor phase: host-side container lifecycle.
//!
//! The supervisor is a foreground runner, not a daemon. One `run` call
//! stages a rootfs, spawns exactly one child into fresh namespaces with a
//! chrooted root, and blocks until it terminates. The child re-invokes
//! this same binary in `containerize` mode, which is why the supervisor
//! copies its own executable into the container rootfs before spawning:
//! the host-side binary path is unreachable after the chroot.
//!
//! Step ordering is load-bearing: directory allocation, bind mount,
//! self-insertion, metadata (`created`), cgroup setup, spawn, metadata
//! (`running`), cgroup attach, wait, metadata (`stopped`).

use std::path::{Path, PathBuf};

use cask_common::constants::{
    CGROUP_ROOT, CONTAINER_BIN_PATH, DEFAULT_COMMAND, ROOTFS_ENV,
};
use cask_common::error::{CaskError, Result};
use cask_common::types::{ContainerId, ContainerState, ResourceLimits};
use cask_core::cgroup::CgroupController;

use crate::metadata::{self, ContainerRecord};

/// Inputs for one container run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// The image reference or rootfs path as the user supplied it,
    /// recorded verbatim in the container metadata.
    pub image: String,
    /// Resolved source rootfs directory to stage from.
    pub rootfs: PathBuf,
    /// Command vector; empty means the default shell.
    pub command: Vec<String>,
    /// Optional cgroup limits.
    pub limits: ResourceLimits,
}

/// Host-side engine owning the `containers/` tree.
#[derive(Debug)]
pub struct Supervisor {
    containers_dir: PathBuf,
    cgroup_root: PathBuf,
}

impl Supervisor {
    /// Creates a supervisor writing container state under `containers_dir`.
    #[must_use]
    pub fn new(containers_dir: impl Into<PathBuf>) -> Self {
        Self {
            containers_dir: containers_dir.into(),
            cgroup_root: PathBuf::from(CGROUP_ROOT),
        }
    }

    /// Overrides the cgroup hierarchy root (used by tests).
    #[must_use]
    pub fn with_cgroup_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cgroup_root = root.into();
        self
    }

    /// Returns the container state directory.
    #[must_use]
    pub fn containers_dir(&self) -> &Path {
        &self.containers_dir
    }

    /// Allocates a container directory, enforcing ID uniqueness through
    /// `create_dir` atomicity, and returns the fresh record.
    fn allocate(&self, image: String, command: Vec<String>) -> Result<ContainerRecord> {
        std::fs::create_dir_all(&self.containers_dir)
            .map_err(|e| CaskError::io(&self.containers_dir, e))?;

        let id = ContainerId::generate();
        let container_dir = self.container_dir(&id);
        std::fs::create_dir(&container_dir).map_err(|e| CaskError::io(&container_dir, e))?;
        for sub in ["rootfs", "metadata"] {
            let dir = container_dir.join(sub);
            std::fs::create_dir(&dir).map_err(|e| CaskError::io(&dir, e))?;
        }

        let command = if command.is_empty() {
            vec![DEFAULT_COMMAND.to_string()]
        } else {
            command
        };
        Ok(ContainerRecord::new(id, image, command))
    }

    fn container_dir(&self, id: &ContainerId) -> PathBuf {
        self.containers_dir.join(id.as_str())
    }

    fn container_rootfs(&self, id: &ContainerId) -> PathBuf {
        self.container_dir(id).join("rootfs")
    }
}

#[cfg(target_os = "linux")]
impl Supervisor {
    /// Runs a container to completion and returns its final record.
    ///
    /// Blocks until the child terminates; stdio is inherited, so the
    /// container's output interleaves with the supervisor's.
    ///
    /// # Errors
    ///
    /// Returns staging, cgroup, or spawn failures, and `ChildFailed`
    /// (carrying the exit status) when the containerized command exits
    /// non-zero. Metadata reflects the final state in every case.
    pub fn run(&self, opts: RunOptions) -> Result<ContainerRecord> {
        let mut record = self.allocate(opts.image, opts.command)?;
        let rootfs = self.container_rootfs(&record.id);
        tracing::info!(id = %record.id, image = %record.image, "container allocated");

        if let Err(e) = stage_rootfs(&opts.rootfs, &rootfs).and_then(|()| insert_runtime_binary(&rootfs)) {
            // Detach before deleting: removing the directory while the
            // image is still bind-mounted would recurse into the image
            // tree itself.
            let _ = cask_core::filesystem::mount::unmount_detached(&rootfs);
            let _ = std::fs::remove_dir_all(self.container_dir(&record.id));
            return Err(e);
        }

        record.touch();
        metadata::save(&self.containers_dir, &record)?;

        let cgroup = if opts.limits.is_unlimited() {
            None
        } else {
            let cgroup = CgroupController::create(&self.cgroup_root, record.id.as_str())?;
            cgroup.apply(&opts.limits)?;
            Some(cgroup)
        };

        let pid = match spawn_init(&rootfs, &record.command) {
            Ok(pid) => pid,
            Err(e) => {
                record.status = ContainerState::Failed;
                record.touch();
                if let Err(save_err) = metadata::save(&self.containers_dir, &record) {
                    tracing::warn!(id = %record.id, error = %save_err, "failed to persist failed state");
                }
                return Err(e);
            }
        };
        let raw_pid = pid.as_raw() as u32;

        record.pid = Some(raw_pid);
        record.status = ContainerState::Running;
        record.touch();
        metadata::save(&self.containers_dir, &record)?;
        tracing::info!(id = %record.id, pid = raw_pid, "container running");

        if let Some(cgroup) = &cgroup {
            // A failed attach leaves the already-running child uncapped.
            if let Err(e) = cgroup.add_process(raw_pid) {
                tracing::warn!(id = %record.id, error = %e, "could not attach process to cgroup");
            }
        }

        let status = nix::sys::wait::waitpid(pid, None)
            .map_err(|e| CaskError::os("waiting for container process", e))?;
        let code = match status {
            nix::sys::wait::WaitStatus::Exited(_, code) => code,
            nix::sys::wait::WaitStatus::Signaled(_, signal, _) => 128 + signal as i32,
            _ => 1,
        };

        record.status = ContainerState::Stopped;
        record.touch();
        metadata::save(&self.containers_dir, &record)?;
        tracing::info!(id = %record.id, code, "container stopped");

        if code == 0 {
            Ok(record)
        } else {
            Err(CaskError::ChildFailed { status: code })
        }
    }

    /// Terminates a running container: SIGTERM, then SIGKILL if that
    /// fails. There is no grace period.
    ///
    /// # Errors
    ///
    /// Returns an error if neither signal can be delivered or metadata
    /// cannot be persisted.
    pub fn stop(&self, record: &mut ContainerRecord) -> Result<()> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = record.pid {
            let pid = Pid::from_raw(pid as i32);
            if let Err(term_err) = kill(pid, Signal::SIGTERM) {
                tracing::warn!(id = %record.id, error = %term_err, "SIGTERM failed, sending SIGKILL");
                kill(pid, Signal::SIGKILL)
                    .map_err(|e| CaskError::os("killing container process", e))?;
            }
        }
        record.status = ContainerState::Stopped;
        record.touch();
        metadata::save(&self.containers_dir, record)
    }

    /// Removes a stopped container: lazily unmounts its rootfs, tears
    /// down its cgroup nodes, and deletes the directory tree.
    ///
    /// A still-running container is stopped first. Unmount and cgroup
    /// failures are warnings; the directory is removed regardless.
    ///
    /// # Errors
    ///
    /// Returns an error if the container directory cannot be deleted.
    pub fn remove(&self, record: &mut ContainerRecord) -> Result<()> {
        if record.status == ContainerState::Running {
            self.stop(record)?;
        }

        let rootfs = self.container_rootfs(&record.id);
        if let Err(e) = cask_core::filesystem::mount::unmount_detached(&rootfs) {
            tracing::warn!(id = %record.id, error = %e, "rootfs unmount failed");
        }
        if let Err(e) = CgroupController::open(&self.cgroup_root, record.id.as_str()).destroy() {
            tracing::warn!(id = %record.id, error = %e, "cgroup cleanup failed");
        }

        let container_dir = self.container_dir(&record.id);
        std::fs::remove_dir_all(&container_dir).map_err(|e| CaskError::io(&container_dir, e))?;
        tracing::info!(id = %record.id, "container removed");
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
impl Supervisor {
    /// Stub for non-Linux platforms.
    ///
    /// # Errors
    ///
    /// Always returns an error — containers require Linux.
    pub fn run(&self, _opts: RunOptions) -> Result<ContainerRecord> {
        Err(CaskError::Usage {
            message: "Linux required to run containers".into(),
        })
    }

    /// Stub for non-Linux platforms.
    ///
    /// # Errors
    ///
    /// Always returns an error — containers require Linux.
    pub fn stop(&self, _record: &mut ContainerRecord) -> Result<()> {
        Err(CaskError::Usage {
            message: "Linux required to run containers".into(),
        })
    }

    /// Stub for non-Linux platforms.
    ///
    /// # Errors
    ///
    /// Always returns an error — containers require Linux.
    pub fn remove(&self, _record: &mut ContainerRecord) -> Result<()> {
        Err(CaskError::Usage {
            message: "Linux required to run containers".into(),
        })
    }
}

/// Bind-mounts the image rootfs onto the container's mount point and
/// creates the directories the init phase and self-insertion rely on.
#[cfg(target_os = "linux")]
fn stage_rootfs(source: &Path, rootfs: &Path) -> Result<()> {
    cask_core::filesystem::mount::bind_mount_recursive(source, rootfs)?;
    for dir in ["proc", "sys", "dev", "tmp", "usr/local/bin"] {
        let path = rootfs.join(dir);
        std::fs::create_dir_all(&path).map_err(|e| CaskError::io(&path, e))?;
    }
    Ok(())
}

/// Copies the running supervisor executable to `usr/local/bin/cask` inside
/// the container rootfs, mode 0755, so the child can re-invoke it after
/// the chroot.
#[cfg(target_os = "linux")]
fn insert_runtime_binary(rootfs: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let host_exe = std::env::current_exe()
        .map_err(|e| CaskError::os("resolving runtime executable", e))?;
    let target = rootfs.join(
        Path::new(CONTAINER_BIN_PATH)
            .strip_prefix("/")
            .unwrap_or(Path::new(CONTAINER_BIN_PATH)),
    );
    std::fs::copy(&host_exe, &target).map_err(|e| CaskError::io(&target, e))?;
    std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| CaskError::io(&target, e))?;
    tracing::debug!(target = %target.display(), "runtime binary inserted");
    Ok(())
}

/// Stack size handed to `clone(2)`; the child only chroots and execs on it.
#[cfg(target_os = "linux")]
const INIT_STACK_SIZE: usize = 1024 * 1024;

/// Spawns the init phase: `/usr/local/bin/cask containerize <cmd>…` with
/// stdio inherited and the rootfs path exported in the environment.
///
/// The child is created through `clone(2)` with the five `CLONE_NEW*`
/// flags, so it is a member of the new namespaces from its first
/// instruction and PID 1 of the new PID namespace. Membership has to be
/// established at creation time: the init phase mounts `/proc`, and a
/// procfs instance shows the PID namespace of the task that mounted it.
/// The cloned child chroots into the container rootfs and then execs the
/// re-entry command.
#[cfg(target_os = "linux")]
fn spawn_init(rootfs: &Path, command: &[String]) -> Result<nix::unistd::Pid> {
    let flags = cask_core::namespace::NamespaceConfig::default().clone_flags();
    let argv = init_argv(command)?;
    let envp = init_envp(rootfs)?;
    let chroot_dir = rootfs.to_path_buf();

    let mut stack = vec![0u8; INIT_STACK_SIZE];
    // SAFETY: without CLONE_VM the child runs on a full copy of the
    // address space, so the borrowed argv/envp/chroot_dir stay valid in
    // its copy for the moments before execve replaces the image.
    unsafe {
        nix::sched::clone(
            Box::new(|| init_entry(&chroot_dir, &argv, &envp)),
            &mut stack,
            flags,
            Some(nix::sys::signal::Signal::SIGCHLD as i32),
        )
    }
    .map_err(|e| CaskError::os("spawning container process", e))
}

/// Entry point of the cloned child: chroot, chdir, exec. Runs inside the
/// new namespaces; a non-zero return becomes the child's exit status.
#[cfg(target_os = "linux")]
fn init_entry(chroot_dir: &Path, argv: &[std::ffi::CString], envp: &[std::ffi::CString]) -> isize {
    if nix::unistd::chroot(chroot_dir).is_err() {
        eprintln!("Error entering container root {}", chroot_dir.display());
        return 127;
    }
    if nix::unistd::chdir("/").is_err() {
        return 127;
    }
    if let Err(errno) = nix::unistd::execve(&argv[0], argv, envp) {
        eprintln!("Error executing {CONTAINER_BIN_PATH} in container: {errno}");
    }
    127
}

#[cfg(target_os = "linux")]
fn init_argv(command: &[String]) -> Result<Vec<std::ffi::CString>> {
    let mut argv = vec![cstring(CONTAINER_BIN_PATH)?, cstring("containerize")?];
    for arg in command {
        argv.push(cstring(arg.as_str())?);
    }
    Ok(argv)
}

/// The init process keeps the supervisor's environment (stdio and env are
/// inherited per the run contract) plus the informational rootfs variable;
/// the user command's environment is rebuilt from scratch later.
#[cfg(target_os = "linux")]
fn init_envp(rootfs: &Path) -> Result<Vec<std::ffi::CString>> {
    let mut envp = Vec::new();
    for (key, value) in std::env::vars() {
        envp.push(cstring(format!("{key}={value}"))?);
    }
    envp.push(cstring(format!("{ROOTFS_ENV}={}", rootfs.display()))?);
    Ok(envp)
}

#[cfg(target_os = "linux")]
fn cstring(value: impl Into<Vec<u8>>) -> Result<std::ffi::CString> {
    std::ffi::CString::new(value).map_err(|e| {
        CaskError::os(
            "encoding container command",
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
        )
    })
}
