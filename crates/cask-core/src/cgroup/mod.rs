//! Cgroup resource management.
//!
//! Supports both hierarchies: the unified v2 tree (one directory per
//! container under `<root>/cask/`) and the legacy v1 layout (one directory
//! per controller under `<root>/<controller>/cask/`). The hierarchy is
//! detected by probing `cgroup.controllers` at the cgroup root.
//!
//! Everything here is plain file I/O against the cgroup filesystem, so the
//! controller can be pointed at a scratch directory in tests.

pub mod cpu;
pub mod memory;

use std::path::{Path, PathBuf};

use cask_common::constants::APP_NAME;
use cask_common::error::{CaskError, Result};
use cask_common::types::ResourceLimits;

/// Which cgroup hierarchy the host exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgroupVersion {
    /// Per-controller hierarchies (`<root>/memory`, `<root>/cpu`, ...).
    V1,
    /// Unified hierarchy with `cgroup.controllers` at the root.
    V2,
}

/// Detects the hierarchy version exposed under `root`.
#[must_use]
pub fn detect_version(root: &Path) -> CgroupVersion {
    if root.join("cgroup.controllers").exists() {
        CgroupVersion::V2
    } else {
        CgroupVersion::V1
    }
}

/// The v1 controllers the runtime manages.
const V1_CONTROLLERS: [&str; 2] = ["memory", "cpu"];

/// Handle to the cgroup nodes owned by one container.
#[derive(Debug)]
pub struct CgroupController {
    root: PathBuf,
    version: CgroupVersion,
    container_id: String,
}

impl CgroupController {
    /// Creates the cgroup directories for the given container.
    ///
    /// On v2 this is `<root>/cask/<id>/`; on v1 one directory per managed
    /// controller.
    ///
    /// # Errors
    ///
    /// Returns an error if a cgroup directory cannot be created.
    pub fn create(root: impl Into<PathBuf>, container_id: &str) -> Result<Self> {
        let root = root.into();
        let version = detect_version(&root);
        let controller = Self {
            root,
            version,
            container_id: container_id.to_string(),
        };
        for dir in controller.node_dirs() {
            std::fs::create_dir_all(&dir).map_err(|e| CaskError::io(&dir, e))?;
        }
        tracing::debug!(id = %controller.container_id, version = ?version, "cgroup created");
        Ok(controller)
    }

    /// Builds a handle to an existing container's cgroup without creating
    /// anything, for teardown paths.
    #[must_use]
    pub fn open(root: impl Into<PathBuf>, container_id: &str) -> Self {
        let root = root.into();
        let version = detect_version(&root);
        Self {
            root,
            version,
            container_id: container_id.to_string(),
        }
    }

    /// Applies the given resource limits by writing the control files.
    ///
    /// # Errors
    ///
    /// Returns an error if any control file cannot be written.
    pub fn apply(&self, limits: &ResourceLimits) -> Result<()> {
        match self.version {
            CgroupVersion::V2 => {
                let dir = self.v2_dir();
                if let Some(bytes) = limits.memory_bytes {
                    memory::set_memory_max(&dir, bytes)?;
                }
                if let Some(shares) = limits.cpu_shares {
                    cpu::set_cpu_weight(&dir, cpu::weight_from_shares(shares))?;
                }
            }
            CgroupVersion::V1 => {
                if let Some(bytes) = limits.memory_bytes {
                    memory::set_limit_in_bytes(&self.v1_dir("memory"), bytes)?;
                }
                if let Some(shares) = limits.cpu_shares {
                    cpu::set_cpu_shares(&self.v1_dir("cpu"), shares)?;
                }
            }
        }
        Ok(())
    }

    /// Registers a process in the container's cgroup.
    ///
    /// On v2 the PID is written to `cgroup.procs`; on v1 to the `tasks`
    /// file of every managed controller.
    ///
    /// # Errors
    ///
    /// Returns an error if a membership file cannot be written.
    pub fn add_process(&self, pid: u32) -> Result<()> {
        let pid = pid.to_string();
        match self.version {
            CgroupVersion::V2 => {
                let procs = self.v2_dir().join("cgroup.procs");
                std::fs::write(&procs, &pid).map_err(|e| CaskError::io(&procs, e))?;
            }
            CgroupVersion::V1 => {
                for controller in V1_CONTROLLERS {
                    let tasks = self.v1_dir(controller).join("tasks");
                    std::fs::write(&tasks, &pid).map_err(|e| CaskError::io(&tasks, e))?;
                }
            }
        }
        tracing::debug!(pid = %pid, "process added to cgroup");
        Ok(())
    }

    /// Removes the container's cgroup directories.
    ///
    /// Uses `rmdir` semantics: cgroup nodes hold kernel-owned virtual files
    /// that cannot be unlinked, but an empty node can be removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a node still has member processes or children.
    pub fn destroy(&self) -> Result<()> {
        for dir in self.node_dirs() {
            if dir.exists() {
                std::fs::remove_dir(&dir).map_err(|e| CaskError::io(&dir, e))?;
            }
        }
        tracing::debug!(id = %self.container_id, "cgroup destroyed");
        Ok(())
    }

    /// Directory of the container's node on the unified hierarchy.
    #[must_use]
    pub fn v2_dir(&self) -> PathBuf {
        self.root.join(APP_NAME).join(&self.container_id)
    }

    /// Directory of the container's node for one v1 controller.
    #[must_use]
    pub fn v1_dir(&self, controller: &str) -> PathBuf {
        self.root
            .join(controller)
            .join(APP_NAME)
            .join(&self.container_id)
    }

    fn node_dirs(&self) -> Vec<PathBuf> {
        match self.version {
            CgroupVersion::V2 => vec![self.v2_dir()],
            CgroupVersion::V1 => V1_CONTROLLERS.iter().map(|c| self.v1_dir(c)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v2_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("cgroup.controllers"), "cpu memory\n").expect("marker");
        dir
    }

    #[test]
    fn detect_version_v2_when_controllers_file_present() {
        let root = v2_root();
        assert_eq!(detect_version(root.path()), CgroupVersion::V2);
    }

    #[test]
    fn detect_version_v1_otherwise() {
        let root = tempfile::tempdir().expect("tempdir");
        assert_eq!(detect_version(root.path()), CgroupVersion::V1);
    }

    #[test]
    fn v2_apply_writes_memory_max_and_cpu_weight() {
        let root = v2_root();
        let cg = CgroupController::create(root.path(), "c1").expect("create");
        cg.apply(&ResourceLimits {
            memory_bytes: Some(67_108_864),
            cpu_shares: Some(1024),
        })
        .expect("apply");

        let node = root.path().join("cask").join("c1");
        assert_eq!(
            std::fs::read_to_string(node.join("memory.max")).expect("memory.max"),
            "67108864"
        );
        let weight: u64 = std::fs::read_to_string(node.join("cpu.weight"))
            .expect("cpu.weight")
            .parse()
            .expect("number");
        assert_eq!(weight, cpu::weight_from_shares(1024));
    }

    #[test]
    fn v1_apply_writes_per_controller_files() {
        let root = tempfile::tempdir().expect("tempdir");
        let cg = CgroupController::create(root.path(), "c1").expect("create");
        cg.apply(&ResourceLimits {
            memory_bytes: Some(1024),
            cpu_shares: Some(512),
        })
        .expect("apply");

        let mem = root.path().join("memory/cask/c1/memory.limit_in_bytes");
        let cpu = root.path().join("cpu/cask/c1/cpu.shares");
        assert_eq!(std::fs::read_to_string(mem).expect("mem"), "1024");
        assert_eq!(std::fs::read_to_string(cpu).expect("cpu"), "512");
    }

    #[test]
    fn add_process_v1_writes_tasks_in_both_controllers() {
        let root = tempfile::tempdir().expect("tempdir");
        let cg = CgroupController::create(root.path(), "c1").expect("create");
        cg.add_process(4242).expect("add");

        for controller in ["memory", "cpu"] {
            let tasks = root.path().join(controller).join("cask/c1/tasks");
            assert_eq!(std::fs::read_to_string(tasks).expect("tasks"), "4242");
        }
    }

    #[test]
    fn add_process_v2_writes_cgroup_procs() {
        let root = v2_root();
        let cg = CgroupController::create(root.path(), "c1").expect("create");
        cg.add_process(7).expect("add");
        let procs = root.path().join("cask/c1/cgroup.procs");
        assert_eq!(std::fs::read_to_string(procs).expect("procs"), "7");
    }

    #[test]
    fn destroy_removes_empty_nodes() {
        let root = v2_root();
        let cg = CgroupController::create(root.path(), "c1").expect("create");
        cg.destroy().expect("destroy");
        assert!(!root.path().join("cask/c1").exists());
    }
}
