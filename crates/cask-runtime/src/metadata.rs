//! Persistent per-container metadata.
//!
//! Each container owns `containers/<id>/metadata/container.json`, rewritten
//! in place on every state transition. Listings take a snapshot view and
//! skip records that fail to read or parse rather than aborting, so a
//! half-written file from a concurrent supervisor never breaks `ps`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use cask_common::error::{CaskError, Result};
use cask_common::types::{ContainerId, ContainerState};

/// On-disk record of one container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerRecord {
    /// Container identifier; also the directory name.
    #[serde(rename = "ID")]
    pub id: ContainerId,
    /// Image reference or rootfs path, as given at run time.
    #[serde(rename = "Image")]
    pub image: String,
    /// Command vector the container was started with.
    #[serde(rename = "Command")]
    pub command: Vec<String>,
    /// Current lifecycle state.
    #[serde(rename = "Status")]
    pub status: ContainerState,
    /// PID of the supervised child while running.
    #[serde(rename = "Pid", skip_serializing_if = "Option::is_none", default)]
    pub pid: Option<u32>,
    /// RFC 3339 timestamp of the last metadata write.
    #[serde(rename = "Updated")]
    pub updated: String,
}

impl ContainerRecord {
    /// Creates a fresh record in the `Created` state.
    #[must_use]
    pub fn new(id: ContainerId, image: String, command: Vec<String>) -> Self {
        Self {
            id,
            image,
            command,
            status: ContainerState::Created,
            pid: None,
            updated: Utc::now().to_rfc3339(),
        }
    }

    /// Stamps the record with the current time.
    pub fn touch(&mut self) {
        self.updated = Utc::now().to_rfc3339();
    }
}

/// Path of a container's metadata file.
#[must_use]
pub fn metadata_path(containers_dir: &Path, id: &ContainerId) -> PathBuf {
    containers_dir
        .join(id.as_str())
        .join("metadata")
        .join("container.json")
}

/// Writes the record, creating the metadata directory if needed.
///
/// The file is rewritten in place; readers tolerate partial writes by
/// skipping unparseable records.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save(containers_dir: &Path, record: &ContainerRecord) -> Result<()> {
    let path = metadata_path(containers_dir, &record.id);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CaskError::io(parent, e))?;
    }
    let json = serde_json::to_string(record)?;
    std::fs::write(&path, json).map_err(|e| CaskError::io(&path, e))?;
    tracing::debug!(id = %record.id, status = %record.status, "metadata saved");
    Ok(())
}

/// Loads one container's record.
///
/// # Errors
///
/// Returns `NotFound` when no metadata file exists for the ID, an I/O
/// error if it cannot be read, or a serialization error if it does not
/// parse.
pub fn load(containers_dir: &Path, id: &ContainerId) -> Result<ContainerRecord> {
    let path = metadata_path(containers_dir, id);
    if !path.exists() {
        return Err(CaskError::NotFound {
            kind: "container",
            id: id.to_string(),
        });
    }
    let content = std::fs::read_to_string(&path).map_err(|e| CaskError::io(&path, e))?;
    Ok(serde_json::from_str(&content)?)
}

/// Lists all containers with readable metadata.
///
/// Records that fail to read or parse are skipped. A record claiming to be
/// `running` whose PID is gone is reported as `stopped`, since the
/// supervisor that owned it may have crashed before its final metadata
/// write.
///
/// # Errors
///
/// Returns an error only if the containers directory exists but cannot be
/// read.
pub fn list_containers(containers_dir: &Path) -> Result<Vec<ContainerRecord>> {
    if !containers_dir.exists() {
        return Ok(Vec::new());
    }
    let entries =
        std::fs::read_dir(containers_dir).map_err(|e| CaskError::io(containers_dir, e))?;

    let mut records = Vec::new();
    for entry in entries.flatten() {
        if !entry.path().is_dir() {
            continue;
        }
        let id = ContainerId::new(entry.file_name().to_string_lossy());
        match load(containers_dir, &id) {
            Ok(mut record) => {
                if record.status == ContainerState::Running
                    && !record.pid.is_some_and(is_pid_alive)
                {
                    record.status = ContainerState::Stopped;
                }
                records.push(record);
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "skipping unreadable container record");
            }
        }
    }
    records.sort_by(|a, b| a.updated.cmp(&b.updated));
    Ok(records)
}

/// Probes `/proc/<pid>` for process liveness.
#[cfg(target_os = "linux")]
#[must_use]
pub fn is_pid_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

/// Non-Linux fallback: assume the recorded state is accurate.
#[cfg(not(target_os = "linux"))]
#[must_use]
pub fn is_pid_alive(_pid: u32) -> bool {
    true
}
