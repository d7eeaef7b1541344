//! Memory resource control files.

use std::path::Path;

use cask_common::error::{CaskError, Result};

/// Sets the hard memory limit on a v2 node by writing `memory.max`.
///
/// Processes exceeding this limit are subject to the OOM killer.
///
/// # Errors
///
/// Returns an error if writing to `memory.max` fails.
pub fn set_memory_max(node: &Path, bytes: u64) -> Result<()> {
    let file = node.join("memory.max");
    std::fs::write(&file, bytes.to_string()).map_err(|e| CaskError::io(&file, e))?;
    tracing::debug!(bytes, "memory limit set (v2)");
    Ok(())
}

/// Sets the hard memory limit on a v1 node by writing `memory.limit_in_bytes`.
///
/// # Errors
///
/// Returns an error if writing to `memory.limit_in_bytes` fails.
pub fn set_limit_in_bytes(node: &Path, bytes: u64) -> Result<()> {
    let file = node.join("memory.limit_in_bytes");
    std::fs::write(&file, bytes.to_string()).map_err(|e| CaskError::io(&file, e))?;
    tracing::debug!(bytes, "memory limit set (v1)");
    Ok(())
}
