//! CPU resource control files.

use std::path::Path;

use cask_common::error::{CaskError, Result};

/// Lowest Docker-style CPU shares value.
const SHARES_MIN: u64 = 2;
/// Highest Docker-style CPU shares value.
const SHARES_MAX: u64 = 262_144;
/// Lowest v2 `cpu.weight` value.
const WEIGHT_MIN: u64 = 1;
/// Highest v2 `cpu.weight` value.
const WEIGHT_MAX: u64 = 10_000;

/// Converts Docker-style CPU shares (v1 range 2..=262144) to a v2
/// `cpu.weight` (range 1..=10000).
///
/// The mapping is linear across the two ranges and monotonic; shares
/// outside the v1 range are clamped to its endpoints, so 2 and below map
/// to weight 1 and 262144 and above map to weight 10000.
#[must_use]
pub fn weight_from_shares(shares: u64) -> u64 {
    let shares = shares.clamp(SHARES_MIN, SHARES_MAX);
    WEIGHT_MIN + (shares - SHARES_MIN) * (WEIGHT_MAX - WEIGHT_MIN) / (SHARES_MAX - SHARES_MIN)
}

/// Sets the CPU weight on a v2 node by writing `cpu.weight`.
///
/// # Errors
///
/// Returns an error if writing to `cpu.weight` fails.
pub fn set_cpu_weight(node: &Path, weight: u64) -> Result<()> {
    let file = node.join("cpu.weight");
    std::fs::write(&file, weight.to_string()).map_err(|e| CaskError::io(&file, e))?;
    tracing::debug!(weight, "cpu weight set (v2)");
    Ok(())
}

/// Sets the CPU shares on a v1 node by writing `cpu.shares` verbatim.
///
/// # Errors
///
/// Returns an error if writing to `cpu.shares` fails.
pub fn set_cpu_shares(node: &Path, shares: u64) -> Result<()> {
    let file = node.join("cpu.shares");
    std::fs::write(&file, shares.to_string()).map_err(|e| CaskError::io(&file, e))?;
    tracing::debug!(shares, "cpu shares set (v1)");
    Ok(())
}
