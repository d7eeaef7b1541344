//! Formatted output helpers for CLI commands.
//!
//! Provides the memory-limit grammar, human-readable byte formatting, and
//! the column truncation rules used by `images` and `ps`.

use cask_common::error::{CaskError, Result};

/// Parses a memory limit with an optional `k`/`m`/`g` suffix
/// (case-insensitive, powers of 1024) into bytes.
///
/// # Errors
///
/// Returns a usage error for non-numeric input.
pub fn parse_bytes(input: &str) -> Result<u64> {
    const KIB: u64 = 1024;

    let lower = input.trim().to_ascii_lowercase();
    let (digits, multiplier) = if let Some(rest) = lower.strip_suffix('k') {
        (rest, KIB)
    } else if let Some(rest) = lower.strip_suffix('m') {
        (rest, KIB * KIB)
    } else if let Some(rest) = lower.strip_suffix('g') {
        (rest, KIB * KIB * KIB)
    } else {
        (lower.as_str(), 1)
    };

    digits
        .parse::<u64>()
        .map(|value| value * multiplier)
        .map_err(|_| CaskError::Usage {
            message: format!("invalid memory limit format: {input}"),
        })
}

/// Formats a byte count into a human-readable string (e.g., "128.0 MiB").
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Truncates a command string to `width` characters, ending in `…` when
/// anything was cut.
#[must_use]
pub fn truncate_command(command: &str, width: usize) -> String {
    if command.chars().count() <= width {
        return command.to_string();
    }
    let mut truncated: String = command.chars().take(width.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Returns the 12-character prefix of an identifier.
#[must_use]
pub fn short_id(id: &str) -> &str {
    let end = id
        .char_indices()
        .nth(12)
        .map_or(id.len(), |(offset, _)| offset);
    &id[..end]
}
