//! Unified error types for the cask workspace.
//!
//! The runtime distinguishes a closed set of failure kinds so that callers
//! can branch on variants instead of matching message substrings.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CaskError {
    /// The caller supplied malformed or missing arguments.
    #[error("usage error: {message}")]
    Usage {
        /// Description of what was malformed.
        message: String,
    },

    /// A required resource has no local presence.
    #[error("{kind} {id} not found locally")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A buildfile could not be parsed or evaluated.
    #[error("invalid instruction at line {line}: {message}")]
    Parse {
        /// 1-based line number of the offending input.
        line: usize,
        /// The offending text or a description of the problem.
        message: String,
    },

    /// A filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A system call failed.
    #[error("{op}: {source}")]
    Os {
        /// The operation that failed, e.g. `mounting /proc in container`.
        op: String,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The containerized process terminated with a non-zero status.
    #[error("container process exited with status {status}")]
    ChildFailed {
        /// Exit status reported by the child.
        status: i32,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl CaskError {
    /// Builds an `Io` error from a path and source error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds an `Os` error from an operation description and source error.
    pub fn os(op: impl Into<String>, source: impl Into<std::io::Error>) -> Self {
        Self::Os {
            op: op.into(),
            source: source.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_mentions_kind_and_id() {
        let err = CaskError::NotFound {
            kind: "image",
            id: "alpine:latest".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("image"));
        assert!(msg.contains("alpine:latest"));
        assert!(msg.contains("not found locally"));
    }

    #[test]
    fn parse_display_carries_line_number() {
        let err = CaskError::Parse {
            line: 7,
            message: "FROZZLE".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("line 7"));
        assert!(msg.contains("FROZZLE"));
    }

    #[test]
    fn os_display_leads_with_operation() {
        let err = CaskError::os(
            "mounting /proc in container",
            std::io::Error::from_raw_os_error(1),
        );
        let msg = format!("{err}");
        assert!(msg.starts_with("mounting /proc in container: "));
    }

    #[test]
    fn child_failed_carries_status() {
        let err = CaskError::ChildFailed { status: 7 };
        assert!(format!("{err}").contains('7'));
    }

    #[test]
    fn serialization_error_from_serde_json() {
        let serde_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: CaskError = serde_err.into();
        assert!(matches!(err, CaskError::Serialization { .. }));
    }
}
