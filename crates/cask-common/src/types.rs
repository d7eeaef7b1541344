//! Domain primitive types used across the cask workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CaskError, Result};

/// Unique identifier for a container instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container ID from an existing string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random container ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the 12-character prefix used in listings.
    #[must_use]
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map_or(self.0.len(), |(offset, _)| offset);
        &self.0[..end]
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `name:tag` pair identifying an image within the local store.
///
/// Rendered on disk as the directory name `<name>:<tag>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference {
    /// Image name.
    pub name: String,
    /// Image tag; `latest` when the reference omitted one.
    pub tag: String,
}

impl ImageReference {
    /// Creates a reference from explicit name and tag parts.
    ///
    /// # Errors
    ///
    /// Returns a usage error if either component is empty or contains
    /// `/` or `:`.
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let tag = tag.into();
        for (label, value) in [("name", &name), ("tag", &tag)] {
            if value.is_empty() {
                return Err(CaskError::Usage {
                    message: format!("image {label} is empty"),
                });
            }
            if value.contains('/') || value.contains(':') {
                return Err(CaskError::Usage {
                    message: format!("image {label} {value:?} contains '/' or ':'"),
                });
            }
        }
        Ok(Self { name, tag })
    }

    /// Parses a `name[:tag]` reference, splitting on the last `:`.
    ///
    /// A missing tag defaults to `latest`.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the name or tag is empty or contains
    /// `/` or `:`.
    pub fn parse(reference: &str) -> Result<Self> {
        match reference.rsplit_once(':') {
            Some((name, tag)) => Self::new(name, tag),
            None => Self::new(reference, "latest"),
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

/// Resource limits applied to a container's cgroup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Memory limit in bytes.
    pub memory_bytes: Option<u64>,
    /// CPU shares (relative weight, Docker range 2..=262144).
    pub cpu_shares: Option<u64>,
}

impl ResourceLimits {
    /// Returns true when no limit is set and cgroup setup can be skipped.
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.memory_bytes.is_none() && self.cpu_shares.is_none()
    }
}

/// Lifecycle state of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    /// Container directory and metadata exist but no process was spawned.
    Created,
    /// The supervised child process was spawned and has not been observed
    /// to exit.
    Running,
    /// The child process terminated.
    Stopped,
    /// The child could not be spawned.
    Failed,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_id_generate_is_unique() {
        let a = ContainerId::generate();
        let b = ContainerId::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn container_id_short_is_twelve_chars() {
        let id = ContainerId::generate();
        assert_eq!(id.short().len(), 12);
    }

    #[test]
    fn container_id_short_tolerates_small_ids() {
        let id = ContainerId::new("abc");
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn reference_parse_splits_name_and_tag() {
        let r = ImageReference::parse("alpine:3.19").expect("parse");
        assert_eq!(r.name, "alpine");
        assert_eq!(r.tag, "3.19");
        assert_eq!(r.to_string(), "alpine:3.19");
    }

    #[test]
    fn reference_parse_defaults_to_latest() {
        let r = ImageReference::parse("alpine").expect("parse");
        assert_eq!(r.name, "alpine");
        assert_eq!(r.tag, "latest");
    }

    #[test]
    fn reference_display_round_trips() {
        let r = ImageReference::parse("demo:v1").expect("parse");
        let again = ImageReference::parse(&r.to_string()).expect("reparse");
        assert_eq!(r, again);
    }

    #[test]
    fn reference_rejects_empty_name() {
        assert!(ImageReference::parse(":v1").is_err());
        assert!(ImageReference::parse("").is_err());
    }

    #[test]
    fn reference_rejects_extra_separators() {
        // splitting on the last colon leaves a colon in the name
        assert!(ImageReference::parse("a:b:c").is_err());
        assert!(ImageReference::parse("a/b:c").is_err());
    }

    #[test]
    fn limits_default_is_unlimited() {
        assert!(ResourceLimits::default().is_unlimited());
        let limited = ResourceLimits {
            memory_bytes: Some(1024),
            cpu_shares: None,
        };
        assert!(!limited.is_unlimited());
    }

    #[test]
    fn container_state_display_is_lowercase() {
        assert_eq!(ContainerState::Created.to_string(), "created");
        assert_eq!(ContainerState::Running.to_string(), "running");
        assert_eq!(ContainerState::Stopped.to_string(), "stopped");
        assert_eq!(ContainerState::Failed.to_string(), "failed");
    }
}
