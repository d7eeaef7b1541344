//! Global configuration model for the cask runtime.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::types::ResourceLimits;

/// Root configuration for a cask invocation.
///
/// The data directory anchors both the image store and the container state
/// tree; it defaults to the current working directory so the on-disk layout
/// is `./images/` and `./containers/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaskConfig {
    /// Base directory for images and container state.
    pub data_dir: PathBuf,
    /// Default resource limits applied when the caller sets none.
    pub default_limits: ResourceLimits,
}

impl CaskConfig {
    /// Creates a configuration anchored at the given data directory.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            default_limits: ResourceLimits::default(),
        }
    }

    /// Path of the image store root.
    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join(constants::IMAGES_DIR)
    }

    /// Path of the container state root.
    #[must_use]
    pub fn containers_dir(&self) -> PathBuf {
        self.data_dir.join(constants::CONTAINERS_DIR)
    }

    /// Returns the data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for CaskConfig {
    fn default() -> Self {
        Self::with_data_dir(".")
    }
}
