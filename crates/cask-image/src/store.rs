//! Flat on-disk image store.
//!
//! Layout:
//!
//! ```text
//! images/<name>:<tag>/
//!     rootfs/                 # the filesystem to chroot into
//!     metadata/image.info     # human-readable sidecar
//! ```
//!
//! An entry is only considered present when its `rootfs/` subtree exists;
//! anything else in the store directory is skipped by listings.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use cask_common::error::{CaskError, Result};
use cask_common::types::ImageReference;

use crate::evaluator::{self, BuildConfig};

/// A locally materialized image.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// The `name:tag` reference.
    pub reference: ImageReference,
    /// Store-assigned identifier.
    pub id: String,
    /// Total byte size of the files under `rootfs/`.
    pub size_bytes: u64,
    /// Informational layer tags.
    pub layers: Vec<String>,
    /// Absolute path of the rootfs directory.
    pub rootfs: PathBuf,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

/// Handle to the image store rooted at `<data_dir>/images`.
#[derive(Debug)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Opens the store at the given root directory.
    ///
    /// The directory is created lazily on first write; a missing root just
    /// lists as empty.
    #[must_use]
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists every materialized image in the store.
    ///
    /// Entries whose directory name does not parse as a reference or that
    /// have no `rootfs/` subtree are skipped, so a listing never fails on
    /// one bad entry.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store root exists but cannot be read.
    pub fn list(&self) -> Result<Vec<ImageRecord>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let entries =
            std::fs::read_dir(&self.root).map_err(|e| CaskError::io(&self.root, e))?;

        let mut images = Vec::new();
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let dir_name = entry.file_name();
            let Ok(reference) = ImageReference::parse(&dir_name.to_string_lossy()) else {
                continue;
            };
            match self.locate(&reference) {
                Ok(record) => images.push(record),
                Err(CaskError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        images.sort_by(|a, b| a.reference.to_string().cmp(&b.reference.to_string()));
        Ok(images)
    }

    /// Resolves a reference to its image record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the entry or its `rootfs/` subtree does not
    /// exist; other failures are I/O errors.
    pub fn locate(&self, reference: &ImageReference) -> Result<ImageRecord> {
        let image_dir = self.image_dir(reference);
        let rootfs = image_dir.join("rootfs");
        if !rootfs.is_dir() {
            return Err(CaskError::NotFound {
                kind: "image",
                id: reference.to_string(),
            });
        }
        let rootfs = std::fs::canonicalize(&rootfs).map_err(|e| CaskError::io(&rootfs, e))?;
        let size_bytes = tree_size(&rootfs)?;
        Ok(ImageRecord {
            reference: reference.clone(),
            id: sidecar_id(&image_dir).unwrap_or_else(|| reference.to_string()),
            size_bytes,
            layers: vec!["base".to_string()],
            rootfs,
            created: created_at(&image_dir),
        })
    }

    /// Builds a new image by evaluating the buildfile at `buildfile`.
    ///
    /// `context` is the directory COPY/ADD sources are resolved against.
    ///
    /// # Errors
    ///
    /// Returns an `AlreadyExists` I/O error when the target entry exists,
    /// a parse error from the buildfile, or any evaluation failure. A
    /// failed build removes the partially created entry.
    pub fn build(
        &self,
        buildfile: &Path,
        reference: &ImageReference,
        context: &Path,
    ) -> Result<ImageRecord> {
        let image_dir = self.image_dir(reference);
        if image_dir.exists() {
            return Err(CaskError::io(
                &image_dir,
                std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("image {reference} already exists"),
                ),
            ));
        }

        let instructions = cask_buildfile::parse_file(buildfile)?;

        let rootfs = image_dir.join("rootfs");
        std::fs::create_dir_all(&rootfs).map_err(|e| CaskError::io(&rootfs, e))?;

        tracing::info!(reference = %reference, steps = instructions.len(), "building image");
        let config = match evaluator::evaluate(self, &instructions, &rootfs, context) {
            Ok(config) => config,
            Err(e) => {
                let _ = std::fs::remove_dir_all(&image_dir);
                return Err(e);
            }
        };

        let record = ImageRecord {
            reference: reference.clone(),
            id: generate_image_id(),
            size_bytes: tree_size(&rootfs)?,
            layers: instructions
                .iter()
                .map(|i| i.command.to_lowercase())
                .collect(),
            rootfs: std::fs::canonicalize(&rootfs).map_err(|e| CaskError::io(&rootfs, e))?,
            created: Utc::now(),
        };
        write_sidecar(&image_dir, &record, &config)?;
        tracing::info!(reference = %reference, id = %record.id, "image built");
        Ok(record)
    }

    /// Removes an image entry and everything under it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the entry does not exist, or an I/O error
    /// if removal fails.
    pub fn remove(&self, reference: &ImageReference) -> Result<()> {
        let image_dir = self.image_dir(reference);
        if !image_dir.exists() {
            return Err(CaskError::NotFound {
                kind: "image",
                id: reference.to_string(),
            });
        }
        std::fs::remove_dir_all(&image_dir).map_err(|e| CaskError::io(&image_dir, e))?;
        tracing::info!(reference = %reference, "image removed");
        Ok(())
    }

    fn image_dir(&self, reference: &ImageReference) -> PathBuf {
        self.root.join(reference.to_string())
    }
}

/// Sums the sizes of all regular files under `path`.
///
/// Directory inodes do not count toward the total.
///
/// # Errors
///
/// Returns an error if the walk encounters an unreadable entry.
pub fn tree_size(path: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in walkdir::WalkDir::new(path) {
        let entry = entry.map_err(|e| CaskError::io(path, std::io::Error::other(e)))?;
        if entry.file_type().is_file() {
            let meta = entry
                .metadata()
                .map_err(|e| CaskError::io(entry.path(), std::io::Error::other(e)))?;
            total += meta.len();
        }
    }
    Ok(total)
}

fn created_at(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_or_else(|_| Utc::now(), DateTime::<Utc>::from)
}

fn generate_image_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}

fn sidecar_id(image_dir: &Path) -> Option<String> {
    let info = std::fs::read_to_string(image_dir.join("metadata").join("image.info")).ok()?;
    info.lines()
        .find_map(|line| line.strip_prefix("ID: "))
        .map(str::to_string)
}

fn write_sidecar(image_dir: &Path, record: &ImageRecord, config: &BuildConfig) -> Result<()> {
    let metadata_dir = image_dir.join("metadata");
    std::fs::create_dir_all(&metadata_dir).map_err(|e| CaskError::io(&metadata_dir, e))?;

    let mut content = format!(
        "Name: {}\nTag: {}\nID: {}\nSize: {} bytes\nCreated: {}\n",
        record.reference.name,
        record.reference.tag,
        record.id,
        record.size_bytes,
        record.created.to_rfc3339(),
    );
    if let Some(workdir) = &config.workdir {
        content.push_str(&format!("Workdir: {workdir}\n"));
    }
    for port in &config.exposed_ports {
        content.push_str(&format!("Expose: {port}\n"));
    }
    if let Some(cmd) = &config.cmd {
        content.push_str(&format!("Cmd: {cmd}\n"));
    }
    if let Some(entrypoint) = &config.entrypoint {
        content.push_str(&format!("Entrypoint: {entrypoint}\n"));
    }

    let info_path = metadata_dir.join("image.info");
    let mut file = std::fs::File::create(&info_path).map_err(|e| CaskError::io(&info_path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| CaskError::io(&info_path, e))?;
    Ok(())
}
