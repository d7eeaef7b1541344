//! Buildfile evaluation against a freshly created rootfs.
//!
//! Instructions are applied in order. Filesystem-affecting commands
//! (`FROM`, `COPY`, `ADD`, `ENV`) mutate the target rootfs; the
//! configuration commands (`WORKDIR`, `EXPOSE`, `CMD`, `ENTRYPOINT`)
//! accumulate into a [`BuildConfig`] the store records in the image
//! sidecar. `RUN` is logged and never executed against the host.
//!
//! Destination paths are confined to the target rootfs: a `COPY`/`ADD`
//! `<dst>` is interpreted relative to the rootfs even when written
//! absolute, and any `..` segment is rejected so an instruction can never
//! write outside the image tree.

use std::path::{Component, Path, PathBuf};

use cask_buildfile::Instruction;
use cask_common::error::{CaskError, Result};
use cask_common::types::ImageReference;

use crate::store::ImageStore;

/// Image configuration accumulated from non-filesystem instructions.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    /// Working directory recorded by `WORKDIR`.
    pub workdir: Option<String>,
    /// Ports recorded by `EXPOSE`, in order.
    pub exposed_ports: Vec<String>,
    /// Default command recorded by `CMD`.
    pub cmd: Option<String>,
    /// Entrypoint recorded by `ENTRYPOINT`.
    pub entrypoint: Option<String>,
}

/// Applies `instructions` to `rootfs`.
///
/// `store` resolves `FROM` base references; `context` is the directory
/// `COPY`/`ADD` sources are read from.
///
/// # Errors
///
/// Returns a parse error (carrying the instruction's 1-based line) for
/// malformed or unknown instructions, `NotFound` for an unresolvable
/// `FROM` reference, and I/O errors for failed filesystem operations.
pub fn evaluate(
    store: &ImageStore,
    instructions: &[Instruction],
    rootfs: &Path,
    context: &Path,
) -> Result<BuildConfig> {
    let mut config = BuildConfig::default();

    for instruction in instructions {
        tracing::debug!(step = %instruction, line = instruction.line, "applying instruction");
        match instruction.command.as_str() {
            "FROM" => apply_from(store, instruction, rootfs)?,
            "RUN" => {
                tracing::info!(command = %instruction.args, "RUN recorded, not executed");
            }
            "COPY" | "ADD" => apply_copy(instruction, rootfs, context)?,
            "ENV" => apply_env(instruction, rootfs)?,
            "WORKDIR" => config.workdir = Some(instruction.args.clone()),
            "EXPOSE" => config.exposed_ports.push(instruction.args.clone()),
            "CMD" => config.cmd = Some(instruction.args.clone()),
            "ENTRYPOINT" => config.entrypoint = Some(instruction.args.clone()),
            other => {
                return Err(CaskError::Parse {
                    line: instruction.line,
                    message: format!("unknown instruction {other}"),
                });
            }
        }
    }

    Ok(config)
}

/// `FROM scratch` starts from an empty base; any other reference must
/// resolve in the local store and has its rootfs copied into the target.
fn apply_from(store: &ImageStore, instruction: &Instruction, rootfs: &Path) -> Result<()> {
    if instruction.args == "scratch" {
        tracing::info!("starting from scratch base");
        return Ok(());
    }
    let reference = ImageReference::parse(&instruction.args)?;
    let base = store.locate(&reference)?;
    tracing::info!(base = %reference, "importing base rootfs");
    copy_tree(&base.rootfs, rootfs)
}

fn apply_copy(instruction: &Instruction, rootfs: &Path, context: &Path) -> Result<()> {
    let Some((src, dst)) = instruction.args.split_once(char::is_whitespace) else {
        return Err(CaskError::Parse {
            line: instruction.line,
            message: format!("{} requires a source and a destination", instruction.command),
        });
    };
    let src = context.join(src.trim());
    let dst = rootfs.join(rootfs_relative(dst.trim(), instruction.line)?);

    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CaskError::io(parent, e))?;
    }
    std::fs::copy(&src, &dst).map_err(|e| CaskError::io(&src, e))?;
    tracing::debug!(src = %src.display(), dst = %dst.display(), "copied into rootfs");
    Ok(())
}

fn apply_env(instruction: &Instruction, rootfs: &Path) -> Result<()> {
    if !instruction.args.contains('=') {
        return Err(CaskError::Parse {
            line: instruction.line,
            message: format!("ENV requires KEY=VALUE, got {:?}", instruction.args),
        });
    }
    let env_file = rootfs.join("etc").join("environment");
    if let Some(parent) = env_file.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CaskError::io(parent, e))?;
    }
    let mut content = std::fs::read_to_string(&env_file).unwrap_or_default();
    content.push_str(&instruction.args);
    content.push('\n');
    std::fs::write(&env_file, content).map_err(|e| CaskError::io(&env_file, e))?;
    Ok(())
}

/// Interprets `path` relative to the rootfs even when written absolute.
///
/// `..` segments are rejected outright: the destination must stay inside
/// the rootfs, and resolving parent references against it would let an
/// instruction reach the surrounding store.
fn rootfs_relative(path: &str, line: usize) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                return Err(CaskError::Parse {
                    line,
                    message: format!("destination {path:?} escapes the image rootfs"),
                });
            }
            Component::Normal(part) => relative.push(part),
            Component::Prefix(_) => {}
        }
    }
    Ok(relative)
}

/// Recursively copies the tree at `src` into `dst`.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in walkdir::WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| CaskError::io(src, std::io::Error::other(e)))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| CaskError::io(entry.path(), std::io::Error::other(e)))?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let target = dst.join(rel);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| CaskError::io(&target, e))?;
        } else if file_type.is_symlink() {
            let link = std::fs::read_link(entry.path())
                .map_err(|e| CaskError::io(entry.path(), e))?;
            #[cfg(unix)]
            std::os::unix::fs::symlink(&link, &target)
                .map_err(|e| CaskError::io(&target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| CaskError::io(parent, e))?;
            }
            std::fs::copy(entry.path(), &target).map_err(|e| CaskError::io(entry.path(), e))?;
        }
    }
    Ok(())
}
