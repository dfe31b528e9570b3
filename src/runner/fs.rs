//! Filesystem tasks
//!
//! Thin wrappers over single filesystem operations. Every path goes through
//! the sandbox first; the blocking work runs on tokio's blocking pool.

use crate::config::{EnsureDirOptions, RemovePathOptions, TransferOptions, WriteFileOptions};
use crate::error::{DeployError, ExecutionError};
use crate::runner::sandbox::require_path;
use crate::runner::Sandbox;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Run blocking filesystem work off the async runtime and wait for it
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, DeployError>
where
    F: FnOnce() -> Result<T, DeployError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Remove a file or directory tree. Returns false if nothing was there.
pub fn remove_any(path: &Path) -> io::Result<bool> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if meta.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(true)
}

fn create_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Clear the way for a copy or move onto `destination`
fn prepare_destination(destination: &Path, overwrite: bool) -> Result<(), DeployError> {
    if fs::symlink_metadata(destination).is_ok() {
        if !overwrite {
            return Err(ExecutionError::DestinationExists(destination.to_path_buf()).into());
        }
        remove_any(destination)?;
    }
    create_parent(destination)?;
    Ok(())
}

fn check_source(source: &Path, destination: &Path) -> Result<(), DeployError> {
    if !source.exists() {
        return Err(ExecutionError::SourceNotFound(source.to_path_buf()).into());
    }
    if destination.starts_with(source) {
        return Err(ExecutionError::Failed(format!(
            "cannot place '{}' inside itself at '{}'",
            source.display(),
            destination.display()
        ))
        .into());
    }
    // Replacing the destination would delete the source with it.
    if source.starts_with(destination) {
        return Err(ExecutionError::Failed(format!(
            "cannot replace '{}' with its own content '{}'",
            destination.display(),
            source.display()
        ))
        .into());
    }
    Ok(())
}

/// Recreate a symlink as a link instead of copying what it points at
#[cfg(unix)]
fn copy_link(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(link)?, target)
}

#[cfg(not(unix))]
fn copy_link(link: &Path, _target: &Path) -> io::Result<()> {
    tracing::warn!(path = %link.display(), "skipping symlink");
    Ok(())
}

/// Copy a file or directory tree
pub fn copy_tree(source: &Path, destination: &Path, overwrite: bool) -> Result<u64, DeployError> {
    check_source(source, destination)?;
    prepare_destination(destination, overwrite)?;

    let meta = fs::symlink_metadata(source)?;
    if meta.file_type().is_symlink() {
        copy_link(source, destination)?;
        return Ok(1);
    }
    if !meta.is_dir() {
        fs::copy(source, destination)?;
        return Ok(1);
    }

    let mut copied = 0;
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| ExecutionError::Failed(e.to_string()))?;
        let target = destination.join(rel);
        if entry.file_type().is_symlink() {
            create_parent(&target)?;
            copy_link(entry.path(), &target)?;
            copied += 1;
        } else if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            create_parent(&target)?;
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Move a file or directory tree, copying across filesystems when a
/// rename is not possible
pub fn move_tree(source: &Path, destination: &Path, overwrite: bool) -> Result<(), DeployError> {
    check_source(source, destination)?;
    prepare_destination(destination, overwrite)?;

    if let Err(e) = fs::rename(source, destination) {
        tracing::debug!(error = %e, "rename failed, falling back to copy");
        copy_tree(source, destination, true)?;
        remove_any(source)?;
    }
    Ok(())
}

/// Write or append text, creating parent directories
pub fn write_text(path: &Path, data: &str, append: bool) -> io::Result<()> {
    create_parent(path)?;
    if append {
        let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(data.as_bytes())?;
        file.sync_all()
    } else {
        fs::write(path, data)
    }
}

pub async fn ensure_dir(options: &EnsureDirOptions, sandbox: &Sandbox) -> Result<(), DeployError> {
    let path = sandbox.resolve(require_path("path", &options.path, false)?);
    tracing::debug!(path = %path.display(), "ensuring directory");
    tokio::fs::create_dir_all(&path).await?;
    Ok(())
}

pub async fn remove_path(options: &RemovePathOptions, sandbox: &Sandbox) -> Result<(), DeployError> {
    let path = sandbox.resolve(require_path("path", &options.path, false)?);
    if sandbox.is_base(&path) {
        return Err(ExecutionError::RemoveBase(path).into());
    }

    let removed = blocking({
        let path = path.clone();
        move || Ok(remove_any(&path)?)
    })
    .await?;

    if removed {
        tracing::debug!(path = %path.display(), "removed");
    } else {
        tracing::debug!(path = %path.display(), "nothing to remove");
    }
    Ok(())
}

fn transfer_paths(options: &TransferOptions, sandbox: &Sandbox) -> Result<(PathBuf, PathBuf), DeployError> {
    let source = sandbox.resolve(require_path("source", &options.source, true)?);
    let destination = sandbox.resolve(require_path("destination", &options.destination, false)?);
    Ok((source, destination))
}

pub async fn move_path(options: &TransferOptions, sandbox: &Sandbox) -> Result<(), DeployError> {
    let (source, destination) = transfer_paths(options, sandbox)?;
    if sandbox.is_base(&source) {
        return Err(ExecutionError::RemoveBase(source).into());
    }

    tracing::debug!(
        source = %source.display(),
        destination = %destination.display(),
        overwrite = options.overwrite,
        "moving"
    );
    let overwrite = options.overwrite;
    blocking(move || move_tree(&source, &destination, overwrite)).await
}

pub async fn copy_path(options: &TransferOptions, sandbox: &Sandbox) -> Result<(), DeployError> {
    let (source, destination) = transfer_paths(options, sandbox)?;

    tracing::debug!(
        source = %source.display(),
        destination = %destination.display(),
        overwrite = options.overwrite,
        "copying"
    );
    let overwrite = options.overwrite;
    let copied = blocking(move || copy_tree(&source, &destination, overwrite)).await?;
    tracing::debug!(files = copied, "copy finished");
    Ok(())
}

pub async fn write_file(options: &WriteFileOptions, sandbox: &Sandbox) -> Result<(), DeployError> {
    let path = sandbox.resolve(require_path("path", &options.path, false)?);
    let data = options.data.clone().unwrap_or_default();
    let append = options.append;

    tracing::debug!(path = %path.display(), bytes = data.len(), append, "writing file");
    blocking(move || Ok(write_text(&path, &data, append)?)).await
}
