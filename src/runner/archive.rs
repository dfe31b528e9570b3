//! Zip extraction
//!
//! Used by `unzip` and by `download_github`.

use crate::config::UnzipOptions;
use crate::error::{DeployError, ExecutionError};
use crate::runner::fs::blocking;
use crate::runner::sandbox::require_path;
use crate::runner::Sandbox;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

fn open(path: &Path) -> Result<ZipArchive<File>, DeployError> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(file)?)
}

/// Extract every entry into `destination`, replacing existing files.
///
/// Entries whose names would land outside `destination` are skipped.
pub fn extract_into(archive: &mut ZipArchive<File>, destination: &Path) -> Result<usize, DeployError> {
    fs::create_dir_all(destination)?;

    let mut extracted = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(rel) = entry.enclosed_name() else {
            tracing::warn!(entry = entry.name(), "skipping archive entry outside destination");
            continue;
        };
        let target = destination.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        extracted += 1;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode().map(|m| m & 0o777).filter(|m| *m != 0) {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode | 0o600))?;
        }
    }
    Ok(extracted)
}

/// Extract a whole archive file
pub fn extract_file(archive_path: &Path, destination: &Path) -> Result<usize, DeployError> {
    let mut archive = open(archive_path)?;
    extract_into(&mut archive, destination)
}

/// Extract a repository snapshot and return the name of its top-level
/// directory.
///
/// The first entry must exist and be a directory; anything else means the
/// archive is not shaped like a snapshot.
pub fn extract_snapshot(archive_path: &Path, destination: &Path) -> Result<String, DeployError> {
    let mut archive = open(archive_path)?;

    let shape_error = || ExecutionError::UnexpectedArchiveShape(archive_path.to_path_buf());
    if archive.len() == 0 {
        return Err(shape_error().into());
    }
    let top = {
        let first = archive.by_index(0)?;
        if !first.is_dir() {
            return Err(shape_error().into());
        }
        let rel = first.enclosed_name().ok_or_else(shape_error)?;
        let mut components = rel.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => {
                name.to_str().ok_or_else(shape_error)?.to_string()
            }
            _ => return Err(shape_error().into()),
        }
    };

    extract_into(&mut archive, destination)?;
    Ok(top)
}

pub async fn unzip(options: &UnzipOptions, sandbox: &Sandbox) -> Result<(), DeployError> {
    let source: PathBuf = sandbox.resolve(require_path("source", &options.source, false)?);
    let destination = sandbox.resolve(require_path("destination", &options.destination, true)?);

    tracing::debug!(
        source = %source.display(),
        destination = %destination.display(),
        "extracting archive"
    );
    let count = blocking(move || extract_file(&source, &destination)).await?;
    tracing::debug!(files = count, "extraction finished");
    Ok(())
}
