//! The `download_github` task
//!
//! Downloads a zip snapshot of a repository, unpacks it in the staging
//! directory and moves the wanted part of it into place.

use crate::config::DownloadGithubOptions;
use crate::error::{DeployError, ExecutionError, ValidationError, ValidationResult};
use crate::runner::archive::extract_snapshot;
use crate::runner::download::stream_to_file;
use crate::runner::fs::{blocking, move_tree, remove_any};
use crate::runner::sandbox::require_path;
use crate::runner::{DeploymentContext, Sandbox};
use chrono::Utc;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// `[scheme://host/ | github.com/ | @] owner/repo [anything]`
static REPO_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.-]*://[^/]+/|(?:www\.)?github\.com/|@)?([^/\s@]+)/([^/\s?#]+)")
        .expect("repository source pattern is valid")
});

/// Owner and repository name parsed from a source string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSource {
    pub owner: String,
    pub repo: String,
}

impl RepoSource {
    pub fn parse(source: &str) -> ValidationResult<Self> {
        let invalid = || ValidationError::InvalidRepositorySource(source.to_string());

        let caps = REPO_SOURCE.captures(source.trim()).ok_or_else(invalid)?;
        let owner = caps[1].to_string();
        let repo = caps[2].trim_end_matches(".git").to_string();
        if owner.is_empty() || repo.is_empty() {
            return Err(invalid());
        }
        Ok(RepoSource { owner, repo })
    }
}

/// Staging paths for one download, removed when the task ends
struct Staging {
    archive: PathBuf,
    extract_dir: PathBuf,
}

impl Staging {
    fn new(temp_dir: &Path, repo: &str, reference: &str) -> Self {
        let reference: String = reference
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let stem = format!(
            "{}-{}-{}",
            repo,
            reference,
            Utc::now().format("%Y%m%d%H%M%S%f")
        );
        Staging {
            archive: temp_dir.join(format!("{}.zip", stem)),
            extract_dir: temp_dir.join(stem),
        }
    }

    async fn cleanup(self) {
        let Staging { archive, extract_dir } = self;
        let result = blocking(move || {
            remove_any(&archive)?;
            remove_any(&extract_dir)?;
            Ok(())
        })
        .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to clean up download staging");
        }
    }
}

pub async fn download_github(
    options: &DownloadGithubOptions,
    sandbox: &Sandbox,
    ctx: &mut DeploymentContext,
) -> Result<(), DeployError> {
    let source = options.repo_source()?;
    let reference = options.reference();
    let destination = sandbox.resolve(require_path("destination", &options.destination, false)?);
    let subpath = options.subpath.clone().unwrap_or_else(|| ".".to_string());

    let url = ctx.settings.archive_url(&source.owner, &source.repo, reference);
    let client = ctx.http_client()?;
    let staging = Staging::new(&ctx.settings.temp_dir, &source.repo, reference);

    tracing::info!(
        owner = %source.owner,
        repo = %source.repo,
        reference,
        "downloading repository snapshot"
    );
    let result = fetch_and_place(
        &client,
        &url,
        &staging,
        &subpath,
        destination,
        options.overwrite,
    )
    .await;
    staging.cleanup().await;
    result
}

async fn fetch_and_place(
    client: &reqwest::Client,
    url: &str,
    staging: &Staging,
    subpath: &str,
    destination: PathBuf,
    overwrite: bool,
) -> Result<(), DeployError> {
    if let Some(parent) = staging.archive.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = stream_to_file(client, url, &staging.archive).await?;
    tracing::debug!(bytes, archive = %staging.archive.display(), "snapshot downloaded");

    let archive = staging.archive.clone();
    let extract_dir = staging.extract_dir.clone();
    let subpath = subpath.to_string();
    blocking(move || {
        let top = extract_snapshot(&archive, &extract_dir)?;
        let source = Sandbox::new(extract_dir.join(&top)).resolve(&subpath);
        if !source.exists() {
            return Err(ExecutionError::MissingArchivePath(format!("{}/{}", top, subpath)).into());
        }
        tracing::debug!(
            source = %source.display(),
            destination = %destination.display(),
            "placing snapshot"
        );
        move_tree(&source, &destination, overwrite)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> RepoSource {
        RepoSource::parse(source).unwrap()
    }

    #[test]
    fn test_short_form() {
        let src = parse("octocat/Hello-World");
        assert_eq!(src.owner, "octocat");
        assert_eq!(src.repo, "Hello-World");
    }

    #[test]
    fn test_prefixes_and_suffixes() {
        for source in [
            "@octocat/Hello-World",
            "https://github.com/octocat/Hello-World",
            "https://github.com/octocat/Hello-World/tree/main/docs",
            "github.com/octocat/Hello-World",
            "octocat/Hello-World.git",
            "octocat/Hello-World#readme",
        ] {
            let src = parse(source);
            assert_eq!(src.owner, "octocat", "{source}");
            assert_eq!(src.repo, "Hello-World", "{source}");
        }
    }

    #[test]
    fn test_rejects_missing_parts() {
        for source in ["", "octocat", "octocat/", "/Hello-World", "@", "https://github.com/octocat"] {
            assert!(RepoSource::parse(source).is_err(), "{source} should be rejected");
        }
    }

    #[test]
    fn test_staging_names_are_sanitised() {
        let staging = Staging::new(Path::new("/tmp"), "repo", "feature/x");
        let name = staging.archive.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("repo-feature_x-"));
        assert!(name.ends_with(".zip"));
        assert_eq!(staging.extract_dir.parent(), Some(Path::new("/tmp")));
    }
}
