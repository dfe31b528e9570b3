//! Option validation
//!
//! Each task's options are checked here before the task runs. Validation
//! never touches the filesystem, the network or the context.

use crate::config::types::*;
use crate::error::{ValidationError, ValidationResult};
use crate::runner::sandbox::{check_path, require_path};
use crate::runner::RepoSource;
use regex::Regex;

impl EnsureDirOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        require_path("path", &self.path, false)?;
        Ok(())
    }
}

impl RemovePathOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        require_path("path", &self.path, false)?;
        Ok(())
    }
}

impl TransferOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        require_path("source", &self.source, true)?;
        require_path("destination", &self.destination, false)?;
        Ok(())
    }
}

impl WriteFileOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        require_path("path", &self.path, false)?;
        match self.data.as_deref() {
            Some(data) if !data.is_empty() => Ok(()),
            _ => Err(ValidationError::EmptyData),
        }
    }
}

impl UnzipOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        require_path("source", &self.source, false)?;
        require_path("destination", &self.destination, true)?;
        Ok(())
    }
}

impl ReplaceStringOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.path.is_empty() {
            return Err(ValidationError::MissingOption("path"));
        }
        for path in &self.path {
            check_path("path", path, false)?;
        }

        if self.mode == ReplaceMode::AllVars {
            return Ok(());
        }

        self.compile_search()?;
        if self.replace.is_none() {
            return Err(ValidationError::MissingOption("replace"));
        }
        Ok(())
    }

    /// Compile the search pattern, rejecting a missing or empty one
    pub fn compile_search(&self) -> ValidationResult<Regex> {
        let pattern = match self.search.as_deref() {
            Some(pattern) if !pattern.is_empty() => pattern,
            _ => return Err(ValidationError::MissingOption("search")),
        };
        Regex::new(pattern).map_err(|e| ValidationError::InvalidPattern {
            pattern: pattern.to_string(),
            error: e.to_string(),
        })
    }
}

impl DownloadFileOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        let url = self
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(ValidationError::MissingOption("url"))?;
        check_http_url(url)?;

        let destination = self
            .destination
            .as_deref()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ValidationError::MissingDestinationFilename(String::new()))?;
        check_path("destination", destination, false)?;
        if destination.ends_with(['/', '\\']) {
            return Err(ValidationError::MissingDestinationFilename(
                destination.to_string(),
            ));
        }
        Ok(())
    }
}

impl DownloadGithubOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        self.repo_source()?;
        if let Some(subpath) = &self.subpath {
            check_path("subpath", subpath, true)?;
        }
        require_path("destination", &self.destination, false)?;
        Ok(())
    }

    /// Parse `source` into owner and repository name
    pub fn repo_source(&self) -> ValidationResult<RepoSource> {
        let source = self
            .source
            .as_deref()
            .ok_or(ValidationError::MissingOption("source"))?;
        RepoSource::parse(source)
    }

    /// The git reference to download
    pub fn reference(&self) -> &str {
        self.reference
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or("master")
    }
}

impl ConnectDatabaseOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        Ok(())
    }
}

impl QueryDatabaseOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        match (self.inline_query(), self.file.as_deref()) {
            (Some(_), Some(_)) => Err(ValidationError::MutuallyExclusive("query", "file")),
            (None, None) => Err(ValidationError::MissingEither("query", "file")),
            (None, Some(file)) => check_path("file", file, false),
            (Some(_), None) => Ok(()),
        }
    }

    /// The inline query, treating a blank one as absent
    pub fn inline_query(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.trim().is_empty())
    }
}

impl LoadVarsOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        match (&self.file, &self.vars) {
            (Some(_), Some(_)) => Err(ValidationError::MutuallyExclusive("file", "vars")),
            (None, None) => Err(ValidationError::MissingEither("file", "vars")),
            (Some(file), None) => check_path("file", file, false),
            (None, Some(_)) => Ok(()),
        }
    }
}

impl DumpContextOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        Ok(())
    }
}

impl WaitOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        Ok(())
    }
}

impl FailOptions {
    pub fn validate(&self) -> ValidationResult<()> {
        Ok(())
    }
}

fn check_http_url(url: &str) -> ValidationResult<()> {
    let parsed = reqwest::Url::parse(url).map_err(|e| ValidationError::InvalidUrl {
        url: url.to_string(),
        error: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ValidationError::InvalidUrl {
            url: url.to_string(),
            error: format!("unsupported scheme '{}'", other),
        }),
    }
}
