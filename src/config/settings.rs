//! Engine-level settings
//!
//! Knobs that are not per-task options but still vary between deployments
//! (mirrors, test servers, database defaults).

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Settings shared by every task in a run
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Base URL serving repository zip snapshots
    pub codeload_url: String,

    /// Where downloads and extractions are staged
    pub temp_dir: PathBuf,

    /// User agent sent with HTTP requests
    pub user_agent: String,

    /// Character set for created schemas
    pub charset: String,

    /// Collation for created schemas
    pub collation: String,

    /// Written to a download destination before the body arrives
    pub placeholder: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            codeload_url: "https://codeload.github.com".to_string(),
            temp_dir: env::temp_dir(),
            user_agent: format!("rdeploy/{}", crate::VERSION),
            charset: "utf8mb4".to_string(),
            collation: "utf8mb4_unicode_ci".to_string(),
            placeholder: "download in progress".to_string(),
        }
    }
}

impl EngineSettings {
    /// Set the codeload base URL
    pub fn with_codeload_url(mut self, url: impl Into<String>) -> Self {
        self.codeload_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the staging directory
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Set the HTTP user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set charset and collation used by `connect_database`
    pub fn with_collation(mut self, charset: impl Into<String>, collation: impl Into<String>) -> Self {
        self.charset = charset.into();
        self.collation = collation.into();
        self
    }

    /// Zip snapshot URL for a repository at a reference
    pub fn archive_url(&self, owner: &str, repo: &str, reference: &str) -> String {
        format!(
            "{}/{}/{}/zip/{}",
            self.codeload_url.trim_end_matches('/'),
            owner,
            repo,
            reference
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.codeload_url, "https://codeload.github.com");
        assert_eq!(settings.charset, "utf8mb4");
        assert!(settings.user_agent.starts_with("rdeploy/"));
    }

    #[test]
    fn test_archive_url() {
        let settings = EngineSettings::default();
        assert_eq!(
            settings.archive_url("octocat", "Hello-World", "master"),
            "https://codeload.github.com/octocat/Hello-World/zip/master"
        );
    }

    #[test]
    fn test_with_codeload_url_trims_slash() {
        let settings = EngineSettings::default().with_codeload_url("http://127.0.0.1:1234/");
        assert_eq!(
            settings.archive_url("o", "r", "v1"),
            "http://127.0.0.1:1234/o/r/zip/v1"
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings: EngineSettings =
            serde_yaml::from_str("collation: utf8mb4_bin").unwrap();
        assert_eq!(settings.collation, "utf8mb4_bin");
        assert_eq!(settings.charset, "utf8mb4");
    }
}
