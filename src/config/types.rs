//! Task option types
//!
//! Options arrive as loosely typed data (YAML or JSON fragments handed over
//! by the orchestrator). These structures are what each task sees after
//! the boundary has normalised them.

use serde::{Deserialize, Serialize};

/// Options for `ensure_dir`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnsureDirOptions {
    /// Directory to create
    #[serde(default)]
    pub path: Option<String>,
}

/// Options for `remove_path`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RemovePathOptions {
    /// File or directory to remove
    #[serde(default)]
    pub path: Option<String>,
}

/// Options shared by `move_path` and `copy_path`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransferOptions {
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub destination: Option<String>,

    /// Replace an existing destination
    #[serde(default, deserialize_with = "deserialize_loose_bool")]
    pub overwrite: bool,
}

/// Options for `write_file`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WriteFileOptions {
    #[serde(default)]
    pub path: Option<String>,

    /// Text to write
    #[serde(default)]
    pub data: Option<String>,

    /// Append instead of replacing the file
    #[serde(default, deserialize_with = "deserialize_loose_bool")]
    pub append: bool,
}

/// Options for `unzip`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UnzipOptions {
    /// Archive to extract
    #[serde(default)]
    pub source: Option<String>,

    /// Directory to extract into
    #[serde(default)]
    pub destination: Option<String>,
}

/// How `replace_string` rewrites a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceMode {
    /// Regex search, replacement goes through variable substitution
    #[default]
    Template,

    /// Regex search, replacement used as written
    Literal,

    /// Substitute every known variable across the whole file
    AllVars,
}

/// Options for `replace_string`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReplaceStringOptions {
    /// One path or a list of paths, processed in order
    #[serde(default, alias = "paths", deserialize_with = "deserialize_paths")]
    pub path: Vec<String>,

    /// Regular expression to search for
    #[serde(default)]
    pub search: Option<String>,

    /// Replacement text
    #[serde(default)]
    pub replace: Option<String>,

    #[serde(default)]
    pub mode: ReplaceMode,
}

/// Options for `download_file`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DownloadFileOptions {
    #[serde(default)]
    pub url: Option<String>,

    /// File to stream the body into
    #[serde(default)]
    pub destination: Option<String>,
}

/// Options for `download_github`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DownloadGithubOptions {
    /// `owner/repo`, optionally prefixed with a host URL or `@`
    #[serde(default)]
    pub source: Option<String>,

    /// Branch, tag or commit (defaults to `master`)
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,

    /// Directory inside the repository to keep
    #[serde(default)]
    pub subpath: Option<String>,

    #[serde(default)]
    pub destination: Option<String>,

    #[serde(default, deserialize_with = "deserialize_loose_bool")]
    pub overwrite: bool,
}

/// Options for `connect_database`; everything comes from the context
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConnectDatabaseOptions {}

/// Options for `query_database`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryDatabaseOptions {
    /// Inline SQL
    #[serde(default)]
    pub query: Option<String>,

    /// SQL file below the base directory
    #[serde(default)]
    pub file: Option<String>,
}

/// Options for `load_vars`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoadVarsOptions {
    /// JSON file below the base directory
    #[serde(default)]
    pub file: Option<String>,

    /// Inline variables
    #[serde(default)]
    pub vars: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Options for `dump_context`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DumpContextOptions {}

/// Options for `wait`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WaitOptions {
    /// Delay in milliseconds
    #[serde(default = "default_wait_ms")]
    pub ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        WaitOptions {
            ms: default_wait_ms(),
        }
    }
}

fn default_wait_ms() -> u64 {
    1000
}

/// Options for `fail`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FailOptions {
    #[serde(default)]
    pub message: Option<String>,
}

/// Accept `true` as well as the string `"true"`; anything else is false
fn deserialize_loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::Bool(b) => Ok(b),
        Value::String(s) => Ok(s == "true"),
        _ => Ok(false),
    }
}

/// Accept a single path or a list of paths
fn deserialize_paths<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::String(s) => Ok(vec![s]),
        Value::Sequence(seq) => {
            let mut paths = Vec::new();
            for item in seq {
                match item {
                    Value::String(s) => paths.push(s),
                    _ => return Err(D::Error::custom("every path must be a string")),
                }
            }
            Ok(paths)
        }
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("path must be a string or array of strings")),
    }
}
