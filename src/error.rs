//! Error types for rdeploy

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rdeploy operations
pub type Result<T> = std::result::Result<T, DeployError>;

/// Main error type for rdeploy
#[derive(Error, Debug)]
pub enum DeployError {
    /// Task options were rejected before anything ran
    #[error("Invalid options: {0}")]
    Validation(#[from] ValidationError),

    /// A task failed while doing its work
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Option validation errors, raised before any side effect
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Task '{0}' is not defined")]
    UnknownTask(String),

    #[error("Malformed options for task '{task}': {error}")]
    MalformedOptions { task: String, error: String },

    #[error("Option '{0}' is required but not provided")]
    MissingOption(&'static str),

    #[error("Option '{option}' has an unsafe or empty path: '{path}'")]
    UnsafePath { option: &'static str, path: String },

    #[error("Option '{option}' must name a path below the base directory, not the base itself")]
    RootPath { option: &'static str },

    #[error("Option 'data' must be a non-empty string")]
    EmptyData,

    #[error("Invalid URL '{url}': {error}")]
    InvalidUrl { url: String, error: String },

    #[error("Destination '{0}' does not name a file")]
    MissingDestinationFilename(String),

    #[error("Cannot resolve owner/repo from source '{0}'")]
    InvalidRepositorySource(String),

    #[error("Invalid search pattern '{pattern}': {error}")]
    InvalidPattern { pattern: String, error: String },

    #[error("Options '{0}' and '{1}' are mutually exclusive")]
    MutuallyExclusive(&'static str, &'static str),

    #[error("One of '{0}' or '{1}' is required")]
    MissingEither(&'static str, &'static str),

    #[error("Context variable '{0}' is required for connect_database")]
    MissingContextVar(&'static str),

    #[error("Context variable '{name}' must be a {expected}")]
    MistypedContextVar {
        name: &'static str,
        expected: &'static str,
    },
}

/// Task execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Refusing to remove the base directory '{0}'")]
    RemoveBase(PathBuf),

    #[error("Destination '{0}' already exists (set overwrite to replace it)")]
    DestinationExists(PathBuf),

    #[error("Source '{0}' does not exist")]
    SourceNotFound(PathBuf),

    #[error("HTTP request to '{url}' failed: {error}")]
    Http { url: String, error: String },

    #[error("HTTP request to '{url}' returned status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Unexpected archive layout in '{0}': the first entry must be a single top-level directory")]
    UnexpectedArchiveShape(PathBuf),

    #[error("Path '{0}' was not found inside the downloaded archive")]
    MissingArchivePath(String),

    #[error("No database connection in context; run connect_database first")]
    MissingConnection,

    #[error("A database connection is already open in this context")]
    AlreadyConnected,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Variables document '{0}' must be a JSON object")]
    InvalidVarsDocument(String),

    #[error("Background job failed: {0}")]
    Join(String),

    #[error("{0}")]
    Failed(String),
}

impl From<zip::result::ZipError> for ExecutionError {
    fn from(err: zip::result::ZipError) -> Self {
        ExecutionError::Archive(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ExecutionError {
    fn from(err: tokio::task::JoinError) -> Self {
        ExecutionError::Join(err.to_string())
    }
}

impl From<zip::result::ZipError> for DeployError {
    fn from(err: zip::result::ZipError) -> Self {
        DeployError::Execution(err.into())
    }
}

impl From<tokio::task::JoinError> for DeployError {
    fn from(err: tokio::task::JoinError) -> Self {
        DeployError::Execution(err.into())
    }
}

/// Specialized result type for option validation
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Helper function to determine if an error was raised before the task ran
/// (the orchestrator treats these as recipe configuration mistakes)
pub fn is_validation_error(err: &DeployError) -> bool {
    matches!(err, DeployError::Validation(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_classified() {
        let err: DeployError = ValidationError::EmptyData.into();
        assert!(is_validation_error(&err));

        let err: DeployError = ExecutionError::MissingConnection.into();
        assert!(!is_validation_error(&err));
    }

    #[test]
    fn test_missing_connection_names_prerequisite() {
        let msg = ExecutionError::MissingConnection.to_string();
        assert!(msg.contains("connect_database"));
    }

    #[test]
    fn test_context_var_errors_are_distinct() {
        let missing = ValidationError::MissingContextVar("dbHost").to_string();
        let mistyped = ValidationError::MistypedContextVar {
            name: "dbDelete",
            expected: "boolean",
        }
        .to_string();
        assert!(missing.contains("dbHost"));
        assert!(mistyped.contains("dbDelete"));
        assert!(mistyped.contains("boolean"));
    }
}
