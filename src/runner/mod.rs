//! Task execution engine
//!
//! This module holds the deployment context, the path sandbox, variable
//! substitution and the task implementations.

pub mod archive;
pub mod context;
pub mod database;
pub mod debug;
pub mod download;
pub mod fs;
pub mod github;
pub mod interpolate;
pub mod mysql;
pub mod replace;
pub mod sandbox;
pub mod task;
pub mod vars;

// Re-export main types
pub use context::*;
pub use database::{DatabaseConnection, DatabaseConnector, DatabaseSettings, ServerTarget};
pub use github::RepoSource;
pub use interpolate::*;
pub use sandbox::{is_valid_path, Sandbox};
pub use task::*;
