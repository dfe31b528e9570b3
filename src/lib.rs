//! rdeploy - sandboxed deployment tasks
//!
//! A catalog of named deployment operations (downloads, archive extraction,
//! file manipulation, text substitution, database provisioning) that an
//! external orchestrator runs one after another against a shared context.
//! Every path is confined to the recipe's base directory.

// Public modules
pub mod config;
pub mod error;
pub mod runner;

// Re-export commonly used types
pub use error::{DeployError, Result};
pub use runner::{DeploymentContext, TaskSpec};

/// Current version of rdeploy
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
