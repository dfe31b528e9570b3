//! Task option parsing and validation
//!
//! This module turns the loosely typed option bags handed over by the
//! orchestrator into typed task options, and validates them.

pub mod parse;
pub mod schema;
pub mod settings;
pub mod types;

// Re-export main types
pub use parse::*;
pub use settings::*;
pub use types::*;
