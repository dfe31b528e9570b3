//! Parsing of single task invocations
//!
//! The orchestrator owns recipe files; it hands each step over either as a
//! `(name, options)` pair or as a small `{task, options}` document.

use crate::error::{DeployError, ValidationError, ValidationResult};
use crate::runner::TaskSpec;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// One task invocation as written in a recipe
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Step {
    /// Task name
    pub task: String,

    /// Task-specific options
    #[serde(default)]
    pub options: Value,
}

/// Parse a `{task, options}` YAML (or JSON) document into a task
pub fn parse_step(yaml: &str) -> Result<TaskSpec, DeployError> {
    let step: Step = serde_yaml::from_str(yaml)?;
    Ok(TaskSpec::from_options(&step.task, step.options)?)
}

/// Convert a JSON option bag into the YAML value the parser works on
pub fn options_from_json(options: serde_json::Value) -> Result<Value, DeployError> {
    Ok(serde_yaml::to_value(options)?)
}

/// Deserialize an option bag into a task's option type.
///
/// A missing bag (`null`) counts as an empty mapping.
pub fn parse_options<T: DeserializeOwned>(task: &str, options: Value) -> ValidationResult<T> {
    let options = match options {
        Value::Null => Value::Mapping(Default::default()),
        other => other,
    };
    serde_yaml::from_value(options).map_err(|e| ValidationError::MalformedOptions {
        task: task.to_string(),
        error: e.to_string(),
    })
}
