//! Context utilities: `load_vars` and `dump_context`

use crate::config::{DumpContextOptions, LoadVarsOptions};
use crate::error::{DeployError, ExecutionError, ValidationError};
use crate::runner::{DeploymentContext, Sandbox};
use serde_json::Value;

/// Merge a flat JSON object into the context variables
pub async fn load_vars(
    options: &LoadVarsOptions,
    sandbox: &Sandbox,
    ctx: &mut DeploymentContext,
) -> Result<(), DeployError> {
    let (origin, vars) = match (&options.file, &options.vars) {
        (Some(file), None) => {
            let path = sandbox.resolve(file);
            let text = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<Value>(&text)? {
                Value::Object(map) => (file.clone(), map),
                _ => return Err(ExecutionError::InvalidVarsDocument(file.clone()).into()),
            }
        }
        (None, Some(vars)) => ("inline".to_string(), vars.clone()),
        (Some(_), Some(_)) => {
            return Err(ValidationError::MutuallyExclusive("file", "vars").into())
        }
        (None, None) => return Err(ValidationError::MissingEither("file", "vars").into()),
    };

    let merged = ctx.merge_vars(vars);
    tracing::info!(source = %origin, count = merged, "loaded variables");
    Ok(())
}

/// Log the context with the connection redacted
pub async fn dump_context(
    _options: &DumpContextOptions,
    ctx: &DeploymentContext,
) -> Result<(), DeployError> {
    let snapshot = serde_json::to_string_pretty(&ctx.snapshot())?;
    tracing::info!(context = %snapshot, "context dump");
    Ok(())
}
