//! The `replace_string` task

use crate::config::{ReplaceMode, ReplaceStringOptions};
use crate::error::{DeployError, ValidationError};
use crate::runner::sandbox::check_path;
use crate::runner::{substitute, unresolved, DeploymentContext, Sandbox};
use regex::{NoExpand, Regex};
use serde_json::Value;
use std::collections::HashMap;

/// How one file's content is rewritten
enum Rewrite {
    Template { search: Regex, replace: String },
    Literal { search: Regex, replace: String },
    AllVars,
}

impl Rewrite {
    fn from_options(options: &ReplaceStringOptions) -> Result<Self, ValidationError> {
        if options.mode == ReplaceMode::AllVars {
            return Ok(Rewrite::AllVars);
        }
        let search = options.compile_search()?;
        let replace = options
            .replace
            .clone()
            .ok_or(ValidationError::MissingOption("replace"))?;
        Ok(match options.mode {
            ReplaceMode::Literal => Rewrite::Literal { search, replace },
            _ => Rewrite::Template { search, replace },
        })
    }

    fn apply(&self, content: &str, vars: &HashMap<String, Value>) -> String {
        match self {
            Rewrite::Template { search, replace } => {
                let replacement = substitute(replace, vars);
                search.replace_all(content, replacement.as_str()).into_owned()
            }
            Rewrite::Literal { search, replace } => {
                search.replace_all(content, NoExpand(replace)).into_owned()
            }
            Rewrite::AllVars => substitute(content, vars),
        }
    }
}

/// Rewrite each listed file in order
pub async fn replace_string(
    options: &ReplaceStringOptions,
    sandbox: &Sandbox,
    ctx: &DeploymentContext,
) -> Result<(), DeployError> {
    let rewrite = Rewrite::from_options(options)?;
    if let Rewrite::Template { replace, .. } = &rewrite {
        let missing = unresolved(replace, &ctx.vars);
        if !missing.is_empty() {
            tracing::warn!(?missing, "replacement names unknown variables");
        }
    }

    for path in &options.path {
        check_path("path", path, false)?;
        let file = sandbox.resolve(path);

        let content = tokio::fs::read_to_string(&file).await?;
        let updated = rewrite.apply(&content, &ctx.vars);
        if updated != content {
            tokio::fs::write(&file, updated).await?;
            tracing::debug!(path = %file.display(), "rewrote file");
        } else {
            tracing::debug!(path = %file.display(), "no changes");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(mode: ReplaceMode, search: &str, replace: &str) -> ReplaceStringOptions {
        ReplaceStringOptions {
            path: vec!["f".to_string()],
            search: Some(search.to_string()),
            replace: Some(replace.to_string()),
            mode,
        }
    }

    fn vars() -> HashMap<String, Value> {
        [("host".to_string(), json!("db.local"))].into_iter().collect()
    }

    #[test]
    fn test_template_substitutes_replacement() {
        let rewrite =
            Rewrite::from_options(&options(ReplaceMode::Template, "localhost", "{{host}}")).unwrap();
        assert_eq!(
            rewrite.apply("a=localhost b=localhost", &vars()),
            "a=db.local b=db.local"
        );
    }

    #[test]
    fn test_template_expands_groups() {
        let rewrite =
            Rewrite::from_options(&options(ReplaceMode::Template, r"port=(\d+)", "port=${1}0")).unwrap();
        assert_eq!(rewrite.apply("port=80", &vars()), "port=800");
    }

    #[test]
    fn test_literal_keeps_replacement_verbatim() {
        let rewrite =
            Rewrite::from_options(&options(ReplaceMode::Literal, "X", "{{host}} $1")).unwrap();
        assert_eq!(rewrite.apply("X", &vars()), "{{host}} $1");
    }

    #[test]
    fn test_all_vars_ignores_search() {
        let opts = options(ReplaceMode::AllVars, "(broken", "ignored");
        let rewrite = Rewrite::from_options(&opts).unwrap();
        let content = "host={{host}} port={{port}}";
        assert_eq!(rewrite.apply(content, &vars()), substitute(content, &vars()));
    }
}
