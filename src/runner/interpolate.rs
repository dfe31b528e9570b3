//! Variable substitution for strings
//!
//! This module replaces `{{name}}` placeholders with values from the
//! deployment context.

use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("placeholder pattern is valid"));

/// Render a context value the way it appears inside substituted text
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitute every `{{name}}` whose name is a known variable.
///
/// A single pass: replacement text is not scanned again, and placeholders
/// naming unknown variables are left untouched.
pub fn substitute(template: &str, vars: &HashMap<String, Value>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value_to_string(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Names of placeholders in `template` that have no matching variable
pub fn unresolved(template: &str, vars: &HashMap<String, Value>) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .filter(|name| !vars.contains_key(name))
        .collect()
}
