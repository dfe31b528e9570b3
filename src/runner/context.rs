//! Deployment context
//!
//! One context lives for a whole recipe run. Tasks read and write its
//! variables, and the database tasks keep the live connection here.

use crate::config::EngineSettings;
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::database::{DatabaseConnection, DatabaseConnector, MySqlConnector};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Context key reserved for the live database connection
pub const CONNECTION_KEY: &str = "dbConnection";

/// State shared by every task in one recipe run
pub struct DeploymentContext {
    /// Variables usable by substitution (including the `db*` settings)
    pub vars: HashMap<String, Value>,

    /// Engine-level settings
    pub settings: EngineSettings,

    /// Live connection opened by `connect_database`
    connection: Option<Box<dyn DatabaseConnection>>,

    /// Opens new database connections
    connector: Arc<dyn DatabaseConnector>,

    /// HTTP client, built on first use
    http: Option<reqwest::Client>,
}

impl DeploymentContext {
    /// Create a new context with default settings and the MySQL connector
    pub fn new() -> Self {
        DeploymentContext {
            vars: HashMap::new(),
            settings: EngineSettings::default(),
            connection: None,
            connector: Arc::new(MySqlConnector),
            http: None,
        }
    }

    /// Replace the engine settings
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self.http = None;
        self
    }

    /// Use a different database connector
    pub fn with_connector(mut self, connector: Arc<dyn DatabaseConnector>) -> Self {
        self.connector = connector;
        self
    }

    /// Set variables
    pub fn with_vars(mut self, vars: HashMap<String, Value>) -> Self {
        self.vars = vars;
        self
    }

    /// Set a single variable
    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Get a variable value
    pub fn get_var(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// Merge a JSON object into the variables, overwriting existing keys.
    ///
    /// The connection key is skipped: a document can never replace the
    /// live connection.
    pub fn merge_vars(&mut self, vars: Map<String, Value>) -> usize {
        let mut merged = 0;
        for (key, value) in vars {
            if key == CONNECTION_KEY {
                tracing::warn!(key = CONNECTION_KEY, "ignoring reserved key in variables");
                continue;
            }
            self.vars.insert(key, value);
            merged += 1;
        }
        merged
    }

    /// The connector used by `connect_database`
    pub fn connector(&self) -> Arc<dyn DatabaseConnector> {
        Arc::clone(&self.connector)
    }

    /// Whether a database connection is open
    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }

    /// The open database connection, if any
    pub fn connection_mut(&mut self) -> Option<&mut (dyn DatabaseConnection + 'static)> {
        self.connection.as_deref_mut()
    }

    pub(crate) fn set_connection(&mut self, connection: Box<dyn DatabaseConnection>) {
        self.connection = Some(connection);
    }

    /// Hand the connection back to the orchestrator
    pub fn take_connection(&mut self) -> Option<Box<dyn DatabaseConnection>> {
        self.connection.take()
    }

    /// Close the connection if one is open. Tasks never call this; tearing
    /// the connection down is up to whoever owns the run.
    pub async fn close_connection(&mut self) -> ExecutionResult<()> {
        match self.connection.take() {
            Some(mut connection) => connection.close().await,
            None => Ok(()),
        }
    }

    /// Shared HTTP client
    pub fn http_client(&mut self) -> ExecutionResult<reqwest::Client> {
        if let Some(client) = &self.http {
            return Ok(client.clone());
        }
        let client = reqwest::Client::builder()
            .user_agent(self.settings.user_agent.clone())
            .build()
            .map_err(|e| ExecutionError::Http {
                url: String::new(),
                error: e.to_string(),
            })?;
        self.http = Some(client.clone());
        Ok(client)
    }

    /// JSON view of the context for diagnostics.
    ///
    /// The connection shows up as a short tag rather than its contents.
    pub fn snapshot(&self) -> Value {
        let mut map: Map<String, Value> = self
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(connection) = &self.connection {
            map.insert(
                CONNECTION_KEY.to_string(),
                Value::String(format!("<{} connection>", connection.kind())),
            );
        }
        Value::Object(map)
    }
}

impl Default for DeploymentContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DeploymentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentContext")
            .field("vars", &self.vars)
            .field("settings", &self.settings)
            .field("connection", &self.connection.as_ref().map(|c| c.kind()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_new() {
        let ctx = DeploymentContext::new();
        assert!(ctx.vars.is_empty());
        assert!(!ctx.has_connection());
    }

    #[test]
    fn test_context_set_var() {
        let mut ctx = DeploymentContext::new();
        ctx.set_var("dbName", "shop");
        ctx.set_var("dbDelete", true);
        assert_eq!(ctx.get_var("dbName"), Some(&json!("shop")));
        assert_eq!(ctx.get_var("dbDelete"), Some(&json!(true)));
    }

    #[test]
    fn test_merge_vars_overwrites_and_skips_connection() {
        let mut ctx = DeploymentContext::new();
        ctx.set_var("env", "dev");

        let doc = json!({"env": "prod", "dbConnection": "bogus", "port": 80});
        let Value::Object(map) = doc else { unreachable!() };
        assert_eq!(ctx.merge_vars(map), 2);

        assert_eq!(ctx.get_var("env"), Some(&json!("prod")));
        assert_eq!(ctx.get_var("port"), Some(&json!(80)));
        assert!(ctx.get_var(CONNECTION_KEY).is_none());
    }

    #[test]
    fn test_snapshot_without_connection() {
        let mut ctx = DeploymentContext::new();
        ctx.set_var("a", 1);
        assert_eq!(ctx.snapshot(), json!({"a": 1}));
    }

    #[test]
    fn test_debug_hides_connector() {
        let ctx = DeploymentContext::new();
        let text = format!("{:?}", ctx);
        assert!(text.contains("DeploymentContext"));
        assert!(text.contains("connection: None"));
    }
}
