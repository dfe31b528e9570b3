//! Database provisioning tasks
//!
//! `connect_database` opens one server connection per context, makes sure
//! the schema exists and selects it. `query_database` runs SQL against that
//! connection.

use crate::config::{ConnectDatabaseOptions, EngineSettings, QueryDatabaseOptions};
use crate::error::{DeployError, ExecutionError, ExecutionResult, ValidationError, ValidationResult};
use crate::runner::{DeploymentContext, Sandbox};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

pub use crate::runner::mysql::MySqlConnector;

/// A live connection to a database server
#[async_trait]
pub trait DatabaseConnection: Send {
    /// Short tag used when the context is dumped (e.g. `mysql`)
    fn kind(&self) -> &'static str;

    /// Run one or more statements, discarding any result rows
    async fn execute(&mut self, sql: &str) -> ExecutionResult<()>;

    /// Close the connection
    async fn close(&mut self) -> ExecutionResult<()>;
}

/// Opens server connections
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    async fn connect(&self, target: &ServerTarget) -> ExecutionResult<Box<dyn DatabaseConnection>>;
}

/// Where and as whom to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    pub host: String,
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
}

impl ServerTarget {
    /// Build a target from a `host` or `host:port` string
    pub fn new(host: &str, username: &str, password: &str) -> Self {
        let (host, port) = match host.rsplit_once(':') {
            Some((name, port)) if !name.is_empty() => match port.parse::<u16>() {
                Ok(port) => (name.to_string(), Some(port)),
                Err(_) => (host.to_string(), None),
            },
            _ => (host.to_string(), None),
        };
        ServerTarget {
            host,
            port,
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

/// Database settings read from the context variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub target: ServerTarget,
    pub name: String,
    pub delete: bool,
}

impl DatabaseSettings {
    /// Read `dbHost`, `dbUsername`, `dbPassword`, `dbName` and `dbDelete`
    pub fn from_vars(vars: &HashMap<String, Value>) -> ValidationResult<Self> {
        let host = string_var(vars, "dbHost")?;
        let username = string_var(vars, "dbUsername")?;
        let password = string_var(vars, "dbPassword")?;
        let name = string_var(vars, "dbName")?;
        let delete = match vars.get("dbDelete") {
            None => return Err(ValidationError::MissingContextVar("dbDelete")),
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(ValidationError::MistypedContextVar {
                    name: "dbDelete",
                    expected: "boolean",
                })
            }
        };

        Ok(DatabaseSettings {
            target: ServerTarget::new(host, username, password),
            name: name.to_string(),
            delete,
        })
    }
}

fn string_var<'a>(vars: &'a HashMap<String, Value>, name: &'static str) -> ValidationResult<&'a str> {
    match vars.get(name) {
        None => Err(ValidationError::MissingContextVar(name)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationError::MistypedContextVar {
            name,
            expected: "string",
        }),
    }
}

/// Quote a schema or table name as a MySQL identifier
pub fn escape_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Statements that prepare and select the schema
pub fn provisioning_statements(db: &DatabaseSettings, settings: &EngineSettings) -> Vec<String> {
    let schema = escape_identifier(&db.name);
    let mut statements = Vec::new();
    if db.delete {
        statements.push(format!("DROP DATABASE IF EXISTS {}", schema));
    }
    statements.push(format!(
        "CREATE DATABASE IF NOT EXISTS {} CHARACTER SET {} COLLATE {}",
        schema, settings.charset, settings.collation
    ));
    statements.push(format!("USE {}", schema));
    statements
}

/// Open the connection, prepare the schema and keep the connection in the
/// context
pub async fn connect_database(
    _options: &ConnectDatabaseOptions,
    ctx: &mut DeploymentContext,
) -> Result<(), DeployError> {
    if ctx.has_connection() {
        return Err(ExecutionError::AlreadyConnected.into());
    }
    let db = DatabaseSettings::from_vars(&ctx.vars)?;

    tracing::info!(
        host = %db.target.host,
        schema = %db.name,
        delete = db.delete,
        "connecting to database server"
    );
    let mut connection = ctx.connector().connect(&db.target).await?;

    for statement in provisioning_statements(&db, &ctx.settings) {
        tracing::debug!(%statement, "provisioning schema");
        connection.execute(&statement).await?;
    }

    ctx.set_connection(connection);
    Ok(())
}

/// Run an inline query or a SQL file against the open connection
pub async fn query_database(
    options: &QueryDatabaseOptions,
    sandbox: &Sandbox,
    ctx: &mut DeploymentContext,
) -> Result<(), DeployError> {
    if !ctx.has_connection() {
        return Err(ExecutionError::MissingConnection.into());
    }

    let sql = match (options.inline_query(), &options.file) {
        (Some(query), None) => query.to_string(),
        (None, Some(file)) => {
            let path = sandbox.resolve(file);
            tracing::debug!(path = %path.display(), "reading SQL file");
            tokio::fs::read_to_string(&path).await?
        }
        (Some(_), Some(_)) => {
            return Err(ValidationError::MutuallyExclusive("query", "file").into())
        }
        (None, None) => return Err(ValidationError::MissingEither("query", "file").into()),
    };

    let connection = ctx
        .connection_mut()
        .ok_or(ExecutionError::MissingConnection)?;
    connection.execute(&sql).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: Value) -> HashMap<String, Value> {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        }
    }

    fn complete() -> HashMap<String, Value> {
        vars(json!({
            "dbHost": "localhost",
            "dbUsername": "root",
            "dbPassword": "secret",
            "dbName": "shop",
            "dbDelete": false,
        }))
    }

    #[test]
    fn test_settings_from_vars() {
        let db = DatabaseSettings::from_vars(&complete()).unwrap();
        assert_eq!(db.target.host, "localhost");
        assert_eq!(db.target.port, None);
        assert_eq!(db.name, "shop");
        assert!(!db.delete);
    }

    #[test]
    fn test_each_missing_var_is_named() {
        for key in ["dbHost", "dbUsername", "dbPassword", "dbName", "dbDelete"] {
            let mut vars = complete();
            vars.remove(key);
            match DatabaseSettings::from_vars(&vars) {
                Err(ValidationError::MissingContextVar(name)) => assert_eq!(name, key),
                other => panic!("expected missing {key}, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_mistyped_vars() {
        let mut vars = complete();
        vars.insert("dbDelete".to_string(), json!("true"));
        assert!(matches!(
            DatabaseSettings::from_vars(&vars),
            Err(ValidationError::MistypedContextVar { name: "dbDelete", .. })
        ));

        let mut vars = complete();
        vars.insert("dbName".to_string(), json!(42));
        assert!(matches!(
            DatabaseSettings::from_vars(&vars),
            Err(ValidationError::MistypedContextVar { name: "dbName", .. })
        ));
    }

    #[test]
    fn test_host_with_port() {
        let target = ServerTarget::new("db.internal:3307", "u", "p");
        assert_eq!(target.host, "db.internal");
        assert_eq!(target.port, Some(3307));

        let target = ServerTarget::new("db.internal:abc", "u", "p");
        assert_eq!(target.host, "db.internal:abc");
        assert_eq!(target.port, None);
    }

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("shop"), "`shop`");
        assert_eq!(escape_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_provisioning_with_delete() {
        let mut db = DatabaseSettings::from_vars(&complete()).unwrap();
        db.delete = true;
        let statements = provisioning_statements(&db, &EngineSettings::default());
        assert_eq!(
            statements,
            vec![
                "DROP DATABASE IF EXISTS `shop`",
                "CREATE DATABASE IF NOT EXISTS `shop` CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci",
                "USE `shop`",
            ]
        );
    }

    #[test]
    fn test_provisioning_without_delete() {
        let db = DatabaseSettings::from_vars(&complete()).unwrap();
        let statements = provisioning_statements(&db, &EngineSettings::default());
        assert_eq!(statements.len(), 2);
        assert!(statements.iter().all(|s| !s.starts_with("DROP")));
    }
}
