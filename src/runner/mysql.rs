//! MySQL connector backed by `mysql_async`

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::database::{DatabaseConnection, DatabaseConnector, ServerTarget};
use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, OptsBuilder};

/// Connects to MySQL/MariaDB servers
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

#[async_trait]
impl DatabaseConnector for MySqlConnector {
    async fn connect(&self, target: &ServerTarget) -> ExecutionResult<Box<dyn DatabaseConnection>> {
        let mut opts = OptsBuilder::default()
            .ip_or_hostname(target.host.clone())
            .user(Some(target.username.clone()))
            .pass(Some(target.password.clone()));
        if let Some(port) = target.port {
            opts = opts.tcp_port(port);
        }

        let conn = Conn::new(opts).await.map_err(database_error)?;
        Ok(Box::new(MySqlConnection { conn: Some(conn) }))
    }
}

/// A server connection; statements are sent over the text protocol so
/// multi-statement SQL files work
pub struct MySqlConnection {
    conn: Option<Conn>,
}

#[async_trait]
impl DatabaseConnection for MySqlConnection {
    fn kind(&self) -> &'static str {
        "mysql"
    }

    async fn execute(&mut self, sql: &str) -> ExecutionResult<()> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| ExecutionError::Database("connection already closed".to_string()))?;
        conn.query_drop(sql).await.map_err(database_error)
    }

    async fn close(&mut self) -> ExecutionResult<()> {
        match self.conn.take() {
            Some(conn) => conn.disconnect().await.map_err(database_error),
            None => Ok(()),
        }
    }
}

fn database_error(err: mysql_async::Error) -> ExecutionError {
    ExecutionError::Database(err.to_string())
}
