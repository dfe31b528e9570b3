//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use rdeploy::error::{ExecutionError, ExecutionResult};
use rdeploy::runner::{DatabaseConnection, DatabaseConnector, ServerTarget};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Create a temporary directory with a `base` directory inside it, so tests
/// can check that nothing leaks next to the base
pub fn create_sandbox() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("base");
    fs::create_dir(&base).unwrap();
    (temp_dir, base)
}

/// Write a file below `base`, creating parents
pub fn write(base: &Path, rel: &str, content: &str) {
    let path = base.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Read a file below `base`
pub fn read(base: &Path, rel: &str) -> String {
    fs::read_to_string(base.join(rel)).unwrap()
}

/// Build a zip in memory; names ending in `/` become directories
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, body) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Number of entries left in a directory
pub fn entry_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// An in-memory database server: schemas and their tables
#[derive(Debug, Default)]
pub struct ServerState {
    pub schemas: BTreeMap<String, BTreeSet<String>>,
    pub statements: Vec<String>,
    pub connects: usize,
}

/// Connector handing out connections to a shared [`ServerState`]
#[derive(Clone, Default)]
pub struct FakeServer {
    pub state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    pub fn with_schema(name: &str, tables: &[&str]) -> Self {
        let server = FakeServer::default();
        server.state.lock().unwrap().schemas.insert(
            name.to_string(),
            tables.iter().map(|t| t.to_string()).collect(),
        );
        server
    }

    pub fn tables(&self, schema: &str) -> Option<BTreeSet<String>> {
        self.state.lock().unwrap().schemas.get(schema).cloned()
    }

    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }
}

#[async_trait]
impl DatabaseConnector for FakeServer {
    async fn connect(&self, _target: &ServerTarget) -> ExecutionResult<Box<dyn DatabaseConnection>> {
        self.state.lock().unwrap().connects += 1;
        Ok(Box::new(FakeConnection {
            state: Arc::clone(&self.state),
            current: None,
        }))
    }
}

pub struct FakeConnection {
    state: Arc<Mutex<ServerState>>,
    current: Option<String>,
}

fn identifier(text: &str) -> String {
    text.trim()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_matches('`')
        .to_string()
}

#[async_trait]
impl DatabaseConnection for FakeConnection {
    fn kind(&self) -> &'static str {
        "fake"
    }

    async fn execute(&mut self, sql: &str) -> ExecutionResult<()> {
        let mut state = self.state.lock().unwrap();
        for statement in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            state.statements.push(statement.to_string());
            if let Some(rest) = statement.strip_prefix("DROP DATABASE IF EXISTS ") {
                state.schemas.remove(&identifier(rest));
            } else if let Some(rest) = statement.strip_prefix("CREATE DATABASE IF NOT EXISTS ") {
                state.schemas.entry(identifier(rest)).or_default();
            } else if let Some(rest) = statement.strip_prefix("USE ") {
                let name = identifier(rest);
                if !state.schemas.contains_key(&name) {
                    return Err(ExecutionError::Database(format!("unknown database {name}")));
                }
                self.current = Some(name);
            } else if let Some(rest) = statement.strip_prefix("CREATE TABLE ") {
                let schema = self
                    .current
                    .clone()
                    .ok_or_else(|| ExecutionError::Database("no database selected".into()))?;
                let table = identifier(rest);
                state.schemas.entry(schema).or_default().insert(table);
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> ExecutionResult<()> {
        Ok(())
    }
}
