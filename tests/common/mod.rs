//! Shared fixtures for integration tests
//!
//! `ScriptedConnector` hands out clients that answer SQL by substring match,
//! and `write_archive` builds package region zips with the `zip` crate.

#![allow(dead_code)]

use async_trait::async_trait;
use lossport::adapters::store::{StoreClient, StoreConnector};
use lossport::config::LossportConfig;
use lossport::domain::{LossportError, Result, StoreError, Table, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zip::write::SimpleFileOptions;

/// What a scripted statement returns
#[derive(Clone)]
pub enum Reply {
    Rows(Table),
    Fail(String),
    /// Outlasts the query timeout but finishes when allowed to run long
    Slow,
}

/// Ordered substring rules; unmatched statements return an empty table
#[derive(Clone, Default)]
pub struct Script {
    rules: Vec<(String, Reply)>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(mut self, needle: &str, table: Table) -> Self {
        self.rules.push((needle.to_string(), Reply::Rows(table)));
        self
    }

    pub fn fail(mut self, needle: &str, message: &str) -> Self {
        self.rules.push((needle.to_string(), Reply::Fail(message.to_string())));
        self
    }

    pub fn slow(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), Reply::Slow));
        self
    }

    fn reply(&self, sql: &str) -> Reply {
        self.rules
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Reply::Rows(Table::default()))
    }
}

/// Every statement any client ran, in order
pub type StatementLog = Arc<Mutex<Vec<String>>>;

/// Every statement paired with the serial of the client that ran it
pub type ClientLog = Arc<Mutex<Vec<(usize, String)>>>;

const QUERY_TIMEOUT_SECS: u64 = 600;

pub struct ScriptedClient {
    script: Script,
    log: StatementLog,
    by_client: ClientLog,
    serial: usize,
    endpoint: String,
}

impl ScriptedClient {
    fn record(&self, sql: &str) {
        self.log.lock().unwrap().push(sql.to_string());
        self.by_client
            .lock()
            .unwrap()
            .push((self.serial, sql.to_string()));
    }
}

#[async_trait]
impl StoreClient for ScriptedClient {
    async fn query(&mut self, sql: &str) -> Result<Table> {
        self.record(sql);
        match self.script.reply(sql) {
            Reply::Rows(table) => Ok(table),
            Reply::Fail(message) => Err(StoreError::QueryFailed(message).into()),
            Reply::Slow => Err(StoreError::Timeout(QUERY_TIMEOUT_SECS).into()),
        }
    }

    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.record(sql);
        match self.script.reply(sql) {
            Reply::Rows(_) => Ok(()),
            Reply::Fail(message) => Err(StoreError::ExecuteFailed(message).into()),
            Reply::Slow => Err(StoreError::Timeout(QUERY_TIMEOUT_SECS).into()),
        }
    }

    async fn execute_long_running(&mut self, sql: &str) -> Result<()> {
        self.record(sql);
        match self.script.reply(sql) {
            Reply::Rows(_) | Reply::Slow => Ok(()),
            Reply::Fail(message) => Err(StoreError::ExecuteFailed(message).into()),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Connects to every endpoint except those listed as down
pub struct ScriptedConnector {
    script: Script,
    down: Vec<String>,
    connections: AtomicUsize,
    pub log: StatementLog,
    pub by_client: ClientLog,
}

impl ScriptedConnector {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            down: Vec::new(),
            connections: AtomicUsize::new(0),
            log: StatementLog::default(),
            by_client: ClientLog::default(),
        }
    }

    /// Number of clients handed out so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn with_down(mut self, endpoint: &str) -> Self {
        self.down.push(endpoint.to_string());
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoreConnector for ScriptedConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn StoreClient>> {
        if self.down.iter().any(|d| d == endpoint) {
            return Err(LossportError::Store(StoreError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                message: "connection refused".to_string(),
            }));
        }
        Ok(Box::new(ScriptedClient {
            script: self.script.clone(),
            log: self.log.clone(),
            by_client: self.by_client.clone(),
            serial: self.connections.fetch_add(1, Ordering::SeqCst),
            endpoint: endpoint.to_string(),
        }))
    }
}

/// Builds a table from rows of values
pub fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
    let mut table = Table::new(columns.iter().copied());
    for row in rows {
        table.push_row(row).unwrap();
    }
    table
}

/// Builds a table whose cells are all text
pub fn text_table(columns: &[&str], rows: &[&[&str]]) -> Table {
    table(
        columns,
        rows.iter()
            .map(|row| row.iter().map(|cell| Value::from(*cell)).collect())
            .collect(),
    )
}

/// The file list `RESTORE FILELISTONLY` reports for a Hazus backup
pub fn file_list() -> Table {
    text_table(
        &["LogicalName", "PhysicalName", "Type"],
        &[
            &["Region", "C:\\data\\Region.mdf", "D"],
            &["Region_log", "C:\\data\\Region_log.ldf", "L"],
        ],
    )
}

/// Writes a zip with `entries` (name, bytes) and the given archive comment
pub fn write_archive(dir: &Path, name: &str, comment: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (entry, bytes) in entries {
        zip.start_file(*entry, SimpleFileOptions::default()).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.set_comment(comment);
    zip.finish().unwrap();
    path
}

/// A valid configuration rooted in `output_dir`
pub fn config(archive: &Path, output_dir: &Path) -> LossportConfig {
    let mut config: LossportConfig = toml::from_str("[store]\npassword = \"secret\"\n").unwrap();
    config.archive.path = Some(archive.to_string_lossy().into_owned());
    config.archive.output_dir = output_dir.to_string_lossy().into_owned();
    config.store.endpoints = vec!["primary".to_string(), "fallback".to_string()];
    config
}
