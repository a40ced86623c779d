//! SQL Server client implementation
//!
//! This module connects to the local Hazus SQL Server instance using the
//! TDS protocol. Named instances are resolved through the SQL Browser
//! service unless an explicit port is given.

use super::traits::{StoreClient, StoreConnector};
use crate::config::{SecretString, StoreConnectionConfig};
use crate::domain::{LossportError, Result, StoreError, Table, Value};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::future::Future;
use std::time::Duration;
use tiberius::{AuthMethod, Client, ColumnData, Config, FromSql, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

/// A parsed `host[\instance][,port]` endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub instance: Option<String>,
    pub port: Option<u16>,
}

impl Endpoint {
    /// Parses an endpoint string
    ///
    /// # Examples
    ///
    /// ```
    /// use lossport::adapters::store::sqlserver::Endpoint;
    ///
    /// let ep = Endpoint::parse("WORKSTATION\\HAZUSPLUSSRVR").unwrap();
    /// assert_eq!(ep.host, "WORKSTATION");
    /// assert_eq!(ep.instance.as_deref(), Some("HAZUSPLUSSRVR"));
    /// assert_eq!(ep.port, None);
    /// ```
    pub fn parse(endpoint: &str) -> Result<Self> {
        let endpoint = endpoint.trim();
        let (server, port) = match endpoint.rsplit_once(',') {
            Some((server, port)) => {
                let port = port.trim().parse::<u16>().map_err(|_| {
                    LossportError::Configuration(format!(
                        "Invalid port in store endpoint '{endpoint}'"
                    ))
                })?;
                (server, Some(port))
            }
            None => (endpoint, None),
        };

        let (host, instance) = match server.split_once('\\') {
            Some((host, instance)) => (host.trim(), Some(instance.trim().to_string())),
            None => (server.trim(), None),
        };

        if host.is_empty() {
            return Err(LossportError::Configuration(format!(
                "Store endpoint '{endpoint}' has no host"
            )));
        }

        Ok(Self {
            host: host.to_string(),
            instance: instance.filter(|i| !i.is_empty()),
            port,
        })
    }
}

/// Opens tiberius connections using the `[store]` settings
pub struct SqlServerConnector {
    username: String,
    password: SecretString,
    trust_server_certificate: bool,
    connect_timeout: Duration,
    query_timeout: Duration,
    restore_timeout: Option<Duration>,
}

impl SqlServerConnector {
    pub fn new(config: &StoreConnectionConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
            trust_server_certificate: config.trust_server_certificate,
            connect_timeout: Duration::from_secs(config.connect_timeout_seconds),
            query_timeout: Duration::from_secs(config.query_timeout_seconds),
            restore_timeout: match config.restore_timeout_seconds {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    fn tds_config(&self, endpoint: &Endpoint) -> Config {
        let mut config = Config::new();
        config.host(&endpoint.host);
        if let Some(port) = endpoint.port {
            config.port(port);
        }
        if let Some(instance) = &endpoint.instance {
            config.instance_name(instance);
        }
        config.application_name("lossport");
        config.authentication(AuthMethod::sql_server(
            &self.username,
            self.password.expose_secret().as_ref(),
        ));
        if self.trust_server_certificate {
            config.trust_cert();
        }
        config
    }

    async fn open(&self, endpoint: &Endpoint) -> tiberius::Result<Client<Compat<TcpStream>>> {
        let config = self.tds_config(endpoint);

        let tcp = if endpoint.instance.is_some() && endpoint.port.is_none() {
            TcpStream::connect_named(&config).await?
        } else {
            TcpStream::connect(config.get_addr()).await?
        };
        tcp.set_nodelay(true)?;

        Client::connect(config, tcp.compat_write()).await
    }
}

#[async_trait]
impl StoreConnector for SqlServerConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn StoreClient>> {
        let parsed = Endpoint::parse(endpoint)?;
        let failed = |message: String| {
            LossportError::Store(StoreError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                message,
            })
        };

        let client = tokio::time::timeout(self.connect_timeout, self.open(&parsed))
            .await
            .map_err(|_| failed(format!("timed out after {}s", self.connect_timeout.as_secs())))?
            .map_err(|e| failed(e.to_string()))?;

        tracing::info!(endpoint, "Connected to SQL Server");

        Ok(Box::new(SqlServerClient {
            client,
            endpoint: endpoint.to_string(),
            query_timeout: self.query_timeout,
            restore_timeout: self.restore_timeout,
        }))
    }
}

/// A tiberius connection
pub struct SqlServerClient {
    client: Client<Compat<TcpStream>>,
    endpoint: String,
    query_timeout: Duration,
    restore_timeout: Option<Duration>,
}

impl SqlServerClient {
    /// Runs a batch and drains every result set, so the call returns only
    /// once the server has finished the statement
    async fn drain(&mut self, sql: &str, limit: Option<Duration>) -> Result<()> {
        let fut = async { self.client.simple_query(sql).await?.into_results().await };

        match within(limit, fut).await {
            Ok(result) => {
                result.map_err(|e| StoreError::ExecuteFailed(e.to_string()))?;
                Ok(())
            }
            Err(_) => Err(StoreError::Timeout(limit.map_or(0, |l| l.as_secs())).into()),
        }
    }
}

/// Awaits `fut`, giving up after `limit` when one is set
async fn within<F: Future>(
    limit: Option<Duration>,
    fut: F,
) -> std::result::Result<F::Output, tokio::time::error::Elapsed> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await,
        None => Ok(fut.await),
    }
}

#[async_trait]
impl StoreClient for SqlServerClient {
    async fn query(&mut self, sql: &str) -> Result<Table> {
        let timeout = self.query_timeout;
        let fut = async {
            let mut stream = self.client.simple_query(sql).await?;
            let columns: Vec<String> = stream
                .columns()
                .await?
                .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
                .unwrap_or_default();
            let rows = stream.into_first_result().await?;
            Ok::<_, tiberius::error::Error>((columns, rows))
        };

        let outcome = tokio::time::timeout(timeout, fut).await;
        let (columns, rows) = match outcome {
            Ok(result) => result.map_err(|e| StoreError::QueryFailed(e.to_string()))?,
            Err(_) => return Err(StoreError::Timeout(timeout.as_secs()).into()),
        };

        let mut table = Table::new(columns);
        for row in rows {
            table.push_row(row.into_iter().map(to_value).collect())?;
        }
        Ok(table)
    }

    async fn execute(&mut self, sql: &str) -> Result<()> {
        let limit = Some(self.query_timeout);
        self.drain(sql, limit).await
    }

    async fn execute_long_running(&mut self, sql: &str) -> Result<()> {
        let limit = self.restore_timeout;
        self.drain(sql, limit).await
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Converts a TDS cell into a table value
///
/// Temporal types become ISO-8601 text; binary and XML become null.
fn to_value(data: ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(v) => v.map(|v| Value::Int(i64::from(v))).unwrap_or(Value::Null),
        ColumnData::I16(v) => v.map(|v| Value::Int(i64::from(v))).unwrap_or(Value::Null),
        ColumnData::I32(v) => v.map(|v| Value::Int(i64::from(v))).unwrap_or(Value::Null),
        ColumnData::I64(v) => v.map(Value::Int).unwrap_or(Value::Null),
        ColumnData::F32(v) => v.map(|v| Value::Float(f64::from(v))).unwrap_or(Value::Null),
        ColumnData::F64(v) => v.map(Value::Float).unwrap_or(Value::Null),
        ColumnData::Bit(v) => v.map(Value::Bool).unwrap_or(Value::Null),
        ColumnData::String(v) => v.map(|s| Value::Text(s.into_owned())).unwrap_or(Value::Null),
        ColumnData::Guid(v) => v.map(|g| Value::Text(g.to_string())).unwrap_or(Value::Null),
        ColumnData::Numeric(v) => v
            .map(|n| {
                if n.scale() == 0 {
                    i64::try_from(n.value())
                        .map(Value::Int)
                        .unwrap_or(Value::Float(n.value() as f64))
                } else {
                    Value::Float(n.value() as f64 / 10f64.powi(i32::from(n.scale())))
                }
            })
            .unwrap_or(Value::Null),
        ColumnData::Binary(_) | ColumnData::Xml(_) => Value::Null,
        other => temporal_text(&other).map(Value::Text).unwrap_or(Value::Null),
    }
}

fn temporal_text(data: &ColumnData<'static>) -> Option<String> {
    if let Ok(Some(dt)) = chrono::DateTime::<chrono::FixedOffset>::from_sql(data) {
        return Some(dt.to_rfc3339());
    }
    if let Ok(Some(dt)) = chrono::NaiveDateTime::from_sql(data) {
        return Some(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = chrono::NaiveDate::from_sql(data) {
        return Some(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(t)) = chrono::NaiveTime::from_sql(data) {
        return Some(t.format("%H:%M:%S%.f").to_string());
    }
    None
}
