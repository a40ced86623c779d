//! A connected client bound to one restored store

use super::sql;
use super::traits::StoreClient;
use crate::domain::{Result, Table};

/// Connection plus the name of the database queries target
pub struct StoreSession {
    client: Box<dyn StoreClient>,
    store_name: String,
}

impl StoreSession {
    pub fn new(client: Box<dyn StoreClient>, store_name: impl Into<String>) -> Self {
        Self {
            client,
            store_name: store_name.into(),
        }
    }

    /// Name of the restored database, `bk_<image stem>`
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    /// `[store].[dbo].[table]`
    pub fn table(&self, table: &str) -> String {
        sql::qualified(&self.store_name, table)
    }

    pub async fn query(&mut self, sql: &str) -> Result<Table> {
        tracing::trace!(store = %self.store_name, sql, "Store query");
        self.client.query(sql).await
    }

    pub async fn execute(&mut self, sql: &str) -> Result<()> {
        tracing::trace!(store = %self.store_name, sql, "Store statement");
        self.client.execute(sql).await
    }

    pub async fn execute_long_running(&mut self, sql: &str) -> Result<()> {
        tracing::trace!(store = %self.store_name, sql, "Long-running store statement");
        self.client.execute_long_running(sql).await
    }

    /// Swaps in a new connection to the same store, dropping the old one
    pub fn replace_client(&mut self, client: Box<dyn StoreClient>) {
        tracing::debug!(
            store = %self.store_name,
            old = self.client.endpoint(),
            new = client.endpoint(),
            "Replacing store connection"
        );
        self.client = client;
    }
}

impl std::fmt::Debug for StoreSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSession")
            .field("store_name", &self.store_name)
            .field("endpoint", &self.client.endpoint())
            .finish()
    }
}
