//! Backing store abstraction traits
//!
//! These traits isolate the SQL Server driver so that restore, enumeration
//! and result providers can be exercised against in-memory doubles.

use crate::domain::{Result, Table};
use async_trait::async_trait;

/// A live connection to the store server
///
/// Calls are sequential; one client serves the whole run.
#[async_trait]
pub trait StoreClient: Send {
    /// Runs a statement batch and returns its first result set
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::StoreError`] wrapped in `LossportError::Store`
    /// when the server rejects the batch or the call times out.
    async fn query(&mut self, sql: &str) -> Result<Table>;

    /// Runs a statement batch, draining every result before returning
    ///
    /// # Errors
    ///
    /// Same as [`StoreClient::query`].
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Runs a statement that may outlast the query timeout, such as a restore
    ///
    /// Clients without a separate limit run it like [`StoreClient::execute`].
    ///
    /// # Errors
    ///
    /// Same as [`StoreClient::query`].
    async fn execute_long_running(&mut self, sql: &str) -> Result<()> {
        self.execute(sql).await
    }

    /// The endpoint this client is connected to
    fn endpoint(&self) -> &str;
}

/// Opens connections to one endpoint at a time
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Connects to `endpoint`, given in `host[\instance][,port]` form
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConnectionFailed` when the endpoint is unreachable
    /// or rejects the login.
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn StoreClient>>;
}
