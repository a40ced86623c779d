//! Backing store access
//!
//! This module provides a trait-based abstraction over the SQL Server
//! instance that hosts restored package regions, so pipeline stages can be
//! tested without a server.

pub mod session;
pub mod sql;
pub mod sqlserver;
pub mod traits;

pub use session::StoreSession;
pub use sqlserver::{SqlServerClient, SqlServerConnector};
pub use traits::{StoreClient, StoreConnector};
