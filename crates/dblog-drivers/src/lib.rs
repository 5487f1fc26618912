//! dblog Drivers - Database driver implementations
//!
//! This crate provides concrete implementations of the driver traits defined
//! in `dblog-core` and a registry to look them up by id.

#[cfg(feature = "mysql")]
pub use dblog_driver_mysql as mysql;

mod registry;

pub use registry::DriverRegistry;

/// Re-export commonly used types from dblog-core
pub use dblog_core::{
    Connection, ConnectionConfig, DatabaseDriver, DblogError, QueryResult, Result, Row,
    StatementResult, Value,
};
