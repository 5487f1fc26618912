//! Error types for dblog

use thiserror::Error;

/// Core error type for dblog operations
#[derive(Error, Debug)]
pub enum DblogError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A handle that does not map to a pool slot. Only raised internally;
    /// releasing an unknown handle is a no-op for callers.
    #[error("Invalid pool handle: {0}")]
    InvalidHandle(u32),

    #[error("Connection pool has been shut down")]
    PoolShutdown,

    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DblogError {
    /// Whether the error came from opening or talking to a database handle
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DblogError::Connection(_) | DblogError::Io(_))
    }
}

/// Result type alias for dblog operations
pub type Result<T> = std::result::Result<T, DblogError>;
