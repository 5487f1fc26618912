//! Database ping
//!
//! Runs a minimal query and measures the round trip.

use std::time::Duration;

use dblog_core::Connection;
use thiserror::Error;
use tokio::time::Instant;

const PING_QUERY: &str = "SELECT 1";

/// Result of a ping operation
pub type PingResult = Result<Duration, PingError>;

/// Error that can occur during a ping operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PingError {
    #[error("Connection is closed")]
    ConnectionClosed,
    #[error("Ping query failed: {0}")]
    QueryFailed(String),
    #[error("Ping timed out after {0:?}")]
    Timeout(Duration),
}

/// Ping a database connection to check if it's alive.
///
/// Executes `SELECT 1` and returns the round-trip time.
pub async fn ping_database(conn: &dyn Connection) -> PingResult {
    if conn.is_closed() {
        return Err(PingError::ConnectionClosed);
    }

    let start = Instant::now();
    match conn.query(PING_QUERY, &[]).await {
        Ok(_) => Ok(start.elapsed()),
        Err(e) => Err(PingError::QueryFailed(e.to_string())),
    }
}

/// Like [`ping_database`], giving up after `timeout`
pub async fn ping_with_timeout(conn: &dyn Connection, timeout: Duration) -> PingResult {
    tokio::time::timeout(timeout, ping_database(conn))
        .await
        .unwrap_or(Err(PingError::Timeout(timeout)))
}
