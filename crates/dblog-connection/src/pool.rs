//! Connection pooling for database connections
//!
//! The pool is an indexed sequence of slots, each holding one
//! [`PoolConnection`] and an availability flag. Callers address slots through
//! 1-based handles; handle 0 is reserved for overflow connections that live
//! outside the pool.
//!
//! # Example
//!
//! ```ignore
//! use dblog_connection::pool::{ConnectionPool, PoolConfig};
//!
//! let config = PoolConfig::new(5, 300).with_idle_timeout_ms(60_000);
//! let pool = ConnectionPool::new(config, connection_config, driver)?;
//!
//! let conn = pool.acquire().await?;
//! conn.execute("INSERT INTO log VALUES ('Error', 'boom')", &[]).await?;
//! conn.release().await;
//!
//! pool.shutdown().await;
//! ```

mod config;
mod connection;
mod growth;
mod guard;
mod pool;
mod reaper;
mod stats;


pub use config::PoolConfig;
pub use connection::{ANONYMOUS_HANDLE, ConnectionState, PoolConnection};
pub use growth::GrowthPolicy;
pub use guard::PooledConnection;
pub use pool::ConnectionPool;
pub use stats::PoolStats;
