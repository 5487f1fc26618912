//! dblog Connection - Connection pooling for database log sinks
//!
//! This crate owns the lifecycle of database connections used by the
//! logger: a slot-based pool that grows under sustained contention, hands
//! out one-shot overflow connections under short bursts, and closes idle
//! connections from a background reaper.

pub mod health;
pub mod pool;
mod query;

pub use health::{
    HealthReport, HealthStatus, HealthThresholds, PingError, PingResult, check_pool,
    ping_database, ping_with_timeout,
};
pub use pool::{
    ANONYMOUS_HANDLE, ConnectionPool, ConnectionState, GrowthPolicy, PoolConfig, PoolConnection,
    PoolStats, PooledConnection,
};
pub use query::QueryExt;
