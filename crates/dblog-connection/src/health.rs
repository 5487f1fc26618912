//! Health checks for pooled database connections
//!
//! # Example
//!
//! ```ignore
//! use dblog_connection::health::{check_pool, HealthThresholds};
//!
//! let report = check_pool(&pool, &HealthThresholds::default()).await;
//! println!("{}: {:?}", report.status, report.latency);
//! ```

mod check;
mod ping;
mod status;

#[cfg(test)]
mod tests;

pub use check::{HealthReport, check_pool};
pub use ping::{PingError, PingResult, ping_database, ping_with_timeout};
pub use status::{HealthStatus, HealthThresholds};
