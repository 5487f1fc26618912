//! One-shot health check of a connection pool

use std::time::Duration;

use serde::Serialize;

use super::ping::ping_with_timeout;
use super::status::{HealthStatus, HealthThresholds};
use crate::pool::{ConnectionPool, PoolStats};

/// Outcome of [`check_pool`]
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Ping round trip, when the ping succeeded
    pub latency: Option<Duration>,
    /// Handle of the connection that was pinged (0 for overflow)
    pub handle: Option<u32>,
    pub error: Option<String>,
    pub stats: PoolStats,
}

/// Acquire a connection, ping it and hand it back.
///
/// A ping slower than `thresholds.ping_timeout` counts as unhealthy.
///
/// Never fails: acquire and ping errors are folded into the report.
pub async fn check_pool(pool: &ConnectionPool, thresholds: &HealthThresholds) -> HealthReport {
    let conn = match pool.acquire().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(error = %e, "health check could not acquire a connection");
            return HealthReport {
                status: HealthStatus::Unreachable,
                latency: None,
                handle: None,
                error: Some(e.to_string()),
                stats: pool.stats(),
            };
        }
    };

    let handle = conn.handle();
    let ping = ping_with_timeout(&*conn, thresholds.ping_timeout).await;
    conn.release().await;

    let (status, latency, error) = match ping {
        Ok(latency) => (
            HealthStatus::from_latency_with_thresholds(latency, thresholds),
            Some(latency),
            None,
        ),
        Err(e) => (HealthStatus::Unhealthy, None, Some(e.to_string())),
    };
    tracing::debug!(handle, %status, ?latency, "pool health check finished");

    HealthReport {
        status,
        latency,
        handle: Some(handle),
        error,
        stats: pool.stats(),
    }
}
