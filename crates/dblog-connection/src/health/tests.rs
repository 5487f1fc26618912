//! Tests for the health module

use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dblog_core::{
    Connection, ConnectionConfig, DatabaseConfig, DatabaseDriver, DblogError, QueryResult, Result,
    ServerConfig, StatementResult, Value,
};

use crate::pool::{ConnectionPool, PoolConfig};

/// Connection whose ping can be slowed down or made to fail
struct PingConnection {
    delay: Duration,
    fail: bool,
    closed: AtomicBool,
    queries: AtomicUsize,
}

impl PingConnection {
    fn new(delay: Duration, fail: bool) -> Self {
        Self {
            delay,
            fail,
            closed: AtomicBool::new(false),
            queries: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Connection for PingConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, _sql: &str, _params: &[Value]) -> Result<StatementResult> {
        Ok(StatementResult::default())
    }

    async fn query(&self, sql: &str, _params: &[Value]) -> Result<QueryResult> {
        assert_eq!(sql, "SELECT 1");
        self.queries.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(DblogError::Query("server has gone away".into()));
        }
        Ok(QueryResult::empty())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct PingDriver {
    delay: Duration,
    fail_ping: bool,
    refuse: bool,
}

#[async_trait]
impl DatabaseDriver for PingDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn connect(&self, _config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        if self.refuse {
            return Err(DblogError::Connection("Connection refused".into()));
        }
        Ok(Arc::new(PingConnection::new(self.delay, self.fail_ping)))
    }
}

fn pool_with(driver: PingDriver) -> ConnectionPool {
    let config = ConnectionConfig::new(
        "mock",
        ServerConfig::new("localhost", 3306, "root", ""),
        DatabaseConfig::new("logs", 1, 4),
    );
    ConnectionPool::new(PoolConfig::new(1, 4), config, Arc::new(driver)).unwrap()
}

mod status_tests {
    use super::*;

    #[test]
    fn test_health_status_from_latency() {
        let status = HealthStatus::from_latency(Duration::from_millis(50));
        assert_eq!(status, HealthStatus::Healthy);
        assert!(status.is_healthy());

        let status = HealthStatus::from_latency(Duration::from_millis(200));
        assert_eq!(status, HealthStatus::Degraded);
        assert!(status.is_usable());
        assert!(!status.is_healthy());

        let status = HealthStatus::from_latency(Duration::from_millis(1000));
        assert_eq!(status, HealthStatus::Unhealthy);
        assert!(!status.is_usable());
    }

    #[test]
    fn test_health_status_at_threshold_boundary() {
        assert_eq!(
            HealthStatus::from_latency(Duration::from_millis(100)),
            HealthStatus::Healthy
        );
        assert_eq!(
            HealthStatus::from_latency(Duration::from_millis(101)),
            HealthStatus::Degraded
        );
        assert_eq!(
            HealthStatus::from_latency(Duration::from_millis(500)),
            HealthStatus::Degraded
        );
        assert_eq!(
            HealthStatus::from_latency(Duration::from_millis(501)),
            HealthStatus::Unhealthy
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = HealthThresholds::new(50, 200);
        assert_eq!(
            HealthStatus::from_latency_with_thresholds(Duration::from_millis(100), &thresholds),
            HealthStatus::Degraded
        );

        // Degraded threshold never drops below the healthy one
        let thresholds = HealthThresholds::new(300, 100);
        assert_eq!(thresholds.degraded_threshold, Duration::from_millis(300));
        assert_eq!(thresholds.ping_timeout, Duration::from_secs(5));

        let thresholds = thresholds.with_ping_timeout(Duration::from_millis(750));
        assert_eq!(thresholds.ping_timeout, Duration::from_millis(750));
    }

    #[test]
    fn test_health_status_display_and_serde() {
        assert_eq!(HealthStatus::Unreachable.to_string(), "unreachable");
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
        assert!(!HealthStatus::Unreachable.is_usable());
    }
}

mod ping_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ping_measures_latency() {
        let conn = PingConnection::new(Duration::from_millis(40), false);
        let latency = ping_database(&conn).await.unwrap();
        assert!(latency >= Duration::from_millis(40));
        assert_eq!(conn.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ping_closed_connection() {
        let conn = PingConnection::new(Duration::ZERO, false);
        conn.close().await.unwrap();
        assert_eq!(ping_database(&conn).await, Err(PingError::ConnectionClosed));
        assert_eq!(conn.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ping_query_failure() {
        let conn = PingConnection::new(Duration::ZERO, true);
        let err = ping_database(&conn).await.unwrap_err();
        assert!(matches!(err, PingError::QueryFailed(ref msg) if msg.contains("gone away")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_timeout() {
        let conn = PingConnection::new(Duration::from_secs(30), false);
        let err = ping_with_timeout(&conn, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, PingError::Timeout(Duration::from_secs(5)));
        // The abandoned query was still sent once
        assert_eq!(conn.queries.load(Ordering::SeqCst), 1);
    }
}

mod check_tests {
    use super::*;

    #[tokio::test]
    async fn test_check_healthy_pool() {
        let pool = pool_with(PingDriver {
            delay: Duration::ZERO,
            fail_ping: false,
            refuse: false,
        });
        let report = check_pool(&pool, &HealthThresholds::default()).await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.handle, Some(1));
        assert!(report.latency.is_some());
        assert!(report.error.is_none());
        // The connection went back to the pool
        assert_eq!(report.stats.in_use(), 0);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_check_unreachable_database() {
        let pool = pool_with(PingDriver {
            delay: Duration::ZERO,
            fail_ping: false,
            refuse: true,
        });
        let report = check_pool(&pool, &HealthThresholds::default()).await;
        assert_eq!(report.status, HealthStatus::Unreachable);
        assert!(report.handle.is_none());
        assert!(report.error.unwrap().contains("Connection refused"));
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_check_failing_ping() {
        let pool = pool_with(PingDriver {
            delay: Duration::ZERO,
            fail_ping: true,
            refuse: false,
        });
        let report = check_pool(&pool, &HealthThresholds::default()).await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(report.latency.is_none());
        pool.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_slow_pool_is_degraded() {
        let pool = pool_with(PingDriver {
            delay: Duration::from_millis(250),
            fail_ping: false,
            refuse: false,
        });
        let report = check_pool(&pool, &HealthThresholds::default()).await;
        assert_eq!(report.status, HealthStatus::Degraded);
        pool.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_hung_ping_times_out() {
        let pool = pool_with(PingDriver {
            delay: Duration::from_secs(60),
            fail_ping: false,
            refuse: false,
        });
        let thresholds = HealthThresholds::default().with_ping_timeout(Duration::from_secs(2));
        let report = check_pool(&pool, &thresholds).await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(report.latency.is_none());
        assert!(report.error.unwrap().contains("timed out"));
        // The connection still went back to the pool
        assert_eq!(report.stats.in_use(), 0);
        pool.shutdown().await;
    }
}
