use std::sync::Arc;

use dblog_connection::{ConnectionPool, PoolConfig, QueryExt};
use dblog_core::{ConnectionConfig, DatabaseDriver, Result};

use crate::template::{Record, Template};

/// Writes each line as a SQL statement through a connection pool
#[derive(Debug)]
pub struct DatabaseSink {
    pool: ConnectionPool,
    query: Template,
}

impl DatabaseSink {
    /// Build the pool and check out one connection to make sure the server
    /// is reachable. The pool is shut down again if that fails.
    pub async fn connect(
        connection: ConnectionConfig,
        pool_config: PoolConfig,
        query_format: &str,
        driver: Arc<dyn DatabaseDriver>,
    ) -> Result<Self> {
        let url = connection.redacted_url();
        let pool = ConnectionPool::new(pool_config, connection, driver)?;

        match pool.acquire().await {
            Ok(conn) => conn.release().await,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "log database unreachable");
                pool.shutdown().await;
                return Err(e);
            }
        }

        tracing::info!(url = %url, "log database connected");
        Ok(Self::from_pool(pool, query_format))
    }

    /// Use an existing pool
    pub fn from_pool(pool: ConnectionPool, query_format: &str) -> Self {
        Self {
            pool,
            query: Template::parse(query_format),
        }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn query(&self) -> &Template {
        &self.query
    }

    /// Render the query for `record` and execute it on a pooled connection
    pub async fn write(&self, record: &Record<'_>) -> Result<u64> {
        let sql = self.query.render_sql(record);
        let conn = self.pool.acquire().await?;
        let result = conn.execute_query(&sql, &[]).await;
        conn.release().await;
        result
    }

    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}
