//! Database driver trait definition

use crate::{Connection, ConnectionConfig, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Core driver trait that all database drivers must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Unique identifier for this driver (e.g., "mysql")
    fn id(&self) -> &'static str {
        self.name()
    }

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Display name for diagnostics
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Default connection port
    fn default_port(&self) -> Option<u16> {
        None
    }

    /// Open a new connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    /// Open a connection, run a trivial query and close it again
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        let conn = self.connect(config).await?;
        let result = conn.query("SELECT 1", &[]).await.map(|_| ());
        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "failed to close test connection");
        }
        result
    }
}
