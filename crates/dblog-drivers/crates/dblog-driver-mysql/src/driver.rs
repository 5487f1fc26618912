//! MySQL driver implementation

use std::sync::Arc;

use async_trait::async_trait;
use dblog_core::{Connection, ConnectionConfig, DatabaseDriver, Result};
use mysql_async::{Opts, OptsBuilder};

use crate::MySqlConnection;

const DEFAULT_PORT: u16 = 3306;

/// MySQL database driver
pub struct MySqlDriver;

impl MySqlDriver {
    /// Create a new MySQL driver instance
    pub fn new() -> Self {
        tracing::debug!("MySQL driver initialized");
        Self
    }

    /// Translate a connection configuration into `mysql_async` options.
    ///
    /// The `socket` param selects a unix socket instead of TCP.
    pub fn opts(config: &ConnectionConfig) -> Opts {
        let server = &config.server;
        let port = if server.port > 0 {
            server.port
        } else {
            DEFAULT_PORT
        };

        let mut builder = OptsBuilder::default()
            .ip_or_hostname(server.host.clone())
            .tcp_port(port)
            .user(Some(server.username.clone()))
            .db_name(Some(config.database.name.clone()));

        if !server.password.is_empty() {
            builder = builder.pass(Some(server.password.clone()));
        }
        if let Some(socket) = config.param("socket") {
            builder = builder.socket(Some(socket.to_string()));
        }

        builder.into()
    }
}

impl Default for MySqlDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for MySqlDriver {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn display_name(&self) -> &'static str {
        "MySQL"
    }

    fn default_port(&self) -> Option<u16> {
        Some(DEFAULT_PORT)
    }

    #[tracing::instrument(skip(self, config), fields(host = %config.server.host, database = %config.database.name))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let conn = MySqlConnection::connect(Self::opts(config), &config.database.name)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to connect to MySQL database"))?;
        Ok(Arc::new(conn))
    }
}
