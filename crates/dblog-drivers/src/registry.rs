//! Driver registry for looking up database drivers by id

use std::collections::HashMap;
use std::sync::Arc;

use dblog_core::{ConnectionConfig, DatabaseDriver, DblogError, Result};

/// Registry of available database drivers
#[derive(Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "mysql")]
        registry.register(Arc::new(crate::mysql::MySqlDriver::new()));

        registry
    }

    /// Register a driver under its id, replacing any previous one
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let id = driver.id().to_string();
        tracing::debug!(driver = %id, "registering database driver");
        self.drivers.insert(id, driver);
    }

    /// Get a driver by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(id).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %id, "driver not found in registry");
        }
        driver
    }

    /// Driver named by a connection configuration
    pub fn for_config(&self, config: &ConnectionConfig) -> Result<Arc<dyn DatabaseDriver>> {
        self.get(&config.driver).ok_or_else(|| {
            DblogError::Driver(format!(
                "unknown database driver '{}' (available: {})",
                config.driver,
                self.list().join(", ")
            ))
        })
    }

    /// List all registered driver ids, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Check if a driver is registered
    pub fn has(&self, id: &str) -> bool {
        self.drivers.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dblog_core::{Connection, DatabaseConfig, ServerConfig};

    struct NullDriver;

    #[async_trait]
    impl DatabaseDriver for NullDriver {
        fn name(&self) -> &'static str {
            "null"
        }

        async fn connect(&self, _config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
            Err(DblogError::Driver("null driver never connects".into()))
        }
    }

    fn config(driver: &str) -> ConnectionConfig {
        ConnectionConfig::new(
            driver,
            ServerConfig::new("localhost", 3306, "root", ""),
            DatabaseConfig::new("logs", 1, 5),
        )
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = DriverRegistry::new();
        assert!(!registry.has("null"));

        registry.register(Arc::new(NullDriver));
        assert!(registry.has("null"));
        assert_eq!(registry.get("null").unwrap().name(), "null");
        assert!(registry.get("oracle").is_none());
    }

    #[test]
    fn test_for_config_unknown_driver() {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(NullDriver));

        assert!(registry.for_config(&config("null")).is_ok());
        let err = registry.for_config(&config("oracle")).err().unwrap();
        assert!(matches!(err, DblogError::Driver(_)));
        assert!(err.to_string().contains("available: null"));
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn test_defaults_include_mysql() {
        let registry = DriverRegistry::with_defaults();
        assert!(registry.has("mysql"));
        assert_eq!(registry.get("mysql").unwrap().default_port(), Some(3306));
    }
}
