//! Pool configuration types

use std::time::Duration;

use dblog_core::{DatabaseConfig, DblogError, Result};
use serde::{Deserialize, Serialize};

use super::growth::GrowthPolicy;

/// Configuration for a connection pool
///
/// Controls pool sizing, growth, and the idle reaper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of slots the pool grows to on first use
    min_size: usize,
    /// Upper bound for automatic growth
    max_size: usize,
    /// Interval in milliseconds between reaper sweeps
    reaper_interval_ms: u64,
    /// Idle time in milliseconds after which an available connection is closed
    idle_timeout_ms: u64,
    /// Multiplier applied to the pool size when it grows
    growth_factor: f64,
    /// How many grow-and-rescan rounds a single acquire may go through
    max_acquire_attempts: u32,
}

impl PoolConfig {
    /// Create a new pool configuration with the given min and max sizes
    pub fn new(min_size: usize, max_size: usize) -> Self {
        Self {
            min_size,
            max_size,
            reaper_interval_ms: 10_000, // 10 seconds
            idle_timeout_ms: 60_000,    // 1 minute
            growth_factor: 1.3,
            max_acquire_attempts: 4,
        }
    }

    /// Take the pool bounds from a database configuration
    pub fn from_database(database: &DatabaseConfig) -> Self {
        Self::new(database.pool_min_size, database.pool_max_size)
    }

    /// Set the reaper interval in milliseconds
    pub fn with_reaper_interval_ms(mut self, interval_ms: u64) -> Self {
        self.reaper_interval_ms = interval_ms;
        self
    }

    /// Set the idle timeout in milliseconds
    pub fn with_idle_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.idle_timeout_ms = timeout_ms;
        self
    }

    /// Set the growth factor
    pub fn with_growth_factor(mut self, factor: f64) -> Self {
        self.growth_factor = factor;
        self
    }

    /// Set the acquire attempt limit
    pub fn with_max_acquire_attempts(mut self, attempts: u32) -> Self {
        self.max_acquire_attempts = attempts;
        self
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(DblogError::Configuration(format!(
                "max_size must be greater than 0, got {}",
                self.max_size
            )));
        }
        if self.min_size > self.max_size {
            return Err(DblogError::Configuration(format!(
                "min_size ({}) cannot exceed max_size ({})",
                self.min_size, self.max_size
            )));
        }
        if self.reaper_interval_ms == 0 {
            return Err(DblogError::Configuration(
                "reaper interval must be greater than 0".into(),
            ));
        }
        if !self.growth_factor.is_finite() || self.growth_factor < 1.0 {
            return Err(DblogError::Configuration(format!(
                "growth_factor must be at least 1.0, got {}",
                self.growth_factor
            )));
        }
        if self.max_acquire_attempts == 0 {
            return Err(DblogError::Configuration(
                "max_acquire_attempts must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Get the minimum pool size
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Get the maximum pool size
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Get the reaper interval as a Duration
    pub fn reaper_interval(&self) -> Duration {
        Duration::from_millis(self.reaper_interval_ms)
    }

    /// Get the idle timeout as a Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Get the growth factor
    pub fn growth_factor(&self) -> f64 {
        self.growth_factor
    }

    /// Get the acquire attempt limit
    pub fn max_acquire_attempts(&self) -> u32 {
        self.max_acquire_attempts
    }

    /// Growth policy derived from this configuration
    pub fn growth_policy(&self) -> GrowthPolicy {
        GrowthPolicy::new(self.growth_factor, self.min_size, self.max_size)
    }
}

impl Default for PoolConfig {
    /// Create a default pool configuration
    ///
    /// Defaults:
    /// - min_size: 5
    /// - max_size: 300
    /// - reaper_interval: 10 seconds
    /// - idle_timeout: 60 seconds
    /// - growth_factor: 1.3
    fn default() -> Self {
        Self::new(5, 300)
    }
}
