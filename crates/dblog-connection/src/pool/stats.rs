//! Pool statistics types

use serde::{Deserialize, Serialize};

/// Statistics about a connection pool's current state
///
/// Provides insight into pool utilization and how often the pool had to
/// grow or fall back to overflow connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolStats {
    /// Number of slots
    total: usize,
    /// Slots free to be acquired
    available: usize,
    /// Slots backed by a live connection, checked out or not
    open: usize,
    /// Overflow connections handed out since the pool was created
    overflow_opened: usize,
    /// Times the pool grew under starvation
    growth_events: usize,
    /// Consecutive acquires that found no free slot
    starvation: usize,
}

impl PoolStats {
    /// Create new pool statistics
    pub fn new(
        total: usize,
        available: usize,
        open: usize,
        overflow_opened: usize,
        growth_events: usize,
        starvation: usize,
    ) -> Self {
        Self {
            total,
            available,
            open,
            overflow_opened,
            growth_events,
            starvation,
        }
    }

    /// Get the number of slots
    pub fn total(&self) -> usize {
        self.total
    }

    /// Get the number of slots free to be acquired
    pub fn available(&self) -> usize {
        self.available
    }

    /// Get the number of checked-out slots
    pub fn in_use(&self) -> usize {
        self.total.saturating_sub(self.available)
    }

    /// Get the number of slots with a live connection
    pub fn open(&self) -> usize {
        self.open
    }

    pub fn overflow_opened(&self) -> usize {
        self.overflow_opened
    }

    pub fn growth_events(&self) -> usize {
        self.growth_events
    }

    pub fn starvation(&self) -> usize {
        self.starvation
    }

    /// Calculate pool utilization as a fraction (0.0 to 1.0)
    ///
    /// Returns 0.0 for an empty pool.
    pub fn utilization(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.in_use() as f64 / self.total as f64
        }
    }

    /// Check if every slot is checked out
    pub fn is_full(&self) -> bool {
        self.available == 0 && self.total > 0
    }
}
