//! Connection pool implementation

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dblog_core::{Connection, ConnectionConfig, DatabaseDriver, DblogError, Result};
use parking_lot::Mutex;

use super::config::PoolConfig;
use super::connection::{ANONYMOUS_HANDLE, ConnectionState, PoolConnection, close_quietly};
use super::growth::GrowthPolicy;
use super::guard::PooledConnection;
use super::reaper::{self, ReaperHandle};
use super::stats::PoolStats;

/// One position in the pool
struct Slot {
    connection: Arc<PoolConnection>,
    available: bool,
}

/// Everything guarded by the pool mutex. Slots and their availability live
/// together so a resize replaces both in one step.
struct PoolState {
    slots: Vec<Slot>,
    starvation: usize,
    shut_down: bool,
    connection_config: Option<Arc<ConnectionConfig>>,
}

/// Outcome of one scan over the slots
enum Claim {
    Slot(Arc<PoolConnection>),
    Grown { from: usize, to: usize },
    Overflow(Arc<ConnectionConfig>),
}

pub(crate) struct PoolInner {
    config: PoolConfig,
    growth: GrowthPolicy,
    driver: Arc<dyn DatabaseDriver>,
    state: Mutex<PoolState>,
    reaper: Mutex<Option<ReaperHandle>>,
    overflow_opened: AtomicUsize,
    growth_events: AtomicUsize,
}

/// A pool of reusable database connections
///
/// Acquire never waits for another caller to release: when every slot is
/// checked out the pool either grows (after sustained starvation) or hands out
/// a one-shot overflow connection. A background reaper closes connections
/// that have been idle longer than the configured timeout.
///
/// Cloning is cheap; all clones share the same slots.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Create an empty pool and start its idle reaper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: PoolConfig,
        connection_config: ConnectionConfig,
        driver: Arc<dyn DatabaseDriver>,
    ) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            DblogError::Configuration(
                "connection pool must be created inside a tokio runtime".into(),
            )
        })?;

        let inner = Arc::new(PoolInner {
            growth: config.growth_policy(),
            config,
            driver,
            state: Mutex::new(PoolState {
                slots: Vec::new(),
                starvation: 0,
                shut_down: false,
                connection_config: Some(Arc::new(connection_config)),
            }),
            reaper: Mutex::new(None),
            overflow_opened: AtomicUsize::new(0),
            growth_events: AtomicUsize::new(0),
        });

        let handle = reaper::spawn(&runtime, Arc::downgrade(&inner), inner.config.reaper_interval());
        *inner.reaper.lock() = Some(handle);

        tracing::debug!(
            min_size = inner.config.min_size(),
            max_size = inner.config.max_size(),
            driver = inner.driver.name(),
            "connection pool created"
        );
        Ok(Self { inner })
    }

    /// Get an exclusively owned, open connection.
    ///
    /// Returns a pooled slot when one is free, grows the pool under sustained
    /// starvation, and otherwise falls back to an overflow connection with
    /// handle 0. Open failures are returned as [`DblogError::Connection`] and
    /// are not retried.
    pub async fn acquire(&self) -> Result<PooledConnection> {
        let attempts = self.inner.config.max_acquire_attempts();
        for attempt in 1..=attempts {
            match self.inner.claim()? {
                Claim::Slot(connection) => {
                    match self.inner.checkout(&connection).await {
                        Ok(live) => {
                            return Ok(PooledConnection::new(
                                self.inner.clone(),
                                connection,
                                live,
                            ));
                        }
                        Err(e) if connection.state() == ConnectionState::Broken => {
                            // Slot was removed by a shrink or shutdown while opening
                            tracing::debug!(
                                handle = connection.handle(),
                                attempt,
                                error = %e,
                                "claimed slot destroyed during open, retrying"
                            );
                            let shut_down = self.inner.state.lock().shut_down;
                            if shut_down {
                                return Err(DblogError::PoolShutdown);
                            }
                        }
                        Err(e) => return Err(e),
                    }
                }
                Claim::Grown { from, to } => {
                    tracing::debug!(from, to, attempt, "pool grown, retrying acquire");
                }
                Claim::Overflow(connection_config) => {
                    return self.inner.open_overflow(connection_config).await;
                }
            }
        }

        Err(DblogError::PoolExhausted(format!(
            "no slot could be claimed after {} attempts",
            attempts
        )))
    }

    /// Mark the slot at `handle` available again.
    ///
    /// Unknown handles (including 0 and handles invalidated by a shrink) are
    /// ignored.
    pub fn release(&self, handle: u32) {
        if let Err(e) = self.inner.release_handle(handle, None) {
            tracing::trace!(handle, error = %e, "ignoring release of unknown handle");
        }
    }

    /// Grow or shrink the pool to exactly `new_size` slots.
    ///
    /// Growing keeps existing slots untouched and appends closed, available
    /// ones. Shrinking destroys every slot at index `new_size` or above;
    /// failures while closing them are logged and ignored.
    pub async fn resize(&self, new_size: usize) -> Result<()> {
        if new_size > self.inner.config.max_size() {
            return Err(DblogError::Configuration(format!(
                "cannot resize pool to {} slots, max_size is {}",
                new_size,
                self.inner.config.max_size()
            )));
        }

        let removed = {
            let mut state = self.inner.state.lock();
            if state.shut_down {
                return Err(DblogError::PoolShutdown);
            }
            self.inner.resize_locked(&mut state, new_size)?
        };

        destroy_all(removed).await;
        Ok(())
    }

    /// Close connections that have been idle for at least the idle timeout.
    ///
    /// Checked-out slots are never touched. Returns how many connections were
    /// closed. The reaper calls this on every tick.
    pub async fn reap_idle(&self) -> usize {
        self.inner.reap_idle().await
    }

    /// Stop the reaper and destroy every slot.
    ///
    /// Safe to call any number of times.
    pub async fn shutdown(&self) {
        let reaper = self.inner.reaper.lock().take();
        if let Some(reaper) = reaper {
            reaper.stop().await;
        }

        let removed = {
            let mut state = self.inner.state.lock();
            if state.shut_down {
                return;
            }
            state.shut_down = true;
            state.starvation = 0;
            state.connection_config = None;
            let slots = std::mem::take(&mut state.slots);
            slots
                .into_iter()
                .filter_map(|slot| slot.connection.mark_destroyed().map(|c| (slot.connection.handle(), c)))
                .collect::<Vec<_>>()
        };

        let count = removed.len();
        destroy_all(removed).await;
        tracing::debug!(closed = count, "connection pool shut down");
    }

    /// Current pool statistics
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        let total = state.slots.len();
        let available = state.slots.iter().filter(|s| s.available).count();
        let open = state
            .slots
            .iter()
            .filter(|s| s.connection.state() == ConnectionState::Open)
            .count();
        PoolStats::new(
            total,
            available,
            open,
            self.inner.overflow_opened.load(Ordering::Relaxed),
            self.inner.growth_events.load(Ordering::Relaxed),
            state.starvation,
        )
    }

    /// Number of slots
    pub fn size(&self) -> usize {
        self.inner.state.lock().slots.len()
    }

    /// The connection stored at `handle`, if any
    pub fn slot(&self, handle: u32) -> Option<Arc<PoolConnection>> {
        let state = self.inner.state.lock();
        slot_index(handle)
            .and_then(|index| state.slots.get(index))
            .map(|slot| slot.connection.clone())
    }

    /// Whether [`shutdown`](Self::shutdown) has run
    pub fn is_shut_down(&self) -> bool {
        self.inner.state.lock().shut_down
    }

    /// Get the pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// The connection settings shared by every slot; `None` after shutdown
    pub fn connection_config(&self) -> Option<Arc<ConnectionConfig>> {
        self.inner.state.lock().connection_config.clone()
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl PoolInner {
    /// Scan the slots under the lock and decide how this acquire proceeds
    fn claim(&self) -> Result<Claim> {
        let mut state = self.state.lock();
        if state.shut_down {
            return Err(DblogError::PoolShutdown);
        }

        if let Some(slot) = state.slots.iter_mut().find(|slot| slot.available) {
            slot.available = false;
            let connection = slot.connection.clone();
            state.starvation = 0;
            return Ok(Claim::Slot(connection));
        }

        state.starvation += 1;
        let size = state.slots.len();
        if self.growth.should_grow(state.starvation, size) {
            state.starvation = 0;
            match self.growth.next_size(size) {
                Some(to) => {
                    // Slots added by growth are closed, so nothing to destroy
                    self.resize_locked(&mut state, to)?;
                    self.growth_events.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(from = size, to, "connection pool grown under starvation");
                    return Ok(Claim::Grown { from: size, to });
                }
                None => {
                    tracing::warn!(
                        size,
                        max_size = self.config.max_size(),
                        "connection pool at capacity, using overflow connection"
                    );
                }
            }
        }

        let connection_config = state
            .connection_config
            .clone()
            .ok_or(DblogError::PoolShutdown)?;
        Ok(Claim::Overflow(connection_config))
    }

    /// Open a claimed slot. The slot is handed back if opening fails.
    async fn checkout(&self, connection: &Arc<PoolConnection>) -> Result<Arc<dyn Connection>> {
        let opened = match connection.open().await {
            Ok(()) => connection.live(),
            Err(e) => Err(e),
        };

        match opened {
            Ok(live) => {
                connection.touch_activity();
                Ok(live)
            }
            Err(e) => {
                tracing::warn!(
                    handle = connection.handle(),
                    error = %e,
                    "failed to open pooled connection"
                );
                // The slot may already be gone after a concurrent shrink
                let _ = self.release_handle(connection.handle(), Some(connection));
                Err(e)
            }
        }
    }

    async fn open_overflow(
        self: &Arc<Self>,
        connection_config: Arc<ConnectionConfig>,
    ) -> Result<PooledConnection> {
        let connection = Arc::new(PoolConnection::new(
            ANONYMOUS_HANDLE,
            self.driver.clone(),
            connection_config,
        ));
        connection.open().await?;
        let live = connection.live()?;
        connection.touch_activity();
        self.overflow_opened.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("handing out overflow connection");
        Ok(PooledConnection::new(self.clone(), connection, live))
    }

    /// Mark a slot available. With `expected` set, only that exact
    /// connection may be released, so a stale guard cannot free a slot that
    /// was destroyed and recreated by a resize.
    pub(crate) fn release_handle(
        &self,
        handle: u32,
        expected: Option<&Arc<PoolConnection>>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let slot = slot_index(handle)
            .and_then(|index| state.slots.get_mut(index))
            .ok_or(DblogError::InvalidHandle(handle))?;

        if let Some(expected) = expected {
            if !Arc::ptr_eq(&slot.connection, expected) {
                return Err(DblogError::InvalidHandle(handle));
            }
        }
        slot.available = true;
        Ok(())
    }

    /// Resize while holding the pool lock; returns the live connections of
    /// removed slots for closing once the lock is released.
    fn resize_locked(
        &self,
        state: &mut PoolState,
        new_size: usize,
    ) -> Result<Vec<(u32, Arc<dyn Connection>)>> {
        let current = state.slots.len();
        if new_size > current {
            let connection_config = state
                .connection_config
                .clone()
                .ok_or(DblogError::PoolShutdown)?;
            state.slots.extend((current..new_size).map(|index| Slot {
                connection: Arc::new(PoolConnection::new(
                    index as u32 + 1,
                    self.driver.clone(),
                    connection_config.clone(),
                )),
                available: true,
            }));
            return Ok(Vec::new());
        }

        Ok(state
            .slots
            .drain(new_size..)
            .filter_map(|slot| {
                slot.connection
                    .mark_destroyed()
                    .map(|live| (slot.connection.handle(), live))
            })
            .collect())
    }

    pub(crate) async fn reap_idle(&self) -> usize {
        let idle_timeout = self.config.idle_timeout();
        let expired = {
            let state = self.state.lock();
            state
                .slots
                .iter()
                .filter(|slot| slot.available)
                .filter(|slot| slot.connection.state() == ConnectionState::Open)
                .filter(|slot| slot.connection.idle_time() >= idle_timeout)
                .filter_map(|slot| {
                    slot.connection
                        .take_open()
                        .map(|live| (slot.connection.handle(), live))
                })
                .collect::<Vec<_>>()
        };

        let count = expired.len();
        for (handle, live) in expired {
            close_quietly(handle, live).await;
            tracing::debug!(handle, "closed idle pooled connection");
        }
        count
    }
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        if let Some(reaper) = self.reaper.get_mut().take() {
            reaper.cancel();
        }

        let state = self.state.get_mut();
        if state.shut_down {
            return;
        }
        let removed: Vec<_> = state
            .slots
            .drain(..)
            .filter_map(|slot| {
                slot.connection
                    .mark_destroyed()
                    .map(|live| (slot.connection.handle(), live))
            })
            .collect();

        if removed.is_empty() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(destroy_all(removed));
            }
            Err(_) => {
                tracing::debug!(
                    count = removed.len(),
                    "connection pool dropped outside a runtime, connections not closed"
                );
            }
        }
    }
}

fn slot_index(handle: u32) -> Option<usize> {
    (handle != ANONYMOUS_HANDLE).then(|| handle as usize - 1)
}

/// Close connections removed from the pool. Best effort.
async fn destroy_all(removed: Vec<(u32, Arc<dyn Connection>)>) {
    for (handle, live) in removed {
        if close_quietly(handle, live).await {
            tracing::debug!(handle, "destroyed pooled connection");
        }
    }
}
