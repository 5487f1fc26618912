//! Lifecycle of a single pooled connection
//!
//! A `PoolConnection` is created lazily with its handle assigned but no live
//! driver connection behind it. It is opened on first acquire, closed by the
//! reaper when idle, reopened transparently, and finally destroyed when its
//! slot is removed from the pool.

use std::sync::Arc;
use std::time::Duration;

use dblog_core::{Connection, ConnectionConfig, DatabaseDriver, DblogError, Result};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Handle carried by overflow connections; never a valid slot
pub const ANONYMOUS_HANDLE: u32 = 0;

/// Observable state of a pooled connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No live driver connection; the next acquire opens one
    Closed,
    /// Backed by a live driver connection
    Open,
    /// Destroyed; the connection can never be used again
    Broken,
}

enum Link {
    Closed,
    Open(Arc<dyn Connection>),
    Destroyed,
}

/// One database connection owned by the pool (or by a caller, for overflow)
pub struct PoolConnection {
    handle: u32,
    driver: Arc<dyn DatabaseDriver>,
    config: Arc<ConnectionConfig>,
    link: Mutex<Link>,
    last_activity: Mutex<Instant>,
}

impl PoolConnection {
    pub(crate) fn new(
        handle: u32,
        driver: Arc<dyn DatabaseDriver>,
        config: Arc<ConnectionConfig>,
    ) -> Self {
        Self {
            handle,
            driver,
            config,
            link: Mutex::new(Link::Closed),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    /// 1-based slot handle, or [`ANONYMOUS_HANDLE`] for overflow connections
    pub fn handle(&self) -> u32 {
        self.handle
    }

    /// True for overflow connections that must be destroyed, not released
    pub fn is_anonymous(&self) -> bool {
        self.handle == ANONYMOUS_HANDLE
    }

    /// Current state. A live connection the driver reports as closed counts
    /// as `Closed`.
    pub fn state(&self) -> ConnectionState {
        match &*self.link.lock() {
            Link::Closed => ConnectionState::Closed,
            Link::Open(conn) if conn.is_closed() => ConnectionState::Closed,
            Link::Open(_) => ConnectionState::Open,
            Link::Destroyed => ConnectionState::Broken,
        }
    }

    /// Open the underlying driver connection.
    ///
    /// No-op when already open. Driver failures surface as
    /// [`DblogError::Connection`] carrying the driver's message.
    pub async fn open(&self) -> Result<()> {
        match self.state() {
            ConnectionState::Open => return Ok(()),
            ConnectionState::Broken => {
                return Err(DblogError::Connection(format!(
                    "connection {} has been destroyed",
                    self.handle
                )));
            }
            ConnectionState::Closed => {}
        }

        tracing::debug!(handle = self.handle, "opening database connection");
        let conn = self
            .driver
            .connect(&self.config)
            .await
            .map_err(|e| match e {
                DblogError::Connection(_) => e,
                other => DblogError::Connection(other.to_string()),
            })?;

        // The lock must be gone before awaiting the close below
        let stale = {
            let mut link = self.link.lock();
            if matches!(*link, Link::Destroyed) {
                Some(conn)
            } else {
                *link = Link::Open(conn);
                None
            }
        };
        if let Some(conn) = stale {
            close_quietly(self.handle, conn).await;
            return Err(DblogError::Connection(format!(
                "connection {} was destroyed while opening",
                self.handle
            )));
        }
        Ok(())
    }

    /// Close the underlying driver connection. Failures are swallowed; the
    /// connection simply reopens on next use.
    pub async fn close(&self) {
        if let Some(conn) = self.take_open() {
            close_quietly(self.handle, conn).await;
        }
    }

    /// Close the connection and make it permanently unusable.
    pub async fn destroy(&self) {
        if let Some(conn) = self.mark_destroyed() {
            close_quietly(self.handle, conn).await;
        }
    }

    /// Stamp the last-activity time with the current instant
    pub fn touch_activity(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Time since the last acquire
    pub fn idle_time(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// Whole seconds since the last acquire
    pub fn idle_seconds(&self) -> u64 {
        self.idle_time().as_secs()
    }

    /// The live driver connection, if open
    pub(crate) fn live(&self) -> Result<Arc<dyn Connection>> {
        match &*self.link.lock() {
            Link::Open(conn) => Ok(conn.clone()),
            Link::Closed => Err(DblogError::Connection(format!(
                "connection {} is not open",
                self.handle
            ))),
            Link::Destroyed => Err(DblogError::Connection(format!(
                "connection {} has been destroyed",
                self.handle
            ))),
        }
    }

    /// Detach the live connection, leaving this one `Closed`.
    pub(crate) fn take_open(&self) -> Option<Arc<dyn Connection>> {
        let mut link = self.link.lock();
        if !matches!(*link, Link::Open(_)) {
            return None;
        }
        match std::mem::replace(&mut *link, Link::Closed) {
            Link::Open(conn) => Some(conn),
            _ => None,
        }
    }

    /// Mark as destroyed and hand back the live connection, if any, so the
    /// caller can close it outside of any pool lock.
    pub(crate) fn mark_destroyed(&self) -> Option<Arc<dyn Connection>> {
        match std::mem::replace(&mut *self.link.lock(), Link::Destroyed) {
            Link::Open(conn) => Some(conn),
            _ => None,
        }
    }
}

impl std::fmt::Debug for PoolConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolConnection")
            .field("handle", &self.handle)
            .field("state", &self.state())
            .field("idle", &self.idle_time())
            .finish()
    }
}

/// Close a driver connection, logging instead of failing
pub(crate) async fn close_quietly(handle: u32, conn: Arc<dyn Connection>) -> bool {
    match conn.close().await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(handle, error = %e, "error while closing database connection");
            false
        }
    }
}
