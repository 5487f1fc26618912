//! Caller-side handle for an acquired connection

use std::ops::Deref;
use std::sync::Arc;

use dblog_core::Connection;

use super::connection::PoolConnection;
use super::pool::PoolInner;

/// A connection checked out of the pool
///
/// Pooled slots go back to the pool on [`release`](Self::release) or when the
/// guard is dropped. Overflow connections (handle 0) are destroyed instead.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    connection: Arc<PoolConnection>,
    live: Arc<dyn Connection>,
    returned: bool,
}

impl PooledConnection {
    pub(crate) fn new(
        pool: Arc<PoolInner>,
        connection: Arc<PoolConnection>,
        live: Arc<dyn Connection>,
    ) -> Self {
        Self {
            pool,
            connection,
            live,
            returned: false,
        }
    }

    /// Slot handle, 0 for overflow connections
    pub fn handle(&self) -> u32 {
        self.connection.handle()
    }

    pub fn is_anonymous(&self) -> bool {
        self.connection.is_anonymous()
    }

    /// The pool-side connection record
    pub fn pool_connection(&self) -> &Arc<PoolConnection> {
        &self.connection
    }

    /// Get the underlying driver connection as an Arc
    pub fn inner(&self) -> &Arc<dyn Connection> {
        &self.live
    }

    /// Hand the connection back: release the slot, or destroy an overflow
    /// connection.
    pub async fn release(mut self) {
        self.returned = true;
        if self.connection.is_anonymous() {
            self.connection.destroy().await;
        } else {
            self.release_slot();
        }
    }

    fn release_slot(&self) {
        if let Err(e) = self
            .pool
            .release_handle(self.connection.handle(), Some(&self.connection))
        {
            tracing::trace!(error = %e, "slot no longer in pool, nothing to release");
        }
    }
}

impl Deref for PooledConnection {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.live.as_ref()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if self.returned {
            return;
        }
        if !self.connection.is_anonymous() {
            self.release_slot();
            return;
        }

        let Some(live) = self.connection.mark_destroyed() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = live.close().await {
                        tracing::debug!(error = %e, "error closing dropped overflow connection");
                    }
                });
            }
            Err(_) => tracing::debug!("overflow connection dropped outside a runtime"),
        }
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("handle", &self.connection.handle())
            .field("driver", &self.live.driver_name())
            .finish()
    }
}
