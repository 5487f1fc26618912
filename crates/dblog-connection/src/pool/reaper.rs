//! Background task closing idle pooled connections

use std::panic::AssertUnwindSafe;
use std::sync::Weak;
use std::time::Duration;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::pool::PoolInner;

/// Owner side of a running reaper task
pub(crate) struct ReaperHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Signal the task to stop without waiting for it
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Signal the task to stop and wait until it has exited
    pub(crate) async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            if e.is_panic() {
                tracing::error!("idle reaper task panicked");
            }
        }
    }
}

/// Spawn the reaper. It holds only a weak reference so an abandoned pool is
/// still dropped; the loop ends once the pool is gone or the token fires.
pub(crate) fn spawn(runtime: &Handle, pool: Weak<PoolInner>, interval: Duration) -> ReaperHandle {
    let token = CancellationToken::new();
    let task = runtime.spawn(run(pool, interval, token.clone()));
    ReaperHandle { token, task }
}

async fn run(pool: Weak<PoolInner>, interval: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(pool) = pool.upgrade() else {
            break;
        };

        match AssertUnwindSafe(pool.reap_idle()).catch_unwind().await {
            Ok(0) => {}
            Ok(closed) => tracing::debug!(closed, "idle reaper sweep finished"),
            Err(_) => tracing::error!("idle reaper sweep panicked, continuing"),
        }
    }

    tracing::trace!("idle reaper stopped");
}
