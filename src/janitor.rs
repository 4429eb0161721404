//! Periodic result-store cleanup.
//!
//! [`StoreJanitor`] runs [`ResultStore::cleanup`] on a fixed interval so
//! expired records are dropped even when nobody resolves IDs. Cleanup is
//! idempotent, so overlapping with the pass `resolve` runs is harmless.

use std::sync::Arc;
use std::time::Duration;

use serp_extract::ResultStore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Background cleanup task for a shared [`ResultStore`].
pub struct StoreJanitor {
    store: Arc<ResultStore>,
    interval: Duration,
    cancel: CancellationToken,
}

impl StoreJanitor {
    /// Create a janitor that cleans `store` every `interval` until `cancel`
    /// fires.
    ///
    /// Call [`run`](Self::run) or [`spawn`](Self::spawn) to start it.
    pub fn new(store: Arc<ResultStore>, interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            store,
            interval,
            cancel,
        }
    }

    /// Run the cleanup loop until the cancellation token is cancelled.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it.
        ticker.tick().await;
        info!(interval_secs = self.interval.as_secs_f64(), "store janitor started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("store janitor cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.store.cleanup();
                    debug!(
                        removed = report.removed(),
                        remaining = self.store.len(),
                        "janitor cleanup pass"
                    );
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
