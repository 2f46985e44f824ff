//! Background eviction for the document store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::domain::ports::DocumentStore;

/// Handle to the periodic sweep task.
///
/// The first sweep runs one full interval after start. Dropping the handle
/// without calling [`Sweeper::shutdown`] leaves the task running until the
/// runtime stops.
pub struct Sweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub fn start(store: Arc<dyn DocumentStore>, every: Duration) -> Self {
        let (shutdown, mut signal) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() fires immediately; skip that tick.
            ticker.tick().await;

            tracing::info!(interval_secs = every.as_secs(), "document sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match store.sweep(Utc::now()) {
                            Ok(0) => tracing::debug!("sweep found nothing to evict"),
                            Ok(evicted) => tracing::info!(evicted, "expired documents evicted"),
                            Err(e) => tracing::error!(error = %e, "sweep failed"),
                        }
                    }
                    _ = signal.changed() => break,
                }
            }

            tracing::info!("document sweeper stopped");
        });

        Self { shutdown, handle }
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "sweeper task ended abnormally");
        }
    }
}
