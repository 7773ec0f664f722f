//! Periodic expiry sweep.
//!
//! [`StreamRegistry::create`] already sweeps inline. The [`Sweeper`]
//! covers the case where nothing is created for a while: an abandoned
//! channel is still evicted within `ttl + interval`.
//!
//! The task holds only a [`Weak`] handle, so it stops on its own once the
//! registry is dropped.

use super::StreamRegistry;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Background task calling [`StreamRegistry::sweep`] on a fixed period.
#[derive(Debug)]
pub struct Sweeper {
    registry: Weak<StreamRegistry>,
    interval: Duration,
    cancel: CancellationToken,
}

impl Sweeper {
    /// Creates a sweeper for `registry` ticking every `interval`.
    #[must_use]
    pub fn new(registry: &Arc<StreamRegistry>, interval: Duration) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the loop when cancelled.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawns [`run`](Self::run) onto the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until cancelled or the registry is dropped.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(interval_secs = self.interval.as_secs(), "Sweeper started");

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    debug!("Sweeper cancelled");
                    break;
                }

                _ = ticker.tick() => {
                    let Some(registry) = self.registry.upgrade() else {
                        debug!("Registry dropped");
                        break;
                    };
                    registry.sweep();
                }
            }
        }

        info!("Sweeper stopped");
    }
}
