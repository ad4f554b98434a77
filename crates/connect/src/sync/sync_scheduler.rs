//! Periodic sync driver.
//!
//! A single interval timer drives sweeps. If a sweep runs past the next
//! tick the missed tick is skipped, never queued, so sweeps cannot pile
//! up behind a slow exchange.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{error, info};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::sync_model::SyncConfig;
use super::sync_service::SyncOrchestrator;

/// What the scheduler runs on each tick. Split out so the tick loop can be
/// tested without real repositories or adapters.
#[async_trait]
pub trait SyncRunner: Send + Sync {
    async fn run_once(&self);
}

#[async_trait]
impl SyncRunner for SyncOrchestrator {
    async fn run_once(&self) {
        if let Err(err) = self.sync_all_active().await {
            error!("Scheduled sync sweep failed: {}", err);
        }
    }
}

pub struct SyncScheduler {
    runner: Arc<dyn SyncRunner>,
    interval: Duration,
}

impl SyncScheduler {
    pub fn new(runner: Arc<dyn SyncRunner>, config: &SyncConfig) -> Self {
        Self {
            runner,
            interval: config.interval,
        }
    }

    /// Runs sweeps until the shutdown channel flips to true or its sender
    /// is dropped. The sweep itself runs inline on this task, which is
    /// what guarantees no two sweeps overlap.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.runner.run_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Sync scheduler shutting down");
                        return;
                    }
                }
            }
        }
    }
}
