use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::scheduler::SchedulerEngine;

/// Background loop that advances task lifecycles at a fixed interval.
///
/// Each tick takes the engine write lock exactly once: due Running tasks
/// complete, assigned Pending tasks start, and the bookkeeping self-check
/// runs. Nothing else in the process mutates task status on a timer.
pub struct LifecycleDriver {
    engine: Arc<RwLock<SchedulerEngine>>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl LifecycleDriver {
    pub fn new(
        engine: Arc<RwLock<SchedulerEngine>>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            interval,
            shutdown,
        }
    }

    pub async fn run(self) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "Lifecycle driver started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                _ = self.shutdown.cancelled() => {
                    info!("Lifecycle driver stopping");
                    break;
                }
            }
        }
    }

    async fn tick(&self) {
        let summary = self.engine.write().await.advance_clock(Utc::now());
        if summary.repaired > 0 {
            error!(
                repaired = summary.repaired,
                "Node task lists drifted and were rebuilt"
            );
        }
        if !summary.is_idle() {
            debug!(
                started = summary.started,
                completed = summary.completed,
                "Lifecycle tick"
            );
        }
    }
}
