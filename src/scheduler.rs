//! Scheduled update runs.
//!
//! A detached task drives the orchestrator on a fixed period. Outcomes are
//! logged, never surfaced to a user. There is no run-level locking against
//! the manual endpoint: overlapping runs both write the cache and the last
//! write wins.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::refresh::Refresher;

/// Spawn the scheduler loop. The first tick fires after one full period.
pub fn spawn(refresher: Arc<Refresher>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval fires immediately; consume the first tick so startup
        // does not trigger a run.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            info!("scheduled refresh starting");
            match refresher.run().await {
                Ok(outcome) => {
                    info!(
                        tier = %outcome.tier,
                        model = %outcome.model,
                        chars = outcome.content.len(),
                        "scheduled refresh succeeded"
                    );
                }
                Err(err) => {
                    error!(error = %err.detail(), "scheduled refresh failed");
                }
            }
        }
    })
}
