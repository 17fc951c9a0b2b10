//! Background consolidation loop.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::hippocampus::HippocampalMemory;

/// Run `check_aging` then `consolidate` every `interval` until `token`
/// is cancelled. The first pass runs after one full interval.
pub fn spawn_consolidation_loop(
    memory: Arc<HippocampalMemory>,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // interval() fires immediately once
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Consolidation loop stopped");
                    break;
                }
                _ = ticker.tick() => {}
            }

            if let Err(e) = memory.lifecycle().check_aging().await {
                warn!(error = %e, "Evidence aging sweep failed");
            }
            if let Err(e) = memory.consolidate().await {
                warn!(error = %e, "Consolidation pass failed");
            }
        }
    })
}
