use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::usage::UsageServiceApi;

/// Spawn the periodic retention sweep for usage records.
///
/// Returns `None` when the interval is zero. The first sweep runs immediately.
pub fn spawn_usage_purge(
    usage_service: Arc<dyn UsageServiceApi>,
    interval: Duration,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        tracing::info!("Usage retention sweep disabled");
        return None;
    }

    tracing::info!(interval_secs = interval.as_secs(), "Starting usage retention sweep");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = usage_service.purge_stale_records().await {
                tracing::error!(error = %e, "Usage retention sweep failed");
            }
        }
    }))
}
