use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::app_state::AppState;

const DELIVERY_PURGE_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Background work started alongside the HTTP listener.
pub fn spawn_background_tasks(state: &AppState) -> JoinHandle<()> {
    let webhooks = state.webhooks.clone();
    let retention_days = state.config().identity.webhook_retention_days;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(DELIVERY_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match webhooks.purge_deliveries(retention_days).await {
                Ok(0) => debug!("no expired webhook deliveries"),
                Ok(purged) => info!(purged, retention_days, "purged webhook deliveries"),
                Err(err) => warn!(error = %err, "failed to purge webhook deliveries"),
            }
        }
    })
}
