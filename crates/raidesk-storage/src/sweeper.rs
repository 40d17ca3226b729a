//! Periodic expiry sweep
//!
//! Reads already hide expired entries, so this only reclaims space held by
//! keys nobody touches again.

use crate::adapter::StorageAdapter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Spawn a task calling [`StorageAdapter::purge_expired`] every `interval`
/// until `shutdown` is cancelled
pub fn spawn_expiry_sweeper(
    storage: Arc<dyn StorageAdapter>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    info!(
        backend = storage.backend_name(),
        interval_secs = interval.as_secs(),
        "Expiry sweeper started"
    );

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    match storage.purge_expired().await {
                        Ok(0) => debug!("Expiry sweep: nothing to purge"),
                        Ok(purged) => info!(purged, "Expiry sweep removed expired entries"),
                        Err(e) => warn!(error = %e, "Expiry sweep failed"),
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Expiry sweeper shutting down");
                    break;
                }
            }
        }
    })
}
