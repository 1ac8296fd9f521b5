//! Periodic expiry sweep for completed jobs.
//!
//! Moves `COMPLETED` jobs whose retention deadline has passed to
//! `EXPIRED` on a fixed interval. Single-job reads also expire lazily,
//! so the sweep is a tidiness mechanism, not a correctness requirement.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sitewright_store::JobStore;
use tokio_util::sync::CancellationToken;

/// Run the expiry sweep loop until `cancel` is triggered.
pub async fn run(store: Arc<dyn JobStore>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Expiry sweep started");
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Expiry sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                match store.sweep_expired(Utc::now()).await {
                    Ok(0) => tracing::debug!("Expiry sweep: nothing to expire"),
                    Ok(swept) => tracing::info!(swept, "Expiry sweep: jobs expired"),
                    Err(e) => tracing::error!(error = %e, "Expiry sweep failed"),
                }
            }
        }
    }
}
