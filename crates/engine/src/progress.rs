//! Best-effort progress reporting.
//!
//! Persists progress on the job record, then pushes a `progress` webhook
//! event. Infallible from the pipeline's point of view: a failure to
//! persist or notify is logged and swallowed, and the generation
//! continues. The job record stays the single source of truth that both
//! the polling and the webhook paths read from.

use std::sync::Arc;

use sitewright_core::status::JobStatus;
use sitewright_events::{EventKind, WebhookDispatcher, WebhookEvent};
use sitewright_store::models::GenerationJob;
use sitewright_store::JobStore;

/// Records progress and triggers `progress` notifications.
#[derive(Clone)]
pub struct ProgressTracker {
    store: Arc<dyn JobStore>,
    dispatcher: Arc<WebhookDispatcher>,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn JobStore>, dispatcher: Arc<WebhookDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Record `progress`/`step` for the job and fire a `progress` event.
    ///
    /// The value is clamped to 0–100 by the store and never lowers the
    /// recorded progress. Never returns an error.
    pub async fn update(&self, job: &GenerationJob, status: JobStatus, progress: u8, step: &str) {
        if let Err(e) = self.store.update_progress(job.id, progress, step).await {
            tracing::warn!(
                job_id = %job.id,
                progress,
                error = %e,
                "Failed to persist progress update, continuing",
            );
        }

        self.dispatcher
            .notify(
                WebhookEvent::new(
                    EventKind::Progress,
                    job.id,
                    job.project_id,
                    job.user_id,
                    status,
                )
                .with_progress(progress.min(100), step),
            )
            .await;
    }
}
