//! Generation pipeline orchestration.
//!
//! [`GenerationEngine`] validates a start request, reserves the project
//! (no other active job), creates the `PENDING` record, and returns the
//! job id immediately. The staged pipeline runs in a spawned task with
//! its own error boundary: a stage error, a panic, or the job deadline
//! all route through the same `FAILED` transition path. Cancellation is
//! cooperative — the in-flight external call is not interrupted, and the
//! next stage-entry compare-and-set observes the terminal override.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use sitewright_core::error::CoreError;
use sitewright_core::options::GenerationOptions;
use sitewright_core::status::{JobStatus, ACTIVE_STATUSES};
use sitewright_core::types::{JobId, ProjectId, UserId};
use sitewright_events::registry::RegistryStats;
use sitewright_events::{
    EventKind, WebhookDispatcher, WebhookEvent, WebhookRegistration, WebhookRegistry,
};
use sitewright_store::models::{GenerationJob, NewJob, ProjectRecord, TransitionFields};
use sitewright_store::{JobStore, ProjectDirectory, StoreError};
use tokio_util::sync::CancellationToken;

use crate::backend::BuildBackend;
use crate::config::EngineConfig;
use crate::progress::ProgressTracker;

/// Error log entry recorded on user cancellation.
pub const CANCELLED_BY_USER: &str = "cancelled by user";

/// Reason codes carried in the `data` blob of `failed` events.
pub const REASON_CANCELLED: &str = "cancelled";
pub const REASON_STAGE_FAILURE: &str = "stage_failure";
pub const REASON_TIMEOUT: &str = "timeout";
pub const REASON_PANIC: &str = "panic";

// Per-stage progress values and step labels. Not evenly spaced: the
// cheap early stages take small increments so the slow content and
// build stages own the bulk of the bar.
const PROGRESS_INITIALIZING: u8 = 5;
const STEP_INITIALIZING: &str = "Preparing project data";
const PROGRESS_CONTENT: u8 = 15;
const STEP_CONTENT: &str = "Generating page content";
const PROGRESS_THEME: u8 = 55;
const STEP_THEME: &str = "Applying theme";
const PROGRESS_BUILD: u8 = 65;
const STEP_BUILD: &str = "Building static site";
const PROGRESS_PACKAGE: u8 = 90;
const STEP_PACKAGE: &str = "Packaging site archive";

// ---------------------------------------------------------------------------
// GenerationEngine
// ---------------------------------------------------------------------------

/// Orchestrates generation jobs over injected collaborators.
pub struct GenerationEngine {
    pub(crate) store: Arc<dyn JobStore>,
    pub(crate) projects: Arc<dyn ProjectDirectory>,
    pub(crate) backend: Arc<dyn BuildBackend>,
    pub(crate) registry: Arc<WebhookRegistry>,
    pub(crate) dispatcher: Arc<WebhookDispatcher>,
    pub(crate) tracker: ProgressTracker,
    pub(crate) config: EngineConfig,
}

impl GenerationEngine {
    pub fn new(
        store: Arc<dyn JobStore>,
        projects: Arc<dyn ProjectDirectory>,
        backend: Arc<dyn BuildBackend>,
        registry: Arc<WebhookRegistry>,
        config: EngineConfig,
    ) -> Self {
        let dispatcher = Arc::new(WebhookDispatcher::new(Arc::clone(&registry)));
        let tracker = ProgressTracker::new(Arc::clone(&store), Arc::clone(&dispatcher));
        Self {
            store,
            projects,
            backend,
            registry,
            dispatcher,
            tracker,
            config,
        }
    }

    // -----------------------------------------------------------------
    // Start
    // -----------------------------------------------------------------

    /// Validate and start a generation job for a project.
    ///
    /// Synchronous failures: `Validation` (bad options, wizard data
    /// incomplete), `NotFound` (project missing or foreign), `Conflict`
    /// (the project already has an active job — the request fails fast,
    /// nothing is queued). On success the pipeline is scheduled and the
    /// new job id returned immediately; no pipeline stage is awaited.
    pub async fn start_generation(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        options: GenerationOptions,
    ) -> Result<JobId, CoreError> {
        options.validate()?;

        let project = self
            .projects
            .find_project(project_id, user_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Project" })?;
        if !project.wizard_complete {
            return Err(CoreError::Validation(
                "Project wizard data must be complete before generation".to_string(),
            ));
        }

        // The store makes the active-job check and the insert a single
        // critical section; concurrent starts admit exactly one job.
        let job = self
            .store
            .create(NewJob {
                project_id,
                user_id,
                options: options.clone(),
            })
            .await
            .map_err(|e| match e {
                StoreError::ActiveJobExists { .. } => CoreError::Conflict(
                    "A generation job is already in progress for this project".to_string(),
                ),
                other => other.into(),
            })?;

        tracing::info!(
            job_id = %job.id,
            project_id = %project_id,
            user_id = %user_id,
            theme = job.theme.as_deref().unwrap_or("<auto>"),
            "Generation job created",
        );

        self.dispatcher
            .notify(WebhookEvent::new(
                EventKind::Started,
                job.id,
                project_id,
                user_id,
                JobStatus::Pending,
            ))
            .await;

        let job_id = job.id;
        self.spawn_pipeline(job, project, options);
        Ok(job_id)
    }

    /// Schedule the pipeline with its own error boundary. A panic inside
    /// a stage cannot reach the request-handling path; it is converted
    /// into a `FAILED` transition, as is the overall job deadline.
    fn spawn_pipeline(
        &self,
        job: GenerationJob,
        project: ProjectRecord,
        options: GenerationOptions,
    ) {
        let worker = PipelineWorker {
            store: Arc::clone(&self.store),
            backend: Arc::clone(&self.backend),
            tracker: self.tracker.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
            retention: self.config.retention,
        };
        let deadline = self.config.job_timeout;

        tokio::spawn(async move {
            let run = AssertUnwindSafe(worker.run(&job, &project, &options)).catch_unwind();
            match tokio::time::timeout(deadline, run).await {
                Ok(Ok(())) => {}
                Ok(Err(_panic)) => {
                    worker
                        .fail(&job, "Generation pipeline panicked".to_string(), REASON_PANIC)
                        .await;
                }
                Err(_elapsed) => {
                    worker
                        .fail(
                            &job,
                            format!("Generation timed out after {}s", deadline.as_secs()),
                            REASON_TIMEOUT,
                        )
                        .await;
                }
            }
        });
    }

    // -----------------------------------------------------------------
    // Cancel
    // -----------------------------------------------------------------

    /// Cancel an active generation job.
    ///
    /// A job owned by another user behaves as `NotFound`. Cancelling a
    /// terminal job is a `Conflict` — the caller is told cancellation
    /// had no effect — and does not mutate the record. The in-flight
    /// stage is not interrupted; the pipeline stops at the next stage
    /// boundary.
    pub async fn cancel_generation(&self, job_id: JobId, user_id: UserId) -> Result<(), CoreError> {
        let job = self
            .store
            .find(job_id)
            .await?
            .filter(|j| j.user_id == user_id)
            .ok_or(CoreError::NotFound { entity: "Job" })?;

        if job.status.is_terminal() {
            return Err(CoreError::Conflict(
                "Generation has already finished and cannot be cancelled".to_string(),
            ));
        }

        let cancelled = self
            .store
            .transition(
                job_id,
                &ACTIVE_STATUSES,
                JobStatus::Failed,
                TransitionFields::failure(CANCELLED_BY_USER, Utc::now()),
            )
            .await?;
        if !cancelled {
            // Lost the race against a terminal transition.
            return Err(CoreError::Conflict(
                "Generation has already finished and cannot be cancelled".to_string(),
            ));
        }

        tracing::info!(job_id = %job_id, user_id = %user_id, "Generation cancelled");

        self.dispatcher
            .notify(
                WebhookEvent::new(
                    EventKind::Failed,
                    job_id,
                    job.project_id,
                    user_id,
                    JobStatus::Failed,
                )
                .with_data(serde_json::json!({
                    "reason": REASON_CANCELLED,
                    "error": CANCELLED_BY_USER,
                })),
            )
            .await;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Webhook management façade
    // -----------------------------------------------------------------

    /// Register a callback URL for a subset of lifecycle events.
    pub async fn register_webhook(
        &self,
        user_id: UserId,
        url: &str,
        events: &[EventKind],
        headers: HashMap<String, String>,
    ) -> Result<(), CoreError> {
        self.registry.register(user_id, url, events, headers).await
    }

    /// List the caller's webhook registrations.
    pub async fn list_webhooks(&self, user_id: UserId) -> Vec<WebhookRegistration> {
        self.registry.list(user_id).await
    }

    /// Remove one registration; absent registrations are `NotFound`.
    pub async fn remove_webhook(&self, user_id: UserId, url: &str) -> Result<(), CoreError> {
        if self.registry.remove(user_id, url).await {
            Ok(())
        } else {
            Err(CoreError::NotFound { entity: "Webhook" })
        }
    }

    /// Remove all of the caller's registrations; returns the count.
    pub async fn clear_webhooks(&self, user_id: UserId) -> usize {
        self.registry.clear(user_id).await
    }

    /// Aggregate registration counts for the caller.
    pub async fn webhook_stats(&self, user_id: UserId) -> RegistryStats {
        self.registry.stats(user_id).await
    }

    // -----------------------------------------------------------------
    // Expiry sweep
    // -----------------------------------------------------------------

    /// Spawn the background expiry sweep. Runs until `cancel` triggers.
    pub fn spawn_expiry_sweeper(&self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let interval = self.config.sweep_interval;
        tokio::spawn(crate::expiry::run(store, interval, cancel))
    }
}

// ---------------------------------------------------------------------------
// Pipeline worker
// ---------------------------------------------------------------------------

/// Owns one job's staged execution inside the spawned task.
struct PipelineWorker {
    store: Arc<dyn JobStore>,
    backend: Arc<dyn BuildBackend>,
    tracker: ProgressTracker,
    dispatcher: Arc<WebhookDispatcher>,
    retention: chrono::Duration,
}

impl PipelineWorker {
    /// Run the fixed stage sequence. Stage errors terminate the job via
    /// [`fail`](Self::fail); a `false` stage entry means the job was
    /// terminally overridden (cancelled) and the pipeline stops quietly.
    async fn run(&self, job: &GenerationJob, project: &ProjectRecord, options: &GenerationOptions) {
        if !self
            .enter_stage(
                job,
                JobStatus::Pending,
                JobStatus::Initializing,
                PROGRESS_INITIALIZING,
                STEP_INITIALIZING,
            )
            .await
        {
            return;
        }

        if !self
            .enter_stage(
                job,
                JobStatus::Initializing,
                JobStatus::GeneratingContent,
                PROGRESS_CONTENT,
                STEP_CONTENT,
            )
            .await
        {
            return;
        }
        let content = match self.backend.generate_content(project, options).await {
            Ok(content) => content,
            Err(e) => {
                return self
                    .fail(job, format!("Content generation failed: {e}"), REASON_STAGE_FAILURE)
                    .await;
            }
        };

        if !self
            .enter_stage(
                job,
                JobStatus::GeneratingContent,
                JobStatus::ApplyingTheme,
                PROGRESS_THEME,
                STEP_THEME,
            )
            .await
        {
            return;
        }
        let themed = match self
            .backend
            .apply_theme(&content, options.theme.as_deref())
            .await
        {
            Ok(themed) => themed,
            Err(e) => {
                return self
                    .fail(job, format!("Theme application failed: {e}"), REASON_STAGE_FAILURE)
                    .await;
            }
        };

        if !self
            .enter_stage(
                job,
                JobStatus::ApplyingTheme,
                JobStatus::BuildingSite,
                PROGRESS_BUILD,
                STEP_BUILD,
            )
            .await
        {
            return;
        }
        let built = match self.backend.build_site(&themed).await {
            Ok(built) => built,
            Err(e) => {
                return self
                    .fail(job, format!("Site build failed: {e}"), REASON_STAGE_FAILURE)
                    .await;
            }
        };

        if !self
            .enter_stage(
                job,
                JobStatus::BuildingSite,
                JobStatus::Packaging,
                PROGRESS_PACKAGE,
                STEP_PACKAGE,
            )
            .await
        {
            return;
        }
        let artifact = match self.backend.package(&built).await {
            Ok(artifact) => artifact,
            Err(e) => {
                return self
                    .fail(job, format!("Packaging failed: {e}"), REASON_STAGE_FAILURE)
                    .await;
            }
        };

        // Terminal transition. Retention is measured from completion.
        let completed_at = Utc::now();
        let expires_at = completed_at + self.retention;
        match self
            .store
            .transition(
                job.id,
                &[JobStatus::Packaging],
                JobStatus::Completed,
                TransitionFields::completion(artifact.clone(), completed_at, expires_at),
            )
            .await
        {
            Ok(true) => {
                tracing::info!(
                    job_id = %job.id,
                    site_url = %artifact.site_url,
                    file_count = artifact.file_count,
                    "Generation completed",
                );
                self.dispatcher
                    .notify(
                        WebhookEvent::new(
                            EventKind::Completed,
                            job.id,
                            job.project_id,
                            job.user_id,
                            JobStatus::Completed,
                        )
                        .with_progress(100, "Completed")
                        .with_data(serde_json::json!({
                            "site_url": artifact.site_url,
                            "file_size": artifact.file_size,
                            "file_count": artifact.file_count,
                        })),
                    )
                    .await;
            }
            Ok(false) => {
                tracing::info!(
                    job_id = %job.id,
                    "Completion skipped, job was terminally overridden",
                );
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Failed to record completion");
            }
        }
    }

    /// Transition into a stage and report its progress.
    ///
    /// Returns `false` when the compare-and-set loses — the job is no
    /// longer in `expected` (cancelled or otherwise terminal) and the
    /// remaining stages must not run.
    async fn enter_stage(
        &self,
        job: &GenerationJob,
        expected: JobStatus,
        next: JobStatus,
        progress: u8,
        step: &str,
    ) -> bool {
        match self
            .store
            .transition(job.id, &[expected], next, TransitionFields::step(progress, step))
            .await
        {
            Ok(true) => {
                tracing::debug!(job_id = %job.id, status = %next, progress, "Stage entered");
                self.tracker.update(job, next, progress, step).await;
                true
            }
            Ok(false) => {
                tracing::info!(
                    job_id = %job.id,
                    stage = %next,
                    "Stage entry skipped, job was terminally overridden",
                );
                false
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Stage transition failed");
                self.fail(job, format!("Stage transition failed: {e}"), REASON_STAGE_FAILURE)
                    .await;
                false
            }
        }
    }

    /// Route any pipeline failure through the `FAILED` transition and
    /// fire the `failed` event with a distinguishing reason code.
    async fn fail(&self, job: &GenerationJob, error_log: String, reason: &str) {
        match self
            .store
            .transition(
                job.id,
                &ACTIVE_STATUSES,
                JobStatus::Failed,
                TransitionFields::failure(error_log.clone(), Utc::now()),
            )
            .await
        {
            Ok(true) => {
                tracing::error!(job_id = %job.id, reason, error = %error_log, "Generation failed");
                self.dispatcher
                    .notify(
                        WebhookEvent::new(
                            EventKind::Failed,
                            job.id,
                            job.project_id,
                            job.user_id,
                            JobStatus::Failed,
                        )
                        .with_data(serde_json::json!({
                            "reason": reason,
                            "error": error_log,
                        })),
                    )
                    .await;
            }
            Ok(false) => {
                tracing::debug!(job_id = %job.id, "Job already terminal, failure not recorded");
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Failed to record job failure");
            }
        }
    }
}
