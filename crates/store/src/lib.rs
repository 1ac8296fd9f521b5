//! Record-store contracts consumed by the generation engine.
//!
//! Durable job and project storage is an external concern; the engine
//! depends only on the [`JobStore`] and [`ProjectDirectory`] traits
//! defined here. [`memory`] provides the in-process implementation used
//! by the engine and its tests.

pub mod memory;
pub mod models;

use async_trait::async_trait;
use sitewright_core::status::JobStatus;
use sitewright_core::types::{JobId, ProjectId, Timestamp, UserId};

use crate::models::{GenerationJob, JobListQuery, NewJob, ProjectRecord, TransitionFields};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The project already has a job in a non-terminal state.
    #[error("Project {project_id} already has an active generation job")]
    ActiveJobExists { project_id: ProjectId },

    #[error("Record not found")]
    NotFound,

    /// Backend failure in a concrete store implementation.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for sitewright_core::error::CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ActiveJobExists { .. } => Self::Conflict(
                "A generation job is already in progress for this project".to_string(),
            ),
            StoreError::NotFound => Self::NotFound { entity: "Job" },
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// JobStore
// ---------------------------------------------------------------------------

/// Durable storage contract for generation job records.
///
/// Implementations must make three operations atomic with respect to
/// concurrent callers: the active-job check inside [`create`], the
/// compare-and-set in [`transition`], and the monotonic clamp in
/// [`update_progress`].
///
/// [`create`]: JobStore::create
/// [`transition`]: JobStore::transition
/// [`update_progress`]: JobStore::update_progress
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a new `Pending` job.
    ///
    /// Fails with [`StoreError::ActiveJobExists`] when the project already
    /// has a job in a non-terminal state. The check and the insert are a
    /// single critical section — two concurrent creates for one project
    /// admit exactly one job.
    async fn create(&self, new_job: NewJob) -> Result<GenerationJob, StoreError>;

    /// Find a job by id.
    async fn find(&self, job_id: JobId) -> Result<Option<GenerationJob>, StoreError>;

    /// Find the project's job in a non-terminal state, if any.
    async fn find_active_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<GenerationJob>, StoreError>;

    /// List a user's jobs, newest first, with optional status filter and
    /// pagination.
    async fn list_for_user(
        &self,
        user_id: UserId,
        query: &JobListQuery,
    ) -> Result<Vec<GenerationJob>, StoreError>;

    /// Persist a progress value and step label.
    ///
    /// The value is clamped to 0–100 and never lowers the stored
    /// progress; the step label is always updated. A job that has
    /// already reached a terminal state is left untouched.
    async fn update_progress(
        &self,
        job_id: JobId,
        progress: u8,
        step: &str,
    ) -> Result<(), StoreError>;

    /// Atomic conditional status transition.
    ///
    /// Moves the job to `next` and applies `fields` only when its current
    /// status is in `expected`; otherwise returns `Ok(false)` without
    /// mutating anything. This is how a cancellation recorded mid-stage
    /// survives: the stage's own transition observes the override and
    /// backs off.
    async fn transition(
        &self,
        job_id: JobId,
        expected: &[JobStatus],
        next: JobStatus,
        fields: TransitionFields,
    ) -> Result<bool, StoreError>;

    /// Move every `Completed` job whose `expires_at` has passed to
    /// `Expired`. Returns the number of jobs transitioned.
    async fn sweep_expired(&self, now: Timestamp) -> Result<u64, StoreError>;
}

// ---------------------------------------------------------------------------
// ProjectDirectory
// ---------------------------------------------------------------------------

/// Owner-scoped project lookup.
///
/// A project owned by a different user resolves to `None`, so callers
/// cannot distinguish "exists but not yours" from "does not exist".
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn find_project(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<ProjectRecord>, StoreError>;
}
