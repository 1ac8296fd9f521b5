//! Job and project record models.

use serde::{Deserialize, Serialize};
use sitewright_core::options::GenerationOptions;
use sitewright_core::status::JobStatus;
use sitewright_core::types::{JobId, ProjectId, Timestamp, UserId};

/// Maximum page size for job listing.
pub const MAX_LIMIT: i64 = 100;

/// Default page size for job listing.
pub const DEFAULT_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Job records
// ---------------------------------------------------------------------------

/// One generation attempt for a project.
///
/// Created by the engine on a successful start request; mutated only
/// through [`JobStore`](crate::JobStore) operations; never deleted by the
/// core.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationJob {
    pub id: JobId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub status: JobStatus,
    pub theme: Option<String>,
    pub customizations: serde_json::Value,
    pub content_options: serde_json::Value,
    /// 0–100, monotonically non-decreasing while the job is active.
    pub progress: u8,
    pub current_step: String,
    pub started_at: Timestamp,
    /// Set exactly once, on the transition into `Completed` or `Failed`.
    pub completed_at: Option<Timestamp>,
    /// Artifact retention deadline, set on completion.
    pub expires_at: Option<Timestamp>,
    pub site_url: Option<String>,
    pub file_size: Option<u64>,
    pub file_count: Option<u32>,
    /// Human-readable failure cause, populated only on `Failed`.
    pub error_log: Option<String>,
}

/// Input for creating a new job record.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub options: GenerationOptions,
}

/// Artifact metadata recorded when a job completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionArtifact {
    pub site_url: String,
    pub file_size: u64,
    pub file_count: u32,
}

/// Field updates applied atomically alongside a status transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionFields {
    pub progress: Option<u8>,
    pub current_step: Option<String>,
    pub completed_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub artifact: Option<CompletionArtifact>,
    pub error_log: Option<String>,
}

impl TransitionFields {
    /// Fields for a plain stage-entry transition.
    pub fn step(progress: u8, step: impl Into<String>) -> Self {
        Self {
            progress: Some(progress),
            current_step: Some(step.into()),
            ..Default::default()
        }
    }

    /// Fields for the terminal `Failed` transition.
    pub fn failure(error_log: impl Into<String>, completed_at: Timestamp) -> Self {
        Self {
            error_log: Some(error_log.into()),
            completed_at: Some(completed_at),
            ..Default::default()
        }
    }

    /// Fields for the terminal `Completed` transition.
    pub fn completion(
        artifact: CompletionArtifact,
        completed_at: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            progress: Some(100),
            current_step: Some("Completed".to_string()),
            completed_at: Some(completed_at),
            expires_at: Some(expires_at),
            artifact: Some(artifact),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Filters for job history listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobListQuery {
    /// Filter by status (e.g. only `FAILED`).
    pub status: Option<JobStatus>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

impl JobListQuery {
    /// Effective limit after applying default and cap.
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(0, MAX_LIMIT)
    }

    /// Effective offset, never negative.
    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// Minimal project view the engine needs for start validation.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub name: String,
    /// True once the wizard marked the project's business data complete.
    pub wizard_complete: bool,
}
