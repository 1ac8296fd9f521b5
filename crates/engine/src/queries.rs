//! Read-only status, history, and download operations.
//!
//! All reads are scoped to the requesting user's own jobs: a job owned
//! by someone else behaves exactly like a missing one. Single-job reads
//! perform a lazy expiry check so correctness does not depend on the
//! background sweep running.

use chrono::Utc;
use serde::Serialize;
use sitewright_core::error::CoreError;
use sitewright_core::status::JobStatus;
use sitewright_core::types::{JobId, ProjectId, Timestamp, UserId};
use sitewright_store::models::{GenerationJob, JobListQuery};

use crate::orchestrator::GenerationEngine;

/// Serializable read model for one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusView {
    pub id: JobId,
    pub project_id: ProjectId,
    pub status: JobStatus,
    pub theme: Option<String>,
    pub progress: u8,
    pub current_step: String,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub site_url: Option<String>,
    pub file_size: Option<u64>,
    pub file_count: Option<u32>,
    pub error_log: Option<String>,
}

impl From<GenerationJob> for JobStatusView {
    fn from(job: GenerationJob) -> Self {
        Self {
            id: job.id,
            project_id: job.project_id,
            status: job.status,
            theme: job.theme,
            progress: job.progress,
            current_step: job.current_step,
            started_at: job.started_at,
            completed_at: job.completed_at,
            expires_at: job.expires_at,
            site_url: job.site_url,
            file_size: job.file_size,
            file_count: job.file_count,
            error_log: job.error_log,
        }
    }
}

/// Artifact handle returned by a successful download request.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadInfo {
    pub site_url: String,
    pub file_size: u64,
    pub file_count: u32,
}

impl GenerationEngine {
    /// Current state of one job. Querying a `FAILED` job returns its
    /// `error_log` in the view.
    pub async fn get_status(
        &self,
        job_id: JobId,
        user_id: UserId,
    ) -> Result<JobStatusView, CoreError> {
        let job = self.owned_job(job_id, user_id).await?;
        let job = self.lazily_expire(job).await;
        Ok(job.into())
    }

    /// The caller's job history, newest first.
    pub async fn get_history(
        &self,
        user_id: UserId,
        query: &JobListQuery,
    ) -> Result<Vec<JobStatusView>, CoreError> {
        let jobs = self.store.list_for_user(user_id, query).await?;
        Ok(jobs.into_iter().map(JobStatusView::from).collect())
    }

    /// Resolve the artifact for download.
    ///
    /// Distinct error kinds: `NotReady` when the job has not completed
    /// (including failures), `Expired` once the retention window lapsed,
    /// `ArtifactMissing` when the job is complete but its artifact
    /// pointer is gone.
    pub async fn download(&self, job_id: JobId, user_id: UserId) -> Result<DownloadInfo, CoreError> {
        let job = self.owned_job(job_id, user_id).await?;
        let job = self.lazily_expire(job).await;

        match job.status {
            JobStatus::Completed => {
                let site_url = job.site_url.ok_or_else(|| {
                    CoreError::ArtifactMissing(
                        "No artifact is recorded for this generation".to_string(),
                    )
                })?;
                Ok(DownloadInfo {
                    site_url,
                    file_size: job.file_size.unwrap_or(0),
                    file_count: job.file_count.unwrap_or(0),
                })
            }
            JobStatus::Expired => Err(CoreError::Expired(
                "The generated site is past its retention window".to_string(),
            )),
            JobStatus::Failed => Err(CoreError::NotReady(
                "Generation failed; no artifact was produced".to_string(),
            )),
            _ => Err(CoreError::NotReady(
                "Generation has not completed yet".to_string(),
            )),
        }
    }

    /// Owner-scoped lookup; a foreign job is indistinguishable from a
    /// missing one.
    async fn owned_job(&self, job_id: JobId, user_id: UserId) -> Result<GenerationJob, CoreError> {
        Ok(self
            .store
            .find(job_id)
            .await?
            .filter(|j| j.user_id == user_id)
            .ok_or(CoreError::NotFound { entity: "Job" })?)
    }

    /// Transition a completed job past its retention deadline to
    /// `EXPIRED` before returning it.
    async fn lazily_expire(&self, mut job: GenerationJob) -> GenerationJob {
        let past_deadline =
            job.status == JobStatus::Completed && job.expires_at.is_some_and(|at| at <= Utc::now());
        if !past_deadline {
            return job;
        }

        match self
            .store
            .transition(
                job.id,
                &[JobStatus::Completed],
                JobStatus::Expired,
                Default::default(),
            )
            .await
        {
            Ok(true) => {
                tracing::debug!(job_id = %job.id, "Job lazily expired");
                job.status = JobStatus::Expired;
            }
            Ok(false) => {
                // The sweep got there first; reflect the stored state.
                job.status = JobStatus::Expired;
            }
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "Lazy expiry failed");
            }
        }
        job
    }
}
