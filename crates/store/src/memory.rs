//! In-memory store implementations.
//!
//! [`MemoryStore`] keeps every invariant-bearing operation under a single
//! write-lock acquisition, so the active-job check, the transition
//! compare-and-set, and the monotonic progress clamp are each atomic with
//! respect to concurrent callers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sitewright_core::status::JobStatus;
use sitewright_core::types::{JobId, ProjectId, Timestamp, UserId};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    GenerationJob, JobListQuery, NewJob, ProjectRecord, TransitionFields,
};
use crate::{JobStore, ProjectDirectory, StoreError};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Process-lifetime job store backed by a locked map.
#[derive(Default)]
pub struct MemoryStore {
    jobs: RwLock<HashMap<JobId, GenerationJob>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create(&self, new_job: NewJob) -> Result<GenerationJob, StoreError> {
        let mut jobs = self.jobs.write().await;

        // Check-and-insert under one lock: the single-active-job invariant.
        if jobs
            .values()
            .any(|j| j.project_id == new_job.project_id && j.status.is_active())
        {
            return Err(StoreError::ActiveJobExists {
                project_id: new_job.project_id,
            });
        }

        let content_options = serde_json::to_value(&new_job.options.content)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let job = GenerationJob {
            id: Uuid::now_v7(),
            project_id: new_job.project_id,
            user_id: new_job.user_id,
            status: JobStatus::Pending,
            theme: new_job.options.theme.clone(),
            customizations: new_job.options.customizations.clone(),
            content_options,
            progress: 0,
            current_step: "Queued".to_string(),
            started_at: Utc::now(),
            completed_at: None,
            expires_at: None,
            site_url: None,
            file_size: None,
            file_count: None,
            error_log: None,
        };
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn find(&self, job_id: JobId) -> Result<Option<GenerationJob>, StoreError> {
        Ok(self.jobs.read().await.get(&job_id).cloned())
    }

    async fn find_active_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<GenerationJob>, StoreError> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .find(|j| j.project_id == project_id && j.status.is_active())
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        query: &JobListQuery,
    ) -> Result<Vec<GenerationJob>, StoreError> {
        let jobs = self.jobs.read().await;
        let mut matching: Vec<GenerationJob> = jobs
            .values()
            .filter(|j| j.user_id == user_id)
            .filter(|j| query.status.is_none_or(|s| j.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));

        Ok(matching
            .into_iter()
            .skip(query.effective_offset() as usize)
            .take(query.effective_limit() as usize)
            .collect())
    }

    async fn update_progress(
        &self,
        job_id: JobId,
        progress: u8,
        step: &str,
    ) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound)?;

        // A cancel can land between a stage transition and its progress
        // report; the terminal record must not change under it.
        if job.status.is_terminal() {
            return Ok(());
        }

        // Clamp and never move backwards; the step label always updates.
        let clamped = progress.min(100);
        if clamped > job.progress {
            job.progress = clamped;
        }
        job.current_step = step.to_string();
        Ok(())
    }

    async fn transition(
        &self,
        job_id: JobId,
        expected: &[JobStatus],
        next: JobStatus,
        fields: TransitionFields,
    ) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound)?;

        if !expected.contains(&job.status) || !job.status.can_transition_to(next) {
            return Ok(false);
        }

        job.status = next;
        if let Some(progress) = fields.progress {
            let clamped = progress.min(100);
            if clamped > job.progress {
                job.progress = clamped;
            }
        }
        if let Some(step) = fields.current_step {
            job.current_step = step;
        }
        if let Some(completed_at) = fields.completed_at {
            // completed_at is set exactly once.
            if job.completed_at.is_none() {
                job.completed_at = Some(completed_at);
            }
        }
        if let Some(expires_at) = fields.expires_at {
            job.expires_at = Some(expires_at);
        }
        if let Some(artifact) = fields.artifact {
            job.site_url = Some(artifact.site_url);
            job.file_size = Some(artifact.file_size);
            job.file_count = Some(artifact.file_count);
        }
        if let Some(error_log) = fields.error_log {
            job.error_log = Some(error_log);
        }
        Ok(true)
    }

    async fn sweep_expired(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut jobs = self.jobs.write().await;
        let mut swept = 0;
        for job in jobs.values_mut() {
            if job.status == JobStatus::Completed
                && job.expires_at.is_some_and(|at| at <= now)
            {
                job.status = JobStatus::Expired;
                swept += 1;
            }
        }
        Ok(swept)
    }
}

// ---------------------------------------------------------------------------
// MemoryProjects
// ---------------------------------------------------------------------------

/// Seedable in-memory project directory.
#[derive(Default)]
pub struct MemoryProjects {
    projects: RwLock<HashMap<ProjectId, ProjectRecord>>,
}

impl MemoryProjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a project record.
    pub async fn insert(&self, record: ProjectRecord) {
        self.projects.write().await.insert(record.id, record);
    }
}

#[async_trait]
impl ProjectDirectory for MemoryProjects {
    async fn find_project(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<ProjectRecord>, StoreError> {
        // Owner-scoped: a foreign project is indistinguishable from a
        // missing one.
        Ok(self
            .projects
            .read()
            .await
            .get(&project_id)
            .filter(|p| p.owner_id == user_id)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
