//! Webhook event payload model.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sitewright_core::error::CoreError;
use sitewright_core::status::JobStatus;
use sitewright_core::types::{JobId, ProjectId, Timestamp, UserId};

/// Job lifecycle event kinds a registration may subscribe to.
///
/// Wire names match the constants in
/// [`sitewright_core::event_kinds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Started,
    Progress,
    Completed,
    Failed,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => sitewright_core::event_kinds::EVENT_STARTED,
            Self::Progress => sitewright_core::event_kinds::EVENT_PROGRESS,
            Self::Completed => sitewright_core::event_kinds::EVENT_COMPLETED,
            Self::Failed => sitewright_core::event_kinds::EVENT_FAILED,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = CoreError;

    /// Parse a wire-format kind name, as outer surfaces receive them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            sitewright_core::event_kinds::EVENT_STARTED => Ok(Self::Started),
            sitewright_core::event_kinds::EVENT_PROGRESS => Ok(Self::Progress),
            sitewright_core::event_kinds::EVENT_COMPLETED => Ok(Self::Completed),
            sitewright_core::event_kinds::EVENT_FAILED => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Invalid event kind '{other}'. Must be one of: {}",
                sitewright_core::event_kinds::ALL_EVENT_KINDS.join(", ")
            ))),
        }
    }
}

/// Delivery payload POSTed to each matching registration.
///
/// Constructed via [`WebhookEvent::new`] and enriched with the builder
/// methods [`with_progress`](WebhookEvent::with_progress) and
/// [`with_data`](WebhookEvent::with_data).
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEvent {
    pub event: EventKind,
    pub generation_id: JobId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    pub timestamp: Timestamp,
    /// Event-kind-specific extra data (artifact metadata, failure reason).
    pub data: serde_json::Value,
}

impl WebhookEvent {
    pub fn new(
        event: EventKind,
        generation_id: JobId,
        project_id: ProjectId,
        user_id: UserId,
        status: JobStatus,
    ) -> Self {
        Self {
            event,
            generation_id,
            project_id,
            user_id,
            status,
            progress: None,
            current_step: None,
            timestamp: Utc::now(),
            data: serde_json::Value::Object(Default::default()),
        }
    }

    /// Attach progress percentage and step label.
    pub fn with_progress(mut self, progress: u8, step: impl Into<String>) -> Self {
        self.progress = Some(progress);
        self.current_step = Some(step.into());
        self
    }

    /// Set the event-specific data blob.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}
