//! Shared identifier and timestamp aliases.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Unique identifier of a generation job.
pub type JobId = Uuid;

/// Unique identifier of a project.
pub type ProjectId = Uuid;

/// Unique identifier of a user.
pub type UserId = Uuid;

/// UTC timestamp used across all records.
pub type Timestamp = DateTime<Utc>;
