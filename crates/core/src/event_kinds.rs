//! Webhook event kind names.
//!
//! Wire names for the job lifecycle events a registration may subscribe
//! to. The events crate parses these on registration and stamps them on
//! delivery headers.

/// Job record created, pipeline scheduled.
pub const EVENT_STARTED: &str = "started";

/// Progress percentage or step label changed.
pub const EVENT_PROGRESS: &str = "progress";

/// Pipeline finished and the artifact is available.
pub const EVENT_COMPLETED: &str = "completed";

/// Pipeline stopped: stage failure, timeout, or user cancellation.
pub const EVENT_FAILED: &str = "failed";

/// All valid event kind names.
pub const ALL_EVENT_KINDS: &[&str] =
    &[EVENT_STARTED, EVENT_PROGRESS, EVENT_COMPLETED, EVENT_FAILED];
