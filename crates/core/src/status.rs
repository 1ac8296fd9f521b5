//! Generation job lifecycle state machine.
//!
//! A job moves through a fixed forward chain of pipeline states and ends
//! in exactly one terminal state. Every transition the orchestrator
//! performs is checked against [`JobStatus::can_transition_to`].

use serde::{Deserialize, Serialize};

/// Lifecycle status of a generation job.
///
/// Forward chain: `Pending → Initializing → GeneratingContent →
/// ApplyingTheme → BuildingSite → Packaging → Completed`.
/// `Failed` is reachable from every non-terminal state (stage failure,
/// user cancellation, or job timeout). `Expired` is reachable only from
/// `Completed`, once the artifact retention window lapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Initializing,
    GeneratingContent,
    ApplyingTheme,
    BuildingSite,
    Packaging,
    Completed,
    Failed,
    Expired,
}

/// All non-terminal statuses, in pipeline order.
pub const ACTIVE_STATUSES: [JobStatus; 6] = [
    JobStatus::Pending,
    JobStatus::Initializing,
    JobStatus::GeneratingContent,
    JobStatus::ApplyingTheme,
    JobStatus::BuildingSite,
    JobStatus::Packaging,
];

impl JobStatus {
    /// True for `Completed`, `Failed`, and `Expired`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Expired)
    }

    /// True while the job still participates in the pipeline.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Position in the forward pipeline chain, or `None` for
    /// `Failed`/`Expired` which sit outside it.
    fn chain_index(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Initializing => Some(1),
            Self::GeneratingContent => Some(2),
            Self::ApplyingTheme => Some(3),
            Self::BuildingSite => Some(4),
            Self::Packaging => Some(5),
            Self::Completed => Some(6),
            Self::Failed | Self::Expired => None,
        }
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// - One step forward along the pipeline chain.
    /// - Any active state may move to `Failed`.
    /// - `Completed` may move to `Expired`.
    /// - No other edge leaves a terminal state.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if next == JobStatus::Failed {
            return self.is_active();
        }
        if next == JobStatus::Expired {
            return self == JobStatus::Completed;
        }
        match (self.chain_index(), next.chain_index()) {
            (Some(from), Some(to)) => self.is_active() && to == from + 1,
            _ => false,
        }
    }

    /// Stable wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Initializing => "INITIALIZING",
            Self::GeneratingContent => "GENERATING_CONTENT",
            Self::ApplyingTheme => "APPLYING_THEME",
            Self::BuildingSite => "BUILDING_SITE",
            Self::Packaging => "PACKAGING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
