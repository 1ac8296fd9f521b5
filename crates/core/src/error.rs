//! Domain error taxonomy.
//!
//! Synchronous failures (validation, conflict, not-found) are returned to
//! the caller with a stable machine-readable code. Pipeline failures are
//! never surfaced through this type to the start caller — they are
//! recorded on the job and observed via status polling.

/// Domain-level error for orchestrator operations.
///
/// `NotFound` deliberately carries no detail beyond the entity kind: a
/// record owned by another user produces the same error as a record that
/// does not exist.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Download requested before the job reached `Completed`.
    #[error("Artifact not available: {0}")]
    NotReady(String),

    /// Download requested after the artifact retention window lapsed.
    #[error("Artifact expired: {0}")]
    Expired(String),

    /// Job is `Completed` but the artifact pointer is gone.
    #[error("Artifact missing: {0}")]
    ArtifactMissing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::NotReady(_) => "NOT_READY",
            Self::Expired(_) => "EXPIRED",
            Self::ArtifactMissing(_) => "ARTIFACT_MISSING",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_does_not_leak_ownership() {
        let err = CoreError::NotFound { entity: "Job" };
        assert_eq!(err.to_string(), "Job not found");
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(CoreError::Validation("x".into()).code(), "VALIDATION_ERROR");
        assert_eq!(CoreError::Conflict("x".into()).code(), "CONFLICT");
        assert_eq!(CoreError::NotReady("x".into()).code(), "NOT_READY");
        assert_eq!(CoreError::Expired("x".into()).code(), "EXPIRED");
        assert_eq!(
            CoreError::ArtifactMissing("x".into()).code(),
            "ARTIFACT_MISSING"
        );
    }
}
