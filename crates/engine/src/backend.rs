//! External content and build collaborators.
//!
//! The AI content service, theme engine, static-site builder, and
//! archiver are outside this system. The pipeline consumes them through
//! [`BuildBackend`]: opaque, potentially slow, potentially failing calls.
//! Payloads are thin JSON carriers the core never interprets.

use async_trait::async_trait;
use sitewright_core::options::GenerationOptions;
use sitewright_store::models::{CompletionArtifact, ProjectRecord};

/// Failure reported by an external collaborator. Any retrying happens on
/// the collaborator's side; the pipeline treats this as final.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct BackendError(pub String);

/// Prose and page structure produced by the AI content service.
#[derive(Debug, Clone)]
pub struct SiteContent(pub serde_json::Value);

/// Content with a theme applied.
#[derive(Debug, Clone)]
pub struct ThemedSite {
    pub content: serde_json::Value,
    /// Theme actually used — resolved by the collaborator when the
    /// request asked for auto-detection.
    pub theme: String,
}

/// Compiled static site, ready for packaging.
#[derive(Debug, Clone)]
pub struct BuiltSite(pub serde_json::Value);

/// The staged external calls the pipeline makes, in order.
#[async_trait]
pub trait BuildBackend: Send + Sync {
    /// Generate page prose and structure for the project.
    async fn generate_content(
        &self,
        project: &ProjectRecord,
        options: &GenerationOptions,
    ) -> Result<SiteContent, BackendError>;

    /// Apply the requested theme; `None` requests auto-detection.
    async fn apply_theme(
        &self,
        content: &SiteContent,
        theme: Option<&str>,
    ) -> Result<ThemedSite, BackendError>;

    /// Compile the themed content into a static site.
    async fn build_site(&self, site: &ThemedSite) -> Result<BuiltSite, BackendError>;

    /// Package the built site into a downloadable artifact.
    async fn package(&self, built: &BuiltSite) -> Result<CompletionArtifact, BackendError>;
}
