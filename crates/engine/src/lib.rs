//! Generation orchestration engine.
//!
//! Turns a start request into a supervised, staged, long-running job:
//! validates options, enforces the one-active-job-per-project invariant,
//! runs the pipeline off the caller's path, reports progress, and fans
//! lifecycle events out to registered webhooks. All collaborators are
//! dependency-injected; nothing here is a global.

pub mod backend;
pub mod config;
pub mod expiry;
pub mod orchestrator;
pub mod progress;
pub mod queries;

pub use backend::{BackendError, BuildBackend, BuiltSite, SiteContent, ThemedSite};
pub use config::EngineConfig;
pub use orchestrator::GenerationEngine;
pub use queries::{DownloadInfo, JobStatusView};
