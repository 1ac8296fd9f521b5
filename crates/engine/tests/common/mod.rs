//! Shared test harness: stub build backend, engine wiring, and a local
//! webhook receiver.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use sitewright_core::options::GenerationOptions;
use sitewright_core::types::{JobId, ProjectId, UserId};
use sitewright_engine::{
    BackendError, BuildBackend, BuiltSite, EngineConfig, GenerationEngine, JobStatusView,
    SiteContent, ThemedSite,
};
use sitewright_events::WebhookRegistry;
use sitewright_store::memory::{MemoryProjects, MemoryStore};
use sitewright_store::models::{CompletionArtifact, ProjectRecord};
use sitewright_store::{JobStore, ProjectDirectory};
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Stub backend
// ---------------------------------------------------------------------------

/// Pipeline stage names for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Content,
    Theme,
    Build,
    Package,
}

/// Configurable stand-in for the external AI and build services.
#[derive(Default)]
pub struct StubBackend {
    /// Fail when this stage runs.
    pub fail_stage: Option<Stage>,
    /// Sleep this long inside every stage call.
    pub stage_delay: Duration,
    /// When set, `generate_content` parks until the gate is notified.
    pub content_gate: Option<Arc<Notify>>,
    /// Panic inside `generate_content` (error-boundary tests).
    pub panic_in_content: bool,
}

impl StubBackend {
    async fn stage(&self, stage: Stage, label: &str) -> Result<(), BackendError> {
        if !self.stage_delay.is_zero() {
            tokio::time::sleep(self.stage_delay).await;
        }
        if self.fail_stage == Some(stage) {
            return Err(BackendError(format!("{label} service unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl BuildBackend for StubBackend {
    async fn generate_content(
        &self,
        project: &ProjectRecord,
        _options: &GenerationOptions,
    ) -> Result<SiteContent, BackendError> {
        if let Some(gate) = &self.content_gate {
            gate.notified().await;
        }
        if self.panic_in_content {
            panic!("stub backend panic");
        }
        self.stage(Stage::Content, "content").await?;
        Ok(SiteContent(serde_json::json!({
            "project": project.name,
            "pages": ["index", "about", "contact"],
        })))
    }

    async fn apply_theme(
        &self,
        content: &SiteContent,
        theme: Option<&str>,
    ) -> Result<ThemedSite, BackendError> {
        self.stage(Stage::Theme, "theme").await?;
        Ok(ThemedSite {
            content: content.0.clone(),
            theme: theme.unwrap_or("ananke").to_string(),
        })
    }

    async fn build_site(&self, site: &ThemedSite) -> Result<BuiltSite, BackendError> {
        self.stage(Stage::Build, "build").await?;
        Ok(BuiltSite(serde_json::json!({ "theme": site.theme })))
    }

    async fn package(&self, _built: &BuiltSite) -> Result<CompletionArtifact, BackendError> {
        self.stage(Stage::Package, "packaging").await?;
        Ok(CompletionArtifact {
            site_url: "/artifacts/site.zip".to_string(),
            file_size: 4096,
            file_count: 12,
        })
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub engine: Arc<GenerationEngine>,
    pub store: Arc<MemoryStore>,
    pub projects: Arc<MemoryProjects>,
    pub registry: Arc<WebhookRegistry>,
    pub user: UserId,
    pub project: ProjectId,
}

impl Harness {
    /// Engine over in-memory stores with one complete project seeded.
    pub async fn with(backend: StubBackend, config: EngineConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let projects = Arc::new(MemoryProjects::new());
        let registry = Arc::new(WebhookRegistry::new());
        let user = Uuid::now_v7();
        let project = Uuid::now_v7();

        projects
            .insert(ProjectRecord {
                id: project,
                owner_id: user,
                name: "acme-landing".to_string(),
                wizard_complete: true,
            })
            .await;

        let engine = Arc::new(GenerationEngine::new(
            Arc::clone(&store) as Arc<dyn JobStore>,
            Arc::clone(&projects) as Arc<dyn ProjectDirectory>,
            Arc::new(backend),
            Arc::clone(&registry),
            config,
        ));

        Self {
            engine,
            store,
            projects,
            registry,
            user,
            project,
        }
    }

    pub async fn new(backend: StubBackend) -> Self {
        Self::with(backend, EngineConfig::default()).await
    }

    /// Seed another complete project for the harness user.
    pub async fn seed_project(&self) -> ProjectId {
        let id = Uuid::now_v7();
        self.projects
            .insert(ProjectRecord {
                id,
                owner_id: self.user,
                name: "second-site".to_string(),
                wizard_complete: true,
            })
            .await;
        id
    }

    /// Poll job status until `pred` holds or a 5-second deadline passes.
    pub async fn wait_for(
        &self,
        job_id: JobId,
        pred: impl Fn(&JobStatusView) -> bool,
    ) -> JobStatusView {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let view = self
                .engine
                .get_status(job_id, self.user)
                .await
                .expect("job should be visible to its owner");
            if pred(&view) {
                return view;
            }
            if tokio::time::Instant::now() > deadline {
                panic!("timed out waiting for job state; last status {}", view.status);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Options every test starts from: a fixed supported theme.
pub fn default_options() -> GenerationOptions {
    GenerationOptions {
        theme: Some("ananke".to_string()),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Local webhook receiver
// ---------------------------------------------------------------------------

pub type Received = (HeaderMap, serde_json::Value);

struct ReceiverState {
    tx: mpsc::UnboundedSender<Received>,
    status: StatusCode,
}

async fn hook(
    State(state): State<Arc<ReceiverState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let _ = state.tx.send((headers, body));
    state.status
}

/// Spawn a webhook receiver on an ephemeral port; returns its URL and
/// the channel deliveries arrive on.
pub async fn spawn_receiver(status: StatusCode) -> (String, mpsc::UnboundedReceiver<Received>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let state = Arc::new(ReceiverState { tx, status });
    let app = Router::new().route("/hook", post(hook)).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/hook"), rx)
}

/// Drain deliveries until one matches `event_kind` or the timeout hits.
/// Returns everything received, in arrival order.
pub async fn collect_until(
    rx: &mut mpsc::UnboundedReceiver<Received>,
    event_kind: &str,
    timeout: Duration,
) -> Vec<serde_json::Value> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut bodies = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some((_, body))) => {
                let done = body["event"] == event_kind;
                bodies.push(body);
                if done {
                    return bodies;
                }
            }
            _ => return bodies,
        }
    }
}
