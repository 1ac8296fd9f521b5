//! Webhook fan-out delivery.
//!
//! [`WebhookDispatcher`] POSTs a JSON-encoded [`WebhookEvent`] to every
//! registration matching the event's user and kind. Each delivery runs in
//! its own task with a hard timeout; one unreachable endpoint cannot
//! delay the others. Delivery is single-attempt and best-effort — a
//! failure is logged and swallowed, never surfaced to the pipeline.

use std::sync::Arc;
use std::time::Duration;

use sitewright_core::types::JobId;

use crate::event::WebhookEvent;
use crate::registry::{WebhookRegistration, WebhookRegistry};

/// Hard timeout for a single delivery attempt.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent identifying the sending system.
const USER_AGENT: &str = concat!("sitewright-webhook/", env!("CARGO_PKG_VERSION"));

/// Event kind header stamped on every delivery.
pub const HEADER_EVENT: &str = "x-sitewright-event";

/// Job id header stamped on every delivery.
pub const HEADER_GENERATION_ID: &str = "x-sitewright-generation-id";

/// Error type for a single delivery attempt.
#[derive(Debug, thiserror::Error)]
enum DeliveryError {
    /// The HTTP request itself failed (network, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

/// Delivers lifecycle events to registered webhook endpoints.
pub struct WebhookDispatcher {
    client: reqwest::Client,
    registry: Arc<WebhookRegistry>,
}

impl WebhookDispatcher {
    /// Create a dispatcher with the default 10-second delivery timeout.
    pub fn new(registry: Arc<WebhookRegistry>) -> Self {
        Self::with_timeout(registry, DELIVERY_TIMEOUT)
    }

    /// Create a dispatcher with a custom delivery timeout.
    pub fn with_timeout(registry: Arc<WebhookRegistry>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, registry }
    }

    /// Fan an event out to every matching registration.
    ///
    /// Returns as soon as the delivery tasks are spawned. Deliveries to
    /// different URLs are independent; none can block another or the
    /// caller.
    pub async fn notify(&self, event: WebhookEvent) {
        let matching = self.registry.matching(event.user_id, event.event).await;
        if matching.is_empty() {
            tracing::debug!(
                event = %event.event,
                generation_id = %event.generation_id,
                "No webhook registrations match, skipping delivery",
            );
            return;
        }

        let payload = match serde_json::to_value(&event) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize webhook event");
                return;
            }
        };

        for registration in matching {
            let client = self.client.clone();
            let payload = payload.clone();
            let kind = event.event;
            let generation_id = event.generation_id;
            tokio::spawn(async move {
                if let Err(e) =
                    deliver(&client, &registration, &payload, kind.as_str(), generation_id).await
                {
                    tracing::warn!(
                        url = %registration.url,
                        event = %kind,
                        generation_id = %generation_id,
                        error = %e,
                        "Webhook delivery failed",
                    );
                }
            });
        }
    }
}

/// Execute one POST and check the response status. Single attempt, no
/// retry.
async fn deliver(
    client: &reqwest::Client,
    registration: &WebhookRegistration,
    payload: &serde_json::Value,
    kind: &str,
    generation_id: JobId,
) -> Result<(), DeliveryError> {
    let mut request = client
        .post(&registration.url)
        .header(HEADER_EVENT, kind)
        .header(HEADER_GENERATION_ID, generation_id.to_string())
        .json(payload);

    for (name, value) in &registration.headers {
        request = request.header(name, value);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(DeliveryError::HttpStatus(response.status().as_u16()));
    }

    tracing::debug!(
        url = %registration.url,
        event = kind,
        generation_id = %generation_id,
        "Webhook delivered",
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
