//! Per-user webhook registration store.
//!
//! Process-lifetime only: registrations do not survive a restart. A
//! deployment wanting durable subscriptions should back this with its
//! record store instead.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::Serialize;
use sitewright_core::error::CoreError;
use sitewright_core::types::{Timestamp, UserId};
use tokio::sync::RwLock;

use crate::event::EventKind;

/// A user's subscription of one callback URL to a set of event kinds.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookRegistration {
    pub url: String,
    pub events: HashSet<EventKind>,
    /// Extra headers attached to every delivery (e.g. bearer tokens).
    pub headers: HashMap<String, String>,
    pub created_at: Timestamp,
}

/// Aggregate registration counts for the `webhook-stats` operation.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub registrations: usize,
    /// Subscription count per event kind name.
    pub by_event: HashMap<&'static str, usize>,
}

/// Concurrency-safe registry of webhook registrations, keyed by user.
///
/// Safe under concurrent access from multiple in-flight generations
/// notifying at once.
#[derive(Default)]
pub struct WebhookRegistry {
    registrations: RwLock<HashMap<UserId, Vec<WebhookRegistration>>>,
}

impl WebhookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registration for a user.
    ///
    /// The URL must be http(s) and the event set non-empty. A URL already
    /// registered by the same user is rejected with a conflict; two users
    /// may register the same URL independently.
    pub async fn register(
        &self,
        user_id: UserId,
        url: &str,
        events: &[EventKind],
        headers: HashMap<String, String>,
    ) -> Result<(), CoreError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| CoreError::Validation(format!("Invalid webhook URL '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CoreError::Validation(format!(
                "Invalid webhook URL '{url}': scheme must be http or https"
            )));
        }
        if events.is_empty() {
            return Err(CoreError::Validation(
                "At least one event kind must be subscribed".to_string(),
            ));
        }

        let mut registrations = self.registrations.write().await;
        let user_hooks = registrations.entry(user_id).or_default();
        if user_hooks.iter().any(|r| r.url == url) {
            return Err(CoreError::Conflict(format!(
                "Webhook URL '{url}' is already registered"
            )));
        }

        user_hooks.push(WebhookRegistration {
            url: url.to_string(),
            events: events.iter().copied().collect(),
            headers,
            created_at: Utc::now(),
        });
        tracing::info!(%user_id, url, "Webhook registered");
        Ok(())
    }

    /// Add a registration from wire-format event kind names, as an outer
    /// surface receives them. Unknown names are a `Validation` error and
    /// nothing is registered.
    pub async fn register_named(
        &self,
        user_id: UserId,
        url: &str,
        kinds: &[String],
        headers: HashMap<String, String>,
    ) -> Result<(), CoreError> {
        let events = kinds
            .iter()
            .map(|kind| kind.parse())
            .collect::<Result<Vec<EventKind>, _>>()?;
        self.register(user_id, url, &events, headers).await
    }

    /// Remove a single registration. Returns `true` if one was removed.
    pub async fn remove(&self, user_id: UserId, url: &str) -> bool {
        let mut registrations = self.registrations.write().await;
        let Some(user_hooks) = registrations.get_mut(&user_id) else {
            return false;
        };
        let before = user_hooks.len();
        user_hooks.retain(|r| r.url != url);
        let removed = user_hooks.len() < before;
        if removed {
            tracing::info!(%user_id, url, "Webhook removed");
        }
        removed
    }

    /// Remove all of a user's registrations. Returns the removed count.
    pub async fn clear(&self, user_id: UserId) -> usize {
        let cleared = self
            .registrations
            .write()
            .await
            .remove(&user_id)
            .map(|hooks| hooks.len())
            .unwrap_or(0);
        if cleared > 0 {
            tracing::info!(%user_id, cleared, "Webhooks cleared");
        }
        cleared
    }

    /// Current registrations for a user.
    pub async fn list(&self, user_id: UserId) -> Vec<WebhookRegistration> {
        self.registrations
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Registrations of a user subscribed to `kind`.
    pub async fn matching(&self, user_id: UserId, kind: EventKind) -> Vec<WebhookRegistration> {
        self.registrations
            .read()
            .await
            .get(&user_id)
            .map(|hooks| {
                hooks
                    .iter()
                    .filter(|r| r.events.contains(&kind))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Aggregate counts for a user's registrations.
    pub async fn stats(&self, user_id: UserId) -> RegistryStats {
        let registrations = self.registrations.read().await;
        let hooks = registrations.get(&user_id).map(Vec::as_slice).unwrap_or(&[]);

        let mut by_event: HashMap<&'static str, usize> = HashMap::new();
        for hook in hooks {
            for kind in &hook.events {
                *by_event.entry(kind.as_str()).or_insert(0) += 1;
            }
        }
        RegistryStats {
            registrations: hooks.len(),
            by_event,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
