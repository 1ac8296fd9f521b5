//! Webhook registry and fan-out delivery.
//!
//! Users register callback URLs with an event subscription set; the
//! dispatcher POSTs job lifecycle events to every matching registration,
//! independently and strictly best-effort.

pub mod dispatcher;
pub mod event;
pub mod registry;

pub use dispatcher::WebhookDispatcher;
pub use event::{EventKind, WebhookEvent};
pub use registry::{WebhookRegistration, WebhookRegistry};
