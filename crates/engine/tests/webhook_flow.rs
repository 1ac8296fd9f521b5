//! Lifecycle events observed through real webhook deliveries while jobs
//! run end to end.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use common::{collect_until, default_options, spawn_receiver, Harness, Stage, StubBackend};
use sitewright_core::status::JobStatus;
use sitewright_events::EventKind;
use tokio::sync::Notify;

const ALL_KINDS: [EventKind; 4] = [
    EventKind::Started,
    EventKind::Progress,
    EventKind::Completed,
    EventKind::Failed,
];

#[tokio::test]
async fn successful_run_emits_started_progress_and_completed() {
    let h = Harness::new(StubBackend {
        stage_delay: Duration::from_millis(20),
        ..Default::default()
    })
    .await;
    let (url, mut rx) = spawn_receiver(StatusCode::OK).await;
    h.engine
        .register_webhook(h.user, &url, &ALL_KINDS, HashMap::new())
        .await
        .unwrap();

    let job_id = h
        .engine
        .start_generation(h.project, h.user, default_options())
        .await
        .unwrap();
    h.wait_for(job_id, |v| v.status == JobStatus::Completed).await;

    // Deliveries are fired on independent tasks, so assert on the set
    // rather than strict arrival order.
    let events = collect_until(&mut rx, "completed", Duration::from_secs(5)).await;
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| e["event"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"started"), "kinds: {kinds:?}");
    assert!(kinds.contains(&"progress"), "kinds: {kinds:?}");
    assert!(kinds.contains(&"completed"), "kinds: {kinds:?}");

    for event in &events {
        assert_eq!(event["generation_id"].as_str().unwrap(), job_id.to_string());
        assert_eq!(event["user_id"].as_str().unwrap(), h.user.to_string());
    }

    let completed = events.last().unwrap();
    assert_eq!(completed["status"], "COMPLETED");
    assert_eq!(completed["progress"], 100);
    assert_eq!(completed["data"]["site_url"], "/artifacts/site.zip");
    assert_eq!(completed["data"]["file_count"], 12);
}

#[tokio::test]
async fn registration_limited_to_completed_sees_nothing_else() {
    let h = Harness::new(StubBackend::default()).await;
    let (url, mut rx) = spawn_receiver(StatusCode::OK).await;
    h.engine
        .register_webhook(h.user, &url, &[EventKind::Completed], HashMap::new())
        .await
        .unwrap();

    let job_id = h
        .engine
        .start_generation(h.project, h.user, default_options())
        .await
        .unwrap();
    h.wait_for(job_id, |v| v.status == JobStatus::Completed).await;

    let events = collect_until(&mut rx, "completed", Duration::from_secs(5)).await;
    assert_eq!(events.len(), 1, "events: {events:?}");
    assert_eq!(events[0]["event"], "completed");
}

#[tokio::test]
async fn failing_endpoint_does_not_affect_the_job() {
    let h = Harness::new(StubBackend::default()).await;
    let (url, mut rx) = spawn_receiver(StatusCode::INTERNAL_SERVER_ERROR).await;
    h.engine
        .register_webhook(h.user, &url, &ALL_KINDS, HashMap::new())
        .await
        .unwrap();

    let job_id = h
        .engine
        .start_generation(h.project, h.user, default_options())
        .await
        .unwrap();
    let view = h.wait_for(job_id, |v| v.status.is_terminal()).await;
    assert_eq!(view.status, JobStatus::Completed);

    // The endpoint still received the attempts; no retries follow a
    // failed delivery, so the count matches the distinct notifications.
    let events = collect_until(&mut rx, "completed", Duration::from_secs(5)).await;
    assert!(!events.is_empty());
}

#[tokio::test]
async fn failed_run_emits_failed_with_reason() {
    let h = Harness::new(StubBackend {
        fail_stage: Some(Stage::Content),
        ..Default::default()
    })
    .await;
    let (url, mut rx) = spawn_receiver(StatusCode::OK).await;
    h.engine
        .register_webhook(h.user, &url, &[EventKind::Failed], HashMap::new())
        .await
        .unwrap();

    let job_id = h
        .engine
        .start_generation(h.project, h.user, default_options())
        .await
        .unwrap();
    h.wait_for(job_id, |v| v.status == JobStatus::Failed).await;

    let events = collect_until(&mut rx, "failed", Duration::from_secs(5)).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["data"]["reason"], "stage_failure");
    assert!(events[0]["data"]["error"]
        .as_str()
        .unwrap()
        .contains("Content generation failed"));
}

#[tokio::test]
async fn cancellation_emits_failed_with_cancelled_reason() {
    let gate = Arc::new(Notify::new());
    let h = Harness::new(StubBackend {
        content_gate: Some(Arc::clone(&gate)),
        ..Default::default()
    })
    .await;
    let (url, mut rx) = spawn_receiver(StatusCode::OK).await;
    h.engine
        .register_webhook(h.user, &url, &[EventKind::Failed], HashMap::new())
        .await
        .unwrap();

    let job_id = h
        .engine
        .start_generation(h.project, h.user, default_options())
        .await
        .unwrap();
    h.wait_for(job_id, |v| v.status == JobStatus::GeneratingContent)
        .await;
    h.engine.cancel_generation(job_id, h.user).await.unwrap();
    gate.notify_one();

    let events = collect_until(&mut rx, "failed", Duration::from_secs(5)).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["data"]["reason"], "cancelled");
    assert_eq!(events[0]["data"]["error"], "cancelled by user");
}

#[tokio::test]
async fn webhook_management_facade_round_trip() {
    let h = Harness::new(StubBackend::default()).await;

    h.engine
        .register_webhook(h.user, "https://example.com/hook", &ALL_KINDS, HashMap::new())
        .await
        .unwrap();

    // Same URL again for the same user is a conflict.
    let err = h
        .engine
        .register_webhook(h.user, "https://example.com/hook", &ALL_KINDS, HashMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFLICT");

    assert_eq!(h.engine.list_webhooks(h.user).await.len(), 1);
    let stats = h.engine.webhook_stats(h.user).await;
    assert_eq!(stats.registrations, 1);

    h.engine
        .remove_webhook(h.user, "https://example.com/hook")
        .await
        .unwrap();
    let err = h
        .engine
        .remove_webhook(h.user, "https://example.com/hook")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    assert_eq!(h.engine.clear_webhooks(h.user).await, 0);
}

#[tokio::test]
async fn events_only_reach_the_job_owners_registrations() {
    let h = Harness::new(StubBackend::default()).await;
    let stranger = uuid::Uuid::now_v7();
    let (url, mut rx) = spawn_receiver(StatusCode::OK).await;
    h.engine
        .register_webhook(stranger, &url, &ALL_KINDS, HashMap::new())
        .await
        .unwrap();

    let job_id = h
        .engine
        .start_generation(h.project, h.user, default_options())
        .await
        .unwrap();
    h.wait_for(job_id, |v| v.status == JobStatus::Completed).await;

    let events = collect_until(&mut rx, "completed", Duration::from_millis(300)).await;
    assert!(events.is_empty(), "stranger received: {events:?}");
}
