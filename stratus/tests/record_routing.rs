mod common;

use common::{raw, scoped_builder};
use serde_json::json;
use stratus::testing::{
    CountingHandler, FailingHandler, RecordingHandler, email_event, queue_event, storage_event,
};
use stratus::{DispatchError, EmailRecord, Orchestrator, QueueRecord, Response, StorageRecord};

#[tokio::test]
async fn test_storage_records_in_scope() {
    common::init_tracing();

    let images = RecordingHandler::<StorageRecord>::new();
    let other = RecordingHandler::<StorageRecord>::new();
    let mut builder = scoped_builder(Some("uploads"), None, None);
    builder
        .storage()
        .route("*.png", images.clone())
        .unwrap()
        .route("_", other.clone())
        .unwrap();
    let orchestrator = builder.build();

    let response = orchestrator
        .handle(raw(storage_event("uploads", &["a/b.png", "a/b.txt"])))
        .await
        .unwrap();
    assert_eq!(response, Response::Empty);

    let keys: Vec<String> = images.inputs().iter().map(|r| r.key().to_string()).collect();
    assert_eq!(keys, ["a/b.png"]);
    let keys: Vec<String> = other.inputs().iter().map(|r| r.key().to_string()).collect();
    assert_eq!(keys, ["a/b.txt"]);

    images.clear();
    other.clear();
    let response = orchestrator
        .handle_value(storage_event("elsewhere", &["a/b.png"]))
        .await
        .unwrap();
    assert_eq!(response, json!({}));
    assert_eq!(images.count(), 0);
    assert_eq!(other.count(), 0);
}

#[tokio::test]
async fn test_every_matching_pattern_fires() {
    let any = CountingHandler::new();
    let reports = CountingHandler::new();
    let csv = CountingHandler::new();
    let mut builder = Orchestrator::builder();
    builder
        .storage()
        .route("*", any.clone())
        .unwrap()
        .route("reports/*", reports.clone())
        .unwrap()
        .route("*.csv", csv.clone())
        .unwrap();
    let orchestrator = builder.build();

    orchestrator
        .handle(raw(storage_event("any-bucket", &["reports/2024/q1.csv"])))
        .await
        .unwrap();

    assert_eq!(any.count(), 1);
    assert_eq!(reports.count(), 1);
    assert_eq!(csv.count(), 1);
}

#[tokio::test]
async fn test_failing_record_does_not_stop_batch() {
    let failing = FailingHandler::new("disk full");
    let counter = CountingHandler::new();
    let mut builder = Orchestrator::builder();
    builder
        .storage()
        .route("*.png", failing.clone())
        .unwrap()
        .route("*", counter.clone())
        .unwrap();
    let orchestrator = builder.build();

    let err = orchestrator
        .handle(raw(storage_event("uploads", &["a.png", "b.png", "c.txt"])))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Handler(_)));
    assert_eq!(err.to_string(), "handler error: disk full");
    assert_eq!(failing.count(), 2);
    assert_eq!(counter.count(), 3);
}

#[tokio::test]
async fn test_email_recipients_in_domain() {
    let support = RecordingHandler::<EmailRecord>::new();
    let fallthrough = CountingHandler::new();
    let mut builder = scoped_builder(None, Some("example.com"), None);
    builder
        .email()
        .route("support@*", support.clone())
        .unwrap()
        .fallthrough(fallthrough.clone());
    let orchestrator = builder.build();

    orchestrator
        .handle(raw(email_event(&["Support@Example.com", "support@other.org"])))
        .await
        .unwrap();
    assert_eq!(support.count(), 1);
    assert_eq!(fallthrough.count(), 0);

    // No recipient is in the domain, so the record is skipped.
    orchestrator
        .handle(raw(email_event(&["support@other.org"])))
        .await
        .unwrap();
    assert_eq!(support.count(), 1);
    assert_eq!(fallthrough.count(), 0);

    orchestrator
        .handle(raw(email_event(&["sales@example.com"])))
        .await
        .unwrap();
    assert_eq!(support.count(), 1);
    assert_eq!(fallthrough.count(), 1);
}

#[tokio::test]
async fn test_queue_body_and_attributes() {
    let orders = RecordingHandler::<QueueRecord>::new();
    let priority = CountingHandler::new();
    let mut builder = scoped_builder(None, None, Some("orders"));
    builder
        .queue()
        .route("order:*", orders.clone())
        .unwrap()
        .route_attribute("priority", "high", priority.clone())
        .unwrap();
    let orchestrator = builder.build();

    orchestrator
        .handle(raw(queue_event("orders", "order:42", &[("priority", "high")])))
        .await
        .unwrap();
    assert_eq!(orders.count(), 1);
    assert_eq!(orders.inputs()[0].body, "order:42");
    assert_eq!(priority.count(), 1);

    orchestrator
        .handle(raw(queue_event("refunds", "order:43", &[("priority", "high")])))
        .await
        .unwrap();
    assert_eq!(orders.count(), 1);
    assert_eq!(priority.count(), 1);
}

#[tokio::test]
async fn test_invalid_pattern_is_rejected() {
    let mut builder = Orchestrator::builder();
    let err = builder
        .storage()
        .route("[unclosed", CountingHandler::new())
        .err()
        .unwrap();
    assert!(err.to_string().starts_with("invalid pattern \"[unclosed\""));
    assert!(builder.storage().is_empty());
}
