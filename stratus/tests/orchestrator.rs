mod common;

use common::raw;
use serde_json::{Value, json};
use std::sync::Arc;
use stratus::testing::{
    CountingHandler, RecordingCapture, http_event, identity_event, rpc_event, storage_event,
    task_event,
};
use stratus::{
    BoxError, DecodeError, DispatchError, Event, HttpRequest, IdentityTrigger, NoRouteError,
    Orchestrator, RawEvent, RemoteCall, Response, StratusConfig,
};

// ============================================================================
// Name-keyed triggers
// ============================================================================

#[tokio::test]
async fn test_scheduled_tasks() {
    let cleanup = CountingHandler::new();
    let mut builder = Orchestrator::builder();
    builder.tasks().route("cleanup", cleanup.clone());
    let orchestrator = builder.build();

    let response = orchestrator.handle_value(task_event("cleanup")).await.unwrap();
    assert_eq!(response, json!({}));
    assert_eq!(cleanup.count(), 1);

    // Unknown tasks succeed without running anything.
    let response = orchestrator.handle_value(task_event("vacuum")).await.unwrap();
    assert_eq!(response, json!({}));
    assert_eq!(cleanup.count(), 1);
}

#[tokio::test]
async fn test_remote_calls() {
    let mut builder = Orchestrator::builder();
    builder.rpc().route("double", |call: RemoteCall| async move {
        let n = call
            .payload
            .get("n")
            .and_then(Value::as_i64)
            .ok_or("missing n")?;
        Ok::<_, BoxError>(json!({ "result": n * 2 }))
    });
    let orchestrator = builder.build();

    let response = orchestrator
        .handle_value(rpc_event("double", json!({ "n": 21 })))
        .await
        .unwrap();
    assert_eq!(response, json!({ "result": 42 }));

    let err = orchestrator
        .handle_value(rpc_event("double", json!({})))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "handler error: missing n");

    let err = orchestrator
        .handle_value(rpc_event("triple", json!({ "n": 1 })))
        .await
        .unwrap_err();
    let DispatchError::Handler(source) = err else {
        panic!("expected a handler error, got {err:?}");
    };
    let no_route = source.downcast_ref::<NoRouteError>().unwrap();
    assert_eq!(no_route.kind, "rpc");
    assert_eq!(no_route.name, "triple");
}

#[tokio::test]
async fn test_identity_triggers() {
    let mut builder = Orchestrator::builder();
    builder
        .identity()
        .route("PreSignUp_SignUp", |mut trigger: IdentityTrigger| async move {
            trigger
                .rest
                .insert("response".into(), json!({ "autoConfirmUser": true }));
            serde_json::to_value(trigger)
        });
    let orchestrator = builder.build();

    let response = orchestrator
        .handle_value(identity_event("PreSignUp_SignUp"))
        .await
        .unwrap();
    assert_eq!(response["response"], json!({ "autoConfirmUser": true }));
    assert_eq!(response["userName"], "jane");

    // Unrouted triggers are echoed back unchanged.
    let event = identity_event("PostConfirmation_ConfirmSignUp");
    let response = orchestrator.handle_value(event.clone()).await.unwrap();
    assert_eq!(response, event);
}

// ============================================================================
// Unclassified and malformed payloads
// ============================================================================

#[tokio::test]
async fn test_unclassified_without_default_handler() {
    let orchestrator = Orchestrator::builder().build();
    let err = orchestrator
        .handle(raw(json!({ "hello": "world" })))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::UnhandledEvent));
}

#[tokio::test]
async fn test_unclassified_with_default_handler() {
    let orchestrator = Orchestrator::builder()
        .default_handler(|event: RawEvent| async move {
            Response::Value(json!({ "keys": event.as_map().len() }))
        })
        .build();

    let response = orchestrator
        .handle_value(json!({ "a": 1, "b": 2 }))
        .await
        .unwrap();
    assert_eq!(response, json!({ "keys": 2 }));
}

#[tokio::test]
async fn test_non_object_payload() {
    let orchestrator = Orchestrator::builder().build();
    for payload in [json!([1, 2]), json!("event"), json!(null)] {
        let err = orchestrator.handle_value(payload).await.unwrap_err();
        assert!(matches!(err, DispatchError::Decode(DecodeError::NotAnObject(_))));
    }
}

#[tokio::test]
async fn test_malformed_http_event() {
    let orchestrator = Orchestrator::builder().build();
    let err = orchestrator
        .handle_value(json!({ "httpMethod": "GET", "path": 42 }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Decode(DecodeError::Malformed { .. })
    ));
}

// ============================================================================
// Filters
// ============================================================================

#[tokio::test]
async fn test_filters_run_in_order() {
    let cleanup = CountingHandler::new();
    let mut builder = Orchestrator::builder()
        .pre_classify(|mut event: RawEvent| {
            if let Some(job) = event.remove("job") {
                event.insert("_taskName", job);
            }
            event
        })
        .pre_dispatch(|event: Event| match event {
            Event::Http(mut request) => {
                let stripped = request.path.strip_prefix("/v1").map(str::to_string);
                if let Some(path) = stripped {
                    request.path = path;
                }
                Event::Http(request)
            }
            other => other,
        })
        .post_dispatch(|response: Response| match response {
            Response::Http(response) => Response::Http(response.with_header("X-Api-Version", "1")),
            other => other,
        })
        .post_dispatch(|response: Response| match response {
            Response::Http(mut response) => {
                let version = response.header("x-api-version").unwrap_or("none").to_string();
                response.body = format!("{} (v{version})", response.body);
                Response::Http(response)
            }
            other => other,
        });
    builder.tasks().route("cleanup", cleanup.clone());
    builder
        .http()
        .get("/status", |_request: HttpRequest| async move { "up" })
        .unwrap();
    let orchestrator = builder.build();

    orchestrator
        .handle_value(json!({ "job": "cleanup" }))
        .await
        .unwrap();
    assert_eq!(cleanup.count(), 1);

    let response = orchestrator
        .handle_value(http_event("GET", "/v1/status"))
        .await
        .unwrap();
    assert_eq!(response["statusCode"], 200);
    assert_eq!(response["headers"]["X-Api-Version"], "1");
    assert_eq!(response["body"], "up (v1)");
}

// ============================================================================
// Capture
// ============================================================================

#[tokio::test]
async fn test_capture_sees_every_invocation() {
    let capture = RecordingCapture::new();
    let mut builder = Orchestrator::builder().capture(capture.clone());
    builder
        .http()
        .get("/users/:id", |_request: HttpRequest| async move { "user" })
        .unwrap();
    let orchestrator = builder.build();

    orchestrator
        .handle_value(http_event("GET", "/users/7"))
        .await
        .unwrap();
    orchestrator
        .handle_value(task_event("unknown"))
        .await
        .unwrap();

    let segments = capture.segments();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].kind, "http");
    assert_eq!(segments[0].name, "GET /users/:id");
    assert_eq!(segments[0].annotation("path"), Some("/users/7"));
    assert_eq!(segments[1].kind, "task");
    assert_eq!(segments[1].name, "_");
    assert_eq!(segments[1].annotation("name"), Some("unknown"));
}

#[tokio::test]
async fn test_builder_from_config_with_tracing() {
    common::init_tracing();

    let config = StratusConfig::from_lookup(|key| match key {
        "STRATUS_STORAGE_SCOPE" => Some("uploads".to_string()),
        _ => None,
    });
    assert!(config.tracing);

    let counter = CountingHandler::new();
    let mut builder = Orchestrator::builder_from_config(&config);
    builder.storage().route("*", counter.clone()).unwrap();
    let orchestrator = builder.build();

    orchestrator
        .handle_value(storage_event("uploads", &["a", "b"]))
        .await
        .unwrap();
    orchestrator
        .handle_value(storage_event("other", &["c"]))
        .await
        .unwrap();
    assert_eq!(counter.count(), 2);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_invocations() {
    let hits = CountingHandler::new();
    let mut builder = Orchestrator::builder();
    builder
        .http()
        .get("/items/:id", |request: HttpRequest| async move {
            json!({ "id": request.param("id").unwrap_or_default() })
        })
        .unwrap();
    builder.tasks().route("tick", hits.clone());
    let orchestrator = Arc::new(builder.build());

    let mut handles = Vec::new();
    for i in 0..32 {
        let orchestrator = Arc::clone(&orchestrator);
        handles.push(tokio::spawn(async move {
            let response = orchestrator
                .handle_value(http_event("GET", &format!("/items/{i}")))
                .await
                .unwrap();
            orchestrator.handle_value(task_event("tick")).await.unwrap();
            response
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let response = handle.await.unwrap();
        let body: Value = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
        assert_eq!(body, json!({ "id": i.to_string() }));
    }
    assert_eq!(hits.count(), 32);
}
