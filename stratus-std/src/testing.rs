//! Testing utilities for Stratus.
//!
//! This module provides handlers and capture hooks that record what they see,
//! plus JSON fixtures for every trigger shape.
//!
//! # Features
//!
//! - [`CountingHandler`]: Counts invocations
//! - [`RecordingHandler`]: Records every input it receives
//! - [`FailingHandler`]: Always fails with a fixed message
//! - [`RecordingCapture`]: A capture hook that records segments
//! - Fixtures: [`http_event`], [`task_event`], [`rpc_event`],
//!   [`storage_event`], [`email_event`], [`queue_event`], [`identity_event`]

use serde_json::{Map, Value, json};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering},
};
use stratus_core::{BoxError, Capture, Handler, Invocation, Message, Segment};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that counts invocations.
///
/// Clones share the counter, so keep one clone and register the other.
///
/// # Example
///
/// ```rust
/// use stratus_std::routing::TaskRouter;
/// use stratus_std::testing::CountingHandler;
///
/// let counter = CountingHandler::new();
/// let mut router = TaskRouter::default();
/// router.route("cleanup", counter.clone());
/// assert_eq!(counter.count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a new counting handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

impl<E: Message> Handler<E> for CountingHandler {
    type Output = ();

    async fn call(&self, _input: E) -> Self::Output {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Recording Handler
// ============================================================================

/// A handler that records all inputs it receives.
pub struct RecordingHandler<E> {
    inputs: Arc<Mutex<Vec<E>>>,
}

impl<E: Clone> RecordingHandler<E> {
    /// Create a new recording handler.
    pub fn new() -> Self {
        Self {
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get a clone of the recorded inputs.
    pub fn inputs(&self) -> Vec<E> {
        lock(&self.inputs).clone()
    }

    /// Get the number of recorded inputs.
    pub fn count(&self) -> usize {
        lock(&self.inputs).len()
    }

    /// Clear all recorded inputs.
    pub fn clear(&self) {
        lock(&self.inputs).clear();
    }
}

impl<E: Clone> Default for RecordingHandler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RecordingHandler<E> {
    fn clone(&self) -> Self {
        Self {
            inputs: self.inputs.clone(),
        }
    }
}

impl<E: Message + Clone> Handler<E> for RecordingHandler<E> {
    type Output = ();

    async fn call(&self, input: E) -> Self::Output {
        lock(&self.inputs).push(input);
    }
}

// ============================================================================
// Failing Handler
// ============================================================================

/// A handler that always fails with the same message.
#[derive(Debug, Clone)]
pub struct FailingHandler {
    message: String,
    calls: Arc<AtomicUsize>,
}

impl FailingHandler {
    /// Create a handler failing with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times the handler ran.
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<E: Message> Handler<E> for FailingHandler {
    type Output = Result<(), BoxError>;

    async fn call(&self, _input: E) -> Self::Output {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.message.clone().into())
    }
}

// ============================================================================
// Recording Capture
// ============================================================================

/// A capture hook that records every segment and runs the invocation.
#[derive(Debug, Clone, Default)]
pub struct RecordingCapture {
    segments: Arc<Mutex<Vec<Segment>>>,
}

impl RecordingCapture {
    /// Create a new recording capture hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments seen so far, in invocation order.
    pub fn segments(&self) -> Vec<Segment> {
        lock(&self.segments).clone()
    }
}

impl Capture for RecordingCapture {
    async fn capture<'a>(
        &'a self,
        segment: &'a Segment,
        invocation: Invocation<'a>,
    ) -> Result<(), BoxError> {
        lock(&self.segments).push(segment.clone());
        invocation.await
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// An HTTP request event.
pub fn http_event(method: &str, path: &str) -> Value {
    json!({
        "resource": path,
        "path": path,
        "httpMethod": method,
        "headers": { "Accept": "*/*", "Host": "api.example.com" },
        "queryStringParameters": null,
        "pathParameters": null,
        "stageVariables": null,
        "requestContext": { "stage": "prod", "requestId": "req-1" },
        "body": null,
        "isBase64Encoded": false
    })
}

/// A scheduled task event.
pub fn task_event(name: &str) -> Value {
    json!({ "_taskName": name })
}

/// A remote call event. Object `args` are merged into the payload; anything
/// else is stored under `args`.
pub fn rpc_event(name: &str, args: Value) -> Value {
    let mut payload = match args {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("args".into(), other);
            map
        }
    };
    payload.insert("_rpcName".into(), Value::from(name));
    Value::Object(payload)
}

/// A storage notification batch with one record per key.
pub fn storage_event(bucket: &str, keys: &[&str]) -> Value {
    let records: Vec<Value> = keys
        .iter()
        .map(|key| {
            json!({
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "us-east-1",
                "eventTime": "2024-01-01T00:00:00.000Z",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "configurationId": "notify",
                    "bucket": { "name": bucket, "arn": format!("arn:aws:s3:::{bucket}") },
                    "object": { "key": key, "size": 1024, "eTag": "d41d8cd9", "sequencer": "0A1B2C" }
                }
            })
        })
        .collect();
    json!({ "Records": records })
}

/// An email receipt batch with a single record for `recipients`.
pub fn email_event(recipients: &[&str]) -> Value {
    json!({
        "Records": [{
            "eventSource": "aws:ses",
            "eventVersion": "1.0",
            "ses": {
                "mail": {
                    "timestamp": "2024-01-01T00:00:00.000Z",
                    "source": "sender@example.org",
                    "messageId": "msg-1",
                    "destination": recipients,
                    "commonHeaders": {
                        "from": ["Sender <sender@example.org>"],
                        "to": recipients,
                        "subject": "Hello"
                    }
                },
                "receipt": {
                    "timestamp": "2024-01-01T00:00:00.000Z",
                    "recipients": recipients,
                    "spamVerdict": { "status": "PASS" },
                    "virusVerdict": { "status": "PASS" },
                    "action": { "type": "Lambda", "invocationType": "Event" }
                }
            }
        }]
    })
}

/// A queue batch with one message.
pub fn queue_event(queue: &str, body: &str, attributes: &[(&str, &str)]) -> Value {
    let message_attributes: Map<String, Value> = attributes
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                json!({ "stringValue": value, "dataType": "String" }),
            )
        })
        .collect();

    json!({
        "Records": [{
            "messageId": "059f36b4-87a3-44ab-83d2-661975830a7d",
            "receiptHandle": "AQEBwJnKyrHigUMZj6rYigCgxlaS3SLy0a",
            "body": body,
            "attributes": {
                "ApproximateReceiveCount": "1",
                "SentTimestamp": "1545082649183"
            },
            "messageAttributes": message_attributes,
            "md5OfBody": "e4e68fb7bd0e697a0ae8f1bb342846b3",
            "eventSource": "aws:sqs",
            "eventSourceARN": format!("arn:aws:sqs:us-east-1:123456789012:{queue}"),
            "awsRegion": "us-east-1"
        }]
    })
}

/// A user pool trigger event.
pub fn identity_event(trigger_source: &str) -> Value {
    json!({
        "version": "1",
        "region": "us-east-1",
        "userPoolId": "us-east-1_Example",
        "userName": "jane",
        "callerContext": { "awsSdkVersion": "aws-sdk-unknown-unknown", "clientId": "client" },
        "triggerSource": trigger_source,
        "request": { "userAttributes": { "email": "jane@example.com" } },
        "response": {}
    })
}
