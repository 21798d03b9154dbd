//! # Event Classification
//!
//! Invocation payloads arrive as open JSON objects ([`RawEvent`]). The
//! classifier inspects which keys are present and returns a [`Category`];
//! [`Event::from_raw`] is the single place where a raw payload becomes a
//! typed [`Event`].
//!
//! Rules are evaluated in a fixed priority order because shapes are not
//! mutually exclusive; the first match wins:
//!
//! | Priority | Keys present | Category |
//! |----------|--------------|----------|
//! | 1 | `path` and `httpMethod` | [`Category::HttpRequest`] |
//! | 2 | `_taskName` | [`Category::ScheduledTask`] |
//! | 3 | `_rpcName` | [`Category::RemoteCall`] |
//! | 4 | first record has `s3` | [`Category::StorageObjectRecord`] |
//! | 5 | first record has `ses` | [`Category::EmailReceiptRecord`] |
//! | 6 | first record has `receiptHandle` | [`Category::QueueMessageRecord`] |
//! | 7 | `userPoolId` or `identityPoolId` | [`Category::IdentityTrigger`] |
//! | 8 | anything else | [`Category::Unclassified`] |
//!
//! Only key presence is inspected, so unknown extra keys never change the
//! outcome.

use crate::{
    error::DecodeError,
    http::HttpRequest,
    message::Message,
    records::{EmailRecord, IdentityTrigger, QueueRecord, StorageRecord},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::fmt;

/// Request path key of an HTTP-shaped event.
pub const PATH_FIELD: &str = "path";
/// HTTP method key of an HTTP-shaped event.
pub const METHOD_FIELD: &str = "httpMethod";
/// Reserved key naming a scheduled task.
pub const TASK_FIELD: &str = "_taskName";
/// Reserved key naming a remote call.
pub const RPC_FIELD: &str = "_rpcName";
/// Keys that may hold a record batch, in lookup order.
pub const RECORDS_FIELDS: [&str; 2] = ["Records", "records"];
/// Marker key of a storage-object record.
pub const STORAGE_MARKER: &str = "s3";
/// Marker key of a mail-receipt record.
pub const EMAIL_MARKER: &str = "ses";
/// Marker key of a queue-message record.
pub const QUEUE_MARKER: &str = "receiptHandle";
/// Keys identifying an identity-provider callback.
pub const IDENTITY_FIELDS: [&str; 2] = ["userPoolId", "identityPoolId"];

// ============================================================================
// Category
// ============================================================================

/// The kind of trigger that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// An HTTP-style request.
    HttpRequest,
    /// A scheduled job.
    ScheduledTask,
    /// An inter-function remote call.
    RemoteCall,
    /// A storage-object notification batch.
    StorageObjectRecord,
    /// An inbound email receipt batch.
    EmailReceiptRecord,
    /// A queue message batch.
    QueueMessageRecord,
    /// An identity-provider callback.
    IdentityTrigger,
    /// Nothing recognisable.
    Unclassified,
}

impl Category {
    /// A short lowercase name, used in logs and span fields.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::HttpRequest => "http",
            Category::ScheduledTask => "task",
            Category::RemoteCall => "rpc",
            Category::StorageObjectRecord => "storage",
            Category::EmailReceiptRecord => "email",
            Category::QueueMessageRecord => "queue",
            Category::IdentityTrigger => "identity",
            Category::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RawEvent
// ============================================================================

/// An invocation payload before classification: an open keyed bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEvent(Map<String, Value>);

impl RawEvent {
    /// Create an empty event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a top-level key holding a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Whether a top-level key is present (whatever its value).
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or replace a top-level key, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Remove a top-level key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// The record batch, if the event carries one.
    pub fn records(&self) -> Option<&Vec<Value>> {
        self.records_field()
            .and_then(|field| self.0.get(field))
            .and_then(Value::as_array)
    }

    /// The first records key whose value is an array.
    fn records_field(&self) -> Option<&'static str> {
        RECORDS_FIELDS
            .into_iter()
            .find(|field| self.0.get(*field).is_some_and(Value::is_array))
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the event, returning the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Consume the event, returning it as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl Message for RawEvent {}

impl From<Map<String, Value>> for RawEvent {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for RawEvent {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(DecodeError::NotAnObject("null")),
            Value::Bool(_) => Err(DecodeError::NotAnObject("a boolean")),
            Value::Number(_) => Err(DecodeError::NotAnObject("a number")),
            Value::String(_) => Err(DecodeError::NotAnObject("a string")),
            Value::Array(_) => Err(DecodeError::NotAnObject("an array")),
        }
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// Classify an event by the keys it carries.
///
/// Pure and infallible: anything unrecognised is [`Category::Unclassified`].
///
/// ```rust
/// use serde_json::json;
/// use stratus_core::{Category, RawEvent, classify};
///
/// let event = RawEvent::try_from(json!({ "_taskName": "cleanup" })).unwrap();
/// assert_eq!(classify(&event), Category::ScheduledTask);
/// ```
pub fn classify(event: &RawEvent) -> Category {
    if event.contains_key(PATH_FIELD) && event.contains_key(METHOD_FIELD) {
        return Category::HttpRequest;
    }
    if event.contains_key(TASK_FIELD) {
        return Category::ScheduledTask;
    }
    if event.contains_key(RPC_FIELD) {
        return Category::RemoteCall;
    }

    let first = event
        .records()
        .and_then(|records| records.first())
        .and_then(Value::as_object);
    if let Some(record) = first {
        if record.contains_key(STORAGE_MARKER) {
            return Category::StorageObjectRecord;
        }
        if record.contains_key(EMAIL_MARKER) {
            return Category::EmailReceiptRecord;
        }
        if record.contains_key(QUEUE_MARKER) {
            return Category::QueueMessageRecord;
        }
    }

    if IDENTITY_FIELDS.iter().any(|field| event.contains_key(field)) {
        return Category::IdentityTrigger;
    }

    Category::Unclassified
}

// ============================================================================
// Typed events
// ============================================================================

/// A scheduled job invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask {
    /// Value of the `_taskName` key.
    pub name: String,
    /// The complete payload, including `_taskName`.
    pub payload: RawEvent,
}

impl Message for ScheduledTask {}

/// An inter-function remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    /// Value of the `_rpcName` key.
    pub name: String,
    /// The complete payload, including `_rpcName`.
    pub payload: RawEvent,
}

impl Message for RemoteCall {}

/// An event after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An HTTP-style request.
    Http(HttpRequest),
    /// A scheduled job.
    Task(ScheduledTask),
    /// An inter-function remote call.
    Rpc(RemoteCall),
    /// A batch of storage-object notifications.
    Storage(Vec<StorageRecord>),
    /// A batch of inbound email receipts.
    Email(Vec<EmailRecord>),
    /// A batch of queue messages.
    Queue(Vec<QueueRecord>),
    /// An identity-provider callback.
    Identity(IdentityTrigger),
    /// An event no rule recognised.
    Raw(RawEvent),
}

impl Message for Event {}

impl Event {
    /// Classify `raw` and decode it into the matching typed variant.
    pub fn from_raw(raw: RawEvent) -> Result<Self, DecodeError> {
        let category = classify(&raw);
        let event = match category {
            Category::HttpRequest => Event::Http(decode(category, raw.into_value())?),
            Category::ScheduledTask => Event::Task(ScheduledTask {
                name: name_field(category, &raw, TASK_FIELD)?,
                payload: raw,
            }),
            Category::RemoteCall => Event::Rpc(RemoteCall {
                name: name_field(category, &raw, RPC_FIELD)?,
                payload: raw,
            }),
            Category::StorageObjectRecord => Event::Storage(decode_records(category, raw)?),
            Category::EmailReceiptRecord => Event::Email(decode_records(category, raw)?),
            Category::QueueMessageRecord => Event::Queue(decode_records(category, raw)?),
            Category::IdentityTrigger => Event::Identity(decode(category, raw.into_value())?),
            Category::Unclassified => Event::Raw(raw),
        };
        Ok(event)
    }

    /// The category this event was decoded from.
    pub fn category(&self) -> Category {
        match self {
            Event::Http(_) => Category::HttpRequest,
            Event::Task(_) => Category::ScheduledTask,
            Event::Rpc(_) => Category::RemoteCall,
            Event::Storage(_) => Category::StorageObjectRecord,
            Event::Email(_) => Category::EmailReceiptRecord,
            Event::Queue(_) => Category::QueueMessageRecord,
            Event::Identity(_) => Category::IdentityTrigger,
            Event::Raw(_) => Category::Unclassified,
        }
    }
}

impl TryFrom<RawEvent> for Event {
    type Error = DecodeError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        Event::from_raw(raw)
    }
}

fn decode<T: DeserializeOwned>(category: Category, value: Value) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|source| DecodeError::Malformed { category, source })
}

fn decode_records<T: DeserializeOwned>(
    category: Category,
    mut raw: RawEvent,
) -> Result<Vec<T>, DecodeError> {
    let records = raw
        .records_field()
        .and_then(|field| raw.remove(field))
        .unwrap_or(Value::Array(Vec::new()));
    decode(category, records)
}

fn name_field(category: Category, raw: &RawEvent, field: &str) -> Result<String, DecodeError> {
    let value = raw.get(field).cloned().unwrap_or(Value::Null);
    decode(category, value)
}
