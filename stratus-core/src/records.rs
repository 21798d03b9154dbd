//! Typed trigger records.
//!
//! Field names follow the JSON the platform delivers. Fields the routers do
//! not need are kept as [`Value`] so nothing in the payload is lost.

use crate::message::Message;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Deserialize a field that may be `null` as its default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ============================================================================
// Storage
// ============================================================================

/// One storage-object notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageRecord {
    /// e.g. `ObjectCreated:Put`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_source: String,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub aws_region: Option<String>,
    /// Bucket and object details.
    pub s3: StorageEntity,
}

/// The `s3` section of a storage record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageEntity {
    pub bucket: Bucket,
    pub object: StorageObject,
}

/// The bucket a notification came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    #[serde(default)]
    pub arn: Option<String>,
}

/// The object a notification refers to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObject {
    /// Object key exactly as delivered.
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub e_tag: Option<String>,
    #[serde(default)]
    pub sequencer: Option<String>,
}

impl StorageRecord {
    /// The bucket name, which scopes storage routers.
    pub fn bucket(&self) -> &str {
        &self.s3.bucket.name
    }

    /// The object key.
    pub fn key(&self) -> &str {
        &self.s3.object.key
    }
}

impl Message for StorageRecord {}

// ============================================================================
// Email
// ============================================================================

/// One inbound email receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_source: String,
    #[serde(default)]
    pub event_version: Option<String>,
    pub ses: EmailMessage,
}

/// The `ses` section of an email record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub mail: Mail,
    pub receipt: Receipt,
}

/// Envelope and header data of the received mail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_id: String,
    /// Envelope sender.
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub destination: Vec<String>,
    #[serde(default)]
    pub common_headers: Value,
}

/// Receipt details, including the recipients this delivery was for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(default, deserialize_with = "null_as_default")]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Verdicts, action and the rest of the receipt.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmailRecord {
    /// Recipient addresses of this delivery.
    pub fn recipients(&self) -> &[String] {
        &self.ses.receipt.recipients
    }

    /// The `Subject` common header, if present.
    pub fn subject(&self) -> Option<&str> {
        self.ses
            .mail
            .common_headers
            .get("subject")
            .and_then(Value::as_str)
    }
}

/// The domain part of an address, without surrounding whitespace.
pub fn address_domain(address: &str) -> Option<&str> {
    address
        .trim()
        .trim_end_matches('>')
        .rsplit_once('@')
        .map(|(_, domain)| domain)
}

impl Message for EmailRecord {}

// ============================================================================
// Queue
// ============================================================================

/// One queue message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_id: String,
    pub receipt_handle: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    /// System attributes (`SentTimestamp`, `MessageGroupId`, ...).
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_attributes: HashMap<String, MessageAttribute>,
    #[serde(default)]
    pub md5_of_body: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_source: String,
    #[serde(rename = "eventSourceARN", default, deserialize_with = "null_as_default")]
    pub event_source_arn: String,
    #[serde(default)]
    pub aws_region: Option<String>,
}

/// A user-supplied message attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAttribute {
    #[serde(default)]
    pub string_value: Option<String>,
    #[serde(default)]
    pub binary_value: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_type: String,
}

impl QueueRecord {
    /// The queue name: the last `:` segment of the source ARN.
    pub fn queue_name(&self) -> &str {
        self.event_source_arn
            .rsplit(':')
            .next()
            .unwrap_or_default()
    }

    /// String value of a message attribute.
    pub fn message_attribute(&self, name: &str) -> Option<&str> {
        self.message_attributes
            .get(name)
            .and_then(|attr| attr.string_value.as_deref())
    }
}

impl Message for QueueRecord {}

// ============================================================================
// Identity
// ============================================================================

/// An identity-provider callback (user pool trigger or identity pool sync).
///
/// Keys other than the named ones are preserved in `rest`, so the trigger can
/// be echoed back to the provider after modification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_pool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_pool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl IdentityTrigger {
    /// The routing name: the trigger source, or `""` when absent.
    pub fn source(&self) -> &str {
        self.trigger_source.as_deref().unwrap_or_default()
    }
}

impl Message for IdentityTrigger {}
