//! The bound shared by everything a router hands to a handler.

/// Implemented by every value a handler can receive: trigger records,
/// HTTP requests, task and RPC payloads, and the raw event itself.
///
/// Routers are frozen once built and then serve concurrent invocations, so
/// a message has to be shareable across threads and own its data.
///
/// Application types decoded from a record body opt in with an empty impl:
///
/// ```rust
/// use serde::Deserialize;
/// use stratus_core::{Message, QueueRecord};
///
/// #[derive(Debug, Clone, Deserialize)]
/// struct OrderPlaced {
///     order_id: String,
/// }
///
/// impl Message for OrderPlaced {}
///
/// let record = QueueRecord {
///     body: r#"{"order_id":"o-17"}"#.into(),
///     ..QueueRecord::default()
/// };
/// let order: OrderPlaced = serde_json::from_str(&record.body).unwrap();
/// assert_eq!(order.order_id, "o-17");
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be routed to a handler",
    label = "not a trigger record, request or payload",
    note = "add `impl Message for {Self} {}`; the type must be `Send + Sync + 'static` to cross concurrent invocations"
)]
pub trait Message: Send + Sync + 'static {}

// Plain payloads, used by handlers that ignore or re-parse their input.
impl Message for () {}
impl Message for String {}
impl Message for serde_json::Value {}

impl<T: Message> Message for std::sync::Arc<T> {}
impl<T: Message> Message for Vec<T> {}
