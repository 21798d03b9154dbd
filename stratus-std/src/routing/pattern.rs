//! Glob-pattern routers for record batches.
//!
//! Storage notifications, email receipts and queue messages arrive in
//! batches. A [`PatternRouter`] tests every record against its glob patterns
//! and calls the handler of **every** matching pattern, in registration
//! order. A record that matches nothing goes to the fallthrough handler
//! exactly once.
//!
//! # Subjects and scope
//!
//! | Record | Scope | Default subject | Attributes |
//! |--------|-------|-----------------|------------|
//! | [`StorageRecord`] | bucket name | object key | `eventName`, `bucket`, `key` |
//! | [`EmailRecord`] | recipient domain | in-scope recipients | `source`, `subject`, `messageId` |
//! | [`QueueRecord`] | queue name | message body | message attributes, then system attributes |
//!
//! A scoped router ignores records outside its scope entirely: no handler
//! and no fallthrough runs for them.
//!
//! In patterns `*` also matches `/`, so `*.png` matches `a/b.png`.

use glob::{MatchOptions, Pattern};
use std::sync::Arc;
use stratus_core::{
    BoxError, BoxHandler, DynCapture, DynHandler, EmailRecord, Handler, Message, QueueRecord,
    RouteError, Segment, StorageRecord, address_domain, invoke,
};

/// The reserved pattern that registers the fallthrough handler.
pub const FALLTHROUGH: &str = "_";

/// A record type a [`PatternRouter`] can route.
pub trait PatternRecord: Message + Clone {
    /// Router kind used in segments and logs.
    const KIND: &'static str;

    /// Whether glob matching distinguishes ASCII case.
    const CASE_SENSITIVE: bool = true;

    /// Whether the record belongs to `scope`.
    fn in_scope(&self, scope: &str) -> bool;

    /// Strings plain patterns are matched against.
    fn subjects(&self, scope: Option<&str>) -> Vec<&str>;

    /// The value attribute patterns named `name` are matched against.
    fn attribute(&self, name: &str) -> Option<&str>;
}

impl PatternRecord for StorageRecord {
    const KIND: &'static str = "storage";

    fn in_scope(&self, scope: &str) -> bool {
        self.bucket() == scope
    }

    fn subjects(&self, _scope: Option<&str>) -> Vec<&str> {
        vec![self.key()]
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "eventName" => Some(self.event_name.as_str()),
            "bucket" => Some(self.bucket()),
            "key" => Some(self.key()),
            _ => None,
        }
    }
}

impl PatternRecord for EmailRecord {
    const KIND: &'static str = "email";
    const CASE_SENSITIVE: bool = false;

    fn in_scope(&self, scope: &str) -> bool {
        self.recipients()
            .iter()
            .any(|recipient| in_domain(recipient, scope))
    }

    fn subjects(&self, scope: Option<&str>) -> Vec<&str> {
        self.recipients()
            .iter()
            .filter(|recipient| scope.is_none_or(|domain| in_domain(recipient, domain)))
            .map(String::as_str)
            .collect()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "source" => Some(self.ses.mail.source.as_str()),
            "subject" => self.subject(),
            "messageId" => Some(self.ses.mail.message_id.as_str()),
            _ => None,
        }
    }
}

fn in_domain(address: &str, domain: &str) -> bool {
    address_domain(address).is_some_and(|d| d.eq_ignore_ascii_case(domain))
}

impl PatternRecord for QueueRecord {
    const KIND: &'static str = "queue";

    fn in_scope(&self, scope: &str) -> bool {
        self.queue_name() == scope
    }

    fn subjects(&self, _scope: Option<&str>) -> Vec<&str> {
        vec![self.body.as_str()]
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.message_attribute(name)
            .or_else(|| self.attributes.get(name).map(String::as_str))
    }
}

// ============================================================================
// Router
// ============================================================================

struct PatternEntry<R> {
    raw: String,
    glob: Pattern,
    attribute: Option<String>,
    handler: BoxHandler<R, ()>,
}

/// The fallthrough installed at construction: logs the record and succeeds.
struct Unmatched;

impl<R: PatternRecord> Handler<R> for Unmatched {
    type Output = ();

    async fn call(&self, record: R) {
        tracing::info!(kind = R::KIND, subjects = ?record.subjects(None), "no pattern matched record");
    }
}

/// A router dispatching records to every handler whose glob matches.
///
/// # Example
///
/// ```rust
/// use stratus_core::{BoxError, StorageRecord};
/// use stratus_std::routing::StorageRouter;
///
/// let mut router = StorageRouter::scoped("uploads");
/// router
///     .route("*.png", |record: StorageRecord| async move {
///         println!("thumbnail {}", record.key());
///         Ok::<_, BoxError>(())
///     })
///     .unwrap();
/// assert_eq!(router.len(), 1);
/// ```
pub struct PatternRouter<R> {
    scope: Option<String>,
    entries: Vec<PatternEntry<R>>,
    fallthrough: BoxHandler<R, ()>,
}

/// Routes storage-object notifications by object key.
pub type StorageRouter = PatternRouter<StorageRecord>;
/// Routes inbound email by recipient address.
pub type EmailRouter = PatternRouter<EmailRecord>;
/// Routes queue messages by body or message attribute.
pub type QueueRouter = PatternRouter<QueueRecord>;

impl<R: PatternRecord> Default for PatternRouter<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PatternRecord> PatternRouter<R> {
    /// A router that considers records from every scope.
    pub fn new() -> Self {
        Self {
            scope: None,
            entries: Vec::new(),
            fallthrough: Arc::new(Unmatched),
        }
    }

    /// A router that only considers records in `scope`.
    ///
    /// An empty scope matches everything, like [`PatternRouter::new`].
    pub fn scoped(scope: impl Into<String>) -> Self {
        let scope = scope.into();
        Self {
            scope: (!scope.is_empty()).then_some(scope),
            ..Self::new()
        }
    }

    /// The scope this router is bound to.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Replace the fallthrough handler.
    pub fn fallthrough<H: DynHandler<R, ()>>(&mut self, handler: H) -> &mut Self {
        self.fallthrough = Arc::new(handler);
        self
    }

    /// Register `handler` for records whose subject matches `pattern`.
    ///
    /// The pattern `"_"` registers the fallthrough handler instead.
    pub fn route<H: DynHandler<R, ()>>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        if pattern == FALLTHROUGH {
            return Ok(self.fallthrough(handler));
        }
        self.insert(None, pattern, Arc::new(handler))
    }

    /// Register `handler` for records whose `attribute` value matches
    /// `pattern`.
    pub fn route_attribute<H: DynHandler<R, ()>>(
        &mut self,
        attribute: &str,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.insert(Some(attribute.to_string()), pattern, Arc::new(handler))
    }

    fn insert(
        &mut self,
        attribute: Option<String>,
        pattern: &str,
        handler: BoxHandler<R, ()>,
    ) -> Result<&mut Self, RouteError> {
        let glob = Pattern::new(pattern).map_err(|err| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.msg.to_string(),
        })?;

        let existing = self
            .entries
            .iter_mut()
            .find(|entry| entry.raw == pattern && entry.attribute == attribute);
        match existing {
            Some(entry) => entry.handler = handler,
            None => self.entries.push(PatternEntry {
                raw: pattern.to_string(),
                glob,
                attribute,
                handler,
            }),
        }
        Ok(self)
    }

    /// Number of registered patterns, the fallthrough excluded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no pattern is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn in_scope(&self, record: &R) -> bool {
        self.scope
            .as_deref()
            .is_none_or(|scope| record.in_scope(scope))
    }

    fn matches(&self, entry: &PatternEntry<R>, record: &R) -> bool {
        let options = MatchOptions {
            case_sensitive: R::CASE_SENSITIVE,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        match &entry.attribute {
            Some(name) => record
                .attribute(name)
                .is_some_and(|value| entry.glob.matches_with(value, options)),
            None => record
                .subjects(self.scope.as_deref())
                .into_iter()
                .any(|subject| entry.glob.matches_with(subject, options)),
        }
    }

    /// Patterns whose handlers `record` would fire, in order.
    ///
    /// Empty when the record is out of scope or would reach the fallthrough.
    pub fn matching_routes(&self, record: &R) -> Vec<&str> {
        if !self.in_scope(record) {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| self.matches(entry, record))
            .map(|entry| entry.raw.as_str())
            .collect()
    }

    /// Dispatch a batch of records.
    ///
    /// A failing handler does not stop the batch. Every failure is logged
    /// and the last one is returned.
    pub async fn dispatch(&self, records: Vec<R>, capture: &dyn DynCapture) -> Result<(), BoxError> {
        let mut last_error = None;

        for record in records {
            if !self.in_scope(&record) {
                tracing::debug!(kind = R::KIND, scope = ?self.scope, "record out of scope");
                continue;
            }

            let mut matched = false;
            for entry in &self.entries {
                if !self.matches(entry, &record) {
                    continue;
                }
                matched = true;
                tracing::debug!(kind = R::KIND, pattern = %entry.raw, "pattern matched");

                let mut segment = Segment::new(R::KIND, entry.raw.clone());
                if let Some(attribute) = &entry.attribute {
                    segment = segment.annotate("attribute", attribute.clone());
                }
                if let Err(error) = invoke(capture, &segment, &*entry.handler, record.clone()).await
                {
                    tracing::warn!(%error, kind = R::KIND, pattern = %entry.raw, "handler failed");
                    last_error = Some(error);
                }
            }

            if !matched {
                let segment = Segment::new(R::KIND, FALLTHROUGH);
                if let Err(error) = invoke(capture, &segment, &*self.fallthrough, record).await {
                    tracing::warn!(%error, kind = R::KIND, "fallthrough handler failed");
                    last_error = Some(error);
                }
            }
        }

        last_error.map_or(Ok(()), Err)
    }
}
