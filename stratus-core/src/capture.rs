//! # Trace Capture
//!
//! A capture hook wraps every handler invocation, so instrumentation (spans,
//! segments, timing) sees each handler run as one unit. Routers never call a
//! handler directly; they go through [`invoke`].
//!
//! A hook receives the invocation as a future and must await it exactly once.

use crate::{
    error::{BoxError, DispatchError},
    handler::DynHandler,
};
use futures::future::BoxFuture;
use std::{fmt, future::Future, sync::Arc};

/// A pending handler invocation handed to a capture hook.
pub type Invocation<'a> = BoxFuture<'a, Result<(), BoxError>>;

/// Describes one handler invocation to a capture hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    /// Route description, e.g. `GET /users/:id` or `*.png`.
    pub name: String,
    /// The router kind (`http`, `task`, `storage`, ...).
    pub kind: &'static str,
    /// Extra key/value pairs, in insertion order.
    pub annotations: Vec<(String, String)>,
}

impl Segment {
    /// Create a segment without annotations.
    pub fn new(kind: &'static str, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            annotations: Vec::new(),
        }
    }

    /// Add an annotation, builder style.
    pub fn annotate(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.push((key.into(), value.into()));
        self
    }

    /// Look up an annotation by key.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// Instrumentation around a single handler invocation.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a capture hook",
    label = "missing `Capture` implementation",
    note = "Capture hooks must implement `capture` and await the invocation exactly once."
)]
pub trait Capture: Send + Sync + 'static {
    /// Run `invocation` inside whatever instrumentation this hook provides,
    /// returning its result.
    fn capture<'a>(
        &'a self,
        segment: &'a Segment,
        invocation: Invocation<'a>,
    ) -> impl Future<Output = Result<(), BoxError>> + Send + 'a;
}

/// Object-safe version of [`Capture`].
pub trait DynCapture: Send + Sync + 'static {
    /// Dynamic dispatch version of [`Capture::capture`].
    fn capture_dyn<'a>(&'a self, segment: &'a Segment, invocation: Invocation<'a>)
    -> Invocation<'a>;
}

impl<C: Capture> DynCapture for C {
    fn capture_dyn<'a>(
        &'a self,
        segment: &'a Segment,
        invocation: Invocation<'a>,
    ) -> Invocation<'a> {
        Box::pin(self.capture(segment, invocation))
    }
}

/// A shared, type-erased capture hook.
pub type BoxCapture = Arc<dyn DynCapture>;

/// A capture hook that runs the invocation and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCapture;

impl Capture for NoopCapture {
    async fn capture<'a>(
        &'a self,
        _segment: &'a Segment,
        invocation: Invocation<'a>,
    ) -> Result<(), BoxError> {
        invocation.await
    }
}

/// Invoke `handler` with `input`, wrapped by `capture`.
///
/// Fails with [`DispatchError::CaptureSkipped`] if the hook returned
/// successfully without running the handler.
pub async fn invoke<In, Out>(
    capture: &dyn DynCapture,
    segment: &Segment,
    handler: &dyn DynHandler<In, Out>,
    input: In,
) -> Result<Out, BoxError>
where
    In: Send + 'static,
    Out: Send + 'static,
{
    let mut output = None;
    let slot = &mut output;
    capture
        .capture_dyn(
            segment,
            Box::pin(async move {
                *slot = Some(handler.call_dyn(input).await?);
                Ok::<(), BoxError>(())
            }),
        )
        .await?;
    output.ok_or_else(|| DispatchError::CaptureSkipped.into())
}
