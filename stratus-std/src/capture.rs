//! Tracing capture hook.

use std::fmt;
use stratus_core::{BoxError, Capture, Invocation, Segment};
use tracing::{Instrument, field};

/// A capture hook that runs each invocation inside an `invocation` span.
///
/// The span carries the segment's `name`, `kind` and `annotations`. A failed
/// invocation records its error on the span's `error` field and emits an
/// error event inside the span.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCapture;

impl TracingCapture {
    /// Create a new tracing capture hook.
    pub fn new() -> Self {
        Self
    }
}

impl Capture for TracingCapture {
    async fn capture<'a>(
        &'a self,
        segment: &'a Segment,
        invocation: Invocation<'a>,
    ) -> Result<(), BoxError> {
        let span = tracing::info_span!(
            "invocation",
            name = %segment.name,
            kind = segment.kind,
            annotations = %Annotations(&segment.annotations),
            error = field::Empty,
        );

        let result = invocation.instrument(span.clone()).await;
        if let Err(error) = &result {
            span.record("error", field::display(error));
            span.in_scope(|| tracing::error!(%error, "invocation failed"));
        }
        result
    }
}

struct Annotations<'a>(&'a [(String, String)]);

impl fmt::Display for Annotations<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
