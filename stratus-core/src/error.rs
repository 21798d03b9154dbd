//! Error types for Stratus.
//!
//! - [`DispatchError`] - Top-level error returned by an invocation
//! - [`DecodeError`] - A classified event could not be decoded into its typed shape
//! - [`RouteError`] - Invalid route registration
//! - [`NoRouteError`] - A name-keyed trigger that must be answered had no route
//! - [`HttpError`] - A handler-chosen HTTP failure status

use crate::event::Category;
use thiserror::Error;

/// A boxed error type for handler failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for a single invocation.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The event matched a category but its payload did not decode.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A handler (or the capture hook around it) failed.
    #[error("handler error: {0}")]
    Handler(#[source] BoxError),

    /// The event could not be classified and no default handler is configured.
    #[error("unhandled event: no default handler is configured for unclassified events")]
    UnhandledEvent,

    /// The capture hook returned without running the handler.
    #[error("capture hook completed without running the handler")]
    CaptureSkipped,

    /// The response could not be serialized.
    #[error("failed to serialize response: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl From<BoxError> for DispatchError {
    fn from(err: BoxError) -> Self {
        // Routers report capture failures as boxed `DispatchError`s.
        match err.downcast::<DispatchError>() {
            Ok(dispatch) => *dispatch,
            Err(err) => DispatchError::Handler(err),
        }
    }
}

/// Errors raised while turning a raw event into its typed shape.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The invocation payload was not a JSON object.
    #[error("event payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// The payload has the keys of `category` but the values do not fit.
    #[error("malformed {category} event: {source}")]
    Malformed {
        /// The category the classifier chose.
        category: Category,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while registering routes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Path patterns must start with `/`.
    #[error("invalid path {0:?}: path patterns must start with '/'")]
    InvalidPath(String),

    /// The glob pattern could not be compiled.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// No route was registered for a name-keyed trigger that requires an answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no {kind} route registered for {name:?}")]
pub struct NoRouteError {
    /// The router kind (`"rpc"`, `"task"`, ...).
    pub kind: &'static str,
    /// The requested name.
    pub name: String,
}

/// A failure carrying the HTTP status the error response should use.
///
/// Any other error returned by an HTTP handler is rendered with status 500.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HttpError {
    /// Status code of the error response.
    pub status: u16,
    /// Message rendered into the response body.
    pub message: String,
}

impl HttpError {
    /// Create an error with an explicit status.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// `400 Bad Request`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    /// `404 Not Found`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RouteError::InvalidPath("users".to_string());
        assert_eq!(
            err.to_string(),
            "invalid path \"users\": path patterns must start with '/'"
        );

        let err = NoRouteError {
            kind: "rpc",
            name: "lookup".to_string(),
        };
        assert_eq!(err.to_string(), "no rpc route registered for \"lookup\"");
    }

    #[test]
    fn test_box_error_converts_to_handler_error() {
        let boxed: BoxError = "boom".into();
        let err = DispatchError::from(boxed);
        assert!(matches!(err, DispatchError::Handler(_)));
        assert_eq!(err.to_string(), "handler error: boom");
    }

    #[test]
    fn test_boxed_dispatch_error_is_unwrapped() {
        let boxed: BoxError = Box::new(DispatchError::CaptureSkipped);
        let err = DispatchError::from(boxed);
        assert!(matches!(err, DispatchError::CaptureSkipped));
    }
}
