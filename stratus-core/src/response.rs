//! Invocation responses and handler output conversion.

use crate::{error::BoxError, http::HttpResponse, message::Message};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// The uniform result of a successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// An HTTP-shaped response.
    Http(HttpResponse),
    /// A JSON payload (remote calls, identity triggers, default handlers).
    Value(Value),
    /// No payload (tasks and record batches). Serializes as `{}`.
    Empty,
}

impl Response {
    /// The HTTP response, if this is one.
    pub fn as_http(&self) -> Option<&HttpResponse> {
        match self {
            Response::Http(response) => Some(response),
            _ => None,
        }
    }

    /// Serialize into the JSON value handed back to the platform.
    pub fn into_value(self) -> Result<Value, serde_json::Error> {
        match self {
            Response::Http(response) => serde_json::to_value(response),
            Response::Value(value) => Ok(value),
            Response::Empty => Ok(Value::Object(Map::new())),
        }
    }
}

impl Message for Response {}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Response::Http(response) => response.serialize(serializer),
            Response::Value(value) => value.serialize(serializer),
            Response::Empty => Map::new().serialize(serializer),
        }
    }
}

impl From<HttpResponse> for Response {
    fn from(response: HttpResponse) -> Self {
        Response::Http(response)
    }
}

impl From<Value> for Response {
    fn from(value: Value) -> Self {
        Response::Value(value)
    }
}

// ============================================================================
// IntoOutcome
// ============================================================================

/// Trait for converting a handler's output into the value a router expects.
///
/// Routers fix `T`: the path router wants [`HttpResponse`], record routers
/// and task routers want `()`, remote-call routers want [`Value`].
///
/// # Default Implementations
///
/// - `()` → `()`, an empty `200 OK`, [`Value::Null`], or [`Response::Empty`]
/// - `HttpResponse`, `String`, `&'static str` → an HTTP response
/// - `Value` → a JSON value, or an `application/json` HTTP response
/// - `Result<T, E>` → delegates to `T` or propagates the error
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be converted into `{T}`",
    label = "missing `IntoOutcome<{T}>` implementation",
    note = "Handler outputs must implement `IntoOutcome` for the router they are registered on."
)]
pub trait IntoOutcome<T> {
    /// Convert the output, or surface the handler's error.
    fn into_outcome(self) -> Result<T, BoxError>;
}

impl IntoOutcome<()> for () {
    fn into_outcome(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl IntoOutcome<HttpResponse> for () {
    fn into_outcome(self) -> Result<HttpResponse, BoxError> {
        Ok(HttpResponse::ok())
    }
}

impl IntoOutcome<HttpResponse> for HttpResponse {
    fn into_outcome(self) -> Result<HttpResponse, BoxError> {
        Ok(self)
    }
}

impl IntoOutcome<HttpResponse> for String {
    fn into_outcome(self) -> Result<HttpResponse, BoxError> {
        Ok(HttpResponse::text(self))
    }
}

impl IntoOutcome<HttpResponse> for &'static str {
    fn into_outcome(self) -> Result<HttpResponse, BoxError> {
        Ok(HttpResponse::text(self))
    }
}

impl IntoOutcome<HttpResponse> for Value {
    fn into_outcome(self) -> Result<HttpResponse, BoxError> {
        Ok(HttpResponse::json(&self))
    }
}

impl IntoOutcome<Value> for Value {
    fn into_outcome(self) -> Result<Value, BoxError> {
        Ok(self)
    }
}

impl IntoOutcome<Value> for () {
    fn into_outcome(self) -> Result<Value, BoxError> {
        Ok(Value::Null)
    }
}

impl IntoOutcome<Response> for Response {
    fn into_outcome(self) -> Result<Response, BoxError> {
        Ok(self)
    }
}

impl IntoOutcome<Response> for () {
    fn into_outcome(self) -> Result<Response, BoxError> {
        Ok(Response::Empty)
    }
}

impl IntoOutcome<Response> for Value {
    fn into_outcome(self) -> Result<Response, BoxError> {
        Ok(Response::Value(self))
    }
}

impl IntoOutcome<Response> for HttpResponse {
    fn into_outcome(self) -> Result<Response, BoxError> {
        Ok(Response::Http(self))
    }
}

impl<T, O, E> IntoOutcome<O> for Result<T, E>
where
    T: IntoOutcome<O>,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<O, BoxError> {
        match self {
            Ok(t) => t.into_outcome(),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_serializes_as_object() {
        assert_eq!(Response::Empty.into_value().unwrap(), json!({}));
        assert_eq!(serde_json::to_value(Response::Empty).unwrap(), json!({}));
    }

    #[test]
    fn test_http_outcomes() {
        let response: HttpResponse = "hello".into_outcome().unwrap();
        assert_eq!(response.body, "hello");
        assert_eq!(response.status_code, 200);

        let response: HttpResponse = json!({ "id": 1 }).into_outcome().unwrap();
        assert_eq!(response.content_type(), Some("application/json"));
    }

    #[test]
    fn test_result_outcome_propagates_error() {
        let output: Result<(), std::io::Error> = Err(std::io::Error::other("nope"));
        let outcome: Result<(), BoxError> = output.into_outcome();
        assert_eq!(outcome.unwrap_err().to_string(), "nope");

        let output: Result<&'static str, BoxError> = Ok("fine");
        let outcome: Result<HttpResponse, BoxError> = output.into_outcome();
        assert_eq!(outcome.unwrap().body, "fine");
    }
}
