//! Draft response headers.

use stratus_core::{BoxError, Flow, HttpRequest, HttpResponse, Middleware};

/// Sets headers on the draft response.
///
/// Handler responses keep their own values; these fill in what the handler
/// leaves unset. Setting `Content-Type` here also selects the format of
/// error responses for the route.
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders {
    headers: Vec<(String, String)>,
}

impl DefaultHeaders {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header, builder style.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Shorthand for `Content-Type: application/json`.
    pub fn json() -> Self {
        Self::new().header(stratus_core::CONTENT_TYPE, "application/json")
    }
}

impl Middleware for DefaultHeaders {
    async fn handle(
        &self,
        _request: &mut HttpRequest,
        response: &mut HttpResponse,
    ) -> Result<Flow, BoxError> {
        for (name, value) in &self.headers {
            response.set_header(name.clone(), value.clone());
        }
        Ok(Flow::Continue)
    }
}
