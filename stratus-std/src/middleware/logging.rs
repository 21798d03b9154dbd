//! Request logging middleware.

use stratus_core::{BoxError, Flow, HttpRequest, HttpResponse, Middleware};

/// Logs every request that reaches a matched route, then continues.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogging;

impl Middleware for RequestLogging {
    async fn handle(
        &self,
        request: &mut HttpRequest,
        _response: &mut HttpResponse,
    ) -> Result<Flow, BoxError> {
        tracing::info!(
            method = %request.http_method,
            path = %request.path,
            params = ?request.path_parameters,
            "request"
        );
        Ok(Flow::Continue)
    }
}
