//! # Middleware
//!
//! Middleware runs in front of an HTTP handler. Each one receives the
//! request and a draft response, may mutate either, and decides whether the
//! chain goes on ([`Flow::Continue`]) or stops with a final response
//! ([`Flow::Halt`]).
//!
//! [`Middleware`] uses native `async fn` for static dispatch; routers keep
//! their chains as [`BoxMiddleware`] built on the object-safe
//! [`DynMiddleware`].

use crate::{
    error::BoxError,
    http::{HttpRequest, HttpResponse},
};
use futures::future::BoxFuture;
use std::{future::Future, sync::Arc};

/// Result of a middleware step.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Run the next middleware, or the handler after the last one.
    Continue,
    /// Stop here and answer with this response. Nothing after runs.
    Halt(HttpResponse),
}

impl Flow {
    /// Returns `true` if this is [`Flow::Halt`].
    pub fn is_halt(&self) -> bool {
        matches!(self, Flow::Halt(_))
    }
}

/// A step in front of an HTTP handler.
///
/// Synchronous closures of the form
/// `Fn(&mut HttpRequest, &mut HttpResponse) -> Flow` are middleware.
///
/// # Example
///
/// ```rust
/// use stratus_core::{BoxError, Flow, HttpRequest, HttpResponse, Middleware};
///
/// struct RequireAuth;
///
/// impl Middleware for RequireAuth {
///     async fn handle(
///         &self,
///         request: &mut HttpRequest,
///         _response: &mut HttpResponse,
///     ) -> Result<Flow, BoxError> {
///         match request.header("Authorization") {
///             Some(_) => Ok(Flow::Continue),
///             None => Ok(Flow::Halt(HttpResponse::text("Unauthorized").with_status(401))),
///         }
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a middleware",
    label = "missing `Middleware` implementation",
    note = "Middleware must implement `handle`, or be a closure `Fn(&mut HttpRequest, &mut HttpResponse) -> Flow`."
)]
pub trait Middleware: Send + Sync + 'static {
    /// Inspect or modify the exchange and decide whether the chain goes on.
    fn handle(
        &self,
        request: &mut HttpRequest,
        response: &mut HttpResponse,
    ) -> impl Future<Output = Result<Flow, BoxError>> + Send;
}

impl<F> Middleware for F
where
    F: Fn(&mut HttpRequest, &mut HttpResponse) -> Flow + Send + Sync + 'static,
{
    async fn handle(
        &self,
        request: &mut HttpRequest,
        response: &mut HttpResponse,
    ) -> Result<Flow, BoxError> {
        Ok((self)(request, response))
    }
}

/// Object-safe version of [`Middleware`].
pub trait DynMiddleware: Send + Sync + 'static {
    /// Dynamic dispatch version of [`Middleware::handle`].
    fn handle_dyn<'a>(
        &'a self,
        request: &'a mut HttpRequest,
        response: &'a mut HttpResponse,
    ) -> BoxFuture<'a, Result<Flow, BoxError>>;
}

impl<M: Middleware> DynMiddleware for M {
    fn handle_dyn<'a>(
        &'a self,
        request: &'a mut HttpRequest,
        response: &'a mut HttpResponse,
    ) -> BoxFuture<'a, Result<Flow, BoxError>> {
        Box::pin(self.handle(request, response))
    }
}

/// A shared, type-erased middleware.
pub type BoxMiddleware = Arc<dyn DynMiddleware>;

/// Run `chain` in order against the shared request and draft response.
///
/// The first [`Flow::Halt`] is returned immediately and later middleware
/// never runs. An error stops the chain the same way. [`Flow::Continue`]
/// means every middleware continued; invoking the handler is left to the
/// caller.
pub async fn run_chain(
    chain: &[BoxMiddleware],
    request: &mut HttpRequest,
    response: &mut HttpResponse,
) -> Result<Flow, BoxError> {
    for middleware in chain {
        if let Flow::Halt(halted) = middleware.handle_dyn(request, response).await? {
            return Ok(Flow::Halt(halted));
        }
    }
    Ok(Flow::Continue)
}
