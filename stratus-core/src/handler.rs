//! # Handlers
//!
//! A handler is the terminal point of dispatch: it receives an owned trigger
//! (a request, a record, a task) and performs async work.
//!
//! [`Handler`] uses native `async fn` for static dispatch. Routers store
//! handlers of different concrete types side by side, so they hold them as
//! [`BoxHandler`], built on the object-safe [`DynHandler`].

use crate::{error::BoxError, message::Message, response::IntoOutcome};
use futures::future::BoxFuture;
use std::{future::Future, sync::Arc};

/// A marker trait for the output of a handler.
pub trait HandlerResult: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> HandlerResult for T {}

/// The final destination of an event.
///
/// # Example
///
/// ```rust
/// use stratus_core::{Handler, StorageRecord};
///
/// struct Thumbnailer;
///
/// impl Handler<StorageRecord> for Thumbnailer {
///     type Output = ();
///
///     async fn call(&self, record: StorageRecord) {
///         println!("resize {}", record.key());
///     }
/// }
/// ```
///
/// Plain async closures are handlers too:
///
/// ```rust
/// use stratus_core::{BoxError, HttpRequest};
///
/// let handler = |request: HttpRequest| async move {
///     Ok::<_, BoxError>(format!("hello {}", request.path))
/// };
/// # let _ = handler;
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle input of type `{In}`",
    label = "missing `Handler<{In}>` implementation",
    note = "Handlers must implement the `call` method for the input type `{In}`."
)]
pub trait Handler<In: Message>: Send + Sync + 'static {
    /// The output type, usually `()`, a response, or a `Result` of either.
    type Output: HandlerResult;

    /// Executes the handler logic.
    fn call(&self, input: In) -> impl Future<Output = Self::Output> + Send;
}

impl<F, In, Out, Fut> Handler<In> for F
where
    In: Message,
    Out: HandlerResult,
    F: Fn(In) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Out> + Send,
{
    type Output = Out;

    fn call(&self, input: In) -> impl Future<Output = Self::Output> + Send {
        (self)(input)
    }
}

/// Object-safe version of [`Handler`] whose output is already converted
/// into the router's expected type `Out`.
pub trait DynHandler<In, Out>: Send + Sync + 'static {
    /// Executes the handler (dynamic dispatch version).
    fn call_dyn(&self, input: In) -> BoxFuture<'_, Result<Out, BoxError>>;
}

// Blanket implementation: any Handler whose output converts into `Out`.
impl<H, In, Out> DynHandler<In, Out> for H
where
    H: Handler<In>,
    In: Message,
    H::Output: IntoOutcome<Out>,
    Out: Send + 'static,
{
    fn call_dyn(&self, input: In) -> BoxFuture<'_, Result<Out, BoxError>> {
        Box::pin(async move { self.call(input).await.into_outcome() })
    }
}

/// A shared, type-erased handler.
pub type BoxHandler<In, Out> = Arc<dyn DynHandler<In, Out>>;

/// Erase a handler into a [`BoxHandler`].
pub fn boxed<H, In, Out>(handler: H) -> BoxHandler<In, Out>
where
    H: DynHandler<In, Out>,
{
    Arc::new(handler)
}
