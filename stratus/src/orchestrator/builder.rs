//! Builder for constructing an [`Orchestrator`].

use super::{EventFilter, Orchestrator, RawFilter, ResponseFilter};
use crate::config::StratusConfig;
use std::sync::Arc;
use stratus_core::{
    BoxCapture, BoxHandler, DynCapture, DynHandler, Event, NoopCapture, RawEvent, Response,
};
use stratus_std::{
    capture::TracingCapture,
    routing::{
        EmailRouter, HttpRouter, IdentityRouter, QueueRouter, RpcRouter, StorageRouter, TaskRouter,
    },
};

/// Builder for constructing an [`Orchestrator`].
///
/// Routes are registered through the router accessors; filters, the default
/// handler and the capture hook through the builder methods. Call
/// [`build`](Self::build) to freeze everything into an immutable,
/// thread-safe `Orchestrator`.
///
/// # Example
///
/// ```rust
/// use stratus::{BoxError, HttpRequest, Orchestrator, ScheduledTask};
///
/// let mut builder = Orchestrator::builder();
/// builder
///     .http()
///     .get("/health", |_request: HttpRequest| async move { "ok" })
///     .unwrap();
/// builder.tasks().route("cleanup", |task: ScheduledTask| async move {
///     println!("running {}", task.name);
///     Ok::<_, BoxError>(())
/// });
/// let orchestrator = builder.build();
/// ```
pub struct OrchestratorBuilder {
    http: HttpRouter,
    tasks: TaskRouter,
    rpc: RpcRouter,
    storage: StorageRouter,
    email: EmailRouter,
    queue: QueueRouter,
    identity: IdentityRouter,
    default_handler: Option<BoxHandler<RawEvent, Response>>,
    pre_classify: Vec<RawFilter>,
    pre_dispatch: Vec<EventFilter>,
    post_dispatch: Vec<ResponseFilter>,
    capture: BoxCapture,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    /// Create a builder with empty, unscoped routers and no instrumentation.
    pub fn new() -> Self {
        Self {
            http: HttpRouter::new(),
            tasks: TaskRouter::default(),
            rpc: RpcRouter::default(),
            storage: StorageRouter::new(),
            email: EmailRouter::new(),
            queue: QueueRouter::new(),
            identity: IdentityRouter::default(),
            default_handler: None,
            pre_classify: Vec::new(),
            pre_dispatch: Vec::new(),
            post_dispatch: Vec::new(),
            capture: Arc::new(NoopCapture),
        }
    }

    /// Create a builder whose record routers are scoped by `config`.
    ///
    /// Selects [`TracingCapture`] when `config.tracing` is set.
    pub fn from_config(config: &StratusConfig) -> Self {
        let mut builder = Self::new();
        if let Some(bucket) = &config.storage_scope {
            builder.storage = StorageRouter::scoped(bucket.clone());
        }
        if let Some(domain) = &config.mail_domain {
            builder.email = EmailRouter::scoped(domain.clone());
        }
        if let Some(queue) = &config.queue_name {
            builder.queue = QueueRouter::scoped(queue.clone());
        }
        if config.tracing {
            builder.capture = Arc::new(TracingCapture::new());
        }
        builder
    }

    /// The HTTP path router.
    pub fn http(&mut self) -> &mut HttpRouter {
        &mut self.http
    }

    /// The scheduled task router.
    pub fn tasks(&mut self) -> &mut TaskRouter {
        &mut self.tasks
    }

    /// The remote call router.
    pub fn rpc(&mut self) -> &mut RpcRouter {
        &mut self.rpc
    }

    /// The storage-object router.
    pub fn storage(&mut self) -> &mut StorageRouter {
        &mut self.storage
    }

    /// The email receipt router.
    pub fn email(&mut self) -> &mut EmailRouter {
        &mut self.email
    }

    /// The queue message router.
    pub fn queue(&mut self) -> &mut QueueRouter {
        &mut self.queue
    }

    /// The identity trigger router.
    pub fn identity(&mut self) -> &mut IdentityRouter {
        &mut self.identity
    }

    /// Replace the storage router, e.g. with a scoped one.
    pub fn storage_router(mut self, router: StorageRouter) -> Self {
        self.storage = router;
        self
    }

    /// Replace the email router.
    pub fn email_router(mut self, router: EmailRouter) -> Self {
        self.email = router;
        self
    }

    /// Replace the queue router.
    pub fn queue_router(mut self, router: QueueRouter) -> Self {
        self.queue = router;
        self
    }

    /// Handle events no classification rule recognises.
    ///
    /// Without one, such events fail with
    /// [`DispatchError::UnhandledEvent`](stratus_core::DispatchError::UnhandledEvent).
    pub fn default_handler<H: DynHandler<RawEvent, Response>>(mut self, handler: H) -> Self {
        self.default_handler = Some(Arc::new(handler));
        self
    }

    /// Add a filter applied to the raw payload before classification.
    pub fn pre_classify<F>(mut self, filter: F) -> Self
    where
        F: Fn(RawEvent) -> RawEvent + Send + Sync + 'static,
    {
        self.pre_classify.push(Box::new(filter));
        self
    }

    /// Add a filter applied to the typed event before routing.
    pub fn pre_dispatch<F>(mut self, filter: F) -> Self
    where
        F: Fn(Event) -> Event + Send + Sync + 'static,
    {
        self.pre_dispatch.push(Box::new(filter));
        self
    }

    /// Add a filter applied to successful responses.
    pub fn post_dispatch<F>(mut self, filter: F) -> Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.post_dispatch.push(Box::new(filter));
        self
    }

    /// Set the capture hook wrapping every handler invocation.
    pub fn capture<C: DynCapture>(mut self, capture: C) -> Self {
        self.capture = Arc::new(capture);
        self
    }

    /// Freeze the builder into an [`Orchestrator`].
    pub fn build(self) -> Orchestrator {
        tracing::debug!(
            http_routes = self.http.len(),
            task_routes = self.tasks.len(),
            rpc_routes = self.rpc.len(),
            storage_routes = self.storage.len(),
            email_routes = self.email.len(),
            queue_routes = self.queue.len(),
            identity_routes = self.identity.len(),
            "orchestrator built"
        );
        Orchestrator {
            http: self.http,
            tasks: self.tasks,
            rpc: self.rpc,
            storage: self.storage,
            email: self.email,
            queue: self.queue,
            identity: self.identity,
            default_handler: self.default_handler,
            pre_classify: self.pre_classify,
            pre_dispatch: self.pre_dispatch,
            post_dispatch: self.post_dispatch,
            capture: self.capture,
        }
    }
}
