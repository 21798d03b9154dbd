//! Exact-name routers for scheduled tasks, remote calls and identity
//! triggers.

use super::pattern::FALLTHROUGH;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use stratus_core::{
    BoxError, BoxHandler, DynCapture, DynHandler, Handler, IdentityTrigger, Message, NoRouteError,
    RemoteCall, ScheduledTask, Segment, invoke,
};

/// A trigger routed by an exact name.
pub trait Named: Message {
    /// The routing key.
    fn name(&self) -> &str;
}

impl Named for ScheduledTask {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for RemoteCall {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for IdentityTrigger {
    fn name(&self) -> &str {
        self.source()
    }
}

/// A router keyed by exact trigger name.
///
/// Names are matched exactly and case-sensitively. Registering the name
/// `"_"` replaces the fallthrough handler.
pub struct NamedRouter<In, Out> {
    kind: &'static str,
    routes: HashMap<String, BoxHandler<In, Out>>,
    fallthrough: BoxHandler<In, Out>,
}

/// Routes scheduled tasks by `_taskName`. Unknown tasks are logged and
/// succeed.
pub type TaskRouter = NamedRouter<ScheduledTask, ()>;
/// Routes remote calls by `_rpcName`. Unknown calls fail with
/// [`NoRouteError`].
pub type RpcRouter = NamedRouter<RemoteCall, Value>;
/// Routes identity callbacks by `triggerSource`. Unknown triggers are echoed
/// back unchanged.
pub type IdentityRouter = NamedRouter<IdentityTrigger, Value>;

impl<In, Out> NamedRouter<In, Out>
where
    In: Named,
    Out: Send + 'static,
{
    /// Create an empty router of `kind` with the given fallthrough.
    pub fn with_fallthrough<H: DynHandler<In, Out>>(kind: &'static str, fallthrough: H) -> Self {
        Self {
            kind,
            routes: HashMap::new(),
            fallthrough: Arc::new(fallthrough),
        }
    }

    /// Register `handler` for `name`, replacing any previous handler.
    pub fn route<H: DynHandler<In, Out>>(&mut self, name: &str, handler: H) -> &mut Self {
        if name == FALLTHROUGH {
            return self.fallthrough(handler);
        }
        self.routes.insert(name.to_string(), Arc::new(handler));
        self
    }

    /// Replace the fallthrough handler.
    pub fn fallthrough<H: DynHandler<In, Out>>(&mut self, handler: H) -> &mut Self {
        self.fallthrough = Arc::new(handler);
        self
    }

    /// The router kind.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Returns `true` if `name` has a handler.
    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no name is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatch `input` to the handler registered for its name.
    pub async fn dispatch(&self, input: In, capture: &dyn DynCapture) -> Result<Out, BoxError> {
        let name = input.name().to_string();
        match self.routes.get(&name) {
            Some(handler) => {
                tracing::debug!(kind = self.kind, %name, "route matched");
                let segment = Segment::new(self.kind, name);
                invoke(capture, &segment, &**handler, input).await
            }
            None => {
                let segment = Segment::new(self.kind, FALLTHROUGH).annotate("name", name);
                invoke(capture, &segment, &*self.fallthrough, input).await
            }
        }
    }
}

// ============================================================================
// Default fallthroughs
// ============================================================================

struct LogUnmatched;

impl Handler<ScheduledTask> for LogUnmatched {
    type Output = ();

    async fn call(&self, task: ScheduledTask) {
        tracing::warn!(task = %task.name, "no task route registered");
    }
}

struct RejectUnmatched;

impl Handler<RemoteCall> for RejectUnmatched {
    type Output = Result<Value, NoRouteError>;

    async fn call(&self, call: RemoteCall) -> Self::Output {
        Err(NoRouteError {
            kind: "rpc",
            name: call.name,
        })
    }
}

struct EchoTrigger;

impl Handler<IdentityTrigger> for EchoTrigger {
    type Output = Result<Value, serde_json::Error>;

    async fn call(&self, trigger: IdentityTrigger) -> Self::Output {
        serde_json::to_value(trigger)
    }
}

impl Default for TaskRouter {
    fn default() -> Self {
        Self::with_fallthrough("task", LogUnmatched)
    }
}

impl Default for RpcRouter {
    fn default() -> Self {
        Self::with_fallthrough("rpc", RejectUnmatched)
    }
}

impl Default for IdentityRouter {
    fn default() -> Self {
        Self::with_fallthrough("identity", EchoTrigger)
    }
}
