//! # Dispatch Orchestrator
//!
//! The [`Orchestrator`] owns one router per trigger family and turns a raw
//! invocation payload into a [`Response`]:
//!
//! 1. pre-classification filters rewrite the [`RawEvent`], in order;
//! 2. the payload is classified and decoded into an [`Event`];
//! 3. pre-dispatch filters rewrite the [`Event`], in order;
//! 4. the event goes to the router for its category;
//! 5. post-dispatch filters rewrite the successful [`Response`].
//!
//! Routers are frozen by [`OrchestratorBuilder::build`]; an `Orchestrator`
//! is `Send + Sync` and can serve concurrent invocations behind an `Arc`.

mod builder;

pub use builder::OrchestratorBuilder;

use crate::config::StratusConfig;
use serde_json::Value;
use stratus_core::{
    BoxCapture, BoxHandler, DispatchError, Event, RawEvent, Response, Segment, invoke,
};
use stratus_std::routing::{
    EmailRouter, HttpRouter, IdentityRouter, QueueRouter, RpcRouter, StorageRouter, TaskRouter,
};

pub(crate) type RawFilter = Box<dyn Fn(RawEvent) -> RawEvent + Send + Sync>;
pub(crate) type EventFilter = Box<dyn Fn(Event) -> Event + Send + Sync>;
pub(crate) type ResponseFilter = Box<dyn Fn(Response) -> Response + Send + Sync>;

/// Routes each invocation to the handler for its trigger.
pub struct Orchestrator {
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

impl Orchestrator {
    /// Start building an orchestrator.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Start building an orchestrator configured by `config`.
    pub fn builder_from_config(config: &StratusConfig) -> OrchestratorBuilder {
        OrchestratorBuilder::from_config(config)
    }

    /// Handle one invocation.
    pub async fn handle(&self, event: RawEvent) -> Result<Response, DispatchError> {
        let event = self
            .pre_classify
            .iter()
            .fold(event, |event, filter| filter(event));

        let event = Event::from_raw(event)?;
        tracing::debug!(category = %event.category(), "event classified");

        let event = self
            .pre_dispatch
            .iter()
            .fold(event, |event, filter| filter(event));

        let response = self.route(event).await?;
        Ok(self
            .post_dispatch
            .iter()
            .fold(response, |response, filter| filter(response)))
    }

    /// Handle one invocation given as JSON, returning the JSON response.
    ///
    /// Non-object payloads fail with
    /// [`DecodeError::NotAnObject`](stratus_core::DecodeError::NotAnObject).
    pub async fn handle_value(&self, event: Value) -> Result<Value, DispatchError> {
        let event = RawEvent::try_from(event)?;
        self.handle(event)
            .await?
            .into_value()
            .map_err(DispatchError::Serialize)
    }

    async fn route(&self, event: Event) -> Result<Response, DispatchError> {
        let capture = &*self.capture;
        match event {
            Event::Http(request) => Ok(Response::Http(self.http.dispatch(request, capture).await)),
            Event::Task(task) => {
                self.tasks.dispatch(task, capture).await?;
                Ok(Response::Empty)
            }
            Event::Rpc(call) => Ok(Response::Value(self.rpc.dispatch(call, capture).await?)),
            Event::Storage(records) => {
                self.storage.dispatch(records, capture).await?;
                Ok(Response::Empty)
            }
            Event::Email(records) => {
                self.email.dispatch(records, capture).await?;
                Ok(Response::Empty)
            }
            Event::Queue(records) => {
                self.queue.dispatch(records, capture).await?;
                Ok(Response::Empty)
            }
            Event::Identity(trigger) => Ok(Response::Value(
                self.identity.dispatch(trigger, capture).await?,
            )),
            Event::Raw(event) => match &self.default_handler {
                Some(handler) => {
                    let segment = Segment::new("default", "unclassified");
                    Ok(invoke(capture, &segment, &**handler, event).await?)
                }
                None => {
                    tracing::warn!(
                        keys = ?event.as_map().keys().collect::<Vec<_>>(),
                        "unclassified event and no default handler"
                    );
                    Err(DispatchError::UnhandledEvent)
                }
            },
        }
    }
}
