//! # stratus - Serverless Event Dispatch
//!
//! `stratus` turns one serverless invocation payload into a call to the right
//! handler. It classifies the payload by shape (HTTP request, scheduled task,
//! remote call, storage/email/queue record batch, identity trigger) and
//! routes it through the router for that shape.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use stratus::{BoxError, HttpRequest, Orchestrator, StorageRecord};
//!
//! let mut builder = Orchestrator::builder();
//! builder
//!     .http()
//!     .get("/users/:id", |request: HttpRequest| async move {
//!         Ok::<_, BoxError>(format!("user {}", request.param("id").unwrap_or_default()))
//!     })
//!     .unwrap();
//! builder
//!     .storage()
//!     .route("*.png", |record: StorageRecord| async move {
//!         println!("new image {}", record.key());
//!     })
//!     .unwrap();
//! let orchestrator = builder.build();
//!
//! let event = json!({ "httpMethod": "GET", "path": "/users/42" });
//! let response = futures::executor::block_on(orchestrator.handle_value(event)).unwrap();
//! assert_eq!(response["body"], "user 42");
//! ```
//!
//! ## Crates
//!
//! - `stratus-core`: event types, classification, handler/middleware/capture traits
//! - `stratus-std`: the routers, tracing capture, standard middleware
//! - `stratus`: the [`Orchestrator`] and configuration

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod config;
pub mod orchestrator;

pub use config::StratusConfig;
pub use orchestrator::{Orchestrator, OrchestratorBuilder};

pub use stratus_core::{
    // Error types
    BoxError,
    // Handler
    BoxHandler,
    // Middleware
    BoxMiddleware,
    // Capture
    Capture,
    // Events
    Category,
    DecodeError,
    DispatchError,
    DynCapture,
    DynHandler,
    DynMiddleware,
    EmailRecord,
    Event,
    Flow,
    Handler,
    // HTTP
    HttpError,
    HttpRequest,
    HttpResponse,
    IdentityTrigger,
    // Response
    IntoOutcome,
    Message,
    Method,
    Middleware,
    NoRouteError,
    NoopCapture,
    QueueRecord,
    RawEvent,
    RemoteCall,
    Response,
    RouteError,
    ScheduledTask,
    Segment,
    StorageRecord,
    classify,
};

pub use stratus_std::{
    capture::TracingCapture,
    routing::{
        EmailRouter, HttpRouter, IdentityRouter, NamedRouter, PatternRouter, QueueRouter,
        RpcRouter, StorageRouter, TaskRouter,
    },
};

/// Standard middleware.
pub mod middleware {
    pub use stratus_std::middleware::{DefaultHeaders, RequestLogging};
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use stratus_std::testing::*;
}

/// Prelude module - common imports for Stratus.
///
/// # Usage
///
/// ```rust
/// use stratus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, Event, Flow, Handler, HttpError, HttpRequest, HttpResponse, Method, Middleware,
        Orchestrator, RawEvent, Response, StratusConfig,
    };
}
