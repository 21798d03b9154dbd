//! # stratus-core
//!
//! Core types and traits for the Stratus serverless dispatch framework.
//!
//! This crate has minimal dependencies and is meant to be imported by
//! handler crates and extensions that don't need the routers in
//! `stratus-std`.
//!
//! # Dispatch Pipeline
//!
//! A single invocation flows through four stages:
//!
//! ## Stage 1: Classification ([`classify`], [`Event`])
//!
//! The raw JSON payload ([`RawEvent`]) is inspected for marker keys and
//! tagged with a [`Category`]. [`Event::from_raw`] decodes it into a typed
//! [`Event`] in one place; nothing downstream looks at raw keys again.
//!
//! ## Stage 2: Routing
//!
//! Each category has its own router in `stratus-std`: a path trie for HTTP,
//! glob routers for storage, email and queue records, and exact-name routers
//! for tasks, remote calls and identity triggers.
//!
//! ## Stage 3: Middleware ([`Middleware`])
//!
//! HTTP routes may carry a chain of middleware that inspects and mutates the
//! request and a draft response, and may [`Flow::Halt`] before the handler.
//!
//! ## Stage 4: Handling ([`Handler`])
//!
//! The terminal point. Every handler call is wrapped by a [`Capture`] hook
//! so tracing sees each invocation as one unit.
//!
//! # Error Types
//!
//! - [`DispatchError`] - Top-level error of an invocation
//! - [`DecodeError`] - Payload did not fit its category
//! - [`RouteError`] - Invalid route registration

#![deny(clippy::wildcard_imports)]

mod capture;
mod error;
mod event;
mod handler;
mod http;
mod message;
mod middleware;
mod records;
mod response;

// Re-exports
pub use capture::{BoxCapture, Capture, DynCapture, Invocation, NoopCapture, Segment, invoke};
pub use error::{BoxError, DecodeError, DispatchError, HttpError, NoRouteError, RouteError};
pub use event::{
    Category, EMAIL_MARKER, Event, IDENTITY_FIELDS, METHOD_FIELD, PATH_FIELD, QUEUE_MARKER,
    RECORDS_FIELDS, RPC_FIELD, RawEvent, RemoteCall, STORAGE_MARKER, ScheduledTask, TASK_FIELD,
    classify,
};
pub use handler::{BoxHandler, DynHandler, Handler, HandlerResult, boxed};
pub use http::{CONTENT_TYPE, HttpRequest, HttpResponse, Method, UnsupportedMethod};
pub use message::Message;
pub use middleware::{BoxMiddleware, DynMiddleware, Flow, Middleware, run_chain};
pub use records::{
    Bucket, EmailMessage, EmailRecord, IdentityTrigger, Mail, MessageAttribute, QueueRecord,
    Receipt, StorageEntity, StorageObject, StorageRecord, address_domain,
};
pub use response::{IntoOutcome, Response};
