//! # stratus-std
//!
//! Standard implementations for the Stratus serverless dispatch framework.
//!
//! This crate provides:
//! - **Path routing**: [`HttpRouter`](routing::HttpRouter)
//! - **Glob routing**: [`PatternRouter`](routing::PatternRouter) for storage,
//!   email and queue records
//! - **Name routing**: [`NamedRouter`](routing::NamedRouter) for tasks,
//!   remote calls and identity triggers
//! - **Capture**: [`TracingCapture`](capture::TracingCapture)
//! - **Middleware**: request logging, default headers

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use stratus_core;

// Modules
pub mod capture;
pub mod middleware;
pub mod routing;
pub mod testing;
