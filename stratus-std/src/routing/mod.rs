//! # Routers
//!
//! One router per trigger family:
//!
//! | Router | Triggers | Key | Matches |
//! |--------|----------|-----|---------|
//! | [`HttpRouter`] | HTTP requests | method + path | one route, literal before parameter |
//! | [`PatternRouter`] | storage, email, queue records | glob over record subjects | every matching pattern |
//! | [`NamedRouter`] | tasks, remote calls, identity triggers | exact name | one route |
//!
//! Every router has a fallthrough handler for input that matches nothing.

pub mod named;
pub mod pattern;
pub mod trie;

pub use named::{IdentityRouter, Named, NamedRouter, RpcRouter, TaskRouter};
pub use pattern::{EmailRouter, FALLTHROUGH, PatternRecord, PatternRouter, QueueRouter, StorageRouter};
pub use trie::{HttpRouter, PARAM_PREFIX, RouteMatch};
