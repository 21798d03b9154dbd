//! Standard middleware for the path router.

mod headers;
mod logging;

pub use headers::DefaultHeaders;
pub use logging::RequestLogging;
