#![allow(dead_code)]

use serde_json::Value;
use stratus::{Orchestrator, OrchestratorBuilder, RawEvent, StratusConfig};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Setup
// ============================================================================

/// Install a test subscriber once; `RUST_LOG` controls the output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A builder without tracing, with the given router scopes.
pub fn scoped_builder(
    storage: Option<&str>,
    mail: Option<&str>,
    queue: Option<&str>,
) -> OrchestratorBuilder {
    let config = StratusConfig {
        storage_scope: storage.map(str::to_string),
        mail_domain: mail.map(str::to_string),
        queue_name: queue.map(str::to_string),
        tracing: false,
    };
    Orchestrator::builder_from_config(&config)
}

pub fn raw(value: Value) -> RawEvent {
    RawEvent::try_from(value).expect("fixture must be a JSON object")
}
