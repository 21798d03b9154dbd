//! Runtime configuration.

use serde::Deserialize;

/// Environment variable naming the bucket the storage router is scoped to.
pub const STORAGE_SCOPE_VAR: &str = "STRATUS_STORAGE_SCOPE";
/// Environment variable naming the mail domain the email router is scoped to.
pub const MAIL_DOMAIN_VAR: &str = "STRATUS_MAIL_DOMAIN";
/// Environment variable naming the queue the queue router is scoped to.
pub const QUEUE_NAME_VAR: &str = "STRATUS_QUEUE_NAME";
/// Environment variable switching the tracing capture hook.
pub const TRACING_VAR: &str = "STRATUS_TRACING";

/// Configuration for [`Orchestrator::builder_from_config`].
///
/// Every field is optional when deserializing.
///
/// [`Orchestrator::builder_from_config`]: crate::Orchestrator::builder_from_config
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StratusConfig {
    /// Bucket the storage router is scoped to. `None` accepts every bucket.
    pub storage_scope: Option<String>,
    /// Mail domain the email router is scoped to.
    pub mail_domain: Option<String>,
    /// Queue the queue router is scoped to.
    pub queue_name: Option<String>,
    /// Wrap handler invocations in tracing spans.
    pub tracing: bool,
}

impl Default for StratusConfig {
    fn default() -> Self {
        Self {
            storage_scope: None,
            mail_domain: None,
            queue_name: None,
            tracing: true,
        }
    }
}

impl StratusConfig {
    /// Read the configuration from `STRATUS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// Empty values count as unset. Tracing is on unless the variable is
    /// `0`, `false`, `no` or `off`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            storage_scope: value(STORAGE_SCOPE_VAR),
            mail_domain: value(MAIL_DOMAIN_VAR),
            queue_name: value(QUEUE_NAME_VAR),
            tracing: value(TRACING_VAR).is_none_or(|v| {
                !matches!(
                    v.trim().to_ascii_lowercase().as_str(),
                    "0" | "false" | "no" | "off"
                )
            }),
        }
    }
}
