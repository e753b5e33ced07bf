//! Configuration and dependency wiring for search sync.

mod dependencies;

pub use dependencies::{ConnectionMode, Dependencies};

use std::env;
use tracing::warn;

/// What a flush does when a backend call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Attempt every remaining operation, then report all failures together.
    #[default]
    ContinueOnError,
    /// Skip the remaining operations after the first failure.
    StopOnError,
}

impl FlushPolicy {
    /// Parse a policy name.
    ///
    /// Valid values: "continue" or "stop-on-error" (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "continue" | "continue-on-error" | "continue_on_error" => Some(Self::ContinueOnError),
            "stop" | "stop-on-error" | "stop_on_error" => Some(Self::StopOnError),
            _ => None,
        }
    }
}

/// Configuration for the change batch coordinator.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    /// Failure handling during a flush. Buffers are cleared either way.
    pub flush_policy: FlushPolicy,
}

impl CoordinatorConfig {
    /// Create a config with the given flush policy.
    pub fn with_flush_policy(flush_policy: FlushPolicy) -> Self {
        Self { flush_policy }
    }

    /// Read configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SEARCH_SYNC_FLUSH_POLICY`: "continue" or "stop-on-error" (default: continue)
    pub fn from_env() -> Self {
        let flush_policy = match env::var("SEARCH_SYNC_FLUSH_POLICY") {
            Ok(value) => FlushPolicy::parse(&value).unwrap_or_else(|| {
                warn!(value = %value, "Invalid SEARCH_SYNC_FLUSH_POLICY, defaulting to 'continue'");
                FlushPolicy::default()
            }),
            Err(_) => FlushPolicy::default(),
        };

        Self { flush_policy }
    }
}
