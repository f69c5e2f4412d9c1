//! Orchestrator configuration.
//!
//! Deserialized from `config.toml` by the infrastructure layer; every field
//! has a default so a missing or partial file still yields a usable config.

use serde::{Deserialize, Serialize};

/// Tunable settings for the turn orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// How many prior messages to include when building a prompt.
    #[serde(default = "default_history_window")]
    pub history_window: i64,

    /// Model selector passed to the generation provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on generated response tokens.
    #[serde(default = "default_max_response_tokens")]
    pub max_response_tokens: u32,

    /// How long a stream may go without a fragment before the turn is
    /// treated as implicitly cancelled.
    #[serde(default = "default_stream_idle_timeout_ms")]
    pub stream_idle_timeout_ms: u64,
}

fn default_history_window() -> i64 {
    20
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_response_tokens() -> u32 {
    1024
}

fn default_stream_idle_timeout_ms() -> u64 {
    30_000
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            model: default_model(),
            max_response_tokens: default_max_response_tokens(),
            stream_idle_timeout_ms: default_stream_idle_timeout_ms(),
        }
    }
}
