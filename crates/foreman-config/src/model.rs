// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Foreman tier router.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Foreman configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ForemanConfig {
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Cascade router behavior.
    #[serde(default)]
    pub cascade: CascadeConfig,

    /// Response cache bounds.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Complexity classifier tuning.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Backend settings for the tiers that make remote calls.
    #[serde(default)]
    pub tiers: TiersConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Cascade router configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CascadeConfig {
    /// Serve and store responses through the response cache.
    #[serde(default = "default_true")]
    pub caching_enabled: bool,

    /// Capacity of the recent routing decisions buffer.
    #[serde(default = "default_max_recent_decisions")]
    pub max_recent_decisions: usize,

    /// Deadline for a single tier call, in seconds.
    #[serde(default = "default_tier_timeout_secs")]
    pub tier_timeout_secs: u64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            caching_enabled: true,
            max_recent_decisions: default_max_recent_decisions(),
            tier_timeout_secs: default_tier_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_recent_decisions() -> usize {
    100
}

fn default_tier_timeout_secs() -> u64 {
    30
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of cached responses.
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,

    /// Time-to-live of a cached response, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_cache_max_entries(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_max_entries() -> usize {
    500
}

fn default_cache_ttl_secs() -> u64 {
    300
}

/// Complexity classifier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Maximum number of command signatures tracked in the execution history.
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Execution count at which a SIMPLE command is treated as TRIVIAL.
    #[serde(default = "default_simple_decay_threshold")]
    pub simple_decay_threshold: u64,

    /// Execution count at which a MODERATE command is treated as SIMPLE.
    #[serde(default = "default_moderate_decay_threshold")]
    pub moderate_decay_threshold: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            simple_decay_threshold: default_simple_decay_threshold(),
            moderate_decay_threshold: default_moderate_decay_threshold(),
        }
    }
}

fn default_max_history() -> usize {
    1000
}

fn default_simple_decay_threshold() -> u64 {
    5
}

fn default_moderate_decay_threshold() -> u64 {
    10
}

/// Per-tier backend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TiersConfig {
    /// Cheap, low-latency tier.
    #[serde(default = "default_fast_tier")]
    pub fast: TierBackendConfig,

    /// Mid-cost general tier.
    #[serde(default = "default_balanced_tier")]
    pub balanced: TierBackendConfig,

    /// Most capable, most expensive tier.
    #[serde(default = "default_smart_tier")]
    pub smart: TierBackendConfig,
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            fast: default_fast_tier(),
            balanced: default_balanced_tier(),
            smart: default_smart_tier(),
        }
    }
}

impl TiersConfig {
    /// Iterate over `(tier id, settings)` pairs in ascending capability order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &TierBackendConfig)> {
        [
            ("fast", &self.fast),
            ("balanced", &self.balanced),
            ("smart", &self.smart),
        ]
        .into_iter()
    }
}

/// Connection settings for one OpenAI-compatible backend.
///
/// The loader merges a partial `[tiers.<id>]` table over that tier's
/// compiled defaults, so overriding only `api_key` keeps the default model.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TierBackendConfig {
    /// Whether the router gets a client for this tier.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the chat completions API (without `/chat/completions`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model requested from the backend.
    #[serde(default)]
    pub model: String,

    /// API key. `None` falls back to the `FOREMAN_TIERS_<TIER>_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Maximum tokens generated per call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.2
}

fn tier_backend(base_url: &str, model: &str) -> TierBackendConfig {
    TierBackendConfig {
        enabled: true,
        base_url: base_url.to_string(),
        model: model.to_string(),
        api_key: None,
        max_tokens: default_max_tokens(),
        temperature: default_temperature(),
    }
}

fn default_fast_tier() -> TierBackendConfig {
    tier_backend("https://api.groq.com/openai/v1", "llama-3.1-8b-instant")
}

fn default_balanced_tier() -> TierBackendConfig {
    tier_backend("https://api.groq.com/openai/v1", "llama-3.3-70b-versatile")
}

fn default_smart_tier() -> TierBackendConfig {
    tier_backend("https://api.openai.com/v1", "gpt-4")
}
