// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by tier clients, the response cache, and the router.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Free-form request parameters passed alongside a command.
///
/// The router reads `model` and `providerId` from this map to build cache
/// keys; the whole map is forwarded to the tier client untouched.
pub type RouteParams = HashMap<String, String>;

/// Parameter key naming the model a caller expects.
pub const PARAM_MODEL: &str = "model";

/// Parameter key naming the provider a caller expects.
pub const PARAM_PROVIDER_ID: &str = "providerId";

/// Health status reported by tier client health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Client is fully operational.
    Healthy,
    /// Client is operational but experiencing issues.
    Degraded(String),
    /// Client is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    /// Whether requests can still be sent (healthy or degraded).
    pub fn is_usable(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy(_))
    }
}

/// Kind of backend a tier client talks to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Hosted OpenAI-compatible chat completions API.
    OpenAiCompatible,
    /// Scripted client used by tests and dry runs.
    Mock,
}

/// A response produced by a tier client (or served from the response cache).
///
/// `content` is opaque to the router; callers parse it into a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierResponse {
    /// Raw text returned by the model.
    pub content: String,
    /// Model that produced the content.
    pub model: String,
    /// Provider that served the call.
    pub provider_id: String,
    /// Total tokens billed for the call.
    pub tokens_used: u32,
    /// Wall-clock latency of the backend call.
    pub latency_ms: u64,
    /// Set when the response was served from the response cache.
    #[serde(default)]
    pub from_cache: bool,
}

impl TierResponse {
    /// Create a fresh (non-cached) response.
    pub fn new(
        content: impl Into<String>,
        model: impl Into<String>,
        provider_id: impl Into<String>,
        tokens_used: u32,
        latency_ms: u64,
    ) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            provider_id: provider_id.into(),
            tokens_used,
            latency_ms,
            from_cache: false,
        }
    }

    /// Copy of this response with the cache flag set.
    pub fn with_cache_flag(&self, from_cache: bool) -> Self {
        Self {
            from_cache,
            ..self.clone()
        }
    }
}
