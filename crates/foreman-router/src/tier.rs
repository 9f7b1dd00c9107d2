// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static catalog of backend tiers and their cost, latency, and capability.
//!
//! Tiers are ordered by capability: CACHE < LOCAL < FAST < BALANCED < SMART.
//! Prices are nominal USD per 1k tokens, used for accounting only.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::complexity::TaskComplexity;

/// A backend tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Response cache, no model call.
    Cache,
    /// On-device model. Not wired up yet, so never available.
    Local,
    /// Small hosted model.
    Fast,
    /// Mid-size hosted model.
    Balanced,
    /// Largest hosted model.
    Smart,
}

/// Attributes of one tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierSpec {
    pub cost_per_1k_tokens: f64,
    pub expected_latency_ms: u64,
    pub capability_rank: u8,
    pub params_billions: u32,
    pub requires_backend_call: bool,
    pub available: bool,
    pub description: &'static str,
    pub provider: &'static str,
}

const CACHE_SPEC: TierSpec = TierSpec {
    cost_per_1k_tokens: 0.0,
    expected_latency_ms: 1,
    capability_rank: 0,
    params_billions: 0,
    requires_backend_call: false,
    available: true,
    description: "cached response",
    provider: "no LLM call",
};

const LOCAL_SPEC: TierSpec = TierSpec {
    cost_per_1k_tokens: 0.0,
    expected_latency_ms: 100,
    capability_rank: 1,
    params_billions: 1,
    requires_backend_call: false,
    available: false,
    description: "local model",
    provider: "not yet integrated",
};

const FAST_SPEC: TierSpec = TierSpec {
    cost_per_1k_tokens: 0.00001,
    expected_latency_ms: 200,
    capability_rank: 2,
    params_billions: 8,
    requires_backend_call: true,
    available: true,
    description: "llama-3.1-8b-instant",
    provider: "Groq",
};

const BALANCED_SPEC: TierSpec = TierSpec {
    cost_per_1k_tokens: 0.0002,
    expected_latency_ms: 500,
    capability_rank: 3,
    params_billions: 70,
    requires_backend_call: true,
    available: true,
    description: "llama-3.3-70b/gpt-3.5",
    provider: "Groq/OpenAI",
};

const SMART_SPEC: TierSpec = TierSpec {
    cost_per_1k_tokens: 0.01,
    expected_latency_ms: 2000,
    capability_rank: 4,
    params_billions: 1000,
    requires_backend_call: true,
    available: true,
    description: "gpt-4/claude-3",
    provider: "OpenAI/Anthropic",
};

impl Tier {
    /// All tiers in ascending capability order.
    pub const ALL: [Tier; 5] = [Tier::Cache, Tier::Local, Tier::Fast, Tier::Balanced, Tier::Smart];

    /// Static attributes for this tier.
    pub fn spec(self) -> &'static TierSpec {
        match self {
            Tier::Cache => &CACHE_SPEC,
            Tier::Local => &LOCAL_SPEC,
            Tier::Fast => &FAST_SPEC,
            Tier::Balanced => &BALANCED_SPEC,
            Tier::Smart => &SMART_SPEC,
        }
    }

    /// Stable lowercase identifier.
    pub fn id(self) -> &'static str {
        match self {
            Tier::Cache => "cache",
            Tier::Local => "local",
            Tier::Fast => "fast",
            Tier::Balanced => "balanced",
            Tier::Smart => "smart",
        }
    }

    pub fn cost_per_1k_tokens(self) -> f64 {
        self.spec().cost_per_1k_tokens
    }

    pub fn expected_latency_ms(self) -> u64 {
        self.spec().expected_latency_ms
    }

    pub fn capability_rank(self) -> u8 {
        self.spec().capability_rank
    }

    pub fn requires_backend_call(self) -> bool {
        self.spec().requires_backend_call
    }

    pub fn is_available(self) -> bool {
        self.spec().available
    }

    pub fn description(self) -> &'static str {
        self.spec().description
    }

    pub fn provider(self) -> &'static str {
        self.spec().provider
    }

    /// Parse a tier id case-insensitively; empty or unknown input yields BALANCED.
    pub fn from_id(id: &str) -> Tier {
        id.trim().parse().unwrap_or(Tier::Balanced)
    }

    /// Estimated cost in USD for `tokens` tokens. Always 0 for CACHE and LOCAL.
    pub fn estimate_cost(self, tokens: u32) -> f64 {
        if !self.requires_backend_call() {
            return 0.0;
        }
        f64::from(tokens) / 1000.0 * self.cost_per_1k_tokens()
    }

    /// Next more capable available tier, or `self` at the top.
    pub fn next_higher(self) -> Tier {
        let rank = self.capability_rank();
        Tier::ALL
            .into_iter()
            .find(|t| t.capability_rank() > rank && t.is_available())
            .unwrap_or(self)
    }

    /// Next less capable available tier, or `self` at the bottom.
    pub fn next_lower(self) -> Tier {
        let rank = self.capability_rank();
        Tier::ALL
            .into_iter()
            .rev()
            .find(|t| t.capability_rank() < rank && t.is_available())
            .unwrap_or(self)
    }

    /// Fixed complexity-to-tier mapping, before availability is considered.
    pub fn for_complexity(complexity: TaskComplexity) -> Tier {
        match complexity {
            TaskComplexity::Trivial => Tier::Cache,
            TaskComplexity::Simple => Tier::Fast,
            TaskComplexity::Moderate => Tier::Balanced,
            TaskComplexity::Complex | TaskComplexity::Novel => Tier::Smart,
        }
    }

    /// One-line listing, e.g. `fast[Groq, $0.00001/1K, ~200ms, 8B params]`.
    pub fn summary(self) -> String {
        format!(
            "{}[{}, ${:.5}/1K, ~{}ms, {}B params]",
            self.id(),
            self.provider(),
            self.cost_per_1k_tokens(),
            self.expected_latency_ms(),
            self.spec().params_billions
        )
    }
}
