// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable record of one routing outcome.
//!
//! A [`RoutingDecision`] is created exactly once per routed request and never
//! mutated. Use the factories for the common shapes, or
//! [`RoutingDecisionBuilder`] when the inputs are not yet validated.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::complexity::TaskComplexity;
use crate::tier::Tier;

/// Why a routing decision could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("command must not be blank")]
    BlankCommand,
    #[error("detected complexity is required")]
    MissingComplexity,
    #[error("selected tier is required")]
    MissingSelectedTier,
    #[error("actual tier is required")]
    MissingActualTier,
    #[error("latency must not be negative, got {0}ms")]
    NegativeLatency(i64),
    #[error("token count must not be negative, got {0}")]
    NegativeTokens(i64),
    #[error("timestamp is required")]
    MissingTimestamp,
}

/// Outcome of routing one command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    command: String,
    detected_complexity: TaskComplexity,
    selected_tier: Tier,
    actual_tier: Tier,
    latency_ms: u64,
    tokens_used: u32,
    success: bool,
    timestamp: DateTime<Utc>,
    from_cache: bool,
    error_message: Option<String>,
}

impl RoutingDecision {
    /// Successful call served by `actual` after `selected` was chosen.
    pub fn success(
        command: impl Into<String>,
        complexity: TaskComplexity,
        selected: Tier,
        actual: Tier,
        latency_ms: u64,
        tokens_used: u32,
    ) -> Self {
        Self {
            command: command.into(),
            detected_complexity: complexity,
            selected_tier: selected,
            actual_tier: actual,
            latency_ms,
            tokens_used,
            success: true,
            timestamp: Utc::now(),
            from_cache: false,
            error_message: None,
        }
    }

    /// Response served from the cache without any tier call.
    pub fn cache_hit(
        command: impl Into<String>,
        complexity: TaskComplexity,
        latency_ms: u64,
    ) -> Self {
        Self {
            command: command.into(),
            detected_complexity: complexity,
            selected_tier: Tier::Cache,
            actual_tier: Tier::Cache,
            latency_ms,
            tokens_used: 0,
            success: true,
            timestamp: Utc::now(),
            from_cache: true,
            error_message: None,
        }
    }

    /// Every tier failed; `actual` is the last one attempted.
    pub fn failure(
        command: impl Into<String>,
        complexity: TaskComplexity,
        selected: Tier,
        actual: Tier,
        latency_ms: u64,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            detected_complexity: complexity,
            selected_tier: selected,
            actual_tier: actual,
            latency_ms,
            tokens_used: 0,
            success: false,
            timestamp: Utc::now(),
            from_cache: false,
            error_message: Some(error_message.into()),
        }
    }

    pub fn builder() -> RoutingDecisionBuilder {
        RoutingDecisionBuilder::default()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn detected_complexity(&self) -> TaskComplexity {
        self.detected_complexity
    }

    pub fn selected_tier(&self) -> Tier {
        self.selected_tier
    }

    pub fn actual_tier(&self) -> Tier {
        self.actual_tier
    }

    pub fn latency_ms(&self) -> u64 {
        self.latency_ms
    }

    pub fn tokens_used(&self) -> u32 {
        self.tokens_used
    }

    pub fn is_successful(&self) -> bool {
        self.success
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Whether a different tier than the selected one produced the outcome.
    pub fn has_fallback(&self) -> bool {
        self.selected_tier != self.actual_tier
    }

    /// "Escalated: fast -> balanced", "Downgraded: ...", or `None` without fallback.
    pub fn fallback_reason(&self) -> Option<String> {
        if !self.has_fallback() {
            return None;
        }
        let direction = match self
            .actual_tier
            .capability_rank()
            .cmp(&self.selected_tier.capability_rank())
        {
            Ordering::Greater => "Escalated",
            Ordering::Less | Ordering::Equal => "Downgraded",
        };
        Some(format!(
            "{direction}: {} -> {}",
            self.selected_tier, self.actual_tier
        ))
    }

    /// Estimated cost in USD, priced at the tier that actually served the call.
    pub fn estimated_cost(&self) -> f64 {
        self.actual_tier.estimate_cost(self.tokens_used)
    }

    /// Check that the record is usable.
    pub fn validate(&self) -> Result<(), DecisionError> {
        if self.command.trim().is_empty() {
            return Err(DecisionError::BlankCommand);
        }
        Ok(())
    }

    /// One-line description for logs and the CLI.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "[{}] {} -> {}",
            self.detected_complexity, self.selected_tier, self.actual_tier
        );
        if self.from_cache {
            line.push_str(" (cached)");
        }
        line.push_str(&format!(
            ", {}ms, {} tokens, ${:.6}",
            self.latency_ms,
            self.tokens_used,
            self.estimated_cost()
        ));
        if let Some(reason) = self.fallback_reason() {
            line.push_str(&format!(", {reason}"));
        }
        if let Some(err) = &self.error_message {
            line.push_str(&format!(", failed: {err}"));
        }
        line
    }
}

/// Builder accepting unvalidated input; [`build`](Self::build) checks it all.
#[derive(Debug, Clone, Default)]
pub struct RoutingDecisionBuilder {
    command: Option<String>,
    detected_complexity: Option<TaskComplexity>,
    selected_tier: Option<Tier>,
    actual_tier: Option<Tier>,
    latency_ms: i64,
    tokens_used: i64,
    success: bool,
    timestamp: Option<DateTime<Utc>>,
    from_cache: bool,
    error_message: Option<String>,
}

impl RoutingDecisionBuilder {
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn detected_complexity(mut self, complexity: TaskComplexity) -> Self {
        self.detected_complexity = Some(complexity);
        self
    }

    pub fn selected_tier(mut self, tier: Tier) -> Self {
        self.selected_tier = Some(tier);
        self
    }

    pub fn actual_tier(mut self, tier: Tier) -> Self {
        self.actual_tier = Some(tier);
        self
    }

    pub fn latency_ms(mut self, latency_ms: i64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn tokens_used(mut self, tokens: i64) -> Self {
        self.tokens_used = tokens;
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    /// Set the timestamp explicitly.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Stamp the decision with the current time.
    pub fn now(self) -> Self {
        self.timestamp(Utc::now())
    }

    pub fn from_cache(mut self, from_cache: bool) -> Self {
        self.from_cache = from_cache;
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Validate every field and produce the decision.
    pub fn build(self) -> Result<RoutingDecision, DecisionError> {
        let command = self
            .command
            .filter(|c| !c.trim().is_empty())
            .ok_or(DecisionError::BlankCommand)?;
        let detected_complexity = self
            .detected_complexity
            .ok_or(DecisionError::MissingComplexity)?;
        let selected_tier = self.selected_tier.ok_or(DecisionError::MissingSelectedTier)?;
        let actual_tier = self.actual_tier.ok_or(DecisionError::MissingActualTier)?;
        let latency_ms = u64::try_from(self.latency_ms)
            .map_err(|_| DecisionError::NegativeLatency(self.latency_ms))?;
        if self.tokens_used < 0 {
            return Err(DecisionError::NegativeTokens(self.tokens_used));
        }
        let tokens_used = u32::try_from(self.tokens_used).unwrap_or(u32::MAX);
        let timestamp = self.timestamp.ok_or(DecisionError::MissingTimestamp)?;

        Ok(RoutingDecision {
            command,
            detected_complexity,
            selected_tier,
            actual_tier,
            latency_ms,
            tokens_used,
            success: self.success,
            timestamp,
            from_cache: self.from_cache,
            error_message: self.error_message,
        })
    }
}
