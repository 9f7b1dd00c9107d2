// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Foreman routing framework.

use thiserror::Error;

/// The primary error type used by tier clients and the cascade router.
#[derive(Debug, Error)]
pub enum ForemanError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A tier's backend call failed (transport error, rate limit, malformed body).
    #[error("tier {tier} failed: {message}")]
    Tier {
        tier: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No client is registered for the tier, or the tier cannot serve calls.
    #[error("tier {tier} is not available")]
    TierUnavailable { tier: String },

    /// Every tier in the cascade failed; the request cannot be served.
    #[error("all tiers exhausted (selected {selected}, last tried {last_tier}): {message}")]
    CascadeExhausted {
        selected: String,
        last_tier: String,
        message: String,
    },

    /// A tier call did not finish before its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ForemanError {
    /// Convenience constructor for a tier failure without an underlying source.
    pub fn tier(tier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tier {
            tier: tier.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error ends the whole cascade rather than one tier.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::CascadeExhausted { .. } | Self::Config(_))
    }
}
