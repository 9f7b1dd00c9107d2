// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as positive bounds, known log levels, and usable tier endpoints.

use crate::diagnostic::ConfigError;
use crate::model::{ForemanConfig, TierBackendConfig};

/// Log levels accepted by `logging.level`.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ForemanConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.logging.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(validation(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.cascade.max_recent_decisions == 0 {
        errors.push(validation(
            "cascade.max_recent_decisions must be at least 1",
        ));
    }

    if config.cascade.tier_timeout_secs == 0 {
        errors.push(validation("cascade.tier_timeout_secs must be at least 1"));
    }

    if config.cache.max_entries == 0 {
        errors.push(validation("cache.max_entries must be at least 1"));
    }

    if config.cache.ttl_secs == 0 {
        errors.push(validation("cache.ttl_secs must be at least 1"));
    }

    if config.classifier.max_history == 0 {
        errors.push(validation("classifier.max_history must be at least 1"));
    }

    // A count of 1 always means "novel", so decay can only start at 2.
    if config.classifier.simple_decay_threshold < 2 {
        errors.push(validation(format!(
            "classifier.simple_decay_threshold must be at least 2, got {}",
            config.classifier.simple_decay_threshold
        )));
    }

    if config.classifier.moderate_decay_threshold < 2 {
        errors.push(validation(format!(
            "classifier.moderate_decay_threshold must be at least 2, got {}",
            config.classifier.moderate_decay_threshold
        )));
    }

    for (id, tier) in config.tiers.iter() {
        validate_tier(id, tier, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_tier(id: &str, tier: &TierBackendConfig, errors: &mut Vec<ConfigError>) {
    if !tier.enabled {
        return;
    }

    let base_url = tier.base_url.trim();
    if base_url.is_empty() {
        errors.push(validation(format!("tiers.{id}.base_url must not be empty")));
    } else if let Err(reason) = check_base_url(base_url) {
        errors.push(validation(format!(
            "tiers.{id}.base_url `{base_url}` is not usable: {reason}"
        )));
    }

    if tier.model.trim().is_empty() {
        errors.push(validation(format!("tiers.{id}.model must not be empty")));
    }

    if tier.max_tokens == 0 {
        errors.push(validation(format!("tiers.{id}.max_tokens must be at least 1")));
    }

    if !(0.0..=2.0).contains(&tier.temperature) {
        errors.push(validation(format!(
            "tiers.{id}.temperature must be between 0.0 and 2.0, got {}",
            tier.temperature
        )));
    }
}

/// A tier endpoint must be an absolute http(s) URL with a host.
fn check_base_url(base_url: &str) -> Result<(), String> {
    let url = url::Url::parse(base_url).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("scheme `{}` is not http or https", url.scheme()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err("no host".to_string());
    }
    Ok(())
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
