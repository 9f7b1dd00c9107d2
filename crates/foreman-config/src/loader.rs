// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./foreman.toml` > `~/.config/foreman/foreman.toml` > `/etc/foreman/foreman.toml`
//! with environment variable overrides via `FOREMAN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ForemanConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/foreman/foreman.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "foreman.toml";

/// Env-var sections, longest first so `tiers_fast_` wins over a bare `tiers_`.
const ENV_SECTIONS: &[(&str, &str)] = &[
    ("tiers_balanced_", "tiers.balanced."),
    ("tiers_smart_", "tiers.smart."),
    ("tiers_fast_", "tiers.fast."),
    ("classifier_", "classifier."),
    ("logging_", "logging."),
    ("cascade_", "cascade."),
    ("cache_", "cache."),
];

/// Path of the per-user config file, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("foreman").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/foreman/foreman.toml` (system-wide)
/// 3. `~/.config/foreman/foreman.toml` (user XDG config)
/// 4. `./foreman.toml` (local directory)
/// 5. `FOREMAN_*` environment variables
pub fn load_config() -> Result<ForemanConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ForemanConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ForemanConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ForemanConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ForemanConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ForemanConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
///
/// Only the section prefix is split, so `tiers_fast_api_key` becomes
/// `tiers.fast.api_key` rather than `tiers.fast.api.key`. Names without a
/// known section are returned unchanged and rejected by `deny_unknown_fields`.
pub fn map_env_key(key: &str) -> String {
    for (prefix, dotted) in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(prefix) {
            return format!("{dotted}{rest}");
        }
    }
    key.to_string()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
fn env_provider() -> Env {
    Env::prefixed("FOREMAN_").map(|key| map_env_key(key.as_str()).into())
}
