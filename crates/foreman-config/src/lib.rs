// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Foreman tier router.
//!
//! `foreman.toml` is layered from `/etc/foreman`, the user config directory,
//! the working directory, and `FOREMAN_*` environment variables. Unknown keys
//! are rejected, and every failure comes back as a [`ConfigError`] ready for
//! [`render_errors`].
//!
//! ```no_run
//! let config = foreman_config::load_and_validate().expect("config errors");
//! println!("cache holds {} entries", config.cache.max_entries);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    CacheConfig, CascadeConfig, ClassifierConfig, ForemanConfig, LoggingConfig,
    TierBackendConfig, TiersConfig,
};

/// Loads the layered configuration and validates it.
pub fn load_and_validate() -> Result<ForemanConfig, Vec<ConfigError>> {
    checked(loader::load_config(), layered_sources)
}

/// Loads one explicit file (env overrides still apply) and validates it.
pub fn load_and_validate_path(path: &Path) -> Result<ForemanConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_sources([path.to_path_buf()])
    })
}

/// Loads a TOML string on top of the defaults and validates it.
pub fn load_and_validate_str(toml_content: &str) -> Result<ForemanConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validates a successful load, or turns figment's error into diagnostics.
///
/// `sources` is only read on failure.
fn checked(
    loaded: Result<ForemanConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<ForemanConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => validation::validate_config(&config).map(|()| config),
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Files merged by [`load_and_validate`], lowest precedence first.
fn layered_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|dir| dir.join(loader::LOCAL_CONFIG_FILE))
        .unwrap_or_else(|_| PathBuf::from(loader::LOCAL_CONFIG_FILE));

    let mut candidates = vec![PathBuf::from(loader::SYSTEM_CONFIG_PATH)];
    candidates.extend(loader::user_config_path());
    candidates.push(local);
    read_sources(candidates)
}

/// `(display path, contents)` for each candidate that can be read.
fn read_sources(paths: impl IntoIterator<Item = PathBuf>) -> Vec<(String, String)> {
    paths
        .into_iter()
        .filter_map(|path| {
            let contents = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), contents))
        })
        .collect()
}
