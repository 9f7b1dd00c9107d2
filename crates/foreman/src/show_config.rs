// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `foreman config` command implementation.

use foreman_config::ForemanConfig;
use foreman_core::ForemanError;

const REDACTED: &str = "<redacted>";

/// Copy of `config` with every API key replaced by a placeholder.
pub fn redacted(config: &ForemanConfig) -> ForemanConfig {
    let mut config = config.clone();
    for backend in [
        &mut config.tiers.fast,
        &mut config.tiers.balanced,
        &mut config.tiers.smart,
    ] {
        if backend.api_key.is_some() {
            backend.api_key = Some(REDACTED.to_string());
        }
    }
    config
}

/// Run the `foreman config` command: print the effective config as TOML.
pub fn run_config(config: &ForemanConfig) -> Result<(), ForemanError> {
    let rendered = toml::to_string_pretty(&redacted(config))
        .map_err(|e| ForemanError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}
