// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `foreman tiers` command implementation.
//!
//! Lists the tier catalog next to the configured backend of each tier and,
//! with `--check`, probes every configured backend.

use std::io::IsTerminal;

use foreman_config::ForemanConfig;
use foreman_core::{ForemanError, HealthStatus};
use foreman_router::Tier;

use crate::route::build_router;

/// Configured model for a tier, or why it has none.
fn backend_label(config: &ForemanConfig, tier: Tier) -> String {
    if !tier.requires_backend_call() {
        return if tier.is_available() {
            "built in".to_string()
        } else {
            "unavailable".to_string()
        };
    }
    match config.tiers.iter().find(|(id, _)| *id == tier.id()) {
        Some((_, backend)) if backend.enabled => format!("{} @ {}", backend.model, backend.base_url),
        Some(_) => "disabled".to_string(),
        None => "not configured".to_string(),
    }
}

fn health_marker(status: &HealthStatus, use_color: bool) -> String {
    let (marker, detail) = match status {
        HealthStatus::Healthy => ("[OK]", String::new()),
        HealthStatus::Degraded(reason) => ("[WARN]", format!(" {reason}")),
        HealthStatus::Unhealthy(reason) => ("[FAIL]", format!(" {reason}")),
    };
    if use_color {
        use colored::Colorize;
        let marker = match status {
            HealthStatus::Healthy => marker.green(),
            HealthStatus::Degraded(_) => marker.yellow(),
            HealthStatus::Unhealthy(_) => marker.red(),
        };
        format!("{marker}{detail}")
    } else {
        format!("{marker}{detail}")
    }
}

/// Run the `foreman tiers` command.
pub async fn run_tiers(config: &ForemanConfig, check: bool) -> Result<(), ForemanError> {
    println!();
    println!("  foreman tiers");
    println!("  {}", "-".repeat(35));
    for tier in Tier::ALL {
        println!("    {:<48} {}", tier.summary(), backend_label(config, tier));
    }

    if check {
        let use_color = std::io::stdout().is_terminal();
        let router = build_router(config)?;
        println!();
        for (tier, status) in router.health().await {
            println!("    {:<10} {}", tier.id(), health_marker(&status, use_color));
        }
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_config() {
        let mut config = ForemanConfig::default();
        config.tiers.balanced.enabled = false;

        assert_eq!(backend_label(&config, Tier::Cache), "built in");
        assert_eq!(backend_label(&config, Tier::Local), "unavailable");
        assert_eq!(backend_label(&config, Tier::Balanced), "disabled");
        assert!(backend_label(&config, Tier::Fast).starts_with("llama-3.1-8b-instant @ "));
    }

    #[test]
    fn plain_health_markers() {
        assert_eq!(health_marker(&HealthStatus::Healthy, false), "[OK]");
        assert_eq!(
            health_marker(&HealthStatus::Unhealthy("401".into()), false),
            "[FAIL] 401"
        );
    }
}
