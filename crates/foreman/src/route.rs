// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `foreman route` command implementation.
//!
//! Builds a router with one OpenAI-compatible client per enabled tier and
//! routes a single command through it.

use std::sync::Arc;

use foreman_config::ForemanConfig;
use foreman_core::{ForemanError, PARAM_MODEL, PARAM_PROVIDER_ID, RouteParams, TierResponse};
use foreman_openai::OpenAiTierClient;
use foreman_router::{CascadeRouter, RoutingDecision, Tier};
use serde::Serialize;
use tracing::info;

/// Structured output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct RouteOutput {
    pub response: TierResponse,
    pub decision: Option<RoutingDecision>,
    pub estimated_cost: f64,
}

/// Build a router with a client for every enabled tier in `config`.
pub fn build_router(config: &ForemanConfig) -> Result<CascadeRouter, ForemanError> {
    let mut builder = CascadeRouter::from_config(config);
    for (name, backend) in config.tiers.iter() {
        if !backend.enabled {
            info!(tier = name, "tier disabled in config");
            continue;
        }
        let client = OpenAiTierClient::from_config(name, backend)?;
        builder = builder.client(Tier::from_id(name), Arc::new(client));
    }
    Ok(builder.build())
}

/// Request parameters carrying the optional cache-key labels.
pub fn route_params(model: Option<&str>, provider: Option<&str>) -> RouteParams {
    let mut params = RouteParams::new();
    if let Some(model) = model {
        params.insert(PARAM_MODEL.to_string(), model.to_string());
    }
    if let Some(provider) = provider {
        params.insert(PARAM_PROVIDER_ID.to_string(), provider.to_string());
    }
    params
}

/// Run the `foreman route` command.
pub async fn run_route(
    config: &ForemanConfig,
    command: &str,
    model: Option<&str>,
    provider: Option<&str>,
    json: bool,
) -> Result<(), ForemanError> {
    let router = build_router(config)?;
    if router.configured_tiers().is_empty() {
        return Err(ForemanError::Config(
            "no tier is enabled; enable at least one of tiers.fast, tiers.balanced, tiers.smart"
                .into(),
        ));
    }

    let response = router
        .route(command, &route_params(model, provider))
        .await?;
    let decision = router.recent_decisions().pop();

    if json {
        let output = RouteOutput {
            estimated_cost: router.total_cost(),
            response,
            decision,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("{}", response.content);
        if let Some(decision) = decision {
            eprintln!("{}", decision.summary());
        }
    }

    router.log_stats();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_params_only_sets_given_labels() {
        let params = route_params(Some("gpt-4"), None);
        assert_eq!(params.get(PARAM_MODEL).map(String::as_str), Some("gpt-4"));
        assert!(!params.contains_key(PARAM_PROVIDER_ID));
        assert!(route_params(None, None).is_empty());
    }

    #[test]
    fn build_router_registers_enabled_tiers() {
        let config = foreman_config::load_and_validate_str(
            r#"
            [tiers.balanced]
            enabled = false
            "#,
        )
        .unwrap();
        let router = build_router(&config).unwrap();
        assert_eq!(router.configured_tiers(), vec![Tier::Fast, Tier::Smart]);
    }

    #[tokio::test]
    async fn route_without_tiers_is_a_config_error() {
        let config = foreman_config::load_and_validate_str(
            r#"
            [tiers.fast]
            enabled = false
            [tiers.balanced]
            enabled = false
            [tiers.smart]
            enabled = false
            "#,
        )
        .unwrap();
        let err = run_route(&config, "mine 10 iron", None, None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ForemanError::Config(_)));
    }
}
