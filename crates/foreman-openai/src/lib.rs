// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible tier client for the Foreman router.
//!
//! This crate implements [`TierClient`] over the chat completions API, which
//! Groq, OpenAI, and most self-hosted inference servers expose.

pub mod client;
pub mod types;

use std::net::IpAddr;
use std::time::Instant;

use async_trait::async_trait;
use foreman_config::TierBackendConfig;
use foreman_core::{BackendKind, ForemanError, HealthStatus, RouteParams, TierClient, TierResponse};
use tracing::{debug, info};

use crate::client::ChatClient;
use crate::types::{ChatMessage, ChatRequest};

/// Tier client for one OpenAI-compatible backend.
pub struct OpenAiTierClient {
    client: ChatClient,
    provider_id: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiTierClient {
    /// Creates a client for the tier named `tier` from its config section.
    pub fn from_config(tier: &str, config: &TierBackendConfig) -> Result<Self, ForemanError> {
        if config.model.trim().is_empty() {
            return Err(ForemanError::Config(format!(
                "tiers.{tier}.model must name a model"
            )));
        }
        let client = ChatClient::new(tier, &config.base_url, config.api_key.clone())?;
        let provider_id = provider_label(&config.base_url);
        info!(tier, provider = %provider_id, model = %config.model, "tier client configured");

        Ok(Self {
            client,
            provider_id,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TierClient for OpenAiTierClient {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::OpenAiCompatible
    }

    async fn send(&self, prompt: &str, _params: &RouteParams) -> Result<TierResponse, ForemanError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let started = Instant::now();
        let response = self.client.complete(&request).await?;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let content = response.first_content().ok_or_else(|| {
            ForemanError::tier(self.client.tier(), "completion response has no choices")
        })?;
        debug!(
            provider = %self.provider_id,
            tokens = response.total_tokens(),
            latency_ms,
            "completion received"
        );

        Ok(TierResponse::new(
            content,
            response.model.clone().unwrap_or_else(|| self.model.clone()),
            self.provider_id.clone(),
            response.total_tokens(),
            latency_ms,
        ))
    }

    async fn health_check(&self) -> Result<HealthStatus, ForemanError> {
        let status = match self.client.probe_models().await {
            Ok(status) => status,
            Err(e) => return Ok(HealthStatus::Unhealthy(e.to_string())),
        };
        Ok(match status.as_u16() {
            200..=299 => HealthStatus::Healthy,
            401 | 403 => HealthStatus::Unhealthy(format!("authentication failed (HTTP {status})")),
            429 => HealthStatus::Degraded("rate limited".to_string()),
            _ => HealthStatus::Degraded(format!("models endpoint returned HTTP {status}")),
        })
    }
}

/// Provider label derived from the base URL host, e.g. `api.groq.com` -> `groq`.
fn provider_label(base_url: &str) -> String {
    let host = reqwest::Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();
    if host.parse::<IpAddr>().is_ok() {
        return host;
    }
    let parts: Vec<&str> = host.split('.').filter(|p| !p.is_empty()).collect();
    match parts.as_slice() {
        [] => "openai-compatible".to_string(),
        [single] => (*single).to_string(),
        [.., name, _tld] => (*name).to_string(),
    }
}
