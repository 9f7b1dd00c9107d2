// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tier client trait for backend model integrations (OpenAI-compatible, local, etc.).

use async_trait::async_trait;

use crate::error::ForemanError;
use crate::types::{BackendKind, HealthStatus, RouteParams, TierResponse};

/// A backend capable of answering a planning prompt for one tier.
///
/// One client is registered per tier. The router calls `send` at most once
/// per tier per request and treats any error as "this tier failed".
/// Retries inside a single tier, if any, belong to the client.
#[async_trait]
pub trait TierClient: Send + Sync + 'static {
    /// Stable identifier of the provider behind this client (e.g. "groq").
    fn provider_id(&self) -> &str;

    /// Kind of backend this client talks to.
    fn backend_kind(&self) -> BackendKind;

    /// Sends a prompt and returns the full response.
    async fn send(
        &self,
        prompt: &str,
        params: &RouteParams,
    ) -> Result<TierResponse, ForemanError>;

    /// Performs a health check and returns the client's current status.
    async fn health_check(&self) -> Result<HealthStatus, ForemanError>;

    /// Boolean health probe. A failed check counts as unhealthy.
    async fn healthy(&self) -> bool {
        match self.health_check().await {
            Ok(status) => status.is_usable(),
            Err(_) => false,
        }
    }
}
