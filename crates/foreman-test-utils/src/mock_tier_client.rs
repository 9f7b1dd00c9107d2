// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock tier client for deterministic testing.
//!
//! `MockTierClient` implements `TierClient` with a scripted FIFO queue of
//! outcomes, enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use foreman_core::{BackendKind, ForemanError, HealthStatus, RouteParams, TierClient, TierResponse};

/// One scripted reply.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOutcome {
    /// Answer with this content and token count.
    Success { content: String, tokens: u32 },
    /// Fail with this message.
    Failure(String),
}

impl MockOutcome {
    pub fn success(content: impl Into<String>, tokens: u32) -> Self {
        Self::Success {
            content: content.into(),
            tokens,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }
}

/// A tier client that replays scripted outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty, the
/// default outcome is used. Every call is counted and its prompt recorded.
pub struct MockTierClient {
    provider_id: String,
    model: String,
    script: Arc<Mutex<VecDeque<MockOutcome>>>,
    default_outcome: MockOutcome,
    delay: Option<Duration>,
    health: HealthStatus,
    calls: AtomicUsize,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockTierClient {
    fn with_default(default_outcome: MockOutcome) -> Self {
        Self {
            provider_id: "mock".to_string(),
            model: "mock-model".to_string(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            default_outcome,
            delay: None,
            health: HealthStatus::Healthy,
            calls: AtomicUsize::new(0),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A client that always answers with `content` using `tokens` tokens.
    pub fn succeeding(content: impl Into<String>, tokens: u32) -> Self {
        Self::with_default(MockOutcome::success(content, tokens))
    }

    /// A client that always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_default(MockOutcome::failure(message))
    }

    /// A client that replays `outcomes`, then falls back to failing.
    pub fn scripted(outcomes: Vec<MockOutcome>) -> Self {
        let client = Self::with_default(MockOutcome::failure("mock script exhausted"));
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(outcomes))),
            ..client
        }
    }

    /// Report this provider id in responses.
    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = provider_id.into();
        self
    }

    /// Report this model in responses.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sleep this long (on the tokio clock) before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report this status from `health_check`.
    pub fn with_health(mut self, health: HealthStatus) -> Self {
        self.health = health;
        self
    }

    /// Queue another outcome.
    pub async fn push(&self, outcome: MockOutcome) {
        self.script.lock().await.push_back(outcome);
    }

    /// Number of `send` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    async fn next_outcome(&self) -> MockOutcome {
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.default_outcome.clone())
    }
}

#[async_trait]
impl TierClient for MockTierClient {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::Mock
    }

    async fn send(&self, prompt: &str, _params: &RouteParams) -> Result<TierResponse, ForemanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_outcome().await {
            MockOutcome::Success { content, tokens } => Ok(TierResponse::new(
                content,
                self.model.clone(),
                self.provider_id.clone(),
                tokens,
                self.delay.map(|d| d.as_millis() as u64).unwrap_or(0),
            )),
            MockOutcome::Failure(message) => Err(ForemanError::tier(&self.provider_id, message)),
        }
    }

    async fn health_check(&self) -> Result<HealthStatus, ForemanError> {
        Ok(self.health.clone())
    }
}
