// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat completions APIs.
//!
//! Provides [`ChatClient`] which handles request construction, bearer
//! authentication, and mapping of HTTP failures onto [`ForemanError::Tier`].
//! There is no retry here: a failed call escalates to the next tier instead.

use std::time::Duration;

use foreman_core::ForemanError;
use reqwest::StatusCode;
use tracing::debug;

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// Upper bound on a single HTTP exchange. The router applies its own,
/// usually shorter, per-tier deadline on top.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client for one OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    tier: String,
}

impl ChatClient {
    /// Creates a client for `base_url` (e.g. `https://api.groq.com/openai/v1`).
    ///
    /// `tier` labels errors. An empty or missing `api_key` sends no
    /// `Authorization` header, which suits local servers.
    pub fn new(
        tier: impl Into<String>,
        base_url: &str,
        api_key: Option<String>,
    ) -> Result<Self, ForemanError> {
        let tier = tier.into();
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ForemanError::Tier {
                tier: tier.clone(),
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            tier,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Tier name used to label errors.
    pub fn tier(&self) -> &str {
        &self.tier
    }

    /// Sends a non-streaming chat completion request.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ForemanError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.client.post(&url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        debug!(tier = %self.tier, status = %status, "completion response received");

        let body = response.text().await.map_err(|e| ForemanError::Tier {
            tier: self.tier.clone(),
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(self.status_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| ForemanError::Tier {
            tier: self.tier.clone(),
            message: format!("malformed completion response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Probes `GET /models` and returns the HTTP status.
    pub async fn probe_models(&self) -> Result<StatusCode, ForemanError> {
        let url = format!("{}/models", self.base_url);
        let mut builder = self.client.get(&url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        Ok(response.status())
    }

    fn transport_error(&self, e: reqwest::Error) -> ForemanError {
        ForemanError::Tier {
            tier: self.tier.clone(),
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }

    fn status_error(&self, status: StatusCode, body: &str) -> ForemanError {
        let detail = match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(api_err) => api_err.error.message,
            Err(_) => body.chars().take(200).collect(),
        };
        ForemanError::tier(
            self.tier.clone(),
            format!("{}: {detail}", describe_status(status)),
        )
    }
}

/// Short human label for a failing HTTP status.
fn describe_status(status: StatusCode) -> String {
    let kind = match status.as_u16() {
        429 => "rate limited",
        401 | 403 => "authentication failed",
        500..=599 => "server error",
        _ => "request rejected",
    };
    format!("{kind} (HTTP {})", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "llama-3.1-8b-instant".into(),
            messages: vec![ChatMessage::user("mine 10 iron")],
            max_tokens: 256,
            temperature: 0.2,
        }
    }

    fn completion_body(content: &str, tokens: u32) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "model": "llama-3.1-8b-instant",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": tokens - 12, "total_tokens": tokens}
        })
    }

    #[tokio::test]
    async fn complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.1-8b-instant",
                "messages": [{"role": "user", "content": "mine 10 iron"}],
                "max_tokens": 256
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("plan", 40)))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new("fast", &server.uri(), Some("test-key".into())).unwrap();
        let resp = client.complete(&test_request()).await.unwrap();
        assert_eq!(resp.first_content(), Some("plan"));
        assert_eq!(resp.total_tokens(), 40);
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok", 20)))
            .mount(&server)
            .await;

        let client = ChatClient::new("fast", &format!("{}/", server.uri()), None).unwrap();
        assert!(client.complete(&test_request()).await.is_ok());
    }

    #[tokio::test]
    async fn rate_limit_maps_to_tier_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"type": "rate_limit_exceeded", "message": "Too many requests"}
            })))
            .mount(&server)
            .await;

        let client = ChatClient::new("fast", &server.uri(), None).unwrap();
        let err = client.complete(&test_request()).await.unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, ForemanError::Tier { ref tier, .. } if tier == "fast"));
        assert!(msg.contains("rate limited (HTTP 429)"), "got: {msg}");
        assert!(msg.contains("Too many requests"), "got: {msg}");
    }

    #[tokio::test]
    async fn auth_failure_maps_to_tier_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let client = ChatClient::new("smart", &server.uri(), Some("bad".into())).unwrap();
        let msg = client.complete(&test_request()).await.unwrap_err().to_string();
        assert!(msg.contains("authentication failed (HTTP 401): unauthorized"), "got: {msg}");
    }

    #[tokio::test]
    async fn server_error_maps_to_tier_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = ChatClient::new("balanced", &server.uri(), None).unwrap();
        let msg = client.complete(&test_request()).await.unwrap_err().to_string();
        assert!(msg.contains("server error (HTTP 503)"), "got: {msg}");
    }

    #[tokio::test]
    async fn malformed_body_maps_to_tier_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = ChatClient::new("fast", &server.uri(), None).unwrap();
        let msg = client.complete(&test_request()).await.unwrap_err().to_string();
        assert!(msg.contains("malformed completion response"), "got: {msg}");
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        // Port 9 (discard) is not listening on test machines.
        let client = ChatClient::new("fast", "http://127.0.0.1:9", None).unwrap();
        let msg = client.complete(&test_request()).await.unwrap_err().to_string();
        assert!(msg.contains("HTTP request failed"), "got: {msg}");
    }

    #[test]
    fn empty_api_key_sends_no_auth_header() {
        let client = ChatClient::new("fast", "http://localhost", Some(String::new())).unwrap();
        assert!(client.api_key.is_none());
    }
}
