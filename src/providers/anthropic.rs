//! Anthropic Provider
//!
//! Implementation of the ChatProvider trait for Anthropic's messages API.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::credentials::CredentialStore;
use crate::provider::{missing_api_key_error, probe_connection, ChatProvider};
use crate::streaming::adapters::AnthropicAdapter;
use crate::streaming::{ChatStreamEvent, ExchangeDriver};
use crate::transport::{ConnectionConfig, Transport};
use crate::types::{
    CheckFailure, CheckResult, LlmResult, Message, MessageRole, ModelInfo, ProviderConfig,
    RequestOptions,
};

/// Default Anthropic API endpoint
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
/// API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic provider
pub struct AnthropicProvider {
    config: ProviderConfig,
    credentials: Arc<dyn CredentialStore>,
    transport: Arc<dyn Transport>,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with the given configuration
    pub fn new(
        config: ProviderConfig,
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            credentials,
            transport,
        }
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(ANTHROPIC_BASE_URL)
    }

    /// Build the request body for the API.
    ///
    /// System messages go into the top-level `system` field, not the
    /// messages array.
    fn build_request_body(
        &self,
        model: &str,
        messages: &[Message],
        options: &RequestOptions,
    ) -> serde_json::Value {
        let mut api_messages: Vec<serde_json::Value> = Vec::new();
        let mut system_parts: Vec<&str> = Vec::new();

        for msg in messages {
            match msg.role {
                MessageRole::System => system_parts.push(&msg.content),
                MessageRole::User => api_messages
                    .push(serde_json::json!({"role": "user", "content": msg.content})),
                MessageRole::Assistant => api_messages
                    .push(serde_json::json!({"role": "assistant", "content": msg.content})),
            }
        }

        let mut body = serde_json::json!({
            "model": model,
            "messages": api_messages,
            "stream": true,
            "temperature": options.temperature.unwrap_or(self.config.temperature),
            "max_tokens": options.max_output_tokens.unwrap_or(self.config.max_tokens),
        });
        if !system_parts.is_empty() {
            body["system"] = serde_json::json!(system_parts.join("\n\n"));
        }
        if let Some(obj) = body.as_object_mut() {
            for (key, value) in &self.config.options {
                obj.insert(key.clone(), value.clone());
            }
            for (key, value) in &options.extra {
                obj.insert(key.clone(), value.clone());
            }
        }
        body
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Anthropic is served from the static catalog.
    async fn fetch_models(&self) -> LlmResult<Option<Vec<ModelInfo>>> {
        Ok(None)
    }

    async fn check_connection(&self) -> CheckResult {
        let Some(api_key) = self.credentials.api_key(None) else {
            return CheckResult::failure(
                CheckFailure::MissingApiKey,
                "No API key configured for Anthropic",
            );
        };

        let url = format!("{}/v1/models", self.base_url());
        let config = ConnectionConfig::get(url)
            .with_header("x-api-key", api_key)
            .with_header("anthropic-version", ANTHROPIC_VERSION)
            .with_tag("anthropic-check");
        probe_connection(self.transport.as_ref(), config).await
    }

    async fn chat_stream(
        &self,
        model: &str,
        messages: Vec<Message>,
        events: mpsc::Sender<ChatStreamEvent>,
        options: RequestOptions,
    ) {
        let Some(api_key) = self.credentials.api_key(Some(model)) else {
            tracing::warn!("Anthropic: no API key configured, not connecting");
            let _ = events
                .send(ChatStreamEvent::Error {
                    error: missing_api_key_error("anthropic"),
                })
                .await;
            return;
        };

        let model = if model.is_empty() {
            self.config.model.as_str()
        } else {
            model
        };
        let url = format!("{}/v1/messages", self.base_url());
        let body = self.build_request_body(model, &messages, &options);
        tracing::debug!("Anthropic chat_stream POST {}", url);

        let config = ConnectionConfig::post(url)
            .with_header("x-api-key", api_key)
            .with_header("anthropic-version", ANTHROPIC_VERSION)
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "text/event-stream")
            .with_body(body)
            .with_tag("anthropic-chat");

        ExchangeDriver::spawn(
            self.transport.as_ref(),
            config,
            Box::new(AnthropicAdapter::new()),
            "anthropic",
            events,
        );
    }

    fn cancel_stream(&self) {
        self.transport.stop();
    }

    fn shutdown(&self) {
        self.transport.shutdown();
    }
}
