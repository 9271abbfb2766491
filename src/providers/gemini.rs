//! Gemini Provider
//!
//! Implementation of the ChatProvider trait for Google's Gemini API.
//! Streams via `:streamGenerateContent?alt=sse`, which delivers standalone
//! JSON objects per chunk; the wire quirks (redelivered chunks, mid-stream
//! response-identity changes) are handled by [`GeminiAdapter`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::credentials::CredentialStore;
use crate::provider::{missing_api_key_error, probe_connection, ChatProvider};
use crate::streaming::adapters::GeminiAdapter;
use crate::streaming::{ChatStreamEvent, ExchangeDriver};
use crate::transport::{ConnectionConfig, Transport};
use crate::types::{
    CheckFailure, CheckResult, LlmResult, Message, MessageRole, ModelInfo, ProviderConfig,
    RequestOptions,
};

/// Default Gemini API endpoint
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider
pub struct GeminiProvider {
    config: ProviderConfig,
    credentials: Arc<dyn CredentialStore>,
    transport: Arc<dyn Transport>,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given configuration
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
        self.config.base_url.as_deref().unwrap_or(GEMINI_BASE_URL)
    }

    /// Streaming endpoint for a model, in SSE mode
    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url(),
            model
        )
    }

    /// Build the request body for the API.
    ///
    /// User turns keep role `user`; assistant turns map to the vendor's
    /// `model` role; system messages are folded into `systemInstruction`.
    fn build_request_body(
        &self,
        messages: &[Message],
        options: &RequestOptions,
    ) -> serde_json::Value {
        let mut contents: Vec<serde_json::Value> = Vec::new();
        let mut system_parts: Vec<&str> = Vec::new();

        for msg in messages {
            match msg.role {
                MessageRole::System => system_parts.push(&msg.content),
                MessageRole::User => contents.push(serde_json::json!({
                    "role": "user",
                    "parts": [{"text": msg.content}]
                })),
                MessageRole::Assistant => contents.push(serde_json::json!({
                    "role": "model",
                    "parts": [{"text": msg.content}]
                })),
            }
        }

        let mut generation_config = serde_json::json!({
            "temperature": options.temperature.unwrap_or(self.config.temperature),
            "maxOutputTokens": options.max_output_tokens.unwrap_or(self.config.max_tokens),
        });
        // Request-shaping only: configured and per-request vendor options are
        // forwarded without interpretation.
        if let Some(obj) = generation_config.as_object_mut() {
            for (key, value) in &self.config.options {
                obj.insert(key.clone(), value.clone());
            }
            for (key, value) in &options.extra {
                obj.insert(key.clone(), value.clone());
            }
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": generation_config,
        });
        if !system_parts.is_empty() {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{"text": system_parts.join("\n\n")}]
            });
        }
        body
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Gemini is served from the static catalog.
    async fn fetch_models(&self) -> LlmResult<Option<Vec<ModelInfo>>> {
        Ok(None)
    }

    async fn check_connection(&self) -> CheckResult {
        let Some(api_key) = self.credentials.api_key(None) else {
            return CheckResult::failure(
                CheckFailure::MissingApiKey,
                "No API key configured for Gemini",
            );
        };

        let url = format!("{}/models?pageSize=1", self.base_url());
        let config = ConnectionConfig::get(url)
            .with_header("x-goog-api-key", api_key)
            .with_tag("gemini-check");
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
            tracing::warn!("Gemini: no API key configured, not connecting");
            let _ = events
                .send(ChatStreamEvent::Error {
                    error: missing_api_key_error("gemini"),
                })
                .await;
            return;
        };

        let model = if model.is_empty() {
            self.config.model.as_str()
        } else {
            model
        };
        let url = self.stream_url(model);
        let body = self.build_request_body(&messages, &options);
        tracing::debug!("Gemini chat_stream POST {}", url);

        let config = ConnectionConfig::post(url)
            .with_header("x-goog-api-key", api_key)
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "text/event-stream")
            .with_header("Connection", "keep-alive")
            .with_body(body)
            .with_tag("gemini-chat");

        ExchangeDriver::spawn(
            self.transport.as_ref(),
            config,
            Box::new(GeminiAdapter::new()),
            "gemini",
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
