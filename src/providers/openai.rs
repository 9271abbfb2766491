//! OpenAI Provider
//!
//! Implementation of the ChatProvider trait for the OpenAI chat-completions
//! API (and compatible backends reached via `base_url`).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::credentials::CredentialStore;
use crate::provider::{fetch_body, missing_api_key_error, probe_connection, ChatProvider};
use crate::streaming::adapters::OpenAiAdapter;
use crate::streaming::{ChatStreamEvent, ExchangeDriver};
use crate::transport::{ConnectionConfig, Transport};
use crate::types::{
    CheckFailure, CheckResult, LlmError, LlmResult, Message, MessageRole, ModelInfo,
    ProviderConfig, RequestOptions,
};

/// Default OpenAI API endpoint
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Model listing response
#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// OpenAI provider
pub struct OpenAiProvider {
    config: ProviderConfig,
    credentials: Arc<dyn CredentialStore>,
    transport: Arc<dyn Transport>,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with the given configuration
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
        self.config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL)
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        model: &str,
        messages: &[Message],
        options: &RequestOptions,
    ) -> serde_json::Value {
        let api_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                };
                serde_json::json!({"role": role, "content": msg.content})
            })
            .collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": api_messages,
            "stream": true,
            "temperature": options.temperature.unwrap_or(self.config.temperature),
            "max_tokens": options.max_output_tokens.unwrap_or(self.config.max_tokens),
        });
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
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn fetch_models(&self) -> LlmResult<Option<Vec<ModelInfo>>> {
        let Some(api_key) = self.credentials.api_key(None) else {
            return Err(missing_api_key_error("openai"));
        };

        let url = format!("{}/models", self.base_url());
        tracing::debug!("OpenAI fetch_models GET {}", url);
        let config = ConnectionConfig::get(url)
            .with_header("Authorization", format!("Bearer {}", api_key))
            .with_tag("openai-models");

        let body = fetch_body(self.transport.as_ref(), config, "openai").await?;
        let list: ModelList = serde_json::from_str(&body).map_err(|e| LlmError::ParseError {
            message: format!("Failed to parse model list: {}", e),
        })?;

        Ok(Some(
            list.data.into_iter().map(|m| ModelInfo::new(m.id)).collect(),
        ))
    }

    async fn check_connection(&self) -> CheckResult {
        let Some(api_key) = self.credentials.api_key(None) else {
            return CheckResult::failure(
                CheckFailure::MissingApiKey,
                "No API key configured for OpenAI",
            );
        };

        let url = format!("{}/models", self.base_url());
        let config = ConnectionConfig::get(url)
            .with_header("Authorization", format!("Bearer {}", api_key))
            .with_tag("openai-check");
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
            tracing::warn!("OpenAI: no API key configured, not connecting");
            let _ = events
                .send(ChatStreamEvent::Error {
                    error: missing_api_key_error("openai"),
                })
                .await;
            return;
        };

        let model = if model.is_empty() {
            self.config.model.as_str()
        } else {
            model
        };
        let url = format!("{}/chat/completions", self.base_url());
        let body = self.build_request_body(model, &messages, &options);
        tracing::debug!("OpenAI chat_stream POST {}", url);

        let config = ConnectionConfig::post(url)
            .with_header("Authorization", format!("Bearer {}", api_key))
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "text/event-stream")
            .with_body(body)
            .with_tag("openai-chat");

        ExchangeDriver::spawn(
            self.transport.as_ref(),
            config,
            Box::new(OpenAiAdapter::new()),
            "openai",
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
