//! Ollama Provider
//!
//! Implementation of the ChatProvider trait for a local Ollama server.
//! No API key is involved; connectivity failures mean the server isn't
//! running.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::provider::{fetch_body, probe_connection, ChatProvider};
use crate::streaming::adapters::OllamaAdapter;
use crate::streaming::{ChatStreamEvent, ExchangeDriver};
use crate::transport::{ConnectionConfig, Transport};
use crate::types::{
    CheckResult, LlmError, LlmResult, Message, MessageRole, ModelInfo, ProviderConfig,
    RequestOptions,
};

/// Default Ollama server address
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Tag listing response
#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Ollama provider
pub struct OllamaProvider {
    config: ProviderConfig,
    transport: Arc<dyn Transport>,
}

impl OllamaProvider {
    /// Create a new Ollama provider with the given configuration
    pub fn new(config: ProviderConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Get the server base URL
    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OLLAMA_BASE_URL)
    }

    /// Build the request body for the chat endpoint
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

        let mut model_options = serde_json::json!({
            "temperature": options.temperature.unwrap_or(self.config.temperature),
        });
        if let Some(obj) = model_options.as_object_mut() {
            for (key, value) in &self.config.options {
                obj.insert(key.clone(), value.clone());
            }
            for (key, value) in &options.extra {
                obj.insert(key.clone(), value.clone());
            }
        }

        serde_json::json!({
            "model": model,
            "messages": api_messages,
            "stream": true,
            "options": model_options,
        })
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn fetch_models(&self) -> LlmResult<Option<Vec<ModelInfo>>> {
        let url = format!("{}/api/tags", self.base_url());
        tracing::debug!("Ollama fetch_models GET {}", url);
        let config = ConnectionConfig::get(url).with_tag("ollama-models");

        let body = fetch_body(self.transport.as_ref(), config, "ollama").await?;
        let tags: TagList = serde_json::from_str(&body).map_err(|e| LlmError::ParseError {
            message: format!("Failed to parse tag list: {}", e),
        })?;

        Ok(Some(
            tags.models
                .into_iter()
                .map(|m| ModelInfo::new(m.name))
                .collect(),
        ))
    }

    async fn check_connection(&self) -> CheckResult {
        let url = format!("{}/api/tags", self.base_url());
        let config = ConnectionConfig::get(url).with_tag("ollama-check");
        probe_connection(self.transport.as_ref(), config).await
    }

    async fn chat_stream(
        &self,
        model: &str,
        messages: Vec<Message>,
        events: mpsc::Sender<ChatStreamEvent>,
        options: RequestOptions,
    ) {
        let model = if model.is_empty() {
            self.config.model.as_str()
        } else {
            model
        };
        let url = format!("{}/api/chat", self.base_url());
        let body = self.build_request_body(model, &messages, &options);
        tracing::debug!("Ollama chat_stream POST {}", url);

        let config = ConnectionConfig::post(url)
            .with_header("Content-Type", "application/json")
            .with_body(body)
            .with_tag("ollama-chat");

        ExchangeDriver::spawn(
            self.transport.as_ref(),
            config,
            Box::new(OllamaAdapter::new()),
            "ollama",
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
