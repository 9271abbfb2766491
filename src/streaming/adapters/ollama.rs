//! Ollama API Adapter
//!
//! Handles Ollama's newline-delimited JSON stream: one bare JSON object per
//! line, text in `message.content` (chat endpoint) or `response` (generate
//! endpoint), completion flagged with `done: true`.

use serde::Deserialize;

use crate::streaming::adapter::StreamAdapter;
use crate::streaming::unified::{AdapterError, ChatStreamEvent};

/// Ollama response format
#[derive(Debug, Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

/// Adapter for the Ollama JSON stream format
pub struct OllamaAdapter;

impl OllamaAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OllamaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAdapter for OllamaAdapter {
    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<ChatStreamEvent>, AdapterError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(vec![]);
        }

        let chunk: OllamaChunk =
            serde_json::from_str(trimmed).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        let mut events = vec![];

        let content = chunk
            .message
            .map(|m| m.content)
            .or(chunk.response)
            .unwrap_or_default();
        if !content.is_empty() {
            events.push(ChatStreamEvent::TextDelta { content });
        }

        if chunk.done {
            events.push(ChatStreamEvent::Complete {
                stop_reason: chunk.done_reason.or_else(|| Some("stop".to_string())),
            });
        }

        Ok(events)
    }
}
