//! OpenAI API Adapter
//!
//! Handles the OpenAI chat-completions SSE format: `data:`-prefixed JSON
//! lines with `choices[].delta` increments and a `[DONE]` sentinel.

use serde::Deserialize;

use crate::streaming::adapter::StreamAdapter;
use crate::streaming::unified::{AdapterError, ChatStreamEvent};
use crate::types::LlmError;

/// Internal event types from the OpenAI SSE format
#[derive(Debug, Deserialize)]
struct OpenAiEvent {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Adapter for the OpenAI SSE format
pub struct OpenAiAdapter;

impl OpenAiAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OpenAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAdapter for OpenAiAdapter {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<ChatStreamEvent>, AdapterError> {
        let trimmed = input.trim();

        // Handle SSE format: "data: {...}"
        let json_str = if let Some(rest) = trimmed.strip_prefix("data:") {
            rest.trim_start()
        } else if trimmed.is_empty() {
            return Ok(vec![]);
        } else {
            trimmed
        };

        if json_str.is_empty() || json_str == "[DONE]" {
            return Ok(vec![]);
        }

        let event: OpenAiEvent =
            serde_json::from_str(json_str).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        let mut events = vec![];

        if let Some(error) = event.error {
            events.push(ChatStreamEvent::Error {
                error: LlmError::Other {
                    message: error.message,
                },
            });
            return Ok(events);
        }

        for choice in event.choices {
            if let Some(content) = choice.delta.and_then(|d| d.content) {
                if !content.is_empty() {
                    events.push(ChatStreamEvent::TextDelta { content });
                }
            }
            if let Some(finish_reason) = choice.finish_reason {
                events.push(ChatStreamEvent::Complete {
                    stop_reason: Some(finish_reason),
                });
            }
        }

        Ok(events)
    }
}
