//! Anthropic API Adapter
//!
//! Handles the Anthropic messages SSE format: typed events carried on
//! `data:` lines (`content_block_delta`, `message_delta`, `message_stop`),
//! interleaved with `event:` lines and `ping` keepalives.

use serde::Deserialize;

use crate::streaming::adapter::StreamAdapter;
use crate::streaming::unified::{AdapterError, ChatStreamEvent};
use crate::types::LlmError;

/// Internal event types from the Anthropic SSE format
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicEvent {
    MessageStart,
    ContentBlockStart,
    ContentBlockDelta {
        delta: Delta,
    },
    ContentBlockStop,
    MessageDelta {
        delta: MessageDelta,
    },
    MessageStop,
    Ping,
    Error {
        error: ApiError,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageDelta {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
}

/// Adapter for the Anthropic SSE format
pub struct AnthropicAdapter {
    /// Stop reason announced by `message_delta`, reported on `message_stop`
    pending_stop_reason: Option<String>,
}

impl AnthropicAdapter {
    pub fn new() -> Self {
        Self {
            pending_stop_reason: None,
        }
    }
}

impl Default for AnthropicAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAdapter for AnthropicAdapter {
    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<ChatStreamEvent>, AdapterError> {
        let trimmed = input.trim();

        // SSE streams interleave event:, id:, retry:, and comment lines with
        // the data: payload lines; only the payloads matter here.
        let json_str = if let Some(rest) = trimmed.strip_prefix("data:") {
            rest.trim_start()
        } else if trimmed.starts_with('{') {
            trimmed
        } else {
            return Ok(vec![]);
        };

        if json_str.is_empty() {
            return Ok(vec![]);
        }

        let event: AnthropicEvent =
            serde_json::from_str(json_str).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        let events = match event {
            AnthropicEvent::ContentBlockDelta {
                delta: Delta::TextDelta { text },
            } if !text.is_empty() => {
                vec![ChatStreamEvent::TextDelta { content: text }]
            }
            AnthropicEvent::MessageDelta { delta } => {
                if let Some(reason) = delta.stop_reason {
                    self.pending_stop_reason = Some(reason);
                }
                vec![]
            }
            AnthropicEvent::MessageStop => {
                vec![ChatStreamEvent::Complete {
                    stop_reason: self.pending_stop_reason.take(),
                }]
            }
            AnthropicEvent::Error { error } => {
                let llm_error = match error.error_type.as_deref() {
                    Some("authentication_error") => LlmError::AuthenticationFailed {
                        message: error.message,
                    },
                    _ => LlmError::Other {
                        message: error.message,
                    },
                };
                vec![ChatStreamEvent::Error { error: llm_error }]
            }
            _ => vec![],
        };

        Ok(events)
    }

    fn reset(&mut self) {
        self.pending_stop_reason = None;
    }
}
