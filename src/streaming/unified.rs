//! Unified Stream Event Types
//!
//! Provider-agnostic event types that all adapters convert to.

use serde::{Deserialize, Serialize};

use crate::types::LlmError;

/// Unified streaming event that all provider adapters convert to.
/// This gives the frontend one consistent shape regardless of LLM provider.
///
/// For one exchange the caller sees `Started`, zero or more `TextDelta`s in
/// content order, then exactly one terminal event (`Complete` or `Error`).
/// An exchange the caller cancels may end without a terminal event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    /// The connection to the backend is established
    Started,

    /// Incremental text from the model
    TextDelta { content: String },

    /// Stream complete
    Complete {
        #[serde(skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },

    /// Terminal error during the exchange
    Error { error: LlmError },
}

impl ChatStreamEvent {
    /// Whether this event ends the exchange.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChatStreamEvent::Complete { .. } | ChatStreamEvent::Error { .. }
        )
    }
}

/// Errors that can occur during stream adaptation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AdapterError {
    /// Invalid format that couldn't be parsed
    InvalidFormat(String),
    /// JSON/data parsing error
    ParseError(String),
    /// Event type not supported by this adapter
    UnsupportedEvent(String),
}

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            AdapterError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AdapterError::UnsupportedEvent(msg) => write!(f, "Unsupported event: {}", msg),
        }
    }
}

impl std::error::Error for AdapterError {}
