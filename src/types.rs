//! LLM Types
//!
//! Core types for LLM provider interactions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supported LLM provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Gemini,
    OpenAi,
    Anthropic,
    Ollama,
}

impl ProviderType {
    /// Resolve a configured backend name (including common aliases) to a
    /// provider type. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "gemini" | "gemini-api" | "google" | "google-ai" => Some(ProviderType::Gemini),
            "openai" | "openai-api" | "gpt" => Some(ProviderType::OpenAi),
            "anthropic" | "claude" | "claude-api" => Some(ProviderType::Anthropic),
            "ollama" | "ollama-api" => Some(ProviderType::Ollama),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::Gemini => write!(f, "gemini"),
            ProviderType::OpenAi => write!(f, "openai"),
            ProviderType::Anthropic => write!(f, "anthropic"),
            ProviderType::Ollama => write!(f, "ollama"),
        }
    }
}

/// Configuration for an LLM provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The provider type
    pub provider: ProviderType,
    /// Base URL override (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Default model to use when a call doesn't name one
    pub model: String,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Provider-specific options, forwarded into the request untouched
    #[serde(default)]
    pub options: HashMap<String, serde_json::Value>,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::Gemini,
            base_url: None,
            model: "gemini-2.5-flash".to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            options: HashMap::new(),
        }
    }
}

/// Per-request options for provider behavior.
///
/// Fields the provider interprets are explicit; everything else rides in
/// `extra` and is merged verbatim into the vendor's generation-config object,
/// so callers can forward vendor options the provider doesn't know about.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RequestOptions {
    /// Optional temperature override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Optional max output tokens override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Additional vendor options, forwarded without interpretation.
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl Message {
    /// Create a message with the given role
    pub fn text(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(MessageRole::Assistant, content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(MessageRole::System, content)
    }
}

/// An entry in a provider's model catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier used in requests
    pub id: String,
    /// Human-readable display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Alternative identifiers accepted for this model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
}

impl ModelInfo {
    /// Create a model entry with just an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            aliases: None,
        }
    }

    /// Set the display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set alternative identifiers
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = Some(aliases);
        self
    }
}

/// Failure classification for a connectivity probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckFailure {
    /// No API key configured
    MissingApiKey,
    /// The backend rejected the credential
    AuthenticationFailed,
    /// The backend could not be reached
    NetworkError,
    /// The probe timed out
    Timeout,
    /// Anything else
    Unknown,
}

/// Result of a connectivity/credential probe.
///
/// Always returned as a value; a probe never surfaces a thrown error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the provider is reachable with the configured credential
    pub ok: bool,
    /// Failure classification when `ok` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<CheckFailure>,
    /// Human-readable detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    /// A successful probe
    pub fn success() -> Self {
        Self {
            ok: true,
            reason: None,
            message: None,
        }
    }

    /// A failed probe with a classification and detail message
    pub fn failure(reason: CheckFailure, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
            message: Some(message.into()),
        }
    }
}

/// Error types for LLM operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmError {
    /// No API key configured for the provider
    MissingApiKey { message: String },
    /// Authentication failed (invalid API key)
    AuthenticationFailed { message: String },
    /// Network/connection error
    NetworkError { message: String },
    /// The request or probe timed out
    Timeout { message: String },
    /// The backend blocked the content via a safety filter
    ContentBlocked { reason: String },
    /// Response parsing error
    ParseError { message: String },
    /// Other error
    Other { message: String },
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::MissingApiKey { message } => {
                write!(f, "Missing API key: {}", message)
            }
            LlmError::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            LlmError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            LlmError::Timeout { message } => {
                write!(f, "Timed out: {}", message)
            }
            LlmError::ContentBlocked { reason } => {
                write!(f, "Content blocked: {}", reason)
            }
            LlmError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            LlmError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;
