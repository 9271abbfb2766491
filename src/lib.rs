//! Lumen LLM
//!
//! Provider abstraction layer for Lumen Chat. Hides the differences between
//! LLM backends — framing, chunk semantics, duplicate deliveries, error
//! vocabularies — behind one normalized token-stream interface:
//!
//! - [`ChatProvider`]: the capability set every backend implements (model
//!   catalog, connectivity probe, streaming chat, cancellation).
//! - [`transport`]: the streaming HTTP primitive all providers connect
//!   through, with cooperative cancellation.
//! - [`streaming`]: per-vendor wire adapters normalizing raw chunks into
//!   [`ChatStreamEvent`]s with a single-terminal-event lifecycle.
//!
//! Callers pick a provider via [`registry`], hand `chat_stream` an mpsc
//! sender, and consume events until `Complete` or `Error`.

pub mod catalog;
pub mod credentials;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod streaming;
pub mod transport;
pub mod types;

// Re-export main types
pub use credentials::{CredentialStore, StaticCredentials};
pub use provider::{missing_api_key_error, parse_http_error, ChatProvider};
pub use providers::{AnthropicProvider, GeminiProvider, OllamaProvider, OpenAiProvider};
pub use streaming::{AdapterError, ChatStreamEvent, StreamAdapter};
pub use transport::{
    build_http_client, ConnectionConfig, HttpMethod, HttpTransport, ProxyConfig, ProxyProtocol,
    Transport, TransportError, TransportEvent,
};
pub use types::*;
