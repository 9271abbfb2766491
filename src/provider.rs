//! LLM Provider Trait
//!
//! Defines the common interface for all LLM providers.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::streaming::ChatStreamEvent;
use crate::transport::{ConnectionConfig, Transport, TransportError, TransportEvent};
use crate::types::{
    CheckFailure, CheckResult, LlmError, LlmResult, Message, ModelInfo, ProviderConfig,
    RequestOptions,
};

/// How long a connectivity probe waits for a first transport event.
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a model-catalog fetch may take end to end.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait that all LLM providers must implement.
///
/// Provides a unified interface for:
/// - Listing the backend's model catalog (fetch_models)
/// - Probing connectivity and credentials (check_connection)
/// - Streaming chat exchanges (chat_stream / cancel_stream)
///
/// One provider instance runs one exchange at a time; starting a new exchange
/// aborts the connection of any exchange still active on the instance.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the configured default model.
    fn model(&self) -> &str;

    /// Get the configuration for this provider.
    fn config(&self) -> &ProviderConfig;

    /// List available models (if supported by provider).
    ///
    /// Returns `None` if the backend has no dynamic catalog; callers fall
    /// back to the static catalog in [`crate::catalog`].
    async fn fetch_models(&self) -> LlmResult<Option<Vec<ModelInfo>>>;

    /// Probe whether the backend is reachable with the configured credential.
    ///
    /// Always returns a value. A missing credential short-circuits without
    /// touching the network.
    async fn check_connection(&self) -> CheckResult;

    /// Start a streaming chat exchange.
    ///
    /// Returns once the exchange is launched; tokens, completion, and errors
    /// are delivered through `events`. Exactly one terminal event
    /// (`Complete` or `Error`) fires per exchange, except for exchanges the
    /// caller cancels, which end silently. A missing credential is reported
    /// immediately through `events` with no connection attempt.
    async fn chat_stream(
        &self,
        model: &str,
        messages: Vec<Message>,
        events: mpsc::Sender<ChatStreamEvent>,
        options: RequestOptions,
    );

    /// Abort the active exchange, if any.
    ///
    /// Safe to call from any state, including before any exchange started
    /// and repeatedly after one terminated. No events fire as a result.
    fn cancel_stream(&self);

    /// Release provider and transport resources. Safe to call multiple times.
    fn shutdown(&self);
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::MissingApiKey {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to map HTTP error status codes into the error taxonomy
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        408 => LlmError::Timeout {
            message: format!("{}: Request timed out", provider),
        },
        _ => LlmError::Other {
            message: format!("{}: HTTP {}: {}", provider, status, body),
        },
    }
}

/// Map a transport failure into the provider error taxonomy.
pub fn transport_error_to_llm(provider: &str, error: TransportError) -> LlmError {
    match error {
        TransportError::Network(message) => LlmError::NetworkError {
            message: format!("{}: {}", provider, message),
        },
        TransportError::Status { status, body } => parse_http_error(status, &body, provider),
        TransportError::Interrupted(message) => LlmError::NetworkError {
            message: format!("{}: stream interrupted: {}", provider, message),
        },
        TransportError::Cancelled => LlmError::Other {
            message: format!("{}: connection cancelled", provider),
        },
    }
}

/// Run a connectivity probe over the provider's transport.
///
/// The first transport event decides the verdict; the connection is torn
/// down afterwards.
pub(crate) async fn probe_connection(
    transport: &dyn Transport,
    config: ConnectionConfig,
) -> CheckResult {
    let (tx, mut rx) = mpsc::channel(8);
    transport.start(config, tx);

    let verdict = match tokio::time::timeout(CHECK_TIMEOUT, rx.recv()).await {
        Err(_) => CheckResult::failure(CheckFailure::Timeout, "connection check timed out"),
        Ok(None) => CheckResult::failure(
            CheckFailure::Unknown,
            "transport closed without reporting an event",
        ),
        Ok(Some(TransportEvent::Open))
        | Ok(Some(TransportEvent::Data(_)))
        | Ok(Some(TransportEvent::Closed)) => CheckResult::success(),
        Ok(Some(TransportEvent::Error(e))) => match e {
            TransportError::Status {
                status: status @ (401 | 403),
                ..
            } => CheckResult::failure(
                CheckFailure::AuthenticationFailed,
                format!("credential rejected (HTTP {})", status),
            ),
            TransportError::Status { status: 408, .. } => {
                CheckResult::failure(CheckFailure::Timeout, "HTTP 408")
            }
            TransportError::Status { status, .. } => {
                CheckResult::failure(CheckFailure::Unknown, format!("HTTP {}", status))
            }
            TransportError::Network(message) | TransportError::Interrupted(message) => {
                CheckResult::failure(CheckFailure::NetworkError, message)
            }
            TransportError::Cancelled => {
                CheckResult::failure(CheckFailure::Unknown, "check cancelled")
            }
        },
    };

    transport.stop();
    verdict
}

/// Fetch a complete (non-incremental) response body over the transport.
///
/// Used for model-catalog endpoints; chunks are concatenated until the
/// stream closes.
pub(crate) async fn fetch_body(
    transport: &dyn Transport,
    config: ConnectionConfig,
    provider: &'static str,
) -> LlmResult<String> {
    let (tx, mut rx) = mpsc::channel(32);
    transport.start(config, tx);

    let mut body = String::new();
    loop {
        match tokio::time::timeout(FETCH_TIMEOUT, rx.recv()).await {
            Err(_) => {
                return Err(LlmError::Timeout {
                    message: format!("{}: model listing timed out", provider),
                })
            }
            Ok(None) | Ok(Some(TransportEvent::Closed)) => return Ok(body),
            Ok(Some(TransportEvent::Open)) => {}
            Ok(Some(TransportEvent::Data(chunk))) => body.push_str(&chunk),
            Ok(Some(TransportEvent::Error(e))) => return Err(transport_error_to_llm(provider, e)),
        }
    }
}
