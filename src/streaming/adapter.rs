//! Stream Adapter Trait
//!
//! Defines the common interface that all provider wire adapters implement.

use super::unified::{AdapterError, ChatStreamEvent};

/// Trait for adapting provider-specific stream formats to unified events.
///
/// All provider adapters (Gemini, OpenAI, Anthropic, Ollama) implement this
/// trait to provide a consistent interface for stream processing.
pub trait StreamAdapter: Send + Sync {
    /// Returns the provider name for logging and identification.
    fn provider_name(&self) -> &'static str;

    /// Adapt a raw stream line/chunk to unified events.
    ///
    /// A single input line may produce zero, one, or multiple events.
    /// Empty lines, keepalives, and non-payload framing produce zero events.
    ///
    /// # Arguments
    /// * `input` - Raw stream line/chunk from the provider
    ///
    /// # Returns
    /// * `Ok(Vec<ChatStreamEvent>)` - Zero or more unified events
    /// * `Err(AdapterError)` - If the input couldn't be parsed
    fn adapt(&mut self, input: &str) -> Result<Vec<ChatStreamEvent>, AdapterError>;

    /// Reset adapter state for a new stream.
    ///
    /// Called when starting a new streaming session to clear any accumulated
    /// state (dedup sets, partial buffers, response identities).
    fn reset(&mut self) {
        // Default implementation does nothing
        // Stateful adapters should override this
    }
}
