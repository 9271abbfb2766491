//! Gemini API Adapter
//!
//! Handles Gemini's streaming format: standalone JSON objects rather than
//! typed event-stream frames, delivered either bare or behind an SSE
//! `data:` prefix depending on the endpoint's `alt` mode.
//!
//! Two quirks of this backend shape the adapter:
//!
//! - the same increment can be delivered more than once; duplicates are
//!   detected by fingerprint (response identity + chunk text length) and
//!   dropped silently;
//! - the server may start a new logical response mid-connection, signalled
//!   by a changed `responseId`; dedup state and the length counter are reset
//!   when that happens so the new series is not filtered against the old.
//!
//! When the server sends no `responseId` at all, the fingerprint degenerates
//! to the chunk length alone, which can misclassify genuinely repeated
//! same-length increments. Known approximation, kept to match the backend's
//! observed redelivery behavior.

use std::collections::HashSet;

use serde::Deserialize;

use crate::streaming::adapter::StreamAdapter;
use crate::streaming::unified::{AdapterError, ChatStreamEvent};
use crate::types::LlmError;

/// One streamed generation chunk
#[derive(Debug, Deserialize)]
struct GeminiChunk {
    #[serde(default, rename = "responseId")]
    response_id: Option<String>,
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

/// Adapter for the Gemini streaming format
pub struct GeminiAdapter {
    /// Identity of the response series currently being received
    response_id: Option<String>,
    /// Fingerprints of increments already emitted for this series
    seen: HashSet<String>,
    /// Total text length emitted for this series
    received_len: usize,
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self {
            response_id: None,
            seen: HashSet::new(),
            received_len: 0,
        }
    }

    fn fingerprint(&self, text_len: usize) -> String {
        format!(
            "{}:{}",
            self.response_id.as_deref().unwrap_or(""),
            text_len
        )
    }

    /// Adopt a new response identity, resetting per-series state when it
    /// differs from the tracked one.
    fn track_identity(&mut self, id: &str) {
        if id.is_empty() || self.response_id.as_deref() == Some(id) {
            return;
        }
        if self.response_id.is_some() {
            tracing::debug!(
                "gemini: new response series {} (was {:?}), resetting dedup state",
                id,
                self.response_id
            );
        }
        self.seen.clear();
        self.received_len = 0;
        self.response_id = Some(id.to_string());
    }
}

impl Default for GeminiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAdapter for GeminiAdapter {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<ChatStreamEvent>, AdapterError> {
        let trimmed = input.trim();

        // Payload lines are JSON objects, optionally behind an SSE prefix.
        let json_str = if let Some(rest) = trimmed.strip_prefix("data:") {
            rest.trim_start()
        } else {
            trimmed
        };

        // Skip framing noise: blank lines, SSE control lines and comments,
        // and the array punctuation the non-SSE endpoint emits.
        if json_str.is_empty()
            || json_str == "[DONE]"
            || matches!(json_str, "[" | "]" | ",")
            || trimmed.starts_with("event:")
            || trimmed.starts_with("id:")
            || trimmed.starts_with("retry:")
            || trimmed.starts_with(':')
        {
            return Ok(vec![]);
        }

        let json_str = json_str.strip_suffix(',').unwrap_or(json_str);

        let chunk: GeminiChunk = serde_json::from_str(json_str)
            .map_err(|e| AdapterError::ParseError(e.to_string()))?;

        let mut events = vec![];

        if let Some(id) = &chunk.response_id {
            self.track_identity(id);
        }

        let candidate = chunk.candidates.first();

        let text: String = candidate
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();

        if !text.is_empty() {
            let fingerprint = self.fingerprint(text.len());
            if self.seen.contains(&fingerprint) {
                tracing::debug!(
                    "gemini: dropping redelivered chunk ({} bytes, {} received)",
                    text.len(),
                    self.received_len
                );
            } else {
                self.seen.insert(fingerprint);
                self.received_len += text.len();
                events.push(ChatStreamEvent::TextDelta { content: text });
            }
        }

        // A prompt block is reported as its own failure class, on top of any
        // text this chunk carried.
        if let Some(reason) = chunk
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            events.push(ChatStreamEvent::Error {
                error: LlmError::ContentBlocked {
                    reason: reason.to_string(),
                },
            });
            return Ok(events);
        }

        if let Some(reason) = candidate.and_then(|c| c.finish_reason.as_deref()) {
            events.push(ChatStreamEvent::Complete {
                stop_reason: Some(reason.to_string()),
            });
        }

        Ok(events)
    }

    fn reset(&mut self) {
        self.response_id = None;
        self.seen.clear();
        self.received_len = 0;
    }
}
