//! Exchange Driver
//!
//! Runs one streaming exchange: consumes raw transport events, feeds complete
//! lines to the provider's wire adapter, and forwards the resulting unified
//! events to the caller while enforcing the exchange lifecycle rules:
//!
//! - at most one terminal event (`Complete`/`Error`) reaches the caller, and
//!   nothing is forwarded after it;
//! - a cancelled connection ends the exchange silently;
//! - a malformed line is skipped, not fatal — but if the stream ends with no
//!   in-band terminal and nothing ever parsed, the failure surfaces once.

use tokio::sync::mpsc;

use super::adapter::StreamAdapter;
use super::unified::ChatStreamEvent;
use crate::provider::transport_error_to_llm;
use crate::transport::{ConnectionConfig, Transport, TransportError, TransportEvent};
use crate::types::LlmError;

/// Capacity of the raw-chunk channel between transport and driver.
const RAW_CHANNEL_CAPACITY: usize = 64;

/// Drives one exchange from raw transport events to unified events.
pub struct ExchangeDriver {
    provider: &'static str,
    adapter: Box<dyn StreamAdapter>,
    buffer: String,
    terminal_sent: bool,
    parsed_any: bool,
    parse_failure: Option<String>,
}

impl ExchangeDriver {
    /// Create a driver around a freshly constructed wire adapter.
    pub fn new(provider: &'static str, adapter: Box<dyn StreamAdapter>) -> Self {
        Self {
            provider,
            adapter,
            buffer: String::new(),
            terminal_sent: false,
            parsed_any: false,
            parse_failure: None,
        }
    }

    /// Start the connection described by `config` and spawn the processing
    /// task for it. Returns once both are launched.
    pub fn spawn(
        transport: &dyn Transport,
        config: ConnectionConfig,
        adapter: Box<dyn StreamAdapter>,
        provider: &'static str,
        events: mpsc::Sender<ChatStreamEvent>,
    ) {
        let (raw_tx, raw_rx) = mpsc::channel(RAW_CHANNEL_CAPACITY);
        transport.start(config, raw_tx);
        let driver = ExchangeDriver::new(provider, adapter);
        tokio::spawn(driver.run(raw_rx, events));
    }

    /// Consume transport events until the exchange terminates.
    pub async fn run(
        mut self,
        mut raw_rx: mpsc::Receiver<TransportEvent>,
        events: mpsc::Sender<ChatStreamEvent>,
    ) {
        while let Some(event) = raw_rx.recv().await {
            match event {
                TransportEvent::Open => {
                    if !self.terminal_sent {
                        let _ = events.send(ChatStreamEvent::Started).await;
                    }
                }
                TransportEvent::Data(chunk) => {
                    self.buffer.push_str(&chunk);
                    while let Some(line_end) = self.buffer.find('\n') {
                        let line = self.buffer[..line_end].to_string();
                        self.buffer = self.buffer[line_end + 1..].to_string();
                        self.feed_line(&line, &events).await;
                    }
                }
                TransportEvent::Error(TransportError::Cancelled) => {
                    tracing::debug!("{}: exchange cancelled", self.provider);
                    return;
                }
                TransportEvent::Error(e) => {
                    if !self.terminal_sent {
                        self.terminal_sent = true;
                        let _ = events
                            .send(ChatStreamEvent::Error {
                                error: transport_error_to_llm(self.provider, e),
                            })
                            .await;
                    }
                    return;
                }
                TransportEvent::Closed => {
                    let rest = std::mem::take(&mut self.buffer);
                    if !rest.trim().is_empty() {
                        self.feed_line(&rest, &events).await;
                    }
                    self.finish(&events).await;
                    return;
                }
            }
        }
        // Transport dropped its sender without a terminal event; treat as a
        // natural end of stream.
        self.finish(&events).await;
    }

    async fn feed_line(&mut self, line: &str, events: &mpsc::Sender<ChatStreamEvent>) {
        if line.trim().is_empty() {
            return;
        }
        match self.adapter.adapt(line) {
            Ok(adapted) => {
                self.parsed_any = true;
                for event in adapted {
                    if self.terminal_sent {
                        continue;
                    }
                    let terminal = event.is_terminal();
                    let _ = events.send(event).await;
                    if terminal {
                        self.terminal_sent = true;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("{}: failed to parse stream chunk: {}", self.provider, e);
                if self.parse_failure.is_none() {
                    self.parse_failure = Some(e.to_string());
                }
            }
        }
    }

    async fn finish(&mut self, events: &mpsc::Sender<ChatStreamEvent>) {
        if self.terminal_sent {
            return;
        }
        self.terminal_sent = true;
        if !self.parsed_any {
            if let Some(failure) = self.parse_failure.take() {
                let _ = events
                    .send(ChatStreamEvent::Error {
                        error: LlmError::ParseError { message: failure },
                    })
                    .await;
                return;
            }
        }
        // The backend also signals completion by closing the stream.
        let _ = events
            .send(ChatStreamEvent::Complete { stop_reason: None })
            .await;
    }
}
