//! Test stubs
//!
//! A scripted transport that records connection attempts and plays back a
//! fixed sequence of transport events, plus small collection helpers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use lumen_llm::{ChatStreamEvent, ConnectionConfig, Transport, TransportEvent};

/// Transport that replays a scripted event sequence on the first `start`.
pub struct StubTransport {
    script: Mutex<Vec<TransportEvent>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
    last_config: Mutex<Option<ConnectionConfig>>,
}

impl StubTransport {
    pub fn new(script: Vec<TransportEvent>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            last_config: Mutex::new(None),
        })
    }

    /// A stub with nothing to play back; useful when the connection should
    /// never be attempted.
    pub fn unreachable() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn last_config(&self) -> Option<ConnectionConfig> {
        self.last_config.lock().unwrap().clone()
    }
}

impl Transport for StubTransport {
    fn start(&self, config: ConnectionConfig, events: mpsc::Sender<TransportEvent>) {
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.last_config.lock().unwrap() = Some(config);
        let script = std::mem::take(&mut *self.script.lock().unwrap());
        tokio::spawn(async move {
            for event in script {
                if events.send(event).await.is_err() {
                    break;
                }
            }
        });
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn shutdown(&self) {
        self.stop();
    }
}

/// A newline-terminated data chunk, the way streaming backends frame lines.
pub fn data_line(payload: &str) -> TransportEvent {
    TransportEvent::Data(format!("{}\n", payload))
}

/// Drain the event channel until the exchange's sender side closes.
pub async fn collect_events(mut rx: mpsc::Receiver<ChatStreamEvent>) -> Vec<ChatStreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

/// Count terminal events (`Complete` + `Error`) in a collected sequence.
pub fn terminal_count(events: &[ChatStreamEvent]) -> usize {
    events.iter().filter(|e| e.is_terminal()).count()
}
