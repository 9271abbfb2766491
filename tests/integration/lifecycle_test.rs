//! Exchange lifecycle: cancellation and shutdown safety.

use std::sync::Arc;

use tokio::sync::mpsc;

use lumen_llm::{
    ChatProvider, ChatStreamEvent, GeminiProvider, Message, ProviderConfig, ProviderType,
    RequestOptions, StaticCredentials, TransportError, TransportEvent,
};

use crate::stubs::{collect_events, data_line, terminal_count, StubTransport};

fn provider_with(stub: Arc<StubTransport>) -> GeminiProvider {
    let config = ProviderConfig {
        provider: ProviderType::Gemini,
        model: "gemini-pro".to_string(),
        ..Default::default()
    };
    GeminiProvider::new(config, StaticCredentials::new("test-key"), stub)
}

#[tokio::test]
async fn cancel_before_any_exchange_is_safe() {
    let stub = StubTransport::unreachable();
    let provider = provider_with(stub.clone());

    provider.cancel_stream();
    provider.cancel_stream();
    assert_eq!(stub.starts(), 0);
}

#[tokio::test]
async fn cancel_after_completion_fires_no_further_events() {
    let stub = StubTransport::new(vec![
        TransportEvent::Open,
        data_line(r#"{"responseId":"r1","candidates":[{"content":{"parts":[{"text":"Hi"}]},"finishReason":"STOP"}]}"#),
        TransportEvent::Closed,
    ]);
    let provider = provider_with(stub);

    let (tx, rx) = mpsc::channel(16);
    provider
        .chat_stream(
            "gemini-pro",
            vec![Message::user("Hi")],
            tx,
            RequestOptions::default(),
        )
        .await;

    // Channel is fully drained and closed: the exchange is over.
    let events = collect_events(rx).await;
    assert_eq!(terminal_count(&events), 1);

    provider.cancel_stream();
    provider.cancel_stream();
}

#[tokio::test]
async fn cancelled_exchange_ends_without_terminal_event() {
    let stub = StubTransport::new(vec![
        TransportEvent::Open,
        data_line(r#"{"responseId":"r1","candidates":[{"content":{"parts":[{"text":"par"}]}}]}"#),
        TransportEvent::Error(TransportError::Cancelled),
    ]);
    let provider = provider_with(stub);

    let (tx, rx) = mpsc::channel(16);
    provider
        .chat_stream(
            "gemini-pro",
            vec![Message::user("Hi")],
            tx,
            RequestOptions::default(),
        )
        .await;

    let events = collect_events(rx).await;
    assert_eq!(
        events,
        vec![
            ChatStreamEvent::Started,
            ChatStreamEvent::TextDelta {
                content: "par".to_string()
            },
        ]
    );
    assert_eq!(terminal_count(&events), 0);
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let stub = StubTransport::unreachable();
    let provider = provider_with(stub.clone());

    provider.shutdown();
    provider.shutdown();
    assert!(stub.stops() >= 2);
}

#[tokio::test]
async fn tokens_never_follow_the_terminal_event() {
    // The backend keeps sending after announcing completion; nothing may
    // reach the caller past the terminal.
    let stub = StubTransport::new(vec![
        TransportEvent::Open,
        data_line(r#"{"responseId":"r1","candidates":[{"content":{"parts":[{"text":"a"}]},"finishReason":"STOP"}]}"#),
        data_line(r#"{"responseId":"r1","candidates":[{"content":{"parts":[{"text":"late"}]}}]}"#),
        TransportEvent::Closed,
    ]);
    let provider = provider_with(stub);

    let (tx, rx) = mpsc::channel(16);
    provider
        .chat_stream(
            "gemini-pro",
            vec![Message::user("Hi")],
            tx,
            RequestOptions::default(),
        )
        .await;

    let events = collect_events(rx).await;
    assert!(events.last().unwrap().is_terminal());
    assert_eq!(terminal_count(&events), 1);
    assert!(!events
        .iter()
        .any(|e| matches!(e, ChatStreamEvent::TextDelta { content } if content == "late")));
}
