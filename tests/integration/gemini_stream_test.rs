//! Gemini streaming scenarios over a scripted transport.

use std::sync::Arc;

use tokio::sync::mpsc;

use lumen_llm::{
    ChatProvider, ChatStreamEvent, GeminiProvider, HttpMethod, LlmError, Message, ProviderConfig,
    ProviderType, RequestOptions, StaticCredentials, TransportError, TransportEvent,
};

use crate::stubs::{collect_events, data_line, terminal_count, StubTransport};

const CHUNK_HEL: &str =
    r#"{"responseId":"r1","candidates":[{"content":{"parts":[{"text":"Hel"}]}}]}"#;
const CHUNK_LO_STOP: &str = r#"{"responseId":"r1","candidates":[{"content":{"parts":[{"text":"lo"}]},"finishReason":"STOP"}]}"#;

fn provider_with(stub: Arc<StubTransport>, key: Option<&str>) -> GeminiProvider {
    let config = ProviderConfig {
        provider: ProviderType::Gemini,
        model: "gemini-pro".to_string(),
        ..Default::default()
    };
    let credentials = match key {
        Some(key) => StaticCredentials::new(key),
        None => StaticCredentials::none(),
    };
    GeminiProvider::new(config, credentials, stub)
}

#[tokio::test]
async fn streams_tokens_then_completes_in_order() {
    let stub = StubTransport::new(vec![
        TransportEvent::Open,
        data_line(CHUNK_HEL),
        data_line(CHUNK_LO_STOP),
        TransportEvent::Closed,
    ]);
    let provider = provider_with(stub.clone(), Some("test-key"));

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
                content: "Hel".to_string()
            },
            ChatStreamEvent::TextDelta {
                content: "lo".to_string()
            },
            ChatStreamEvent::Complete {
                stop_reason: Some("STOP".to_string())
            },
        ]
    );
    assert_eq!(stub.starts(), 1);
}

#[tokio::test]
async fn duplicate_chunk_emits_once() {
    let stub = StubTransport::new(vec![
        TransportEvent::Open,
        data_line(CHUNK_HEL),
        data_line(CHUNK_HEL),
        data_line(CHUNK_LO_STOP),
        TransportEvent::Closed,
    ]);
    let provider = provider_with(stub, Some("test-key"));

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
    let hels = events
        .iter()
        .filter(|e| matches!(e, ChatStreamEvent::TextDelta { content } if content == "Hel"))
        .count();
    assert_eq!(hels, 1);
    assert_eq!(terminal_count(&events), 1);
}

#[tokio::test]
async fn identity_change_resets_dedup_state() {
    let repeat_under_r2 =
        r#"{"responseId":"r2","candidates":[{"content":{"parts":[{"text":"Hel"}]}}]}"#;
    let stub = StubTransport::new(vec![
        TransportEvent::Open,
        data_line(CHUNK_HEL),
        data_line(CHUNK_HEL),
        data_line(repeat_under_r2),
        TransportEvent::Closed,
    ]);
    let provider = provider_with(stub, Some("test-key"));

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
    // The duplicate under r1 is dropped; the identical fingerprint under r2
    // goes through after the reset.
    let hels = events
        .iter()
        .filter(|e| matches!(e, ChatStreamEvent::TextDelta { content } if content == "Hel"))
        .count();
    assert_eq!(hels, 2);
}

#[tokio::test]
async fn safety_block_is_content_error_without_complete() {
    let stub = StubTransport::new(vec![
        TransportEvent::Open,
        data_line(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#),
        TransportEvent::Closed,
    ]);
    let provider = provider_with(stub, Some("test-key"));

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
    assert!(events.iter().any(|e| matches!(
        e,
        ChatStreamEvent::Error {
            error: LlmError::ContentBlocked { reason }
        } if reason == "SAFETY"
    )));
    assert!(!events
        .iter()
        .any(|e| matches!(e, ChatStreamEvent::Complete { .. })));
    assert_eq!(terminal_count(&events), 1);
}

#[tokio::test]
async fn http_401_maps_to_authentication_failure() {
    let stub = StubTransport::new(vec![TransportEvent::Error(TransportError::Status {
        status: 401,
        body: "API key not valid".to_string(),
    })]);
    let provider = provider_with(stub, Some("bad-key"));

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
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        ChatStreamEvent::Error {
            error: LlmError::AuthenticationFailed { .. }
        }
    ));
}

#[tokio::test]
async fn interrupted_stream_ends_with_single_network_error() {
    let stub = StubTransport::new(vec![
        TransportEvent::Open,
        data_line(CHUNK_HEL),
        TransportEvent::Error(TransportError::Interrupted("connection reset".to_string())),
    ]);
    let provider = provider_with(stub, Some("test-key"));

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
    assert!(matches!(
        events.last(),
        Some(ChatStreamEvent::Error {
            error: LlmError::NetworkError { .. }
        })
    ));
    assert_eq!(terminal_count(&events), 1);
}

#[tokio::test]
async fn missing_key_errors_without_connecting() {
    let stub = StubTransport::unreachable();
    let provider = provider_with(stub.clone(), None);

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
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        ChatStreamEvent::Error {
            error: LlmError::MissingApiKey { .. }
        }
    ));
    assert_eq!(stub.starts(), 0);
}

#[tokio::test]
async fn request_shape_matches_backend_contract() {
    let stub = StubTransport::new(vec![TransportEvent::Closed]);
    let provider = provider_with(stub.clone(), Some("test-key"));

    let (tx, rx) = mpsc::channel(16);
    provider
        .chat_stream(
            "gemini-pro",
            vec![Message::user("Hi")],
            tx,
            RequestOptions::default(),
        )
        .await;
    let _ = collect_events(rx).await;

    let config = stub.last_config().expect("connection was attempted");
    assert_eq!(config.method, HttpMethod::Post);
    assert!(config
        .url
        .ends_with("/models/gemini-pro:streamGenerateContent?alt=sse"));
    assert!(config
        .headers
        .iter()
        .any(|(name, value)| name == "x-goog-api-key" && value == "test-key"));
    assert!(config
        .headers
        .iter()
        .any(|(name, value)| name == "Accept" && value == "text/event-stream"));

    let body = config.body.expect("request has a body");
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(body["contents"][0]["parts"][0]["text"], "Hi");
    assert!(body["generationConfig"]["temperature"].is_number());
}
