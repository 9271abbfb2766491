//! Model catalog: dynamic listings and the static fallback.

use lumen_llm::{
    catalog, ChatProvider, GeminiProvider, LlmError, OllamaProvider, OpenAiProvider,
    ProviderConfig, ProviderType, StaticCredentials, TransportError, TransportEvent,
};

use crate::stubs::StubTransport;

fn config(provider: ProviderType) -> ProviderConfig {
    ProviderConfig {
        provider,
        ..Default::default()
    }
}

#[tokio::test]
async fn openai_lists_models_dynamically() {
    let body = r#"{"object":"list","data":[{"id":"gpt-4o"},{"id":"gpt-4o-mini"}]}"#;
    let stub = StubTransport::new(vec![
        TransportEvent::Open,
        TransportEvent::Data(body.to_string()),
        TransportEvent::Closed,
    ]);
    let provider = OpenAiProvider::new(
        config(ProviderType::OpenAi),
        StaticCredentials::new("sk-test"),
        stub.clone(),
    );

    let models = provider.fetch_models().await.unwrap().unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].id, "gpt-4o");
    assert_eq!(stub.starts(), 1);
}

#[tokio::test]
async fn openai_listing_body_may_arrive_in_pieces() {
    let stub = StubTransport::new(vec![
        TransportEvent::Open,
        TransportEvent::Data(r#"{"data":[{"id":"gpt"#.to_string()),
        TransportEvent::Data(r#"-4o"}]}"#.to_string()),
        TransportEvent::Closed,
    ]);
    let provider = OpenAiProvider::new(
        config(ProviderType::OpenAi),
        StaticCredentials::new("sk-test"),
        stub,
    );

    let models = provider.fetch_models().await.unwrap().unwrap();
    assert_eq!(models[0].id, "gpt-4o");
}

#[tokio::test]
async fn openai_listing_auth_failure_propagates() {
    let stub = StubTransport::new(vec![TransportEvent::Error(TransportError::Status {
        status: 401,
        body: "bad key".to_string(),
    })]);
    let provider = OpenAiProvider::new(
        config(ProviderType::OpenAi),
        StaticCredentials::new("sk-bad"),
        stub,
    );

    let result = provider.fetch_models().await;
    assert!(matches!(
        result,
        Err(LlmError::AuthenticationFailed { .. })
    ));
}

#[tokio::test]
async fn ollama_lists_local_models() {
    let body = r#"{"models":[{"name":"llama3.2:latest"},{"name":"qwen2.5:7b"}]}"#;
    let stub = StubTransport::new(vec![
        TransportEvent::Open,
        TransportEvent::Data(body.to_string()),
        TransportEvent::Closed,
    ]);
    let provider = OllamaProvider::new(config(ProviderType::Ollama), stub.clone());

    let models = provider.fetch_models().await.unwrap().unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].id, "llama3.2:latest");

    let request = stub.last_config().unwrap();
    assert!(request.url.ends_with("/api/tags"));
}

#[tokio::test]
async fn static_catalog_backs_providers_without_listing() {
    let stub = StubTransport::unreachable();
    let provider = GeminiProvider::new(
        config(ProviderType::Gemini),
        StaticCredentials::new("test-key"),
        stub.clone(),
    );

    // No dynamic catalog: the caller falls back to the static table.
    let dynamic = provider.fetch_models().await.unwrap();
    assert!(dynamic.is_none());
    assert_eq!(stub.starts(), 0);

    let fallback = catalog::static_models(provider.name()).unwrap();
    assert!(fallback.iter().any(|m| m.id.starts_with("gemini-")));
}
