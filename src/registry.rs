//! Provider Registry
//!
//! Maps a configured backend to a provider instance.

use std::sync::Arc;

use crate::credentials::CredentialStore;
use crate::provider::ChatProvider;
use crate::providers::{AnthropicProvider, GeminiProvider, OllamaProvider, OpenAiProvider};
use crate::transport::Transport;
use crate::types::{ProviderConfig, ProviderType};

/// Create the provider instance for a configuration.
///
/// The transport is exclusively owned by the returned provider; don't share
/// one transport between providers.
pub fn create_provider(
    config: ProviderConfig,
    credentials: Arc<dyn CredentialStore>,
    transport: Arc<dyn Transport>,
) -> Box<dyn ChatProvider> {
    match config.provider {
        ProviderType::Gemini => Box::new(GeminiProvider::new(config, credentials, transport)),
        ProviderType::OpenAi => Box::new(OpenAiProvider::new(config, credentials, transport)),
        ProviderType::Anthropic => Box::new(AnthropicProvider::new(config, credentials, transport)),
        ProviderType::Ollama => Box::new(OllamaProvider::new(config, transport)),
    }
}

/// Create a provider from a backend name (accepting common aliases).
///
/// Returns `None` for unknown names.
pub fn create_provider_by_name(
    name: &str,
    mut config: ProviderConfig,
    credentials: Arc<dyn CredentialStore>,
    transport: Arc<dyn Transport>,
) -> Option<Box<dyn ChatProvider>> {
    let provider = ProviderType::from_name(name)?;
    config.provider = provider;
    Some(create_provider(config, credentials, transport))
}

/// Get a list of supported provider names.
pub fn supported_providers() -> &'static [&'static str] {
    &["gemini", "openai", "anthropic", "ollama"]
}
