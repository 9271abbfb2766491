//! Static Model Catalog
//!
//! Fallback model lists for backends without a dynamic model-listing
//! endpoint. Consulted by callers when a provider's `fetch_models` returns
//! `None`. Kept deliberately small: a few current defaults per vendor, not
//! an exhaustive catalog.

use crate::types::ModelInfo;

/// Look up the built-in model list for a provider name.
///
/// Returns `None` for providers that list models dynamically (or unknown
/// names).
pub fn static_models(provider: &str) -> Option<Vec<ModelInfo>> {
    match provider.to_lowercase().as_str() {
        "gemini" | "google" => Some(vec![
            ModelInfo::new("gemini-2.5-pro")
                .with_label("Gemini 2.5 Pro")
                .with_aliases(vec!["gemini-pro".to_string()]),
            ModelInfo::new("gemini-2.5-flash")
                .with_label("Gemini 2.5 Flash")
                .with_aliases(vec!["gemini-flash".to_string()]),
            ModelInfo::new("gemini-2.5-flash-lite").with_label("Gemini 2.5 Flash-Lite"),
        ]),
        "anthropic" | "claude" => Some(vec![
            ModelInfo::new("claude-sonnet-4-20250514").with_label("Claude Sonnet 4"),
            ModelInfo::new("claude-opus-4-20250514").with_label("Claude Opus 4"),
            ModelInfo::new("claude-3-5-haiku-20241022").with_label("Claude 3.5 Haiku"),
        ]),
        _ => None,
    }
}
