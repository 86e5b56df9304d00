//! Endpoint selection — builds the configured model endpoint.
//!
//! A deliberately simple selector: the configured provider name picks a
//! base URL and credentials, and everything speaks through the
//! [`ModelEndpoint`] trait. New providers are added by implementing that
//! trait, not by branching inside the conversation loop.

use ironquill_config::AppConfig;
use ironquill_core::ModelEndpoint;
use std::sync::Arc;

use crate::openai_compat::OpenAiCompatEndpoint;

/// Resolved connection settings for the default provider.
struct Resolved {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
}

fn resolve(config: &AppConfig) -> Resolved {
    let name = config.default_provider.clone();
    let overrides = config.providers.get(&name);

    Resolved {
        base_url: overrides
            .and_then(|p| p.api_url.clone())
            .unwrap_or_else(|| default_base_url(&name)),
        api_key: overrides
            .and_then(|p| p.api_key.clone())
            .or_else(|| config.api_key.clone())
            .unwrap_or_default(),
        model: overrides
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone()),
        name,
    }
}

/// Build the configured model endpoint.
pub fn build_endpoint(config: &AppConfig) -> Arc<dyn ModelEndpoint> {
    let resolved = resolve(config);
    Arc::new(OpenAiCompatEndpoint::new(
        resolved.name,
        resolved.base_url,
        resolved.api_key,
    ))
}

/// The model the conversation should use: the per-provider override when
/// present, the global default otherwise.
pub fn model_for(config: &AppConfig) -> String {
    resolve(config).model
}

/// Base URLs for well-known providers. Unknown names fall back to
/// OpenRouter, which proxies most models.
pub fn default_base_url(provider: &str) -> String {
    match provider {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "together" => "https://api.together.xyz/v1",
        _ => "https://openrouter.ai/api/v1",
    }
    .to_string()
}
