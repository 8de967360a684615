//! Builds external clients from configuration.
//!
//! A missing credential yields `None`: the caller degrades the feature
//! (chat disabled, memory skipped) instead of failing the process.

use crate::memory_service::HostedMemoryClient;
use crate::openai_compat::OpenAiCompatProvider;
use hubblet_config::AppConfig;
use hubblet_core::Provider;
use std::sync::Arc;

/// The language-model / embedding provider, if an API key is configured.
pub fn build_provider(config: &AppConfig) -> Option<Arc<dyn Provider>> {
    if !config.has_api_key() {
        tracing::warn!("No API key configured; chat and embeddings are disabled");
        return None;
    }
    let api_key = config.api_key.clone().unwrap_or_default();
    let name = provider_name(&config.api_url);
    Some(Arc::new(OpenAiCompatProvider::new(
        name,
        &config.api_url,
        api_key,
    )))
}

/// The hosted memory client, if a memory API key is configured.
pub fn build_hosted_memory(config: &AppConfig) -> Option<HostedMemoryClient> {
    match config.memory.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            Some(HostedMemoryClient::new(&config.memory.api_url, key))
        }
        _ => {
            tracing::warn!("No memory service API key configured; conversational memory is disabled");
            None
        }
    }
}

/// A short provider label derived from the base URL host.
fn provider_name(api_url: &str) -> &'static str {
    match api_url {
        u if u.contains("api.openai.com") => "openai",
        u if u.contains("openrouter.ai") => "openrouter",
        u if u.contains("localhost:11434") => "ollama",
        _ => "openai-compatible",
    }
}
