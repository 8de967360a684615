//! External collaborator implementations for Hubblet.
//!
//! The language-model/embedding client implements `hubblet_core::Provider`;
//! the hosted memory client implements `hubblet_core::MemoryService`.
//! [`factory`] builds both from configuration.

pub mod factory;
pub mod memory_service;
pub mod openai_compat;

pub use factory::{build_hosted_memory, build_provider};
pub use memory_service::HostedMemoryClient;
pub use openai_compat::OpenAiCompatProvider;

/// Shared HTTP client settings: 120 s timeout, no retries.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}
