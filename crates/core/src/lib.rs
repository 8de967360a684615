//! # Hubblet Core
//!
//! Domain types, traits, and error definitions for the Hubblet assistant
//! builder. This crate has **zero framework dependencies**; it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (language model, embedding API, managed
//! memory service) is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod identity;
pub mod memory;
pub mod message;
pub mod profile;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use identity::UserId;
pub use memory::{MemoryQuery, MemoryRecord, MemoryService, MemoryWrite};
pub use message::{ChatSession, Message, MessageToolCall, Role};
pub use profile::{AssistantProfile, ConfigField};
pub use provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
    ToolDefinition,
};
