//! Memory service trait: conversational memory scoped by user and assistant.
//!
//! The memory service stores chat turns and returns semantically related
//! facts before the next turn. Records are tagged with a `user_id` and an
//! optional `agent_id` (the assistant name). The core treats the store as
//! opaque: it only issues `search` and `add`.

use crate::error::MemoryError;
use crate::message::Message;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A memory record returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Service-assigned identifier, when the service provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The remembered text
    #[serde(default, alias = "text")]
    pub memory: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    /// Relevance score (set by search operations)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl MemoryRecord {
    /// A record with only text and an optional id.
    pub fn new(id: Option<&str>, memory: impl Into<String>) -> Self {
        Self {
            id: id.map(String::from),
            memory: memory.into(),
            user_id: None,
            agent_id: None,
            score: None,
            created_at: None,
        }
    }
}

/// A semantic search against the memory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryQuery {
    /// The search text
    pub text: String,

    /// Canonical user identity (always required)
    pub user_id: String,

    /// Assistant identity; `None` searches across all of the user's assistants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    5
}

impl MemoryQuery {
    /// A user-scoped query.
    pub fn for_user(text: impl Into<String>, user_id: impl Into<String>, limit: usize) -> Self {
        Self {
            text: text.into(),
            user_id: user_id.into(),
            agent_id: None,
            limit,
        }
    }

    /// Narrow the query to one assistant.
    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }
}

/// A chat exchange to be remembered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryWrite {
    pub messages: Vec<Message>,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

/// The core MemoryService trait.
///
/// Implementations: hosted REST client, JSONL file, in-memory (for testing),
/// none (no-op).
#[async_trait]
pub trait MemoryService: Send + Sync {
    /// The backend name (e.g., "hosted", "file", "none").
    fn name(&self) -> &str;

    /// Search memories related to the query text.
    async fn search(&self, query: MemoryQuery) -> std::result::Result<Vec<MemoryRecord>, MemoryError>;

    /// Remember a chat exchange.
    async fn add(&self, write: MemoryWrite) -> std::result::Result<(), MemoryError>;
}
