//! Retrieval steps that feed the assembler: conversational memory and
//! knowledge-base documents.
//!
//! Both steps are failure-tolerant. An error from the memory service, the
//! embedding provider, or the index is logged, returned as a warning, and
//! treated as "no results" for that step only.

use hubblet_config::AppConfig;
use hubblet_core::UserId;
use hubblet_core::memory::{MemoryQuery, MemoryRecord, MemoryService};
use hubblet_memory::{Embedder, KnowledgeBase};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Query limits for one turn's retrieval.
#[derive(Debug, Clone)]
pub struct RetrievalSettings {
    /// Fixed query that pulls user-profile facts
    pub profile_query: String,
    pub profile_limit: usize,
    /// Limit for each utterance-based memory query
    pub context_limit: usize,
    /// Nearest chunks requested from the index
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl RetrievalSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            profile_query: config.memory.profile_query.clone(),
            profile_limit: config.memory.profile_limit,
            context_limit: config.memory.context_limit,
            top_k: config.retrieval.top_k,
        }
    }
}

/// Texts found by a retrieval step, plus anything that went wrong.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieved {
    pub texts: Vec<String>,
    pub warnings: Vec<String>,
}

impl Retrieved {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

/// Run the three memory queries for a turn and merge their results.
///
/// 1. the profile query, user only
/// 2. the utterance, user + assistant (skipped without an assistant)
/// 3. the utterance, user only
pub async fn retrieve_memories(
    memory: &dyn MemoryService,
    user: &UserId,
    assistant: Option<&str>,
    utterance: &str,
    settings: &RetrievalSettings,
) -> Retrieved {
    let mut queries = vec![(
        "profile",
        MemoryQuery::for_user(&settings.profile_query, user.as_str(), settings.profile_limit),
    )];
    if let Some(agent) = assistant.map(str::trim).filter(|a| !a.is_empty()) {
        queries.push((
            "assistant",
            MemoryQuery::for_user(utterance, user.as_str(), settings.context_limit).with_agent(agent),
        ));
    }
    queries.push((
        "user",
        MemoryQuery::for_user(utterance, user.as_str(), settings.context_limit),
    ));

    let mut out = Retrieved::default();
    let mut batches = Vec::with_capacity(queries.len());
    for (scope, query) in queries {
        match memory.search(query).await {
            Ok(records) => {
                debug!(scope, found = records.len(), backend = memory.name(), "Memory search");
                batches.push(records);
            }
            Err(e) => out.warn(format!("Memory search ({scope}) failed: {e}")),
        }
    }

    out.texts = merge_memories(batches);
    out
}

/// Merge query results in first-seen order.
///
/// Records are deduplicated by id when they carry one and by exact text
/// otherwise; the surviving texts are then deduplicated again and blanks
/// removed.
pub fn merge_memories(batches: impl IntoIterator<Item = Vec<MemoryRecord>>) -> Vec<String> {
    let mut seen_ids = HashSet::new();
    let mut seen_texts = HashSet::new();
    let mut records = Vec::new();

    for record in batches.into_iter().flatten() {
        let fresh = match &record.id {
            Some(id) => seen_ids.insert(id.clone()),
            None => seen_texts.insert(record.memory.clone()),
        };
        if fresh {
            records.push(record);
        }
    }

    let mut unique = HashSet::new();
    records
        .into_iter()
        .map(|r| r.memory)
        .filter(|text| !text.trim().is_empty())
        .filter(|text| unique.insert(text.clone()))
        .collect()
}

/// Embed the utterance and return the `k` nearest chunk texts.
///
/// Nothing is embedded when the knowledge base is empty.
pub async fn retrieve_documents(
    knowledge: &KnowledgeBase,
    embedder: Option<&Embedder>,
    utterance: &str,
    k: usize,
) -> Retrieved {
    let mut out = Retrieved::default();
    if knowledge.is_empty() || k == 0 {
        return out;
    }
    let Some(embedder) = embedder else {
        out.warn("Knowledge base present but no embedding provider is configured".into());
        return out;
    };

    let query = match embedder.embed_one(utterance).await {
        Ok(v) => v,
        Err(e) => {
            out.warn(format!("Could not embed the question for document search: {e}"));
            return out;
        }
    };

    match knowledge.nearest_chunks(&query, k) {
        Ok(chunks) => {
            debug!(requested = k, found = chunks.len(), "Document search");
            out.texts = chunks.into_iter().map(String::from).collect();
        }
        Err(e) => out.warn(format!("Document search failed: {e}")),
    }
    out
}
