//! In-memory memory service: useful for testing and ephemeral sessions.
//!
//! Stores each user utterance as one record and answers searches by keyword
//! overlap. The hosted service extracts facts with a model; this backend is
//! deliberately simple.

use async_trait::async_trait;
use chrono::Utc;
use hubblet_core::error::MemoryError;
use hubblet_core::memory::{MemoryQuery, MemoryRecord, MemoryService, MemoryWrite};
use hubblet_core::Role;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A memory service that keeps records in a Vec.
pub struct InMemoryService {
    records: Arc<RwLock<Vec<MemoryRecord>>>,
}

impl InMemoryService {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Start with pre-existing records (test fixtures, loaded files).
    pub fn with_records(records: Vec<MemoryRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryService {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn an exchange into records: one per non-empty user message.
pub(crate) fn records_from_write(write: &MemoryWrite) -> Vec<MemoryRecord> {
    write
        .messages
        .iter()
        .filter(|m| m.role == Role::User && !m.content.trim().is_empty())
        .map(|m| MemoryRecord {
            id: Some(Uuid::new_v4().to_string()),
            memory: m.content.trim().to_string(),
            user_id: Some(write.user_id.clone()),
            agent_id: write.agent_id.clone(),
            score: None,
            created_at: Some(Utc::now()),
        })
        .collect()
}

/// Lowercased words of at least four characters.
fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4)
        .map(str::to_lowercase)
        .collect()
}

/// Keyword search scoped to the query's user (and assistant, when given).
///
/// Score is the fraction of query terms found in the record; records with
/// no overlap are excluded.
pub(crate) fn keyword_search(records: &[MemoryRecord], query: &MemoryQuery) -> Vec<MemoryRecord> {
    let query_terms = terms(&query.text);
    if query_terms.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<MemoryRecord> = records
        .iter()
        .filter(|r| r.user_id.as_deref() == Some(query.user_id.as_str()))
        .filter(|r| match &query.agent_id {
            Some(agent) => r.agent_id.as_deref() == Some(agent.as_str()),
            None => true,
        })
        .filter_map(|r| {
            let haystack = r.memory.to_lowercase();
            let hits = query_terms.iter().filter(|t| haystack.contains(t.as_str())).count();
            (hits > 0).then(|| {
                let mut r = r.clone();
                r.score = Some(hits as f32 / query_terms.len() as f32);
                r
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(query.limit);
    results
}

#[async_trait]
impl MemoryService for InMemoryService {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn search(&self, query: MemoryQuery) -> Result<Vec<MemoryRecord>, MemoryError> {
        let records = self.records.read().await;
        Ok(keyword_search(&records, &query))
    }

    async fn add(&self, write: MemoryWrite) -> Result<(), MemoryError> {
        let new = records_from_write(&write);
        self.records.write().await.extend(new);
        Ok(())
    }
}
