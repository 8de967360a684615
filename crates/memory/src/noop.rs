//! No-op memory service: disables conversational memory entirely.

use async_trait::async_trait;
use hubblet_core::error::MemoryError;
use hubblet_core::memory::{MemoryQuery, MemoryRecord, MemoryService, MemoryWrite};

/// A memory service that remembers nothing.
pub struct NoopMemory;

#[async_trait]
impl MemoryService for NoopMemory {
    fn name(&self) -> &str {
        "none"
    }

    async fn search(&self, _query: MemoryQuery) -> Result<Vec<MemoryRecord>, MemoryError> {
        Ok(Vec::new())
    }

    async fn add(&self, _write: MemoryWrite) -> Result<(), MemoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubblet_core::Message;

    #[tokio::test]
    async fn remembers_nothing() {
        let mem = NoopMemory;
        mem.add(MemoryWrite {
            messages: vec![Message::user("my name is Ana")],
            user_id: "ana".into(),
            agent_id: None,
        })
        .await
        .unwrap();
        let results = mem
            .search(MemoryQuery::for_user("name", "ana", 5))
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
