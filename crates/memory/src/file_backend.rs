//! File-based memory service: persistent JSON-lines storage.
//!
//! A local stand-in for the hosted memory service. Each line is a
//! JSON-encoded [`MemoryRecord`] tagged with `user_id` and `agent_id`;
//! searches use the same keyword overlap as the in-memory service.
//!
//! Storage location: `<data_dir>/memories.jsonl`

use crate::in_memory::{keyword_search, records_from_write};
use async_trait::async_trait;
use hubblet_core::error::MemoryError;
use hubblet_core::memory::{MemoryQuery, MemoryRecord, MemoryService, MemoryWrite};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A file-backed memory store using JSONL (one JSON object per line).
///
/// Records are loaded into memory on creation and flushed to disk on every
/// write. This gives fast reads with durable writes.
pub struct FileMemoryService {
    path: PathBuf,
    records: Arc<RwLock<Vec<MemoryRecord>>>,
}

impl FileMemoryService {
    /// Open the store at `path`.
    ///
    /// A missing file starts empty (created on first write).
    pub fn new(path: PathBuf) -> Self {
        let records = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = records.len(), "File memory loaded");
        Self {
            path,
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Load records from a JSONL file.
    fn load_from_disk(path: &Path) -> Vec<MemoryRecord> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<MemoryRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted memory record");
                    None
                }
            })
            .collect()
    }

    /// Flush all records to disk as JSONL.
    async fn flush(&self) -> Result<(), MemoryError> {
        let records = self.records.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Storage(format!("Failed to create memory directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for record in records.iter() {
            let line = serde_json::to_string(record).map_err(|e| {
                MemoryError::Storage(format!("Failed to serialize memory record: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| MemoryError::Storage(format!("Failed to write memory file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl MemoryService for FileMemoryService {
    fn name(&self) -> &str {
        "file"
    }

    async fn search(&self, query: MemoryQuery) -> Result<Vec<MemoryRecord>, MemoryError> {
        let records = self.records.read().await;
        Ok(keyword_search(&records, &query))
    }

    async fn add(&self, write: MemoryWrite) -> Result<(), MemoryError> {
        let new = records_from_write(&write);
        if new.is_empty() {
            return Ok(());
        }
        self.records.write().await.extend(new);
        self.flush().await.map_err(|e| MemoryError::AddFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubblet_core::Message;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn exchange(text: &str) -> MemoryWrite {
        MemoryWrite {
            messages: vec![Message::user(text), Message::assistant("ok")],
            user_id: "ana".into(),
            agent_id: Some("Aurora".into()),
        }
    }

    #[tokio::test]
    async fn add_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory").join("memories.jsonl");

        let mem = FileMemoryService::new(path.clone());
        mem.add(exchange("My favourite colour is green")).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("favourite colour"));

        let reopened = FileMemoryService::new(path);
        let results = reopened
            .search(MemoryQuery::for_user("favourite colour", "ana", 5))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].agent_id.as_deref(), Some("Aurora"));
    }

    #[tokio::test]
    async fn handles_missing_file_gracefully() {
        let dir = tempfile::tempdir().unwrap();
        let mem = FileMemoryService::new(dir.path().join("absent.jsonl"));
        let results = mem
            .search(MemoryQuery::for_user("anything here", "ana", 5))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn handles_corrupted_lines() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, r#"{{"id":"1","memory":"Works remotely from Lisbon","user_id":"ana"}}"#).unwrap();
        writeln!(tmp, "this is not json").unwrap();
        writeln!(tmp, r#"{{"id":"2","memory":"Lisbon weather is mild","user_id":"ana"}}"#).unwrap();

        let mem = FileMemoryService::new(tmp.path().to_path_buf());
        let results = mem
            .search(MemoryQuery::for_user("lisbon", "ana", 5))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }
}
