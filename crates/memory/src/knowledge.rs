//! Per-assistant knowledge base: document chunks paired 1:1 with index vectors.
//!
//! Chunk `i` is described by vector `i`. Every mutation goes through
//! [`KnowledgeBase::push`], which only appends a chunk together with its
//! vector and refuses to append while the two lists disagree. Snapshots
//! loaded from disk may still disagree, so lookups bounds-check and
//! ingestion rebuilds the index before adding anything.

use crate::chunker::chunk_text;
use crate::index::FlatL2Index;
use hubblet_core::error::{ProviderError, StoreError};
use hubblet_core::provider::{EmbeddingRequest, Provider};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns text into embedding vectors through a [`Provider`].
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl Embedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: vec![text.to_string()],
            })
            .await?;
        response
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ProviderError::EmbeddingFailed("empty embedding returned".into()))
    }
}

/// A file handed to ingestion: display name plus raw bytes.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file, naming it by its file name.
    pub fn read(path: &Path) -> Result<Self, StoreError> {
        let bytes = std::fs::read(path).map_err(|e| StoreError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// Ingestion limits.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub chunk_size: usize,
    pub max_file_bytes: u64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            chunk_size: crate::chunker::DEFAULT_CHUNK_SIZE,
            max_file_bytes: 2 * 1024 * 1024,
        }
    }
}

/// What an ingestion or rebuild did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Display names of files that produced text
    pub processed_files: Vec<String>,
    pub chunks_added: usize,
    pub chunks_skipped: usize,
    /// Non-fatal problems, in the order they happened
    pub warnings: Vec<String>,
}

impl IngestReport {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    chunks: Vec<String>,
    index: Option<FlatL2Index>,
    uploaded_files: Vec<String>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reassemble from persisted parts.
    pub fn from_parts(
        chunks: Vec<String>,
        index: Option<FlatL2Index>,
        uploaded_files: Vec<String>,
    ) -> Self {
        let kb = Self {
            chunks,
            index,
            uploaded_files,
        };
        if kb.has_index() && kb.index_len() != kb.chunks.len() {
            warn!(
                chunks = kb.chunks.len(),
                vectors = kb.index_len(),
                "Chunk list and index disagree; out-of-range hits will be ignored"
            );
        }
        kb
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn uploaded_files(&self) -> &[String] {
        &self.uploaded_files
    }

    pub fn index(&self) -> Option<&FlatL2Index> {
        self.index.as_ref()
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Number of vectors in the index (0 without one).
    pub fn index_len(&self) -> usize {
        self.index.as_ref().map_or(0, FlatL2Index::len)
    }

    /// True when chunk `i` has vector `i` for every chunk.
    pub fn is_paired(&self) -> bool {
        self.index_len() == self.chunks.len()
    }

    /// True when there is nothing to retrieve.
    pub fn is_empty(&self) -> bool {
        self.index_len() == 0
    }

    /// Append one chunk with its vector.
    ///
    /// The first vector fixes the index dimension. Fails with
    /// [`StoreError::Unpaired`] when chunks and vectors already disagree.
    pub fn push(&mut self, chunk: impl Into<String>, vector: &[f32]) -> Result<(), StoreError> {
        if !self.is_paired() {
            return Err(StoreError::Unpaired {
                chunks: self.chunks.len(),
                vectors: self.index_len(),
            });
        }
        let index = self
            .index
            .get_or_insert_with(|| FlatL2Index::new(vector.len()));
        index.add(vector)?;
        self.chunks.push(chunk.into());
        Ok(())
    }

    /// Chunk texts of the `k` nearest vectors, nearest first.
    ///
    /// Sentinel and out-of-range labels are dropped.
    pub fn nearest_chunks(&self, query: &[f32], k: usize) -> Result<Vec<&str>, StoreError> {
        let Some(index) = &self.index else {
            return Ok(Vec::new());
        };
        if index.is_empty() {
            return Ok(Vec::new());
        }
        let hits = index.search(query, k)?;
        Ok(hits
            .positions()
            .filter_map(|i| self.chunks.get(i).map(String::as_str))
            .collect())
    }

    /// Decode, chunk, and embed new files.
    ///
    /// Files already in the uploaded list are skipped. A chunk whose
    /// embedding fails is dropped with a warning. Stored chunks without
    /// matching vectors are re-embedded first.
    pub async fn ingest(
        &mut self,
        files: &[SourceFile],
        embedder: &Embedder,
        options: &IngestOptions,
    ) -> IngestReport {
        let mut report = IngestReport::default();
        if !self.is_paired() {
            report.warn(format!(
                "{} stored chunks have {} vectors; rebuilding the index before ingesting",
                self.chunks.len(),
                self.index_len()
            ));
            let rebuilt = self.rebuild_index(embedder).await;
            report.chunks_skipped += rebuilt.chunks_skipped;
            report.warnings.extend(rebuilt.warnings);
        }

        for file in files {
            if self.uploaded_files.iter().any(|f| f == &file.name) {
                debug!(file = %file.name, "Already ingested, skipping");
                continue;
            }
            if file.bytes.is_empty() {
                report.warn(format!("File '{}' is empty and was skipped", file.name));
                continue;
            }
            let size = file.bytes.len() as u64;
            if size > options.max_file_bytes {
                report.warn(format!(
                    "File '{}' ({:.2} MB) exceeds the {:.0} MB limit and was skipped",
                    file.name,
                    size as f64 / (1024.0 * 1024.0),
                    options.max_file_bytes as f64 / (1024.0 * 1024.0),
                ));
                continue;
            }

            let text = match std::str::from_utf8(&file.bytes) {
                Ok(text) => text.to_string(),
                Err(_) => {
                    report.warn(format!(
                        "File '{}' is not valid UTF-8; read as Latin-1",
                        file.name
                    ));
                    decode_latin1(&file.bytes)
                }
            };

            let pieces: Vec<&str> = chunk_text(&text, options.chunk_size).collect();
            if pieces.is_empty() {
                report.warn(format!(
                    "File '{}' contains no extractable text",
                    file.name
                ));
                continue;
            }

            for (n, piece) in pieces.iter().enumerate() {
                match self.embed_and_push(piece, embedder).await {
                    Ok(()) => report.chunks_added += 1,
                    Err(e) => {
                        report.chunks_skipped += 1;
                        report.warn(format!(
                            "Embedding failed for chunk {}/{} of '{}': {e}. The chunk was skipped",
                            n + 1,
                            pieces.len(),
                            file.name
                        ));
                    }
                }
            }

            self.uploaded_files.push(file.name.clone());
            report.processed_files.push(file.name.clone());
        }

        info!(
            files = report.processed_files.len(),
            chunks = report.chunks_added,
            skipped = report.chunks_skipped,
            "Ingestion finished"
        );
        report
    }

    /// Re-embed every chunk into a fresh index.
    ///
    /// Chunks whose embedding fails are dropped so the pairing holds.
    pub async fn rebuild_index(&mut self, embedder: &Embedder) -> IngestReport {
        let chunks = std::mem::take(&mut self.chunks);
        self.index = None;
        let mut report = IngestReport::default();

        for (n, chunk) in chunks.iter().enumerate() {
            match self.embed_and_push(chunk, embedder).await {
                Ok(()) => report.chunks_added += 1,
                Err(e) => {
                    report.chunks_skipped += 1;
                    report.warn(format!(
                        "Embedding failed for stored chunk {}/{}: {e}. The chunk was dropped",
                        n + 1,
                        chunks.len()
                    ));
                }
            }
        }

        info!(
            chunks = report.chunks_added,
            dropped = report.chunks_skipped,
            "Index rebuilt from stored chunks"
        );
        report
    }

    async fn embed_and_push(&mut self, chunk: &str, embedder: &Embedder) -> Result<(), String> {
        let vector = embedder.embed_one(chunk).await.map_err(|e| e.to_string())?;
        self.push(chunk, &vector).map_err(|e| e.to_string())
    }
}

/// ISO-8859-1: every byte is the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
