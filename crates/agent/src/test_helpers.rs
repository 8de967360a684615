//! Shared test helpers for dialogue, retrieval and orchestrator tests.

use async_trait::async_trait;
use hubblet_core::error::{MemoryError, ProviderError};
use hubblet_core::memory::{MemoryQuery, MemoryRecord, MemoryService, MemoryWrite};
use hubblet_core::message::{Message, MessageToolCall};
use hubblet_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage,
};
use hubblet_memory::{Embedder, KnowledgeBase};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request. Panics if more calls are made than responses
/// provided. Embeddings are `[chars, vowels, first byte]`.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
    fail_complete: bool,
    fail_embed: bool,
    embed_calls: AtomicUsize,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            fail_complete: false,
            fail_embed: false,
            embed_calls: AtomicUsize::new(0),
        }
    }

    /// Create a provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// Every completion fails with a network error.
    pub fn failing() -> Self {
        Self {
            fail_complete: true,
            ..Self::new(Vec::new())
        }
    }

    /// Completions work, embeddings fail.
    pub fn without_embeddings(mut self) -> Self {
        self.fail_embed = true;
        self
    }

    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        if self.fail_complete {
            return Err(ProviderError::Network("connection refused".into()));
        }
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let count = requests.len();

        if count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                count,
                responses.len()
            );
        }

        requests.push(request);
        Ok(responses[count].clone())
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_embed {
            return Err(ProviderError::EmbeddingFailed("embedding service unavailable".into()));
        }
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|t| stub_vector(t)).collect(),
            model: request.model,
        })
    }
}

pub fn stub_vector(text: &str) -> Vec<f32> {
    let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count();
    vec![
        text.chars().count() as f32,
        vowels as f32,
        text.bytes().next().unwrap_or(0) as f32,
    ]
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response with tool calls and optional text content.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, text: &str) -> ProviderResponse {
    let mut response = make_text_response(text);
    response.message.tool_calls = tool_calls;
    response
}

/// Helper to create a tool call.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

/// An embedder over a fresh mock provider.
pub fn embedder_with(fail: bool) -> (Embedder, Arc<SequentialMockProvider>) {
    let mut provider = SequentialMockProvider::new(Vec::new());
    if fail {
        provider = provider.without_embeddings();
    }
    let provider = Arc::new(provider);
    (Embedder::new(provider.clone(), "mock-embedding"), provider)
}

/// A knowledge base holding one chunk per text.
pub async fn knowledge_of(chunks: &[&str]) -> (KnowledgeBase, Embedder) {
    let (embedder, _) = embedder_with(false);
    let mut kb = KnowledgeBase::new();
    for chunk in chunks {
        kb.push(*chunk, &stub_vector(chunk)).unwrap();
    }
    (kb, embedder)
}

/// Memory service that scripts search results and records every call.
#[derive(Default)]
pub struct RecordingMemory {
    /// Results for successive searches; empty once exhausted
    results: Mutex<Vec<Vec<MemoryRecord>>>,
    queries: Mutex<Vec<MemoryQuery>>,
    writes: Mutex<Vec<MemoryWrite>>,
    fail: bool,
}

impl RecordingMemory {
    pub fn with_results(results: Vec<Vec<MemoryRecord>>) -> Self {
        Self {
            results: Mutex::new(results),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<MemoryQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<MemoryWrite> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemoryService for RecordingMemory {
    fn name(&self) -> &str {
        "recording"
    }

    async fn search(&self, query: MemoryQuery) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.queries.lock().unwrap().push(query);
        if self.fail {
            return Err(MemoryError::SearchFailed("service unavailable".into()));
        }
        let mut results = self.results.lock().unwrap();
        Ok(if results.is_empty() {
            Vec::new()
        } else {
            results.remove(0)
        })
    }

    async fn add(&self, write: MemoryWrite) -> Result<(), MemoryError> {
        self.writes.lock().unwrap().push(write);
        if self.fail {
            return Err(MemoryError::AddFailed("service unavailable".into()));
        }
        Ok(())
    }
}
