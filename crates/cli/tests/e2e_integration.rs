//! End-to-end integration tests for Hubblet.
//!
//! These tests exercise the full pipeline: configuring an assistant through
//! the dialogue, ingesting documents, saving and reloading it from disk, and
//! chatting with retrieved memory and document context.

use std::sync::{Arc, Mutex};

use hubblet_agent::dialogue::SAVE_TOOL;
use hubblet_agent::{ChatOrchestrator, ConfigDialogue, DialogueSettings, DialogueState};
use hubblet_config::AppConfig;
use hubblet_core::error::ProviderError;
use hubblet_core::message::{Message, MessageToolCall, Role};
use hubblet_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage,
};
use hubblet_core::UserId;
use hubblet_memory::{InMemoryService, KnowledgeBase, SourceFile, chunk_text};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence and embeds
/// text as a bag of letter counts.
struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let count = requests.len();
        if count >= responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                count,
                responses.len()
            );
        }
        requests.push(request);
        Ok(responses[count].clone())
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|t| letter_counts(t)).collect(),
            model: request.model,
        })
    }
}

/// 26-dimensional a–z histogram.
fn letter_counts(text: &str) -> Vec<f32> {
    let mut v = vec![0.0; 26];
    for c in text.to_lowercase().chars().filter(char::is_ascii_lowercase) {
        v[(c as u8 - b'a') as usize] += 1.0;
    }
    v
}

fn text_response(text: &str) -> ProviderResponse {
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

fn save_call_response(instructions: &str) -> ProviderResponse {
    let mut response = text_response("");
    response.message.tool_calls = vec![MessageToolCall {
        id: "call_save".into(),
        name: SAVE_TOOL.into(),
        arguments: serde_json::json!({ "instructions": instructions }).to_string(),
    }];
    response
}

fn config_in(dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.data_dir = Some(dir.to_path_buf());
    config.retrieval.chunk_size = 40;
    config
}

const INSTRUCTIONS: &str = "You are Aurora, a friendly support assistant for ACME. Answer from the knowledge base.";
const DOCUMENT: &str = "Refunds are processed within five business days. \
Shipping is free for orders above fifty euros. \
Support is available on weekdays from nine to five.";

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn configure_save_reload_and_chat() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let provider = Arc::new(ScriptedProvider::new(vec![
        save_call_response(INSTRUCTIONS),
        text_response("Refunds take five business days."),
        text_response("Of course, Ana."),
    ]));
    let memory = Arc::new(InMemoryService::new());
    let orchestrator = ChatOrchestrator::new(&config, Some(provider.clone()), memory.clone());
    let ana = UserId::new("Ana").unwrap();

    // 1. Dialogue: four fields, then refinement via tool call.
    let mut dialogue = ConfigDialogue::new(DialogueSettings::from_config(&config));
    for answer in ["Aurora", "Friendly", "Customer support", "yes"] {
        dialogue.respond(answer, orchestrator.provider()).await.unwrap();
    }
    assert_eq!(dialogue.state(), DialogueState::Complete);
    let reply = dialogue
        .respond("Please generate the instructions", orchestrator.provider())
        .await
        .unwrap();
    assert!(reply.instructions_captured);
    let profile = dialogue.finalize().unwrap();

    // 2. Ingest and save.
    let mut knowledge = KnowledgeBase::new();
    let report = orchestrator
        .ingest(&mut knowledge, &[SourceFile::new("faq.txt", DOCUMENT)])
        .await
        .unwrap();
    assert_eq!(report.processed_files, vec!["faq.txt"]);
    assert_eq!(report.chunks_added, chunk_text(DOCUMENT, 40).count());
    orchestrator.save(&profile, &knowledge).unwrap();
    assert_eq!(orchestrator.profiles().list(), vec!["Aurora"]);

    // 3. Reload reproduces instructions, chunks and nearest-neighbour order.
    let (mut ws, warnings) = orchestrator.open(&ana, "Aurora").await.unwrap();
    assert!(warnings.is_empty());
    assert_eq!(ws.profile.final_instructions.as_deref(), Some(INSTRUCTIONS));
    assert_eq!(ws.knowledge.chunks(), knowledge.chunks());
    let query = letter_counts("refund days");
    assert_eq!(
        ws.knowledge.nearest_chunks(&query, 3).unwrap(),
        knowledge.nearest_chunks(&query, 3).unwrap()
    );

    // 4. First chat turn: documents and instructions, no memory yet.
    let outcome = orchestrator
        .chat_turn(&ana, &mut ws, "My name is Ana. How long do refunds take?")
        .await
        .unwrap();
    assert_eq!(outcome.reply, "Refunds take five business days.");
    assert_eq!(outcome.metadata.memory_records, 0);
    assert_eq!(outcome.metadata.document_chunks, 3);

    // 5. Second turn recalls the first utterance from memory.
    let outcome = orchestrator
        .chat_turn(&ana, &mut ws, "Can you remember my name, please?")
        .await
        .unwrap();
    assert_eq!(outcome.reply, "Of course, Ana.");
    assert!(outcome.metadata.memory_records >= 1);

    let last = provider.requests().pop().unwrap();
    let roles: Vec<Role> = last.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::System, // memory
            Role::System, // documents
            Role::System, // instructions
            Role::User,
            Role::Assistant,
            Role::User,
        ]
    );
    assert!(last.messages[0].content.contains("My name is Ana"));
    assert_eq!(last.messages[2].content, INSTRUCTIONS);

    // Both turns persisted in the session.
    let stored = orchestrator.history().session_messages(&ws.session.id);
    assert_eq!(stored.len(), 4);
}

#[tokio::test]
async fn missing_index_is_rebuilt_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let provider = Arc::new(ScriptedProvider::new(Vec::new()));
    let orchestrator =
        ChatOrchestrator::new(&config, Some(provider), Arc::new(InMemoryService::new()));

    let mut profile = hubblet_core::AssistantProfile::named("Aurora Pro");
    profile.final_instructions = Some(INSTRUCTIONS.into());
    let mut knowledge = KnowledgeBase::new();
    orchestrator
        .ingest(&mut knowledge, &[SourceFile::new("faq.txt", DOCUMENT)])
        .await
        .unwrap();
    let paths = orchestrator.save(&profile, &knowledge).unwrap();
    assert!(paths.index.ends_with("assistant_aurora_pro_index.bin"));

    std::fs::remove_file(&paths.index).unwrap();
    let embedder = orchestrator.embedder();
    let loaded = orchestrator
        .profiles()
        .load("Aurora Pro", embedder.as_ref())
        .await;

    assert!(loaded.found);
    assert_eq!(loaded.knowledge.chunks(), knowledge.chunks());
    assert_eq!(loaded.knowledge.index_len(), knowledge.chunks().len());
    assert!(paths.index.exists(), "rebuilt index is written back");
    assert_eq!(loaded.profile.name, "Aurora Pro");
}

#[tokio::test]
async fn chat_without_documents_or_memory() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let provider = Arc::new(ScriptedProvider::new(vec![text_response("Hello!")]));
    let orchestrator = ChatOrchestrator::new(
        &config,
        Some(provider.clone()),
        Arc::new(hubblet_memory::NoopMemory),
    );

    let mut profile = hubblet_core::AssistantProfile::named("Plain");
    profile.final_instructions = Some("Be brief.".into());
    orchestrator.save(&profile, &KnowledgeBase::new()).unwrap();

    let bob = UserId::new("bob").unwrap();
    let (mut ws, _) = orchestrator.open(&bob, "plain").await.unwrap();
    orchestrator.chat_turn(&bob, &mut ws, "hi").await.unwrap();

    let request = &provider.requests()[0];
    let contents: Vec<&str> = request.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["Be brief.", "hi"]);
}
