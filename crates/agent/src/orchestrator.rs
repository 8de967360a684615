//! Chat orchestrator: runs one retrieval-augmented chat turn end to end.
//!
//! # Flow
//!
//! 1. Persist the user utterance to the chat session
//! 2. Retrieve long-term memories (three scoped queries, merged)
//! 3. Retrieve the nearest document chunks
//! 4. Assemble `[memory?, documents?, instructions?, history, user]`
//! 5. Call the language model
//! 6. Persist the reply and write the exchange to the memory service
//!
//! Retrieval and memory-write failures are warnings on the
//! [`TurnOutcome`]; only a missing API key, a failed completion, or a
//! failed history write stop the turn.

use crate::context::{
    AssembledContext, AssemblyInput, AssemblyMetadata, ContextAssembler, RetrievalSettings,
    Retrieved, retrieve_documents, retrieve_memories,
};
use hubblet_config::{AppConfig, MemoryBackend};
use hubblet_core::error::{ProviderError, StoreError};
use hubblet_core::memory::{MemoryService, MemoryWrite};
use hubblet_core::message::{ChatSession, Message};
use hubblet_core::profile::AssistantProfile;
use hubblet_core::provider::{Provider, ProviderRequest};
use hubblet_core::UserId;
use hubblet_memory::{
    ChatHistoryStore, Embedder, FileMemoryService, IngestOptions, IngestReport, KnowledgeBase,
    NoopMemory, ProfilePaths, ProfileStore, SourceFile,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("no language-model API key is configured; set OPENAI_API_KEY or HUBBLET_API_KEY")]
    MissingApiKey,

    #[error("message is empty")]
    EmptyMessage,

    #[error("assistant '{0}' not found")]
    AssistantNotFound(String),

    #[error("language model call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One user's open assistant: profile, documents and current session.
#[derive(Debug, Clone)]
pub struct AssistantWorkspace {
    pub profile: AssistantProfile,
    pub knowledge: KnowledgeBase,
    pub session: ChatSession,
}

/// Snapshots and retrieval results for a single turn.
///
/// Built at the start of [`ChatOrchestrator::chat_turn`] and dropped when
/// the turn ends.
#[derive(Debug, Clone)]
pub struct TurnContext {
    /// Session messages before this turn
    pub history: Vec<Message>,
    pub memories: Retrieved,
    pub documents: Retrieved,
}

impl TurnContext {
    fn input<'a>(&'a self, profile: &'a AssistantProfile, utterance: &'a str) -> AssemblyInput<'a> {
        AssemblyInput {
            instructions: profile.instructions(),
            memories: &self.memories.texts,
            documents: &self.documents.texts,
            history: &self.history,
            user_message: utterance,
        }
    }

    fn into_warnings(self) -> Vec<String> {
        let mut warnings = self.memories.warnings;
        warnings.extend(self.documents.warnings);
        warnings
    }
}

/// What a completed turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub metadata: AssemblyMetadata,
    /// Non-fatal problems (retrieval or memory write)
    pub warnings: Vec<String>,
}

pub struct ChatOrchestrator {
    provider: Option<Arc<dyn Provider>>,
    memory: Arc<dyn MemoryService>,
    profiles: ProfileStore,
    history: ChatHistoryStore,
    assembler: ContextAssembler,
    retrieval: RetrievalSettings,
    ingest: IngestOptions,
    chat_model: String,
    embedding_model: String,
    temperature: f32,
}

impl ChatOrchestrator {
    pub fn new(
        config: &AppConfig,
        provider: Option<Arc<dyn Provider>>,
        memory: Arc<dyn MemoryService>,
    ) -> Self {
        Self {
            provider,
            memory,
            profiles: ProfileStore::new(config.storage.profile_dir()),
            history: ChatHistoryStore::new(config.storage.chat_history_file()),
            assembler: ContextAssembler::new(config.retrieval.history_window),
            retrieval: RetrievalSettings::from_config(config),
            ingest: IngestOptions {
                chunk_size: config.retrieval.chunk_size,
                max_file_bytes: config.retrieval.max_file_bytes,
            },
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            temperature: config.chat_temperature,
        }
    }

    /// Wire up the provider and memory backend named in the configuration.
    ///
    /// Missing credentials disable the affected feature instead of failing.
    pub fn from_config(config: &AppConfig) -> Self {
        let provider = hubblet_providers::build_provider(config);
        Self::new(config, provider, memory_backend(config))
    }

    pub fn provider(&self) -> Option<&dyn Provider> {
        self.provider.as_deref()
    }

    pub fn memory(&self) -> &dyn MemoryService {
        self.memory.as_ref()
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn history(&self) -> &ChatHistoryStore {
        &self.history
    }

    pub fn embedder(&self) -> Option<Embedder> {
        self.provider
            .clone()
            .map(|p| Embedder::new(p, &self.embedding_model))
    }

    /// Load an assistant and resume (or start) the user's conversation
    /// with it. Returns the load warnings alongside the workspace.
    pub async fn open(
        &self,
        user: &UserId,
        name: &str,
    ) -> Result<(AssistantWorkspace, Vec<String>), TurnError> {
        let embedder = self.embedder();
        let loaded = self.profiles.load(name, embedder.as_ref()).await;
        if !loaded.found {
            return Err(TurnError::AssistantNotFound(name.trim().to_string()));
        }
        let session = self.history.resume_or_create(user, &loaded.profile.name)?;
        info!(
            assistant = %loaded.profile.name,
            session = %session.id,
            chunks = loaded.knowledge.chunks().len(),
            "Assistant opened"
        );
        Ok((
            AssistantWorkspace {
                profile: loaded.profile,
                knowledge: loaded.knowledge,
                session,
            },
            loaded.warnings,
        ))
    }

    /// Switch the workspace to a fresh conversation.
    pub fn new_conversation(
        &self,
        user: &UserId,
        workspace: &mut AssistantWorkspace,
    ) -> Result<(), TurnError> {
        workspace.session = self.history.new_session_for(user, &workspace.profile.name)?;
        Ok(())
    }

    /// Chunk and embed files into a knowledge base.
    pub async fn ingest(
        &self,
        knowledge: &mut KnowledgeBase,
        files: &[SourceFile],
    ) -> Result<IngestReport, TurnError> {
        let embedder = self.embedder().ok_or(TurnError::MissingApiKey)?;
        Ok(knowledge.ingest(files, &embedder, &self.ingest).await)
    }

    pub fn save(
        &self,
        profile: &AssistantProfile,
        knowledge: &KnowledgeBase,
    ) -> Result<ProfilePaths, TurnError> {
        Ok(self.profiles.save(profile, knowledge)?)
    }

    /// Run one chat turn.
    pub async fn chat_turn(
        &self,
        user: &UserId,
        workspace: &mut AssistantWorkspace,
        utterance: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(TurnError::EmptyMessage);
        }
        let provider = self.provider.as_deref().ok_or(TurnError::MissingApiKey)?;

        let history = workspace.session.messages.clone();
        let user_message = Message::user(utterance);

        let assistant = workspace.profile.name.as_str();
        let memories =
            retrieve_memories(self.memory.as_ref(), user, Some(assistant), utterance, &self.retrieval)
                .await;
        let embedder = self.embedder();
        let documents = retrieve_documents(
            &workspace.knowledge,
            embedder.as_ref(),
            utterance,
            self.retrieval.top_k,
        )
        .await;

        let turn = TurnContext {
            history,
            memories,
            documents,
        };
        let AssembledContext { messages, metadata } = self
            .assembler
            .assemble(&turn.input(&workspace.profile, utterance));
        debug!(
            messages = messages.len(),
            memories = metadata.memory_records,
            chunks = metadata.document_chunks,
            history = metadata.history_included,
            "Context assembled"
        );

        let request = ProviderRequest::new(&self.chat_model, messages, self.temperature);
        let response = provider.complete(request).await?;
        let reply = response.message.content.trim().to_string();

        // The exchange is stored only once the reply exists.
        let assistant_message = Message::assistant(&reply);
        for message in [&user_message, &assistant_message] {
            self.history.add_message(&workspace.session.id, message.clone())?;
            workspace.session.push(message.clone());
        }

        let mut warnings = turn.into_warnings();
        let write = MemoryWrite {
            messages: vec![user_message, assistant_message],
            user_id: user.as_str().to_string(),
            agent_id: Some(assistant.to_string()),
        };
        if let Err(e) = self.memory.add(write).await {
            let message = format!("Could not save this exchange to memory: {e}");
            warn!("{message}");
            warnings.push(message);
        }

        info!(
            assistant = %assistant,
            session = %workspace.session.id,
            warnings = warnings.len(),
            "Chat turn complete"
        );
        Ok(TurnOutcome {
            reply,
            metadata,
            warnings,
        })
    }
}

/// The configured memory backend; a hosted backend without a key falls
/// back to no memory.
pub fn memory_backend(config: &AppConfig) -> Arc<dyn MemoryService> {
    match config.memory.backend {
        MemoryBackend::Hosted => match hubblet_providers::build_hosted_memory(config) {
            Some(client) => Arc::new(client),
            None => Arc::new(NoopMemory),
        },
        MemoryBackend::File => Arc::new(FileMemoryService::new(config.storage.memory_file())),
        MemoryBackend::None => Arc::new(NoopMemory),
    }
}
