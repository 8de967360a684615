//! Local storage for Hubblet: document chunking, the flat vector index,
//! per-assistant knowledge bases, profile and chat-history files, and local
//! conversational memory services.

pub mod chat_history;
pub mod chunker;
pub mod file_backend;
pub mod in_memory;
pub mod index;
pub mod knowledge;
pub mod noop;
pub mod profile_store;
pub mod vector;

pub use chat_history::{ChatHistory, ChatHistoryStore, session_title};
pub use chunker::{DEFAULT_CHUNK_SIZE, chunk_text};
pub use file_backend::FileMemoryService;
pub use in_memory::InMemoryService;
pub use index::{FlatL2Index, MISSING_LABEL, SearchHits};
pub use knowledge::{Embedder, IngestOptions, IngestReport, KnowledgeBase, SourceFile};
pub use noop::NoopMemory;
pub use profile_store::{LoadedProfile, ProfilePaths, ProfileStore};
