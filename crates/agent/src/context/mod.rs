//! Per-turn context: retrieval steps and the message assembler.
//!
//! | Layer | Source | Omitted when |
//! |-------|--------|--------------|
//! | 1. Long-term memory | Memory service (three queries) | nothing found |
//! | 2. Knowledge base | Flat L2 index over document chunks | nothing found |
//! | 3. Instructions | Assistant profile | none configured |
//! | 4. History | Chat session, last N messages | never |
//! | 5. User utterance | Current input | never |

pub mod assembler;
pub mod retrieval;

pub use assembler::{
    AssembledContext, AssemblyInput, AssemblyMetadata, ContextAssembler, DOCUMENTS_PREAMBLE,
    LayerStats, MEMORY_PREAMBLE,
};
pub use retrieval::{
    RetrievalSettings, Retrieved, merge_memories, retrieve_documents, retrieve_memories,
};
