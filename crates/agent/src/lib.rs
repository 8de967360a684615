//! The assistant side of Hubblet: what goes into each model call.
//!
//! 1. **Configure** an assistant through the [`dialogue`] state machine
//! 2. **Retrieve** memories and document chunks for a user utterance
//! 3. **Assemble** `[memory?, documents?, instructions?, history, user]`
//! 4. **Complete** the turn and persist it ([`orchestrator`])

pub mod context;
pub mod dialogue;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{
    AssembledContext, AssemblyInput, AssemblyMetadata, ContextAssembler, LayerStats,
    RetrievalSettings, Retrieved,
};
pub use dialogue::{ConfigDialogue, DialogueError, DialogueReply, DialogueSettings, DialogueState};
pub use orchestrator::{
    AssistantWorkspace, ChatOrchestrator, TurnContext, TurnError, TurnOutcome, memory_backend,
};
