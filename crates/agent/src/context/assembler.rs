//! Context assembly: the ordered message list for one chat turn.
//!
//! Combines four layers into the request sent to the language model:
//!
//! | Position | Layer | Omitted when |
//! |---|---|---|
//! | 1 | Long-term memory (system) | no memory texts |
//! | 2 | Knowledge base (system) | no document chunks |
//! | 3 | Final instructions (system) | no instructions configured |
//! | 4.. | Conversation history | never (may be empty) |
//! | last | Current user utterance | never |
//!
//! The memory message always comes first when present, the document
//! message directly after it (or first), then the instructions.
//!
//! # Determinism
//!
//! Assembly is a pure function of its input: no I/O, no clock, no
//! randomness. Retrieval happens beforehand (see [`super::retrieval`]).

use hubblet_core::message::{Message, Role};
use serde::{Deserialize, Serialize};

/// Introduces the long-term memory snippets.
pub const MEMORY_PREAMBLE: &str = "Consider this information from past interactions (long-term memory) \
when formulating your answer. It is especially important to use personal information about the user \
(such as their name and preferences) if it is present in these memories:";

/// Separates memory snippets (and the preamble from the first one).
pub const MEMORY_SEPARATOR: &str = "\n---\n";

/// Introduces the retrieved document chunks.
pub const DOCUMENTS_PREAMBLE: &str =
    "Use the following information from the knowledge base to answer the user's question:";

/// Default number of recent history messages sent with a turn.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

// ── Types ─────────────────────────────────────────────────────────────────

/// Read-only snapshots for a single assembly.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyInput<'a> {
    /// The assistant's final instructions (system prompt), if configured.
    pub instructions: Option<&'a str>,
    /// Unique memory texts, in retrieval order.
    pub memories: &'a [String],
    /// Retrieved chunk texts, nearest first.
    pub documents: &'a [String],
    /// The session's messages before this turn, oldest first.
    pub history: &'a [Message],
    /// The new user utterance.
    pub user_message: &'a str,
}

/// The assembled request, ready for the provider.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub messages: Vec<Message>,
    pub metadata: AssemblyMetadata,
}

/// Which layers made it into the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    /// Memory snippets injected.
    pub memory_records: usize,
    /// Document chunks injected.
    pub document_chunks: usize,
    /// Whether an instructions message was included.
    pub instructions_included: bool,
    /// History messages inside the window.
    pub history_included: usize,
    /// Stored history messages not sent: those outside the window plus
    /// system and blank messages, which are never replayed.
    pub history_dropped: usize,
    /// Per-layer statistics, in request order.
    pub per_layer: Vec<LayerStats>,
}

/// Statistics for a single context layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStats {
    /// Layer name.
    pub name: String,
    /// Characters contributed to the request.
    pub chars: usize,
    /// Items included.
    pub items_included: usize,
    /// Items available before windowing.
    pub items_total: usize,
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// The context assembler. Stateless apart from the history window.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    history_window: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl ContextAssembler {
    pub fn new(history_window: usize) -> Self {
        Self { history_window }
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Build `[memory?, documents?, instructions?, ...history, user]`.
    pub fn assemble(&self, input: &AssemblyInput<'_>) -> AssembledContext {
        let mut messages = Vec::new();
        let mut stats = Vec::new();

        // ── Layer 1: Long-term memory ──────────────────────────────────────
        let memories: Vec<&str> = input
            .memories
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .collect();
        if let Some(section) = render_memory(&memories) {
            stats.push(layer("memory", &section, memories.len(), input.memories.len()));
            messages.push(Message::system(section));
        }

        // ── Layer 2: Knowledge base ────────────────────────────────────────
        let documents: Vec<&str> = input
            .documents
            .iter()
            .map(String::as_str)
            .filter(|d| !d.trim().is_empty())
            .collect();
        if let Some(section) = render_documents(&documents) {
            stats.push(layer("documents", &section, documents.len(), input.documents.len()));
            messages.push(Message::system(section));
        }

        // ── Layer 3: Instructions ──────────────────────────────────────────
        let instructions = input
            .instructions
            .map(str::trim)
            .filter(|i| !i.is_empty());
        if let Some(text) = instructions {
            stats.push(layer("instructions", text, 1, 1));
            messages.push(Message::system(text));
        }

        // ── Layer 4: Conversation history ──────────────────────────────────
        let eligible: Vec<&Message> = input
            .history
            .iter()
            .filter(|m| m.role != Role::System && !m.content.trim().is_empty())
            .collect();
        let start = eligible.len().saturating_sub(self.history_window);
        let window = &eligible[start..];
        stats.push(LayerStats {
            name: "history".into(),
            chars: window.iter().map(|m| m.content.chars().count()).sum(),
            items_included: window.len(),
            items_total: input.history.len(),
        });
        messages.extend(
            window
                .iter()
                .map(|m| Message {
                    tool_calls: Vec::new(),
                    ..(*m).clone()
                }),
        );

        // ── Layer 5: User utterance ────────────────────────────────────────
        stats.push(layer("user_message", input.user_message, 1, 1));
        messages.push(Message::user(input.user_message));

        AssembledContext {
            messages,
            metadata: AssemblyMetadata {
                memory_records: memories.len(),
                document_chunks: documents.len(),
                instructions_included: instructions.is_some(),
                history_included: window.len(),
                history_dropped: input.history.len() - window.len(),
                per_layer: stats,
            },
        }
    }
}

// ── Layer renderers ───────────────────────────────────────────────────────

fn render_memory(memories: &[&str]) -> Option<String> {
    if memories.is_empty() {
        return None;
    }
    Some(format!(
        "{MEMORY_PREAMBLE}{MEMORY_SEPARATOR}{}",
        memories.join(MEMORY_SEPARATOR)
    ))
}

fn render_documents(documents: &[&str]) -> Option<String> {
    if documents.is_empty() {
        return None;
    }
    Some(format!("{DOCUMENTS_PREAMBLE}\n{}", documents.join("\n\n")))
}

fn layer(name: &str, text: &str, included: usize, total: usize) -> LayerStats {
    LayerStats {
        name: name.into(),
        chars: text.chars().count(),
        items_included: included,
        items_total: total,
    }
}
