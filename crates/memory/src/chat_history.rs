//! Chat history store: every session for every user in one JSON document.
//!
//! ```json
//! {"chat_sessions": [{"id": "...", "user_id": "ana", "title": "Chat with Aurora",
//!   "created_at": "...", "updated_at": "...", "messages": [{"role": "user", "content": "...", "created_at": "..."}]}]}
//! ```
//!
//! The file is re-read on every operation and rewritten on every mutation.
//! There is no locking; the last writer wins. Reads of a corrupt file see an
//! empty history; the first write moves the corrupt file aside to
//! `<file>.corrupt-<timestamp>` before starting over.

use hubblet_core::error::StoreError;
use hubblet_core::{ChatSession, Message, UserId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatHistory {
    #[serde(default)]
    pub chat_sessions: Vec<ChatSession>,
}

pub struct ChatHistoryStore {
    path: PathBuf,
}

/// Base title of the conversation with an assistant.
pub fn session_title(assistant: &str) -> String {
    format!("Chat with {}", assistant.trim())
}

/// True for `"Chat with X"` and `"Chat with X (n)"`.
fn is_title_for(title: &str, assistant: &str) -> bool {
    let base = session_title(assistant);
    match title.strip_prefix(&base) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix(" (")
            .and_then(|r| r.strip_suffix(')'))
            .is_some_and(|n| n.parse::<u32>().is_ok()),
        None => false,
    }
}

impl ChatHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole history. Missing or unreadable files yield an empty
    /// history; unreadable ones are logged.
    pub fn load(&self) -> ChatHistory {
        match self.read() {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "Chat history unavailable; starting empty");
                ChatHistory::default()
            }
        }
    }

    fn read(&self) -> Result<ChatHistory, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ChatHistory::default()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        serde_json::from_str(&content).map_err(|e| StoreError::corrupt(&self.path, e))
    }

    /// History to mutate. A corrupt file is moved aside first; an unreadable
    /// one is an error so it is never overwritten.
    fn load_for_write(&self) -> Result<ChatHistory, StoreError> {
        match self.read() {
            Err(StoreError::Corrupt { reason, .. }) => {
                let aside = self.corrupt_path();
                std::fs::rename(&self.path, &aside).map_err(|e| StoreError::io(&self.path, e))?;
                warn!(
                    path = %self.path.display(),
                    moved_to = %aside.display(),
                    error = %reason,
                    "Chat history was corrupt; kept a copy and started a new one"
                );
                Ok(ChatHistory::default())
            }
            other => other,
        }
    }

    fn corrupt_path(&self) -> PathBuf {
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".corrupt-{stamp}"));
        PathBuf::from(name)
    }

    pub fn save(&self, history: &ChatHistory) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(history).map_err(|e| StoreError::io(&self.path, e))?;
        std::fs::write(&self.path, json).map_err(|e| StoreError::io(&self.path, e))
    }

    pub fn create_session(&self, user: &UserId, title: &str) -> Result<ChatSession, StoreError> {
        let mut history = self.load_for_write()?;
        let session = ChatSession::new(user.as_str(), title);
        history.chat_sessions.push(session.clone());
        self.save(&history)?;
        debug!(session = %session.id, title = %session.title, "Chat session created");
        Ok(session)
    }

    /// All sessions owned by `user`, in file order.
    pub fn list_sessions(&self, user: &UserId) -> Vec<ChatSession> {
        self.load()
            .chat_sessions
            .into_iter()
            .filter(|s| s.user_id == user.as_str())
            .collect()
    }

    pub fn session(&self, session_id: &str) -> Option<ChatSession> {
        self.load()
            .chat_sessions
            .into_iter()
            .find(|s| s.id == session_id)
    }

    /// Messages of a session; empty when the session does not exist.
    pub fn session_messages(&self, session_id: &str) -> Vec<Message> {
        self.session(session_id)
            .map(|s| s.messages)
            .unwrap_or_default()
    }

    /// Append a message and bump the session's `updated_at`.
    pub fn add_message(&self, session_id: &str, message: Message) -> Result<(), StoreError> {
        let mut history = self.load_for_write()?;
        let session = history
            .chat_sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        session.push(message);
        self.save(&history)
    }

    /// The most recently updated session between `user` and `assistant`.
    pub fn latest_session_for(&self, user: &UserId, assistant: &str) -> Option<ChatSession> {
        self.list_sessions(user)
            .into_iter()
            .filter(|s| is_title_for(&s.title, assistant))
            .max_by_key(|s| s.updated_at)
    }

    /// Start a new conversation with a unique title:
    /// `"Chat with X"`, then `"Chat with X (2)"`, `"(3)"`, ...
    pub fn new_session_for(&self, user: &UserId, assistant: &str) -> Result<ChatSession, StoreError> {
        let taken: Vec<String> = self
            .list_sessions(user)
            .into_iter()
            .map(|s| s.title)
            .collect();
        let base = session_title(assistant);
        let title = std::iter::once(base.clone())
            .chain((2..).map(|n| format!("{base} ({n})")))
            .find(|t| !taken.contains(t))
            .unwrap_or(base);
        self.create_session(user, &title)
    }

    /// Resume the latest conversation with `assistant`, or start one.
    pub fn resume_or_create(&self, user: &UserId, assistant: &str) -> Result<ChatSession, StoreError> {
        match self.latest_session_for(user, assistant) {
            Some(session) => Ok(session),
            None => self.new_session_for(user, assistant),
        }
    }
}
