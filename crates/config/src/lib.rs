//! Configuration loading, validation, and management for Hubblet.
//!
//! Loads configuration from `~/.hubblet/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.hubblet/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language-model / embedding API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model used for chat turns and the configuration dialogue
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used to embed document chunks and queries
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Temperature for assistant chat turns
    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f32,

    /// Temperature for configuration-dialogue refinement
    #[serde(default = "default_dialogue_temperature")]
    pub dialogue_temperature: f32,

    /// Conversational memory service
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Document retrieval and history window
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Where profiles and chat history live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Configuration dialogue behavior
    #[serde(default)]
    pub dialogue: DialogueConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_chat_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".into()
}
fn default_chat_temperature() -> f32 {
    0.7
}
fn default_dialogue_temperature() -> f32 {
    0.5
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("chat_temperature", &self.chat_temperature)
            .field("dialogue_temperature", &self.dialogue_temperature)
            .field("memory", &self.memory)
            .field("retrieval", &self.retrieval)
            .field("storage", &self.storage)
            .field("dialogue", &self.dialogue)
            .finish()
    }
}

/// Which conversational memory backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackend {
    /// Hosted mem0-style REST service
    Hosted,
    /// Local JSONL file under the data directory
    File,
    /// Memory disabled
    None,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_backend")]
    pub backend: MemoryBackend,

    /// Hosted memory service API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_memory_api_url")]
    pub api_url: String,

    /// Fixed query used to pull user-profile facts on every turn
    #[serde(default = "default_profile_query")]
    pub profile_query: String,

    #[serde(default = "default_profile_limit")]
    pub profile_limit: usize,

    /// Limit for each utterance-based memory search
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,
}

fn default_memory_backend() -> MemoryBackend {
    MemoryBackend::Hosted
}
fn default_memory_api_url() -> String {
    "https://api.mem0.ai".into()
}
fn default_profile_query() -> String {
    "User profile information, the user's name, the user's general preferences.".into()
}
fn default_profile_limit() -> usize {
    3
}
fn default_context_limit() -> usize {
    5
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            api_key: None,
            api_url: default_memory_api_url(),
            profile_query: default_profile_query(),
            profile_limit: default_profile_limit(),
            context_limit: default_context_limit(),
        }
    }
}

impl std::fmt::Debug for MemoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConfig")
            .field("backend", &self.backend)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("profile_query", &self.profile_query)
            .field("profile_limit", &self.profile_limit)
            .field("context_limit", &self.context_limit)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Characters per document chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Nearest chunks injected per turn
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Recent chat messages sent with each turn
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Uploaded files larger than this are skipped
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_chunk_size() -> usize {
    1500
}
fn default_top_k() -> usize {
    3
}
fn default_history_window() -> usize {
    10
}
fn default_max_file_bytes() -> u64 {
    2 * 1024 * 1024
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            top_k: default_top_k(),
            history_window: default_history_window(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root data directory (default: `~/.hubblet/data`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("data"))
    }

    /// Directory holding `assistant_<name>_*` files.
    pub fn profile_dir(&self) -> PathBuf {
        self.data_dir().join("assistants")
    }

    pub fn chat_history_file(&self) -> PathBuf {
        self.data_dir().join("chat_sessions.json")
    }

    /// JSONL file used by the `file` memory backend.
    pub fn memory_file(&self) -> PathBuf {
        self.data_dir().join("memories.jsonl")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Also accept prefix-tagged replies as final instructions
    #[serde(default = "default_true")]
    pub legacy_detection: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            legacy_detection: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.hubblet/config.toml).
    ///
    /// Environment variables override the file:
    /// - `HUBBLET_API_KEY`, then `OPENAI_API_KEY`
    /// - `MEM0_API_KEY`
    /// - `HUBBLET_MODEL`
    /// - `HUBBLET_DATA_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("HUBBLET_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }
        if self.memory.api_key.is_none() {
            self.memory.api_key = lookup("MEM0_API_KEY");
        }
        if let Some(model) = lookup("HUBBLET_MODEL") {
            self.chat_model = model;
        }
        if let Some(dir) = lookup("HUBBLET_DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hubblet")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("chat_temperature", self.chat_temperature),
            ("dialogue_temperature", self.dialogue_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 2.0"
                )));
            }
        }

        if self.retrieval.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.chunk_size must be > 0".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be > 0".into(),
            ));
        }
        if self.retrieval.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.history_window must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if a language-model API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            chat_temperature: default_chat_temperature(),
            dialogue_temperature: default_dialogue_temperature(),
            memory: MemoryConfig::default(),
            retrieval: RetrievalConfig::default(),
            storage: StorageConfig::default(),
            dialogue: DialogueConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chat_model, "gpt-3.5-turbo");
        assert_eq!(config.retrieval.chunk_size, 1500);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.history_window, 10);
        assert_eq!(config.memory.profile_limit, 3);
        assert!(config.dialogue.legacy_detection);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.chat_model, config.chat_model);
        assert_eq!(parsed.memory.backend, MemoryBackend::Hosted);
        assert_eq!(parsed.retrieval.max_file_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            dialogue_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.chunk_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().embedding_model, "text-embedding-ada-002");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
chat_model = "gpt-4o-mini"

[memory]
backend = "file"

[retrieval]
top_k = 5

[storage]
data_dir = "/srv/hubblet"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.memory.backend, MemoryBackend::File);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.chunk_size, 1500);
        assert_eq!(
            config.storage.profile_dir(),
            PathBuf::from("/srv/hubblet/assistants")
        );
        assert_eq!(
            config.storage.chat_history_file(),
            PathBuf::from("/srv/hubblet/chat_sessions.json")
        );
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "chat_model = [").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-openai"),
            ("MEM0_API_KEY", "m0-key"),
            ("HUBBLET_MODEL", "gpt-4o"),
            ("HUBBLET_DATA_DIR", "/data"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.memory.api_key.as_deref(), Some("m0-key"));
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.storage.data_dir(), PathBuf::from("/data"));
    }

    #[test]
    fn hubblet_key_wins_over_openai_key() {
        let mut config = AppConfig::default();
        config.apply_env(|k| match k {
            "HUBBLET_API_KEY" => Some("sk-hubblet".into()),
            "OPENAI_API_KEY" => Some("sk-openai".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-hubblet"));
    }

    #[test]
    fn file_key_is_not_overridden() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(|_| Some("from-env".into()));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        config.memory.api_key = Some("m0-secret".into());
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(!dbg.contains("m0-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn blank_api_key_is_missing() {
        let config = AppConfig {
            api_key: Some("  ".into()),
            ..AppConfig::default()
        };
        assert!(!config.has_api_key());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("text-embedding-ada-002"));
        assert!(toml_str.contains("[retrieval]"));
    }
}
