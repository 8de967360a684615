//! Assistant profile: the configuration a user builds through the dialogue.

use serde::{Deserialize, Serialize};

/// A configured assistant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantProfile {
    /// Display name (also the memory-service agent id)
    pub name: String,

    /// Communication style (formal, friendly, technical, ...)
    #[serde(default)]
    pub style: String,

    /// Main functions or tasks
    #[serde(default)]
    pub functions: String,

    /// Whether/which knowledge sources the user attached
    #[serde(default)]
    pub sources_info: String,

    /// The generated system prompt used on every chat turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_instructions: Option<String>,
}

impl AssistantProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The value collected for a field, if any.
    pub fn field(&self, field: ConfigField) -> Option<&str> {
        let value = match field {
            ConfigField::Name => &self.name,
            ConfigField::Style => &self.style,
            ConfigField::Functions => &self.functions,
            ConfigField::SourcesInfo => &self.sources_info,
        };
        if value.is_empty() { None } else { Some(value) }
    }

    pub fn set_field(&mut self, field: ConfigField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ConfigField::Name => self.name = value,
            ConfigField::Style => self.style = value,
            ConfigField::Functions => self.functions = value,
            ConfigField::SourcesInfo => self.sources_info = value,
        }
    }

    /// Instructions, treating blank text as absent.
    pub fn instructions(&self) -> Option<&str> {
        self.final_instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The filesystem-safe key for this assistant's files.
    pub fn safe_name(&self) -> String {
        sanitize_name(&self.name)
    }
}

/// The fields collected by the configuration dialogue, in asking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    Name,
    Style,
    Functions,
    SourcesInfo,
}

impl ConfigField {
    pub const ORDER: [ConfigField; 4] = [
        ConfigField::Name,
        ConfigField::Style,
        ConfigField::Functions,
        ConfigField::SourcesInfo,
    ];

    pub fn first() -> Self {
        ConfigField::Name
    }

    /// The field asked after this one, or `None` after the last.
    pub fn next(self) -> Option<Self> {
        match self {
            ConfigField::Name => Some(ConfigField::Style),
            ConfigField::Style => Some(ConfigField::Functions),
            ConfigField::Functions => Some(ConfigField::SourcesInfo),
            ConfigField::SourcesInfo => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfigField::Name => "Name",
            ConfigField::Style => "Style",
            ConfigField::Functions => "Functions",
            ConfigField::SourcesInfo => "Sources",
        }
    }

    pub fn question(self) -> &'static str {
        match self {
            ConfigField::Name => "What will your assistant be called?",
            ConfigField::Style => {
                "Which communication style should the assistant use? (e.g. formal, friendly, technical, playful)"
            }
            ConfigField::Functions => {
                "What are the main functions or tasks this assistant should perform?"
            }
            ConfigField::SourcesInfo => {
                "Have you attached the documents the assistant should use as its knowledge base? Answer 'yes' or 'no'. If you don't need any right now, just say 'no'."
            }
        }
    }
}

/// Filesystem key for an assistant name: trimmed, lowercased, and every
/// character other than a letter, digit, `-` or `_` mapped to `_`. The key
/// never contains a path separator or a dot.
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Best-effort display name from a sanitized key: `_` to spaces, title case.
pub fn display_name_from_safe(safe: &str) -> String {
    safe.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
