//! Configuration dialogue: the state machine that builds an assistant
//! profile from a conversation.
//!
//! ```text
//!   Name ──► Style ──► Functions ──► SourcesInfo ──► Complete ──┐
//!                                                        ▲      │ refinement
//!                                                        └──────┘ (model call)
//! ```
//!
//! Each field state stores the user's reply for that field and asks the
//! next predefined question. In `Complete` every turn goes to the language
//! model, which may call `save_final_instructions` to hand back the final
//! instructions.

use hubblet_config::AppConfig;
use hubblet_core::error::ProviderError;
use hubblet_core::message::{Message, Role};
use hubblet_core::profile::{AssistantProfile, ConfigField};
use hubblet_core::provider::{Provider, ProviderRequest, ToolDefinition};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Tool the refinement model calls with the finished instructions.
pub const SAVE_TOOL: &str = "save_final_instructions";

/// Replies at or below this length are never treated as instructions.
const MIN_INSTRUCTIONS_CHARS: usize = 50;

const LEGACY_PREFIXES: [&str; 2] = ["instruções finais:", "final instructions:"];
const LEGACY_REQUESTS: [&str; 2] = ["gerar instruções", "generate instructions"];

const CONFIG_SYSTEM_PROMPT: &str = "You are the Hubblet Configuration Assistant. You guide users, \
who may not be technical, through creating their own AI assistant. The basic questions (name, \
communication style, main functions, information sources) have been answered; their answers are \
summarized below. Help the user refine purpose, audience, tone and specific capabilities, offering \
suggestions where useful and asking for clarification when answers are vague. When you have enough \
information, or when the user asks you to generate the instructions, write complete, well-structured \
final instructions ready to be used as the new assistant's system prompt and pass them to the \
save_final_instructions tool.";

#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    #[error("no language-model API key is configured; set OPENAI_API_KEY to refine the assistant")]
    MissingApiKey,

    #[error("configuration model call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("the assistant needs a name before it can be saved")]
    MissingName,

    #[error("no final instructions yet; ask the configuration assistant to generate them")]
    MissingInstructions,
}

/// Where the dialogue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "field")]
pub enum DialogueState {
    /// Waiting for the answer to this field's question
    Asking(ConfigField),
    /// All fields answered; turns go to refinement
    Complete,
}

/// The dialogue's answer to one user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueReply {
    pub message: String,
    pub state: DialogueState,
    /// True when this turn produced (new) final instructions
    pub instructions_captured: bool,
}

/// Model, temperature and detection settings for the dialogue.
#[derive(Debug, Clone)]
pub struct DialogueSettings {
    pub model: String,
    pub temperature: f32,
    /// Also accept prefix-marked or requested replies as instructions
    pub legacy_detection: bool,
}

impl DialogueSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.chat_model.clone(),
            temperature: config.dialogue_temperature,
            legacy_detection: config.dialogue.legacy_detection,
        }
    }
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

pub struct ConfigDialogue {
    profile: AssistantProfile,
    state: DialogueState,
    transcript: Vec<Message>,
    editing: bool,
    /// Most recent refinement reply long enough to serve as instructions
    last_long_reply: Option<String>,
    settings: DialogueSettings,
}

impl ConfigDialogue {
    /// Start configuring a new assistant. The transcript opens with the
    /// welcome message and the first question.
    pub fn new(settings: DialogueSettings) -> Self {
        let first = ConfigField::first();
        let welcome = format!(
            "Hello! I'm the Hubblet Configuration Assistant and I'm here to help you create your \
             new custom assistant. Let's start with a few questions to define its basics. The first \
             one is: {}",
            first.question()
        );
        Self {
            profile: AssistantProfile::default(),
            state: DialogueState::Asking(first),
            transcript: vec![Message::assistant(welcome)],
            editing: false,
            last_long_reply: None,
            settings,
        }
    }

    /// Edit an existing assistant. With instructions the dialogue starts in
    /// `Complete`; otherwise it asks for the first unanswered field.
    pub fn edit(profile: AssistantProfile, settings: DialogueSettings) -> Self {
        let pending = match profile.instructions() {
            Some(_) => None,
            None => first_unanswered(&profile, None),
        };
        let (state, opening) = match pending {
            Some(field) => (
                DialogueState::Asking(field),
                format!(
                    "Editing '{}'. It has no instructions yet, so let's fill in the basics. {}",
                    profile.name,
                    field.question()
                ),
            ),
            None if profile.instructions().is_some() => (
                DialogueState::Complete,
                format!(
                    "Editing '{}'. The current instructions are loaded. You can refine them or ask for a new version.",
                    profile.name
                ),
            ),
            None => (
                DialogueState::Complete,
                format!(
                    "Editing '{}'. Ask the configuration assistant to generate its instructions.",
                    profile.name
                ),
            ),
        };
        Self {
            profile,
            state,
            transcript: vec![Message::assistant(opening)],
            editing: true,
            last_long_reply: None,
            settings,
        }
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    pub fn profile(&self) -> &AssistantProfile {
        &self.profile
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// The message shown before the first user turn.
    pub fn opening(&self) -> &str {
        self.transcript
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    /// Handle one user turn.
    ///
    /// Field states never call the provider. In `Complete` a provider is
    /// required; a failed call leaves the transcript as it was.
    pub async fn respond(
        &mut self,
        input: &str,
        provider: Option<&dyn Provider>,
    ) -> Result<DialogueReply, DialogueError> {
        let input = input.trim();
        match self.state {
            DialogueState::Asking(field) => Ok(self.answer_field(field, input)),
            DialogueState::Complete => {
                let provider = provider.ok_or(DialogueError::MissingApiKey)?;
                self.refine(input, provider).await
            }
        }
    }

    fn answer_field(&mut self, field: ConfigField, input: &str) -> DialogueReply {
        self.transcript.push(Message::user(input));
        if input.is_empty() {
            let message = field.question().to_string();
            self.transcript.push(Message::assistant(&message));
            return self.reply(message, false);
        }

        self.profile.set_field(field, input);
        debug!(field = field.label(), "Configuration field captured");

        let message = match first_unanswered(&self.profile, Some(field)) {
            Some(next) => {
                self.state = DialogueState::Asking(next);
                next.question().to_string()
            }
            None => {
                self.state = DialogueState::Complete;
                info!(assistant = %self.profile.name, "Basic configuration complete");
                "Basic configuration complete! Now you can refine the details with the AI or ask \
                 it to generate the final instructions. What would you like to do?"
                    .to_string()
            }
        };
        self.transcript.push(Message::assistant(&message));
        self.reply(message, false)
    }

    async fn refine(
        &mut self,
        input: &str,
        provider: &dyn Provider,
    ) -> Result<DialogueReply, DialogueError> {
        self.transcript.push(Message::user(input));
        let request = self.refinement_request();

        let response = match provider.complete(request).await {
            Ok(r) => r,
            Err(e) => {
                self.transcript.pop();
                warn!(error = %e, "Configuration model call failed");
                return Err(e.into());
            }
        };

        let reply = response.message;
        let mut captured = None;

        for call in reply.tool_calls.iter().filter(|c| c.name == SAVE_TOOL) {
            match parse_save_arguments(&call.arguments) {
                Some(instructions) => captured = Some(instructions),
                None => warn!(arguments = %call.arguments, "Ignoring malformed {SAVE_TOOL} call"),
            }
        }
        if captured.is_none() && self.settings.legacy_detection {
            captured = detect_legacy(input, &reply.content);
        }

        let text = reply.content.trim();
        let message = match (&captured, text.is_empty()) {
            (Some(_), true) => {
                "The final instructions are ready. Save the assistant to keep them.".to_string()
            }
            _ => text.to_string(),
        };

        if text.chars().count() > MIN_INSTRUCTIONS_CHARS {
            self.last_long_reply = Some(text.to_string());
        }
        let instructions_captured = captured.is_some();
        if let Some(instructions) = captured {
            info!(assistant = %self.profile.name, chars = instructions.len(), "Final instructions captured");
            self.profile.final_instructions = Some(instructions);
        }

        self.transcript.push(Message::assistant(&message));
        Ok(self.reply(message, instructions_captured))
    }

    /// Request for one refinement turn: system prompt, transcript, collected
    /// fields, and the current instructions when editing.
    pub fn refinement_request(&self) -> ProviderRequest {
        let mut messages = vec![Message::system(CONFIG_SYSTEM_PROMPT)];
        messages.extend(self.transcript.iter().cloned());

        let collected: Vec<String> = ConfigField::ORDER
            .iter()
            .filter_map(|f| self.profile.field(*f).map(|v| format!("- {}: {v}", f.label())))
            .collect();
        if !collected.is_empty() {
            messages.push(Message::system(format!(
                "Information collected so far:\n{}",
                collected.join("\n")
            )));
        }

        if self.editing {
            if let Some(current) = self.profile.instructions() {
                messages.push(Message::system(format!(
                    "Current instructions (being edited):\n{current}"
                )));
            }
        }

        ProviderRequest::new(&self.settings.model, messages, self.settings.temperature)
            .with_tool(save_tool())
    }

    /// Produce the profile to save.
    ///
    /// Without captured instructions, the last long refinement reply is used.
    pub fn finalize(&mut self) -> Result<AssistantProfile, DialogueError> {
        if self.profile.name.trim().is_empty() {
            return Err(DialogueError::MissingName);
        }
        if self.profile.instructions().is_none() {
            let fallback = self
                .last_long_reply
                .clone()
                .ok_or(DialogueError::MissingInstructions)?;
            info!("Using the last configuration reply as final instructions");
            self.profile.final_instructions = Some(fallback);
        }
        Ok(self.profile.clone())
    }

    fn reply(&self, message: String, instructions_captured: bool) -> DialogueReply {
        DialogueReply {
            message,
            state: self.state,
            instructions_captured,
        }
    }
}

/// The first field after `after` (or from the start) with no answer.
fn first_unanswered(profile: &AssistantProfile, after: Option<ConfigField>) -> Option<ConfigField> {
    let mut next = match after {
        Some(field) => field.next(),
        None => Some(ConfigField::first()),
    };
    while let Some(field) = next {
        if profile.field(field).is_none() {
            return Some(field);
        }
        next = field.next();
    }
    None
}

/// Tool definition offered on refinement turns.
pub fn save_tool() -> ToolDefinition {
    ToolDefinition {
        name: SAVE_TOOL.into(),
        description: "Save the complete final instructions (system prompt) for the assistant \
                      being configured."
            .into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "instructions": {
                    "type": "string",
                    "description": "The full system prompt for the new assistant"
                }
            },
            "required": ["instructions"]
        }),
    }
}

fn parse_save_arguments(arguments: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Args {
        instructions: String,
    }
    serde_json::from_str::<Args>(arguments)
        .ok()
        .map(|a| a.instructions.trim().to_string())
        .filter(|i| !i.is_empty())
}

/// Prefix-marked replies, or long replies to an explicit request.
fn detect_legacy(user_input: &str, reply: &str) -> Option<String> {
    let trimmed = reply.trim();
    let lowered = trimmed.to_lowercase();
    for prefix in LEGACY_PREFIXES {
        if lowered.starts_with(prefix) {
            // Lowercasing can shift byte offsets, so strip by characters.
            let rest: String = trimmed.chars().skip(prefix.chars().count()).collect();
            let rest = rest.trim();
            return (!rest.is_empty()).then(|| rest.to_string());
        }
    }

    let asked = user_input.to_lowercase();
    if LEGACY_REQUESTS.iter().any(|r| asked.starts_with(r))
        && trimmed.chars().count() > MIN_INSTRUCTIONS_CHARS
    {
        return Some(trimmed.to_string());
    }
    None
}

/// Count of user turns in a transcript; used by the CLI summary.
pub fn user_turns(transcript: &[Message]) -> usize {
    transcript.iter().filter(|m| m.role == Role::User).count()
}
