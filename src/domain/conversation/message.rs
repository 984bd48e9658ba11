//! Messages in a conversation log.
//!
//! Messages serialize to the same `{role, content}` shape the chat widget
//! sends and the store persists, so this type is both the domain record and
//! the wire format of the history array.

use serde::{Deserialize, Serialize};

/// Maximum characters accepted for a single message.
pub const MAX_INPUT_CHARS: usize = 2000;

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (never shown to the user).
    System,
    /// End-user input.
    User,
    /// Assistant (model) response.
    Assistant,
}

impl Role {
    /// Returns true if messages with this role are part of the visible chat.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::User | Self::Assistant)
    }
}

/// A single entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: Role,
    /// Message text, trimmed and capped at [`MAX_INPUT_CHARS`].
    pub content: String,
    /// Suggested quick-reply options (assistant messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Message {
    /// Creates a new message, trimming and capping the content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        let content: String = content.into();
        let trimmed = content.trim();
        let capped: String = trimmed.chars().take(MAX_INPUT_CHARS).collect();
        Self {
            role,
            content: capped,
            options: None,
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Attaches quick-reply options to an assistant message.
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    /// Returns true if this message is from the user.
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Returns true if this message is from the assistant.
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}
