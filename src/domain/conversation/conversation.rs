//! Conversation aggregate: an ordered message log with a status flag.
//!
//! The aggregate enforces the two log invariants the turn pipeline relies
//! on: the incoming user message is never appended twice in a row
//! (idempotent append), and the log is capped to a configured length by
//! dropping the oldest entries.

use serde::{Deserialize, Serialize};

use super::message::{Message, Role};
use crate::domain::foundation::ConversationId;

/// Lifecycle status of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Closed,
}

/// A conversation with its ordered message log.
///
/// Insertion order is chronological order. The aggregate never deletes
/// itself; retention is an external policy.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: ConversationId,
    messages: Vec<Message>,
    status: ConversationStatus,
}

impl Conversation {
    /// Creates a new active conversation with an empty log.
    pub fn new(id: ConversationId) -> Self {
        Self {
            id,
            messages: Vec::new(),
            status: ConversationStatus::Active,
        }
    }

    /// Reconstitutes a conversation from persistence.
    pub fn reconstitute(
        id: ConversationId,
        messages: Vec<Message>,
        status: ConversationStatus,
    ) -> Self {
        Self {
            id,
            messages,
            status,
        }
    }

    /// Returns the conversation ID.
    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    /// Returns the message log in chronological order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the current status.
    pub fn status(&self) -> ConversationStatus {
        self.status
    }

    /// Marks the conversation closed. Closing is idempotent.
    pub fn close(&mut self) {
        self.status = ConversationStatus::Closed;
    }

    /// Appends the incoming user message unless it duplicates the last entry.
    ///
    /// Returns true if the message was appended. A retry of the same turn
    /// (same trailing user text) is a no-op, keeping the log free of
    /// back-to-back duplicates.
    pub fn append_user_idempotent(&mut self, content: &str) -> bool {
        let duplicate = matches!(
            self.messages.last(),
            Some(last) if last.role == Role::User && last.content == content.trim()
        );
        if duplicate {
            return false;
        }
        self.messages.push(Message::user(content));
        true
    }

    /// Appends an assistant reply.
    pub fn append_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Drops the oldest messages so at most `max` remain.
    pub fn truncate_to_last(&mut self, max: usize) {
        if self.messages.len() > max {
            let drop = self.messages.len() - max;
            self.messages.drain(..drop);
        }
    }

    /// Replaces the whole log (stateless mode, history carried by the caller).
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Concatenated lower-cased text of every message, for slot extraction.
    pub fn transcript_lowercase(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}
