//! Conversation store port.
//!
//! Fetch-or-create plus append-only update of a conversation's message log.
//! Store failures are survivable: the turn pipeline downgrades to stateless
//! mode instead of failing the request.

use async_trait::async_trait;

use crate::domain::conversation::{Conversation, Message};
use crate::domain::foundation::ConversationId;

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store cannot be reached or is misconfigured.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A query or write failed.
    #[error("database error: {0}")]
    Database(String),

    /// The referenced conversation does not exist.
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),
}

/// Repository contract for conversation persistence.
///
/// The store exclusively owns Conversation/Message persistence; the turn
/// pipeline never mutates storage through any other path. Two concurrent
/// turns for the same conversation race on the read-modify-write of the
/// message log; last write wins.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Fetches the conversation with the given id, or creates a fresh
    /// active one when no id is supplied or the id is unknown.
    async fn get_or_create(
        &self,
        id: Option<ConversationId>,
    ) -> Result<Conversation, StoreError>;

    /// Replaces the conversation's message log.
    async fn update_messages(
        &self,
        id: &ConversationId,
        messages: &[Message],
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_is_object_safe() {
        fn _accepts_dyn(_s: &dyn ConversationStore) {}
    }
}
