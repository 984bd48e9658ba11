//! Conversation bounded context: message log and aggregate.

mod conversation;
mod message;

pub use conversation::{Conversation, ConversationStatus};
pub use message::{Message, Role, MAX_INPUT_CHARS};
