//! Foundation value objects shared across the domain.

mod ids;
mod timestamp;

pub use ids::{ConversationId, LeadId};
pub use timestamp::Timestamp;
