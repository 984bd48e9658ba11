//! Application layer: use-case orchestration over the ports.

mod chat_turn;
mod record_lead;

pub use chat_turn::{
    ChatTurnError, ChatTurnHandler, ChatTurnRequest, ChatTurnResponse, CrmSyncStatus, LeadData,
    Persistence, DEFAULT_SYSTEM_PROMPT,
};
pub use record_lead::{LeadOutcome, LeadRecorder};
