//! Ports: interfaces between the application core and the outside world.

mod ai_provider;
mod conversation_store;
mod crm_sink;
mod lead_dispatcher;
mod lead_repository;

pub use ai_provider::{AiError, AiProvider};
pub use conversation_store::{ConversationStore, StoreError};
pub use crm_sink::{CrmDelivery, CrmError, CrmLeadPayload, CrmSink};
pub use lead_dispatcher::{DispatchLead, DispatchOutcome, LeadDispatcher};
pub use lead_repository::LeadRepository;
