//! HTTP adapters - REST API implementations.
//!
//! The chat endpoint drives the turn pipeline; the lead endpoints receive
//! finalized leads from the widget and the landing-page form.

pub mod chat;
pub mod lead;

pub use chat::{chat_router, ChatAppState};
pub use lead::{lead_router, LeadAppState};
