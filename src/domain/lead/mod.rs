//! Lead bounded context: slot extraction, normalization, and the lead record.

mod block;
mod extractor;
mod lead;
pub mod normalize;
mod slots;

pub use block::{extract_lead_block, render_lead_block, strip_lead_block, LeadBlock};
pub use extractor::extract_slots;
pub use lead::{compose_matter, NewLead};
pub use slots::{NextSlot, SlotSet};
