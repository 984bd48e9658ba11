//! The structured lead block embedded in assistant replies.
//!
//! The model signals a completed lead by appending a single delimited JSON
//! fragment to its closing message: `<LEAD>{...}</LEAD>`. This is an
//! explicit wire contract between the model and the pipeline, carried
//! inside the text channel; it is a control signal and is stripped before
//! the reply reaches the end user. Parsing is defensive: an unparseable
//! block is treated as absent, never as an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static LEAD_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<LEAD>\s*(.*?)\s*</LEAD>").expect("lead block regex"));

/// Fields of a structured lead block, as emitted by the model.
///
/// All fields are optional strings; normalization is reapplied locally
/// before the block is trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadBlock {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub motivo: Option<String>,
    #[serde(default)]
    pub acreedor: Option<String>,
    #[serde(default)]
    pub monto: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub comuna: Option<String>,
}

/// Extracts the first lead block from a reply, if present and well formed.
pub fn extract_lead_block(text: &str) -> Option<LeadBlock> {
    let fragment = LEAD_BLOCK.captures(text)?.get(1)?.as_str();
    serde_json::from_str(fragment).ok()
}

/// Removes the lead block from the user-visible reply.
pub fn strip_lead_block(text: &str) -> String {
    LEAD_BLOCK.replace(text, "").trim().to_string()
}

/// Renders a lead block for a synthesized close.
pub fn render_lead_block(block: &LeadBlock) -> String {
    // LeadBlock serialization cannot fail: all fields are plain strings.
    let json = serde_json::to_string(block).unwrap_or_default();
    format!("<LEAD>{}</LEAD>", json)
}
