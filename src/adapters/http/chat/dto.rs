//! HTTP DTOs for the chat endpoint.
//!
//! The wire shape matches what the chat widget already sends: camelCase
//! keys, bare `{role, content}` history entries, and a `leadData` object
//! the widget forwards to the lead endpoint on its own.

use serde::{Deserialize, Serialize};

use crate::application::{ChatTurnResponse, LeadData};
use crate::domain::conversation::{Message, Role};

/// Inbound chat turn.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<HistoryEntry>>,
}

/// One caller-supplied history entry. Deliberately lenient: entries with
/// an unknown role are dropped instead of rejecting the request.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl HistoryEntry {
    /// Converts to a domain message, or None for unknown roles.
    pub fn into_message(self) -> Option<Message> {
        let role = match self.role.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "system" => Role::System,
            _ => return None,
        };
        Some(Message::new(role, self.content))
    }
}

/// Finalized lead handed back to the widget. Fields the block did not
/// carry serialize as null rather than being dropped; the widget keys on
/// the object's presence.
#[derive(Debug, Clone, Serialize)]
pub struct LeadDataDto {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

impl From<LeadData> for LeadDataDto {
    fn from(lead: LeadData) -> Self {
        Self {
            name: lead.name,
            email: lead.email,
            phone: lead.phone,
            message: lead.message,
        }
    }
}

/// Outbound chat turn result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub conversation_id: String,
    pub reply: String,
    pub lead_data: Option<LeadDataDto>,
    pub lead_id: Option<String>,
    pub lead_status: &'static str,
    pub persistence: &'static str,
    pub crm_sync: Option<&'static str>,
    pub crm_lead_id: Option<String>,
}

impl From<ChatTurnResponse> for ChatMessageResponse {
    fn from(response: ChatTurnResponse) -> Self {
        Self {
            conversation_id: response.conversation_id.to_string(),
            reply: response.reply,
            lead_data: response.lead_data.map(LeadDataDto::from),
            lead_id: response.lead_outcome.lead_id().map(|id| id.to_string()),
            lead_status: response.lead_outcome.as_str(),
            persistence: response.persistence.as_str(),
            crm_sync: response.crm_sync.map(|s| s.as_str()),
            crm_lead_id: response.crm_lead_id,
        }
    }
}

/// Error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_camel_case_keys() {
        let request: ChatMessageRequest = serde_json::from_str(
            r#"{"message":"hola","conversationId":"abc","systemPrompt":"x","history":[{"role":"user","content":"hola"}]}"#,
        )
        .unwrap();
        assert_eq!(request.message.as_deref(), Some("hola"));
        assert_eq!(request.conversation_id.as_deref(), Some("abc"));
        assert_eq!(request.history.unwrap().len(), 1);
    }

    #[test]
    fn unknown_history_role_is_dropped() {
        let entry = HistoryEntry {
            role: "tool".into(),
            content: "x".into(),
        };
        assert!(entry.into_message().is_none());
    }

    #[test]
    fn response_serializes_camel_case() {
        let response = ChatMessageResponse {
            conversation_id: "c1".into(),
            reply: "hola".into(),
            lead_data: None,
            lead_id: None,
            lead_status: "skipped",
            persistence: "postgres",
            crm_sync: None,
            crm_lead_id: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["conversationId"], "c1");
        assert_eq!(json["leadStatus"], "skipped");
        assert!(json["leadData"].is_null());
    }
}
