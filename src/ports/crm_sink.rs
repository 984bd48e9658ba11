//! CRM sink port - outbound sync of a finalized lead to the intake system.

use async_trait::async_trait;
use serde::Serialize;

/// Payload for the CRM intake endpoint.
///
/// The wire format duplicates values under English and Spanish aliases;
/// the adapter handles that expansion, this struct carries each value once.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrmLeadPayload {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub rut: Option<String>,
    pub message: Option<String>,
    /// "consulta" for bot-originated leads, "evaluacion" for form leads.
    pub lead_type: String,
    pub source: Option<String>,
    /// "bot" or "form".
    pub origin: Option<String>,
    pub conversation_id: Option<String>,
    pub form_id: Option<String>,
}

/// Successful delivery: the remote lead id when the CRM returned one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmDelivery {
    pub lead_id: Option<String>,
    pub status: u16,
}

/// CRM delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    /// Intake token not configured. Fatal for the capability.
    #[error("intake token is missing")]
    MissingToken,

    /// Network failure or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The CRM rejected the lead.
    #[error("intake rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl CrmError {
    /// HTTP status to report to the caller of the ingestion endpoint.
    pub fn status(&self) -> u16 {
        match self {
            CrmError::MissingToken => 500,
            CrmError::Network(_) => 502,
            CrmError::Rejected { status, .. } => *status,
        }
    }
}

/// Port for delivering a lead to the external CRM.
#[async_trait]
pub trait CrmSink: Send + Sync {
    /// Delivers one lead. A failed delivery never rolls back the local
    /// record; local persistence and external sync are independent.
    async fn deliver(&self, payload: &CrmLeadPayload) -> Result<CrmDelivery, CrmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_mapping() {
        assert_eq!(CrmError::MissingToken.status(), 500);
        assert_eq!(CrmError::Network("timeout".into()).status(), 502);
        assert_eq!(
            CrmError::Rejected {
                status: 422,
                message: "bad".into()
            }
            .status(),
            422
        );
    }

    #[test]
    fn crm_sink_is_object_safe() {
        fn _accepts_dyn(_s: &dyn CrmSink) {}
    }
}
