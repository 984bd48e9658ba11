//! Lead dispatcher port - delivery to the primary ingestion endpoint.

use async_trait::async_trait;
use serde::Serialize;

/// A finalized lead handed to the dispatcher.
///
/// Requires a name and at least one contact channel; the dispatcher does
/// not re-validate beyond that.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchLead {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Motive/summary composed by the pipeline.
    pub message: Option<String>,
}

impl DispatchLead {
    /// True when the lead can be dispatched at all.
    pub fn is_dispatchable(&self) -> bool {
        !self.name.trim().is_empty() && (self.email.is_some() || self.phone.is_some())
    }
}

/// Outcome of a dispatch attempt. Failure is an outcome, not an error:
/// the caller reports it but never unwinds past the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A 2xx response was received (possibly on the retry).
    Delivered,
    /// Both attempts failed; the last error is carried for logging.
    Failed { last_error: String },
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered)
    }
}

/// Port for delivering a finalized lead to the ingestion endpoint.
#[async_trait]
pub trait LeadDispatcher: Send + Sync {
    /// Delivers the lead with bounded retries. Never errors; the outcome
    /// carries the failure when both attempts are exhausted.
    async fn dispatch(&self, lead: &DispatchLead) -> DispatchOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatchable_needs_name_and_contact() {
        let lead = DispatchLead {
            name: "Ana".into(),
            email: Some("ana@example.com".into()),
            ..Default::default()
        };
        assert!(lead.is_dispatchable());
        assert!(!DispatchLead::default().is_dispatchable());
    }

    #[test]
    fn dispatcher_is_object_safe() {
        fn _accepts_dyn(_d: &dyn LeadDispatcher) {}
    }
}
