//! Lead recording with contact-based dedupe.
//!
//! Persistence is gated by a config toggle, the minimum fields are
//! re-validated here regardless of what the extraction layer produced, and
//! a repeat contact within the dedupe window resolves to the existing lead
//! instead of inserting a second row. Recording never fails the caller; a
//! persistence failure becomes an outcome.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::LeadsConfig;
use crate::domain::foundation::{ConversationId, LeadId, Timestamp};
use crate::domain::lead::normalize::{norm_email, norm_phone, norm_text};
use crate::domain::lead::{compose_matter, NewLead, SlotSet};
use crate::ports::LeadRepository;

/// What happened to a lead candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadOutcome {
    /// A new lead row was created.
    Inserted(LeadId),
    /// A lead with the same contact already exists inside the window.
    Deduped(LeadId),
    /// Minimum fields missing (no name, or neither contact channel).
    Skipped,
    /// Persistence is turned off or unavailable for this turn.
    Disabled,
    /// The repository failed; the turn continues without a local record.
    Error,
}

impl LeadOutcome {
    /// Wire name reported to API clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadOutcome::Inserted(_) => "inserted",
            LeadOutcome::Deduped(_) => "deduped",
            LeadOutcome::Skipped => "skipped",
            LeadOutcome::Disabled => "disabled",
            LeadOutcome::Error => "error",
        }
    }

    /// The local lead id, when one exists.
    pub fn lead_id(&self) -> Option<LeadId> {
        match self {
            LeadOutcome::Inserted(id) | LeadOutcome::Deduped(id) => Some(*id),
            _ => None,
        }
    }
}

/// Records finalized leads with dedupe.
pub struct LeadRecorder {
    repository: Arc<dyn LeadRepository>,
    save_leads: bool,
    dedupe_window_hours: i64,
}

impl LeadRecorder {
    /// Creates a recorder from the lead pipeline configuration.
    pub fn new(repository: Arc<dyn LeadRepository>, config: &LeadsConfig) -> Self {
        Self {
            repository,
            save_leads: config.save_leads,
            dedupe_window_hours: config.dedupe_window_hours,
        }
    }

    /// Records one lead candidate.
    ///
    /// All fields are re-normalized here; upstream extraction results are
    /// not trusted. `source` and `channel` tag where the lead came from
    /// ("bot"/"bot" on the chat path, "form"/"landing" on the form path).
    pub async fn record(
        &self,
        slots: &SlotSet,
        conversation_id: Option<ConversationId>,
        source: &str,
        channel: &str,
    ) -> LeadOutcome {
        if !self.save_leads {
            return LeadOutcome::Disabled;
        }

        let name = norm_text(slots.name.as_deref());
        let email = norm_email(slots.email.as_deref());
        let phone = norm_phone(slots.phone.as_deref());

        let name = match name {
            Some(name) => name,
            None => return LeadOutcome::Skipped,
        };
        if email.is_none() && phone.is_none() {
            return LeadOutcome::Skipped;
        }

        let since = Timestamp::now().minus_hours(self.dedupe_window_hours);
        match self
            .repository
            .find_recent_by_contact(email.as_deref(), phone.as_deref(), since)
            .await
        {
            Ok(Some(existing)) => {
                info!(lead_id = %existing, "duplicate contact inside dedupe window");
                return LeadOutcome::Deduped(existing);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "lead dedupe query failed");
                return LeadOutcome::Error;
            }
        }

        let matter = compose_matter(
            norm_text(slots.matter.as_deref()).as_deref(),
            norm_text(slots.creditor.as_deref()).as_deref(),
            slots.amount,
            norm_text(slots.region.as_deref()).as_deref(),
            norm_text(slots.commune.as_deref()).as_deref(),
        );

        let lead = NewLead {
            name,
            email,
            phone,
            matter,
            channel: channel.to_string(),
            source: source.to_string(),
            conversation_id,
        };

        match self.repository.insert(&lead).await {
            Ok(id) => {
                info!(lead_id = %id, channel, "lead recorded");
                LeadOutcome::Inserted(id)
            }
            Err(err) => {
                warn!(error = %err, "lead insert failed");
                LeadOutcome::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::ports::StoreError;

    /// In-memory repository for recorder tests.
    #[derive(Default)]
    struct InMemoryLeads {
        rows: Mutex<Vec<(LeadId, NewLead, Timestamp)>>,
        fail_inserts: bool,
    }

    #[async_trait]
    impl LeadRepository for InMemoryLeads {
        async fn find_recent_by_contact(
            &self,
            email: Option<&str>,
            phone: Option<&str>,
            since: Timestamp,
        ) -> Result<Option<LeadId>, StoreError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|(_, lead, at)| {
                    !at.is_before(&since)
                        && (email.is_some() && lead.email.as_deref() == email
                            || phone.is_some() && lead.phone.as_deref() == phone)
                })
                .map(|(id, _, _)| *id)
                .next_back())
        }

        async fn insert(&self, lead: &NewLead) -> Result<LeadId, StoreError> {
            if self.fail_inserts {
                return Err(StoreError::Database("insert failed".into()));
            }
            let id = LeadId::new();
            self.rows
                .lock()
                .unwrap()
                .push((id, lead.clone(), Timestamp::now()));
            Ok(id)
        }
    }

    fn slots() -> SlotSet {
        SlotSet {
            name: Some("Ana Rojas".into()),
            email: Some("Ana@Example.com".into()),
            phone: Some("+56 9 1234 5678".into()),
            matter: Some("deuda".into()),
            ..Default::default()
        }
    }

    fn recorder(repo: Arc<InMemoryLeads>) -> LeadRecorder {
        LeadRecorder::new(repo, &LeadsConfig::default())
    }

    #[tokio::test]
    async fn inserts_and_normalizes() {
        let repo = Arc::new(InMemoryLeads::default());
        let outcome = recorder(repo.clone())
            .record(&slots(), None, "bot", "bot")
            .await;
        assert!(matches!(outcome, LeadOutcome::Inserted(_)));

        let rows = repo.rows.lock().unwrap();
        let (_, lead, _) = &rows[0];
        assert_eq!(lead.email.as_deref(), Some("ana@example.com"));
        assert_eq!(lead.phone.as_deref(), Some("56912345678"));
        assert_eq!(lead.channel, "bot");
    }

    #[tokio::test]
    async fn second_submission_inside_window_is_deduped() {
        let repo = Arc::new(InMemoryLeads::default());
        let recorder = recorder(repo);

        let first = recorder.record(&slots(), None, "bot", "bot").await;
        let second = recorder.record(&slots(), None, "bot", "bot").await;

        assert!(matches!(second, LeadOutcome::Deduped(_)));
        assert_eq!(second.lead_id(), first.lead_id());
    }

    #[tokio::test]
    async fn old_row_outside_window_does_not_dedupe() {
        let repo = Arc::new(InMemoryLeads::default());
        let stale = NewLead {
            name: "Ana Rojas".into(),
            email: Some("ana@example.com".into()),
            phone: Some("56912345678".into()),
            matter: None,
            channel: "bot".into(),
            source: "bot".into(),
            conversation_id: None,
        };
        repo.rows.lock().unwrap().push((
            LeadId::new(),
            stale,
            Timestamp::now().minus_hours(72),
        ));

        let outcome = recorder(repo.clone())
            .record(&slots(), None, "bot", "bot")
            .await;
        assert!(matches!(outcome, LeadOutcome::Inserted(_)));
        assert_eq!(repo.rows.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_name_is_skipped() {
        let repo = Arc::new(InMemoryLeads::default());
        let mut incomplete = slots();
        incomplete.name = None;
        let outcome = recorder(repo).record(&incomplete, None, "bot", "bot").await;
        assert_eq!(outcome, LeadOutcome::Skipped);
    }

    #[tokio::test]
    async fn missing_both_contacts_is_skipped() {
        let repo = Arc::new(InMemoryLeads::default());
        let mut incomplete = slots();
        incomplete.email = None;
        incomplete.phone = None;
        let outcome = recorder(repo).record(&incomplete, None, "bot", "bot").await;
        assert_eq!(outcome, LeadOutcome::Skipped);
    }

    #[tokio::test]
    async fn invalid_contact_values_count_as_absent() {
        let repo = Arc::new(InMemoryLeads::default());
        let mut bad = slots();
        bad.email = Some("not-an-email".into());
        bad.phone = Some("123".into());
        let outcome = recorder(repo).record(&bad, None, "bot", "bot").await;
        assert_eq!(outcome, LeadOutcome::Skipped);
    }

    #[tokio::test]
    async fn toggle_off_disables_recording() {
        let repo = Arc::new(InMemoryLeads::default());
        let config = LeadsConfig {
            save_leads: false,
            ..Default::default()
        };
        let recorder = LeadRecorder::new(repo, &config);
        let outcome = recorder.record(&slots(), None, "bot", "bot").await;
        assert_eq!(outcome, LeadOutcome::Disabled);
    }

    #[tokio::test]
    async fn insert_failure_becomes_error_outcome() {
        let repo = Arc::new(InMemoryLeads {
            fail_inserts: true,
            ..Default::default()
        });
        let outcome = recorder(repo).record(&slots(), None, "bot", "bot").await;
        assert_eq!(outcome, LeadOutcome::Error);
    }

    #[test]
    fn outcome_wire_names() {
        assert_eq!(LeadOutcome::Skipped.as_str(), "skipped");
        assert_eq!(LeadOutcome::Disabled.as_str(), "disabled");
        assert_eq!(LeadOutcome::Error.as_str(), "error");
        assert_eq!(LeadOutcome::Inserted(LeadId::new()).as_str(), "inserted");
    }
}
