//! Lead repository port.

use async_trait::async_trait;

use super::conversation_store::StoreError;
use crate::domain::foundation::{LeadId, Timestamp};
use crate::domain::lead::NewLead;

/// Repository contract for lead persistence, including the dedupe query.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Finds a lead created at or after `since` matching the given email
    /// and/or phone.
    ///
    /// When both identifiers are present, either one matching counts as a
    /// duplicate; otherwise whichever is present is matched. Callers must
    /// pass at least one identifier.
    async fn find_recent_by_contact(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<LeadId>, StoreError>;

    /// Inserts a new lead and returns its id.
    async fn insert(&self, lead: &NewLead) -> Result<LeadId, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_repository_is_object_safe() {
        fn _accepts_dyn(_r: &dyn LeadRepository) {}
    }
}
