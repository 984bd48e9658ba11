//! The lead record: a prospective client's contact and need, bound for a CRM.

use serde::{Deserialize, Serialize};

use super::normalize::format_clp;
use crate::domain::foundation::ConversationId;

/// A lead ready to be persisted.
///
/// Invariants enforced upstream by the recorder: `name` present and at
/// least one of `email`/`phone` present (phone digits-only, 8-15 digits).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub email: Option<String>,
    /// Digits-only, 8-15 digits.
    pub phone: Option<String>,
    /// Enriched matter summary, see [`compose_matter`].
    pub matter: Option<String>,
    /// Channel the lead arrived through ("bot" or "landing").
    pub channel: String,
    pub source: String,
    pub conversation_id: Option<ConversationId>,
}

impl NewLead {
    /// True when the minimum fields for persistence are present.
    pub fn has_required_fields(&self) -> bool {
        !self.name.trim().is_empty() && (self.email.is_some() || self.phone.is_some())
    }
}

/// Composes the enriched matter summary persisted and forwarded with a lead.
///
/// Folds the optional creditor, amount, and location into a single string
/// field so no schema changes are needed downstream, e.g.
/// `deuda | Acreedor: santander | Monto aprox: $10.000.000 | Ubicación: Providencia, Metropolitana`.
pub fn compose_matter(
    base_matter: Option<&str>,
    creditor: Option<&str>,
    amount_clp: Option<i64>,
    region: Option<&str>,
    commune: Option<&str>,
) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(m) = base_matter {
        parts.push(m.to_string());
    }
    if let Some(c) = creditor {
        parts.push(format!("Acreedor: {}", c));
    }
    if let Some(formatted) = format_clp(amount_clp) {
        parts.push(format!("Monto aprox: {}", formatted));
    }
    let location: Vec<&str> = [commune, region].into_iter().flatten().collect();
    if !location.is_empty() {
        parts.push(format!("Ubicación: {}", location.join(", ")));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}
