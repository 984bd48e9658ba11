//! Slot set and next-slot resolution.
//!
//! The dialogue state is not an explicit enum carried across turns; it is
//! derived each turn from which slots are already filled, in a fixed
//! priority order. Slots are monotonically discovered: once a field is set
//! the manager never clears it, only a fresh conversation resets them.

use serde::{Deserialize, Serialize};

/// The slot the assistant should ask for next, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextSlot {
    Name,
    Contact,
    Matter,
    Region,
    Commune,
    /// All required slots are filled; close and emit the lead.
    Close,
}

impl NextSlot {
    /// Wire name used in the steering instruction.
    pub fn as_str(&self) -> &'static str {
        match self {
            NextSlot::Name => "name",
            NextSlot::Contact => "contact",
            NextSlot::Matter => "motivo",
            NextSlot::Region => "region",
            NextSlot::Commune => "comuna",
            NextSlot::Close => "close",
        }
    }
}

/// The extracted or declared fields of one conversation.
///
/// `creditor` and `amount` are observed but never block closing; the
/// essentials are name, one contact channel, matter, region, and commune.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSet {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Legal matter ("motivo"): divorcio, despido, deuda, ...
    pub matter: Option<String>,
    /// Financial-institution creditor, when the matter involves debt.
    pub creditor: Option<String>,
    /// Claim amount in integer pesos.
    pub amount: Option<i64>,
    pub region: Option<String>,
    pub commune: Option<String>,
}

impl SlotSet {
    /// True if at least one contact channel is known. Email OR phone
    /// satisfies contact; both are never required.
    pub fn has_contact(&self) -> bool {
        self.email.is_some() || self.phone.is_some()
    }

    /// Computes the next unmet slot by priority order:
    /// name, contact, matter, region, commune, then close.
    pub fn next_slot(&self) -> NextSlot {
        if self.name.is_none() {
            return NextSlot::Name;
        }
        if !self.has_contact() {
            return NextSlot::Contact;
        }
        if self.matter.is_none() {
            return NextSlot::Matter;
        }
        if self.region.is_none() {
            return NextSlot::Region;
        }
        if self.commune.is_none() {
            return NextSlot::Commune;
        }
        NextSlot::Close
    }

    /// True when every required slot is filled.
    pub fn is_complete(&self) -> bool {
        self.next_slot() == NextSlot::Close
    }

    /// Fills any slot still empty from `other`, keeping existing values.
    ///
    /// Used to overlay model-declared fields onto pattern-extracted ones
    /// without ever clearing a resolved slot.
    pub fn merge_missing_from(&mut self, other: &SlotSet) {
        fn fill<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if dst.is_none() {
                *dst = src.clone();
            }
        }
        fill(&mut self.name, &other.name);
        fill(&mut self.email, &other.email);
        fill(&mut self.phone, &other.phone);
        fill(&mut self.matter, &other.matter);
        fill(&mut self.creditor, &other.creditor);
        fill(&mut self.amount, &other.amount);
        fill(&mut self.region, &other.region);
        fill(&mut self.commune, &other.commune);
    }
}
