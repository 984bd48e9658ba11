//! Slot extraction over the conversation transcript.
//!
//! Extraction is a stateless scan of the full lower-cased transcript:
//! running it twice over the same text yields the same slot set, and an
//! incremental scan as turns arrive gives the same result as a full rescan.
//! First match wins for every single-valued field. This is deliberate
//! lightweight pattern matching, not intent classification.
//!
//! Region and commune are never pattern-extracted here; free-text
//! geographic extraction is unreliable, so those slots are obtained by
//! explicitly asking (see the turn pipeline's anchored recovery).

use once_cell::sync::Lazy;
use regex::Regex;

use super::normalize::{norm_email, norm_phone, norm_text, parse_amount_clp};
use super::slots::SlotSet;

static EMAIL_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^\s@]+@[^\s@]+\.[^\s@]+)").expect("email token regex"));

// A run of phone punctuation; digits-only projection validated afterwards.
static PHONE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\+?[\d\-\s\(\)]{8,20})").expect("phone run regex"));

static NAME_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:mi nombre es|me llamo|soy)\s+([a-záéíóúñ\s]{2,60})").expect("name regex")
});

// Closed vocabulary of financial institutions; creditor only matters in
// debt conversations.
static CREDITOR_VOCAB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(santander|ripley|scotiabank|bci|falabella|lider|bbva|itau|cmr|la\s*polar|banco)\b")
        .expect("creditor regex")
});

// Closed vocabulary of legal-topic keywords across practice areas.
static MATTER_VOCAB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(dicom|cobranza|repactaci[oó]n|prescripci[oó]n|deuda|demanda|juicio|divorcio|herencia|testamento|sucesi[oó]n|despido|finiquito|tutel|custodia|pensi[oó]n|alimento|visitas|delito|estafa|robo|homicidio|lesiones|tr[áa]nsito|choque|contrato|arriendo|inmobiliario|penal|laboral|civil|familia)\b",
    )
    .expect("matter regex")
});

static AMOUNT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d[\d\.,]*\s*(millones|millon|m\b)?)").expect("amount regex"));

/// Scans a lower-cased transcript for lead slots.
///
/// Never errors: anything that does not match simply stays absent.
/// Region and commune always come back `None` from this function.
pub fn extract_slots(transcript: &str) -> SlotSet {
    let email = norm_email(first_capture(&EMAIL_TOKEN, transcript).as_deref());
    let phone = norm_phone(first_capture(&PHONE_RUN, transcript).as_deref());
    let name = norm_text(first_capture(&NAME_PHRASE, transcript).as_deref());
    let creditor = norm_text(first_capture(&CREDITOR_VOCAB, transcript).as_deref());
    let matter = norm_text(MATTER_VOCAB.find(transcript).map(|m| m.as_str()));
    let amount = parse_amount_clp(AMOUNT_TOKEN.find(transcript).map(|m| m.as_str()));

    SlotSet {
        name,
        email,
        phone,
        matter,
        creditor,
        amount,
        region: None,
        commune: None,
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
