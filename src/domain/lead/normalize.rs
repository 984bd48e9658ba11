//! Normalizers for lead fields.
//!
//! All functions here are pure and total over optional string input:
//! invalid input maps to `None`, never to an error.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

static MILLIONS_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(millones|millon|m\b)").expect("millions regex"));

static NUMBER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(\.\d+)?)").expect("number regex"));

/// Lower bound for a believable claim amount in pesos.
const AMOUNT_FLOOR: f64 = 1_000.0;
/// Upper bound for a believable claim amount in pesos.
const AMOUNT_CEILING: f64 = 100_000_000_000.0;

/// Lowercases and trims an email, accepting only a `local@domain.tld` shape.
pub fn norm_email(email: Option<&str>) -> Option<String> {
    let v = email?.trim().to_lowercase();
    if v.is_empty() || !EMAIL_SHAPE.is_match(&v) {
        return None;
    }
    Some(v)
}

/// Strips a phone down to digits, accepting 8 to 15 of them.
pub fn norm_phone(phone: Option<&str>) -> Option<String> {
    let digits: String = phone?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 8 || digits.len() > 15 {
        return None;
    }
    Some(digits)
}

/// Trims free text and collapses internal whitespace runs to one space.
pub fn norm_text(text: Option<&str>) -> Option<String> {
    let t = text?.trim();
    if t.is_empty() {
        return None;
    }
    Some(t.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Parses a claim amount in Chilean pesos.
///
/// Handles the Latin-American convention ("." as thousands separator, ","
/// as decimal separator) and a "millones"/"m" multiplier, e.g. "10 millones",
/// "300.000.000", "15m", "1,2 M". Values outside a sane bound map to `None`.
pub fn parse_amount_clp(input: Option<&str>) -> Option<i64> {
    let s = input?.to_lowercase();
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // "300.000.000" -> "300000000" ; "1,2" -> "1.2"
    let normalized = s.replace('.', "").replace(',', ".");
    let has_millions = MILLIONS_MARKER.is_match(&normalized);

    let base: f64 = NUMBER_TOKEN
        .captures(&normalized)?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;
    if !base.is_finite() || base <= 0.0 {
        return None;
    }

    let value = if has_millions { base * 1_000_000.0 } else { base };
    if !(AMOUNT_FLOOR..=AMOUNT_CEILING).contains(&value) {
        return None;
    }

    Some(value.round() as i64)
}

/// Formats an amount as thousands-grouped Chilean pesos, e.g. `$1.200.000`.
pub fn format_clp(amount: Option<i64>) -> Option<String> {
    let n = amount?;
    if n <= 0 {
        return None;
    }
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    Some(format!("${}", grouped))
}
