//! CRM endpoint configuration
//!
//! Two destinations: the intake endpoint (full dual-alias sync) and the
//! ingestion endpoint (dispatcher target reached from the widget path).

use serde::Deserialize;

use super::ai::strip_quotes;
use super::error::ValidationError;

/// CRM destinations configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrmConfig {
    /// Intake endpoint URL
    #[serde(default = "default_intake_url")]
    pub intake_url: String,

    /// Intake bearer token
    pub intake_token: Option<String>,

    /// Legacy name for the intake bearer token, kept for deployments that
    /// still set the old variable
    pub legacy_intake_token: Option<String>,

    /// Ingestion endpoint URL
    #[serde(default = "default_ingest_url")]
    pub ingest_url: String,

    /// Ingestion API key
    pub ingest_api_key: Option<String>,

    /// Outbound call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl CrmConfig {
    /// Resolved intake token: new name wins over the legacy one, accidental
    /// quoting stripped.
    pub fn resolved_intake_token(&self) -> Option<String> {
        self.intake_token
            .as_deref()
            .or(self.legacy_intake_token.as_deref())
            .map(strip_quotes)
            .filter(|t| !t.is_empty())
    }

    /// Resolved ingestion key, quoting stripped.
    pub fn resolved_ingest_key(&self) -> Option<String> {
        self.ingest_api_key
            .as_deref()
            .map(strip_quotes)
            .filter(|t| !t.is_empty())
    }

    /// Validate CRM configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        for url in [&self.intake_url, &self.ingest_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidIntakeUrl);
            }
        }
        Ok(())
    }
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            intake_url: default_intake_url(),
            intake_token: None,
            legacy_intake_token: None,
            ingest_url: default_ingest_url(),
            ingest_api_key: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_intake_url() -> String {
    "https://www.xel.cl/api/intake/deudacero-lead".to_string()
}

fn default_ingest_url() -> String {
    "https://api.geimser.com/api/leads/ingest".to_string()
}

fn default_timeout() -> u64 {
    5
}
