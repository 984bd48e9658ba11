//! Lead pipeline configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Lead capture and dedupe configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LeadsConfig {
    /// Toggle local lead persistence
    #[serde(default = "default_save_leads")]
    pub save_leads: bool,

    /// Trailing dedupe window in hours
    #[serde(default = "default_dedupe_window")]
    pub dedupe_window_hours: i64,

    /// Maximum retained history messages per conversation
    #[serde(default = "default_max_history")]
    pub max_history_messages: usize,
}

impl LeadsConfig {
    /// Validate lead pipeline configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dedupe_window_hours < 1 {
            return Err(ValidationError::InvalidDedupeWindow);
        }
        if self.max_history_messages < 2 {
            return Err(ValidationError::InvalidHistoryCap);
        }
        Ok(())
    }
}

impl Default for LeadsConfig {
    fn default() -> Self {
        Self {
            save_leads: default_save_leads(),
            dedupe_window_hours: default_dedupe_window(),
            max_history_messages: default_max_history(),
        }
    }
}

fn default_save_leads() -> bool {
    true
}

fn default_dedupe_window() -> i64 {
    48
}

fn default_max_history() -> usize {
    30
}
