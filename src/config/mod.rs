//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `LEXBOT` prefix
//! and nested sections use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use lexbot::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod ai;
mod crm;
mod database;
mod error;
mod leads;
mod server;

pub use ai::{strip_quotes, AiConfig, LlmProvider};
pub use crm::CrmConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use leads::LeadsConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// LLM provider configuration (Gemini/OpenAI)
    #[serde(default)]
    pub ai: AiConfig,

    /// Lead capture configuration (save toggle, dedupe window, history cap)
    #[serde(default)]
    pub leads: LeadsConfig,

    /// CRM destination configuration (intake + ingestion endpoints)
    #[serde(default)]
    pub crm: CrmConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Reads `.env` if present (development), then environment variables
    /// with the `LEXBOT` prefix and `__` as nesting separator:
    ///
    /// - `LEXBOT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `LEXBOT__AI__GEMINI_API_KEY=...` -> `ai.gemini_api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("LEXBOT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.ai.validate()?;
        self.leads.validate()?;
        self.crm.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AppConfig {
        AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/lexbot".to_string(),
                min_connections: 1,
                max_connections: 10,
                acquire_timeout_secs: 5,
                run_migrations: false,
            },
            ai: AiConfig {
                gemini_api_key: Some("key".to_string()),
                ..Default::default()
            },
            leads: LeadsConfig::default(),
            crm: CrmConfig::default(),
        }
    }

    #[test]
    fn full_config_validates() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn validation_propagates_section_errors() {
        let mut config = base();
        config.ai.gemini_api_key = None;
        assert!(config.validate().is_err());
    }
}
