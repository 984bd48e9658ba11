//! LLM provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// LLM provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Backend selection: auto picks the first backend with a credential,
    /// preferring Gemini.
    #[serde(default)]
    pub provider: LlmProvider,

    /// Gemini API key
    pub gemini_api_key: Option<String>,

    /// Gemini model name (alias resolution happens at call time)
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Gemini API version ("v1beta", "v1", or bare "1beta")
    #[serde(default = "default_gemini_api_version")]
    pub gemini_api_version: String,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// OpenAI model name
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Nucleus sampling parameter
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Per-HTTP-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// LLM backend selection
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Auto,
    Gemini,
    OpenAi,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if Gemini is configured
    pub fn has_gemini(&self) -> bool {
        self.gemini_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Check if OpenAI is configured
    pub fn has_openai(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Gemini API version, normalized to a leading "v".
    pub fn gemini_api_version_normalized(&self) -> String {
        let v = strip_quotes(&self.gemini_api_version);
        if v.starts_with('v') {
            v
        } else {
            format!("v{}", v)
        }
    }

    /// Validate LLM configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.provider {
            LlmProvider::Gemini if !self.has_gemini() => {
                return Err(ValidationError::MissingRequired("LEXBOT__AI__GEMINI_API_KEY"));
            }
            LlmProvider::OpenAi if !self.has_openai() => {
                return Err(ValidationError::MissingRequired("LEXBOT__AI__OPENAI_API_KEY"));
            }
            LlmProvider::Auto if !self.has_gemini() && !self.has_openai() => {
                return Err(ValidationError::NoLlmProviderConfigured);
            }
            _ => {}
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Auto,
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            gemini_api_version: default_gemini_api_version(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Strips accidental quoting from an env-sourced value
/// (`"gemini-1.5-flash"` pasted with its quotes).
pub fn strip_quotes(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_gemini_api_version() -> String {
    "v1beta".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    500
}

fn default_top_p() -> f32 {
    1.0
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_auto() {
        let config = AiConfig::default();
        assert_eq!(config.provider, LlmProvider::Auto);
        assert_eq!(config.gemini_model, "gemini-1.5-flash-latest");
        assert_eq!(config.max_tokens, 500);
    }

    #[test]
    fn auto_without_any_key_fails_validation() {
        assert!(matches!(
            AiConfig::default().validate(),
            Err(ValidationError::NoLlmProviderConfigured)
        ));
    }

    #[test]
    fn forced_gemini_requires_its_key() {
        let config = AiConfig {
            provider: LlmProvider::Gemini,
            openai_api_key: Some("sk-xxx".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired("LEXBOT__AI__GEMINI_API_KEY"))
        ));
    }

    #[test]
    fn api_version_normalizes_leading_v() {
        let config = AiConfig {
            gemini_api_version: "1beta".to_string(),
            ..Default::default()
        };
        assert_eq!(config.gemini_api_version_normalized(), "v1beta");

        let config = AiConfig {
            gemini_api_version: "\"v1\"".to_string(),
            ..Default::default()
        };
        assert_eq!(config.gemini_api_version_normalized(), "v1");
    }

    #[test]
    fn strip_quotes_removes_accidental_quoting() {
        assert_eq!(strip_quotes("'gemini-pro'"), "gemini-pro");
        assert_eq!(strip_quotes("\"token\""), "token");
        assert_eq!(strip_quotes("plain"), "plain");
    }
}
