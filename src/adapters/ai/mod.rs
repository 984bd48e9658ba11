//! AI provider adapters.
//!
//! Two interchangeable backends behind the AiProvider port, plus the
//! startup selection that picks one by configuration or by which
//! credential is present.

mod gemini_provider;
mod mock_provider;
mod openai_provider;

pub use gemini_provider::{GeminiConfig, GeminiProvider};
pub use mock_provider::{MockAiProvider, MockReply, RecordedCall};
pub use openai_provider::{OpenAiConfig, OpenAiProvider};

use std::sync::Arc;

use crate::config::{AiConfig, LlmProvider};
use crate::ports::{AiError, AiProvider};

/// Builds the configured provider once at startup.
///
/// Explicit selection wins; in automatic mode the first backend with a
/// credential is used, preferring Gemini. Fails only when no credential
/// is configured for any supported backend.
pub fn build_provider(config: &AiConfig) -> Result<Arc<dyn AiProvider>, AiError> {
    match config.provider {
        LlmProvider::Gemini => build_gemini(config),
        LlmProvider::OpenAi => build_openai(config),
        LlmProvider::Auto => {
            if config.has_gemini() {
                build_gemini(config)
            } else if config.has_openai() {
                build_openai(config)
            } else {
                Err(AiError::MissingCredential(
                    "set LEXBOT__AI__GEMINI_API_KEY or LEXBOT__AI__OPENAI_API_KEY",
                ))
            }
        }
    }
}

fn build_gemini(config: &AiConfig) -> Result<Arc<dyn AiProvider>, AiError> {
    let key = config
        .gemini_api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or(AiError::MissingCredential("LEXBOT__AI__GEMINI_API_KEY"))?;

    let provider_config = GeminiConfig::new(key)
        .with_model(crate::config::strip_quotes(&config.gemini_model))
        .with_api_version(config.gemini_api_version_normalized())
        .with_generation(config.temperature, config.max_tokens, config.top_p)
        .with_timeout(config.timeout());

    Ok(Arc::new(GeminiProvider::new(provider_config)))
}

fn build_openai(config: &AiConfig) -> Result<Arc<dyn AiProvider>, AiError> {
    let key = config
        .openai_api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or(AiError::MissingCredential("LEXBOT__AI__OPENAI_API_KEY"))?;

    let provider_config = OpenAiConfig::new(key)
        .with_model(crate::config::strip_quotes(&config.openai_model))
        .with_generation(config.temperature, config.max_tokens)
        .with_timeout(config.timeout());

    Ok(Arc::new(OpenAiProvider::new(provider_config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_keys(gemini: Option<&str>, openai: Option<&str>) -> AiConfig {
        AiConfig {
            gemini_api_key: gemini.map(str::to_string),
            openai_api_key: openai.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn auto_prefers_gemini_when_both_present() {
        let provider = build_provider(&with_keys(Some("g"), Some("o"))).unwrap();
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn auto_falls_back_to_openai() {
        let provider = build_provider(&with_keys(None, Some("o"))).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn auto_without_keys_is_a_credential_error() {
        let err = build_provider(&with_keys(None, None)).err();
        assert!(matches!(err, Some(AiError::MissingCredential(_))));
    }

    #[test]
    fn forced_backend_requires_its_own_key() {
        let config = AiConfig {
            provider: LlmProvider::Gemini,
            ..with_keys(None, Some("o"))
        };
        let err = build_provider(&config).err();
        assert!(matches!(
            err,
            Some(AiError::MissingCredential("LEXBOT__AI__GEMINI_API_KEY"))
        ));
    }
}
