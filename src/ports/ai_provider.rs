//! AI provider port - interface for conversational completion backends.
//!
//! Abstracts the two interchangeable LLM backends (Gemini, OpenAI) behind a
//! single capability: given a system instruction and the conversation
//! history, produce a reply. Providers own their retry/fallback behavior;
//! callers only see the error taxonomy below.

use async_trait::async_trait;

use crate::domain::conversation::Message;

/// Port for conversational completion providers.
///
/// Implementations translate between the provider-specific API and the
/// domain message log. `complete` fails only when no credential is
/// configured or every model/API-version combination is exhausted.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generates a reply for the given system instruction and history.
    ///
    /// Only user and assistant messages from the history are forwarded;
    /// system guidance travels in `system_instruction`.
    async fn complete(
        &self,
        system_instruction: &str,
        history: &[Message],
    ) -> Result<String, AiError>;

    /// Provider name for logging ("gemini", "openai", ...).
    fn name(&self) -> &'static str;
}

/// AI provider errors, classified by how the caller should react.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// No credential configured for the provider. Fatal for the capability,
    /// never retried.
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    /// The requested model alias is retired or unsupported. Triggers the
    /// gateway's fallback/discovery path rather than blind retry.
    #[error("model not available: {0}")]
    ModelNotFound(String),

    /// API key rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Rate limited or quota exhausted. Fallback cannot fix this.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Network failure or timeout; classified together since a timed-out
    /// call is indistinguishable from a dropped one.
    #[error("network error: {0}")]
    Network(String),

    /// Provider response did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// The request itself was malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream returned a non-success status not covered above.
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },
}

impl AiError {
    /// True when the model-fallback path applies: the configured model name
    /// is stale, or the response was malformed enough to warrant trying the
    /// next model.
    pub fn is_model_fallback(&self) -> bool {
        match self {
            AiError::ModelNotFound(_) => true,
            // A 200 with an unexpected shape usually means the alias now
            // points at an incompatible endpoint; the next model may answer.
            AiError::Parse(_) => true,
            // Providers surface alias retirement through the message text.
            AiError::Upstream { message, .. } => {
                let msg = message.to_lowercase();
                msg.contains("not found") || msg.contains("not supported")
            }
            _ => false,
        }
    }

    /// Helper for mapping provider error bodies: classifies a message that
    /// signals a retired model alias.
    pub fn from_upstream(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("not found") || lower.contains("not supported") {
            return AiError::ModelNotFound(message);
        }
        match status {
            401 | 403 => AiError::AuthenticationFailed,
            429 => AiError::RateLimited(message),
            400 => AiError::InvalidRequest(message),
            _ => AiError::Upstream { status, message },
        }
    }
}
