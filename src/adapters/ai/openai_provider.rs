//! OpenAI provider - implementation of AiProvider for the chat
//! completions API.
//!
//! The secondary backend: a single configured model, no resolution or
//! discovery; the adaptive machinery lives in the Gemini adapter because
//! only that provider retires aliases in practice.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::domain::conversation::{Message, Role};
use crate::ports::{AiError, AiProvider};

/// Fallback text when the model returns no choices.
const EMPTY_REPLY_FALLBACK: &str = "Lo siento, no pude procesar tu solicitud.";

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    api_key: Secret<String>,
    /// Model to use (e.g., "gpt-4o-mini").
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Base URL for the API.
    pub base_url: String,
    /// Per-HTTP-call timeout.
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 500,
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the generation parameters.
    pub fn with_generation(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the base URL (for tests against a local server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI API provider implementation.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    /// Creates a new OpenAI provider with the given configuration.
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Converts the system instruction plus history to OpenAI's format.
    fn to_openai_request(&self, system_instruction: &str, history: &[Message]) -> OpenAiRequest {
        let mut messages = vec![OpenAiMessage {
            role: "system".to_string(),
            content: system_instruction.to_string(),
        }];

        for msg in history.iter().filter(|m| m.role.is_user_visible()) {
            messages.push(OpenAiMessage {
                role: match msg.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                }
                .to_string(),
                content: msg.content.clone(),
            });
        }

        OpenAiRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn complete(
        &self,
        system_instruction: &str,
        history: &[Message],
    ) -> Result<String, AiError> {
        let request = self.to_openai_request(system_instruction, history);

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Network(format!("request timed out: {}", e))
                } else if e.is_connect() {
                    AiError::Network(format!("connection failed: {}", e))
                } else {
                    AiError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AiError::from_upstream(
                status.as_u16(),
                extract_error_message(&body),
            ));
        }

        let parsed: OpenAiResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::Parse(format!("Malformed completion response: {}", e)))?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| EMPTY_REPLY_FALLBACK.to_string());

        Ok(reply)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Pulls `error.message` out of an error body, falling back to the raw text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "OpenAI request failed".to_string()
            } else {
                body.trim().to_string()
            }
        })
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}
