//! Gemini provider - implementation of AiProvider for the Generative
//! Language API, with adaptive model resolution.
//!
//! The upstream provider periodically retires model aliases, so a
//! configured model name can go stale between deploys. Instead of failing
//! hard, this adapter resolves a working model per call:
//!
//! 1. Try the cached `(model, api_version)` pair that last succeeded.
//! 2. On a "model not found / not supported" error or a malformed reply
//!    body, invalidate the cache and walk an ordered preference list
//!    across API versions.
//! 3. If the whole list fails, list the provider's models and pick the
//!    first one advertising `generateContent` support.
//! 4. Re-cache whatever succeeded.
//!
//! Credential, quota, and malformed-request errors are surfaced
//! immediately; fallback cannot fix those. The cache is owned by the
//! provider instance and is best-effort: a stale value costs one extra
//! fallback attempt, never a wrong reply.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::conversation::{Message, Role};
use crate::ports::{AiError, AiProvider};

/// Fallback text when the model returns an empty candidate.
const EMPTY_REPLY_FALLBACK: &str = "Lo siento, no pude procesar tu solicitud.";

/// Retired aliases mapped to their current names, tried before fallback.
const MODEL_ALIASES: &[(&str, &str)] = &[("gemini-1.5-flash", "gemini-1.5-flash-latest")];

/// Models walked when the configured one is not available.
const FALLBACK_MODELS: &[&str] = &[
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
    "gemini-1.0-pro",
];

/// Preference order when selecting from a discovered model listing.
const MODEL_PREFERENCES: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.0-flash",
    "gemini-1.5-flash-latest",
    "gemini-1.5-flash",
    "gemini-1.5-pro-latest",
    "gemini-1.5-pro",
    "gemini-pro",
    "gemini-1.0-pro",
];

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    api_key: Secret<String>,
    /// Configured model name; alias resolution happens at call time.
    pub model: String,
    /// Preferred API version, normalized to a leading "v".
    pub api_version: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    /// Base URL for the API.
    pub base_url: String,
    /// Per-HTTP-call timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gemini-1.5-flash-latest".to_string(),
            api_version: "v1beta".to_string(),
            temperature: 0.2,
            max_tokens: 500,
            top_p: 1.0,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the preferred API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the generation parameters.
    pub fn with_generation(mut self, temperature: f32, max_tokens: u32, top_p: f32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self.top_p = top_p;
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

/// The last (model, API version) pair that produced a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CachedModel {
    model: String,
    api_version: String,
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
    cached: Mutex<Option<CachedModel>>,
}

impl GeminiProvider {
    /// Creates a new Gemini provider with the given configuration.
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            client,
            cached: Mutex::new(None),
        }
    }

    /// Resolves a retired alias to its current name.
    fn resolve_alias(model: &str) -> &str {
        MODEL_ALIASES
            .iter()
            .find(|(alias, _)| *alias == model)
            .map(|(_, current)| *current)
            .unwrap_or(model)
    }

    /// API versions to try, configured one first, deduplicated.
    fn api_versions(&self) -> Vec<String> {
        let versions = [
            self.config.api_version.clone(),
            "v1beta".to_string(),
            "v1".to_string(),
        ];
        let mut seen: Vec<String> = Vec::new();
        for v in versions {
            if !seen.contains(&v) {
                seen.push(v);
            }
        }
        seen
    }

    fn generate_url(&self, api_version: &str, model: &str) -> String {
        format!(
            "{}/{}/models/{}:generateContent?key={}",
            self.config.base_url,
            api_version,
            model,
            self.config.api_key()
        )
    }

    fn list_url(&self, api_version: &str) -> String {
        format!(
            "{}/{}/models?key={}",
            self.config.base_url,
            api_version,
            self.config.api_key()
        )
    }

    /// One generateContent call against a specific model and API version.
    async fn call_generate(
        &self,
        api_version: &str,
        model: &str,
        system_instruction: &str,
        contents: &[GeminiContent],
    ) -> Result<String, AiError> {
        let request = GeminiRequest {
            system_instruction: SystemInstruction {
                role: "system".to_string(),
                parts: vec![Part {
                    text: system_instruction.to_string(),
                }],
            },
            contents: contents.to_vec(),
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
                top_p: self.config.top_p,
            },
        };

        let response = self
            .client
            .post(self.generate_url(api_version, model))
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AiError::from_upstream(
                status.as_u16(),
                extract_error_message(&body),
            ));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::Parse(format!("Malformed generateContent response: {}", e)))?;

        Ok(candidate_text(&parsed))
    }

    /// Lists models on one API version, keeping those that support
    /// generateContent.
    async fn list_models(&self, api_version: &str) -> Result<Vec<String>, AiError> {
        let response = self
            .client
            .get(self.list_url(api_version))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AiError::from_upstream(
                status.as_u16(),
                extract_error_message(&body),
            ));
        }

        let parsed: ListModelsResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::Parse(format!("Malformed models listing: {}", e)))?;

        Ok(parsed
            .models
            .unwrap_or_default()
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .as_deref()
                    .is_some_and(|methods| methods.iter().any(|s| s == "generateContent"))
            })
            .filter_map(|m| m.name)
            .map(|name| normalize_model_name(&name).to_string())
            .filter(|name| !name.is_empty())
            .collect())
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    async fn complete(
        &self,
        system_instruction: &str,
        history: &[Message],
    ) -> Result<String, AiError> {
        let contents = to_gemini_contents(history);

        // Fast path: the pair that worked last time.
        let cached = self.cached.lock().await.clone();
        if let Some(pair) = cached {
            match self
                .call_generate(&pair.api_version, &pair.model, system_instruction, &contents)
                .await
            {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_model_fallback() => {
                    debug!(model = %pair.model, "cached model retired, re-resolving");
                    *self.cached.lock().await = None;
                }
                Err(err) => return Err(err),
            }
        }

        let resolved = Self::resolve_alias(&self.config.model).to_string();
        let fallbacks: Vec<&str> = FALLBACK_MODELS
            .iter()
            .copied()
            .filter(|m| *m != resolved)
            .collect();

        let mut last_error: Option<AiError> = None;

        for api_version in self.api_versions() {
            for model in std::iter::once(resolved.as_str()).chain(fallbacks.iter().copied()) {
                match self
                    .call_generate(&api_version, model, system_instruction, &contents)
                    .await
                {
                    Ok(reply) => {
                        *self.cached.lock().await = Some(CachedModel {
                            model: model.to_string(),
                            api_version: api_version.clone(),
                        });
                        return Ok(reply);
                    }
                    Err(err) if err.is_model_fallback() => {
                        last_error = Some(err);
                    }
                    // Credential, quota, malformed request: fallback cannot
                    // fix these, surface now.
                    Err(err) => return Err(err),
                }
            }

            // Every preferred name is stale on this version: ask the
            // provider what it actually serves.
            match self.list_models(&api_version).await {
                Ok(models) => {
                    if let Some(picked) = pick_preferred_model(&models) {
                        debug!(model = %picked, %api_version, "discovered model via listing");
                        match self
                            .call_generate(&api_version, &picked, system_instruction, &contents)
                            .await
                        {
                            Ok(reply) => {
                                *self.cached.lock().await = Some(CachedModel {
                                    model: picked,
                                    api_version: api_version.clone(),
                                });
                                return Ok(reply);
                            }
                            Err(err) => {
                                last_error = Some(err);
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(%api_version, error = %err, "model listing failed");
                    if last_error.is_none() {
                        last_error = Some(err);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AiError::Upstream {
            status: 0,
            message: "Gemini request failed".to_string(),
        }))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Maps the history into Gemini contents. Gemini has no assistant role;
/// it calls the model's own turns "model".
fn to_gemini_contents(history: &[Message]) -> Vec<GeminiContent> {
    history
        .iter()
        .filter(|m| m.role.is_user_visible())
        .map(|m| GeminiContent {
            role: match m.role {
                Role::Assistant => "model",
                _ => "user",
            }
            .to_string(),
            parts: vec![Part {
                text: m.content.clone(),
            }],
        })
        .collect()
}

fn map_transport_error(e: reqwest::Error) -> AiError {
    if e.is_timeout() {
        AiError::Network(format!("request timed out: {}", e))
    } else if e.is_connect() {
        AiError::Network(format!("connection failed: {}", e))
    } else {
        AiError::Network(e.to_string())
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
                "Gemini request failed".to_string()
            } else {
                body.trim().to_string()
            }
        })
}

/// Joins the text parts of the first candidate.
fn candidate_text(response: &GeminiResponse) -> String {
    let text: String = response
        .candidates
        .as_deref()
        .and_then(|c| c.first())
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.as_deref())
        .map(|parts| {
            parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        EMPTY_REPLY_FALLBACK.to_string()
    } else {
        text
    }
}

/// Strips the `models/` prefix from a listed model name.
fn normalize_model_name(name: &str) -> &str {
    name.strip_prefix("models/").unwrap_or(name)
}

/// First preference-list model present in the listing, else the first
/// listed model.
fn pick_preferred_model(models: &[String]) -> Option<String> {
    MODEL_PREFERENCES
        .iter()
        .find(|pref| models.iter().any(|m| m == *pref))
        .map(|s| s.to_string())
        .or_else(|| models.first().cloned())
}

// ----- Gemini API Types -----

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: SystemInstruction,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct SystemInstruction {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    models: Option<Vec<ListedModel>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedModel {
    name: Option<String>,
    supported_generation_methods: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reply_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        })
    }

    fn not_found_body(model: &str) -> serde_json::Value {
        serde_json::json!({
            "error": {"message": format!("models/{} is not found for API version v1beta", model)}
        })
    }

    #[tokio::test]
    async fn stale_model_walks_fallback_and_caches_the_winner() {
        let server = MockServer::start().await;

        // The configured model is retired; the first fallback works.
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash-latest:generateContent"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(not_found_body("gemini-1.5-flash-latest")),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Hola")))
            .expect(2)
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(
            GeminiConfig::new("key").with_base_url(server.uri()),
        );

        assert_eq!(provider.complete("inst", &[]).await.unwrap(), "Hola");
        // The second call goes straight to the cached pair; the retired
        // model is never hit again.
        assert_eq!(provider.complete("inst", &[]).await.unwrap(), "Hola");
    }

    #[tokio::test]
    async fn malformed_response_walks_to_the_next_model() {
        let server = MockServer::start().await;

        // The configured model answers 200 with a body that is not the
        // generateContent shape; the first fallback answers properly.
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash-latest:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Hola")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(
            GeminiConfig::new("key").with_base_url(server.uri()),
        );

        assert_eq!(provider.complete("inst", &[]).await.unwrap(), "Hola");
    }

    #[tokio::test]
    async fn exhausted_fallback_list_discovers_a_model_via_listing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-experimental:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Hola")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [{
                    "name": "models/gemini-experimental",
                    "supportedGenerationMethods": ["generateContent"]
                }]
            })))
            .mount(&server)
            .await;
        // Every preferred model name is stale.
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(not_found_body("any")))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(
            GeminiConfig::new("key").with_base_url(server.uri()),
        );

        assert_eq!(provider.complete("inst", &[]).await.unwrap(), "Hola");
    }

    #[tokio::test]
    async fn auth_failure_is_surfaced_without_fallback() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "API key not valid"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(
            GeminiConfig::new("bad-key").with_base_url(server.uri()),
        );

        let err = provider.complete("inst", &[]).await.unwrap_err();
        assert!(matches!(err, AiError::AuthenticationFailed));
    }

    #[test]
    fn alias_resolution_maps_retired_names() {
        assert_eq!(
            GeminiProvider::resolve_alias("gemini-1.5-flash"),
            "gemini-1.5-flash-latest"
        );
        assert_eq!(GeminiProvider::resolve_alias("gemini-pro"), "gemini-pro");
    }

    #[test]
    fn api_versions_configured_first_and_deduplicated() {
        let provider = GeminiProvider::new(GeminiConfig::new("key").with_api_version("v1"));
        assert_eq!(provider.api_versions(), vec!["v1", "v1beta"]);

        let provider = GeminiProvider::new(GeminiConfig::new("key").with_api_version("v1beta"));
        assert_eq!(provider.api_versions(), vec!["v1beta", "v1"]);
    }

    #[test]
    fn contents_map_assistant_to_model_role() {
        let history = vec![
            Message::system("instrucciones"),
            Message::user("hola"),
            Message::assistant("¿tu nombre?"),
        ];
        let contents = to_gemini_contents(&history);
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[1].parts[0].text, "¿tu nombre?");
    }

    #[test]
    fn candidate_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hola "},{"text":"Ana"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(candidate_text(&response), "Hola Ana");
    }

    #[test]
    fn empty_candidate_falls_back_to_apology() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(candidate_text(&response), EMPTY_REPLY_FALLBACK);
    }

    #[test]
    fn error_message_extracted_from_body() {
        let body = r#"{"error":{"message":"models/gemini-pro is not found"}}"#;
        assert_eq!(extract_error_message(body), "models/gemini-pro is not found");
        assert_eq!(extract_error_message("plain failure"), "plain failure");
        assert_eq!(extract_error_message("  "), "Gemini request failed");
    }

    #[test]
    fn preferred_model_picked_in_order() {
        let models = vec![
            "gemini-1.0-pro".to_string(),
            "gemini-2.0-flash".to_string(),
        ];
        assert_eq!(
            pick_preferred_model(&models),
            Some("gemini-2.0-flash".to_string())
        );
    }

    #[test]
    fn unknown_listing_falls_back_to_first() {
        let models = vec!["gemini-experimental".to_string()];
        assert_eq!(
            pick_preferred_model(&models),
            Some("gemini-experimental".to_string())
        );
        assert_eq!(pick_preferred_model(&[]), None);
    }

    #[test]
    fn listing_filters_non_generation_models() {
        let body = r#"{"models":[
            {"name":"models/embedding-001","supportedGenerationMethods":["embedContent"]},
            {"name":"models/gemini-1.5-pro","supportedGenerationMethods":["generateContent"]}
        ]}"#;
        let parsed: ListModelsResponse = serde_json::from_str(body).unwrap();
        let models: Vec<String> = parsed
            .models
            .unwrap()
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .as_deref()
                    .is_some_and(|ms| ms.iter().any(|s| s == "generateContent"))
            })
            .filter_map(|m| m.name)
            .map(|n| normalize_model_name(&n).to_string())
            .collect();
        assert_eq!(models, vec!["gemini-1.5-pro".to_string()]);
    }
}
