//! Ingestion dispatcher - LeadDispatcher implementation for the primary
//! ingestion endpoint.
//!
//! Delivery is best effort: at most two attempts with a short timeout, and
//! the outcome is reported rather than raised so a slow or broken CRM never
//! breaks the chat path that triggered the dispatch.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::foundation::Timestamp;
use crate::ports::{DispatchLead, DispatchOutcome, LeadDispatcher};

/// Source tag reported with every dispatched lead.
const DISPATCH_SOURCE: &str = "lawyer_site_bot";

/// Maximum delivery attempts per lead.
const MAX_ATTEMPTS: u32 = 2;

/// Configuration for the ingestion dispatcher.
#[derive(Debug, Clone)]
pub struct GeimserConfig {
    pub url: String,
    api_key: Option<Secret<String>>,
    pub timeout: Duration,
}

impl GeimserConfig {
    /// Creates a new configuration. A missing key is allowed; dispatch
    /// reports failure instead of erroring at construction time.
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.map(Secret::new),
            timeout: Duration::from_secs(5),
        }
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client for the ingestion endpoint.
pub struct GeimserDispatcher {
    config: GeimserConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct IngestBody<'a> {
    name: &'a str,
    email: Option<&'a str>,
    phone: Option<&'a str>,
    message: Option<&'a str>,
    source: &'a str,
    meta: IngestMeta,
}

#[derive(Debug, Serialize)]
struct IngestMeta {
    timestamp: String,
}

impl GeimserDispatcher {
    /// Creates a new dispatcher.
    pub fn new(config: GeimserConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    async fn attempt(&self, api_key: &str, body: &IngestBody<'_>) -> Result<(), String> {
        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(format!("ingestion error: {} {}", status.as_u16(), text))
    }
}

#[async_trait]
impl LeadDispatcher for GeimserDispatcher {
    async fn dispatch(&self, lead: &DispatchLead) -> DispatchOutcome {
        let api_key = match self.config.api_key.as_ref() {
            Some(key) => key.expose_secret().clone(),
            None => {
                warn!("ingestion API key is not configured, lead not dispatched");
                return DispatchOutcome::Failed {
                    last_error: "ingestion API key is not configured".to_string(),
                };
            }
        };

        let body = IngestBody {
            name: &lead.name,
            email: lead.email.as_deref(),
            phone: lead.phone.as_deref(),
            message: lead.message.as_deref(),
            source: DISPATCH_SOURCE,
            meta: IngestMeta {
                timestamp: Timestamp::now().as_datetime().to_rfc3339(),
            },
        };

        let mut last_error = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(&api_key, &body).await {
                Ok(()) => {
                    debug!(attempt, "lead dispatched to ingestion endpoint");
                    return DispatchOutcome::Delivered;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "lead dispatch attempt failed");
                    last_error = err;
                }
            }
        }

        DispatchOutcome::Failed { last_error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher_for(server: &MockServer) -> GeimserDispatcher {
        GeimserDispatcher::new(GeimserConfig::new(
            format!("{}/api/leads/ingest", server.uri()),
            Some("ingest-key".to_string()),
        ))
    }

    #[tokio::test]
    async fn first_failure_is_retried_and_reported_as_delivered() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/leads/ingest"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/leads/ingest"))
            .and(header("authorization", "Bearer ingest-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = dispatcher_for(&server).dispatch(&lead()).await;
        assert!(outcome.is_delivered());
    }

    #[tokio::test]
    async fn timed_out_first_attempt_is_retried() {
        let server = MockServer::start().await;

        // First attempt stalls past the client timeout; second answers fast.
        Mock::given(method("POST"))
            .and(path("/api/leads/ingest"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(serde_json::json!({"ok": true})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/leads/ingest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = GeimserDispatcher::new(
            GeimserConfig::new(
                format!("{}/api/leads/ingest", server.uri()),
                Some("ingest-key".to_string()),
            )
            .with_timeout(Duration::from_millis(100)),
        );

        assert!(dispatcher.dispatch(&lead()).await.is_delivered());
    }

    #[tokio::test]
    async fn both_attempts_failing_is_an_outcome_not_a_panic() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/leads/ingest"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(2)
            .mount(&server)
            .await;

        let outcome = dispatcher_for(&server).dispatch(&lead()).await;
        match outcome {
            DispatchOutcome::Failed { last_error } => {
                assert!(last_error.contains("503"));
            }
            DispatchOutcome::Delivered => panic!("dispatch should not succeed"),
        }
    }

    fn lead() -> DispatchLead {
        DispatchLead {
            name: "Ana Rojas".into(),
            email: Some("ana@example.com".into()),
            phone: None,
            message: Some("deuda | Acreedor: santander".into()),
        }
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let dispatcher = GeimserDispatcher::new(GeimserConfig::new("https://example.invalid", None));
        let outcome = dispatcher.dispatch(&lead()).await;
        assert!(!outcome.is_delivered());
    }

    #[test]
    fn wire_body_carries_source_tag() {
        let lead = lead();
        let body = IngestBody {
            name: &lead.name,
            email: lead.email.as_deref(),
            phone: lead.phone.as_deref(),
            message: lead.message.as_deref(),
            source: DISPATCH_SOURCE,
            meta: IngestMeta {
                timestamp: "2024-01-01T00:00:00Z".into(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["source"], "lawyer_site_bot");
        assert_eq!(json["name"], "Ana Rojas");
    }
}
