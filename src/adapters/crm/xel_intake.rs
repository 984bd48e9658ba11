//! Intake client - CrmSink implementation for the external intake endpoint.
//!
//! The intake endpoint expects every value duplicated under its English and
//! Spanish field names. The wire body is expanded here so the rest of the
//! crate carries each value once.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use tracing::{debug, warn};

use crate::ports::{CrmDelivery, CrmError, CrmLeadPayload, CrmSink};

/// Default lead source reported when the caller supplies none.
const DEFAULT_SOURCE: &str = "website_deudascero";

/// Configuration for the intake client.
#[derive(Debug, Clone)]
pub struct XelIntakeConfig {
    pub url: String,
    token: Option<Secret<String>>,
    pub timeout: Duration,
}

impl XelIntakeConfig {
    /// Creates a new configuration. A missing token is allowed at
    /// construction time; delivery fails with `MissingToken` instead.
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            url: url.into(),
            token: token.map(Secret::new),
            timeout: Duration::from_secs(5),
        }
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client for the intake endpoint.
pub struct XelIntakeClient {
    config: XelIntakeConfig,
    client: Client,
}

/// Wire body with the dual English/Spanish aliases the endpoint expects.
#[derive(Debug, Serialize)]
struct IntakeBody<'a> {
    source: &'a str,
    origin: Option<&'a str>,
    full_name: &'a str,
    nombre_completo: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    telefono: Option<&'a str>,
    rut: Option<&'a str>,
    message: Option<&'a str>,
    mensaje: Option<&'a str>,
    lead_type: &'a str,
    tipo_lead: &'a str,
    conversation_id: Option<&'a str>,
    form_id: Option<&'a str>,
}

impl<'a> IntakeBody<'a> {
    fn from_payload(payload: &'a CrmLeadPayload) -> Self {
        let source = payload
            .source
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SOURCE);
        Self {
            source,
            origin: payload.origin.as_deref(),
            full_name: &payload.full_name,
            nombre_completo: &payload.full_name,
            email: &payload.email,
            phone: payload.phone.as_deref(),
            telefono: payload.phone.as_deref(),
            rut: payload.rut.as_deref(),
            message: payload.message.as_deref(),
            mensaje: payload.message.as_deref(),
            lead_type: &payload.lead_type,
            tipo_lead: &payload.lead_type,
            conversation_id: payload.conversation_id.as_deref(),
            form_id: payload.form_id.as_deref(),
        }
    }
}

impl XelIntakeClient {
    /// Creates a new intake client.
    pub fn new(config: XelIntakeConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }
}

#[async_trait]
impl CrmSink for XelIntakeClient {
    async fn deliver(&self, payload: &CrmLeadPayload) -> Result<CrmDelivery, CrmError> {
        let token = self.config.token.as_ref().ok_or(CrmError::MissingToken)?;

        let body = IntakeBody::from_payload(payload);
        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| CrmError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| CrmError::Network(e.to_string()))?;
        let data: Option<serde_json::Value> = serde_json::from_str(&raw).ok();

        if !(200..300).contains(&status) {
            let message = data
                .as_ref()
                .and_then(|d| {
                    d.get("error")
                        .or_else(|| d.get("message"))
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| {
                    if raw.is_empty() {
                        "intake request failed".to_string()
                    } else {
                        raw.clone()
                    }
                });
            warn!(status, %message, "intake rejected lead");
            return Err(CrmError::Rejected { status, message });
        }

        // The endpoint has returned the remote id under both names.
        let lead_id = data.as_ref().and_then(|d| {
            d.get("lead_id")
                .or_else(|| d.get("id"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        });

        debug!(status, lead_id = ?lead_id, "lead delivered to intake");
        Ok(CrmDelivery { lead_id, status })
    }
}
