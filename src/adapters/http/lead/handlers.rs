//! HTTP handlers for the lead endpoints.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{info, warn};

use crate::application::{LeadOutcome, LeadRecorder};
use crate::domain::lead::SlotSet;
use crate::ports::{CrmLeadPayload, CrmSink, DispatchLead, DispatchOutcome, LeadDispatcher};

use super::dto::{IngestLeadRequest, LeadResponse, SubmitLeadRequest};

/// Shared state for the lead routes.
#[derive(Clone)]
pub struct LeadAppState {
    pub dispatcher: Arc<dyn LeadDispatcher>,
    pub recorder: Arc<LeadRecorder>,
    pub crm: Arc<dyn CrmSink>,
}

impl LeadAppState {
    pub fn new(
        dispatcher: Arc<dyn LeadDispatcher>,
        recorder: Arc<LeadRecorder>,
        crm: Arc<dyn CrmSink>,
    ) -> Self {
        Self {
            dispatcher,
            recorder,
            crm,
        }
    }
}

/// POST /api/bot/lead
///
/// Forwards a widget-collected lead to the ingestion endpoint. The widget
/// treats any non-2xx as "log and move on", so the contract is a plain
/// `{ok}` envelope.
pub async fn ingest_lead(
    State(state): State<LeadAppState>,
    Json(request): Json<IngestLeadRequest>,
) -> impl IntoResponse {
    let lead = DispatchLead {
        name: request.resolved_name().unwrap_or_default(),
        email: request.resolved_email(),
        phone: request.resolved_phone(),
        message: request.resolved_message(),
    };

    if !lead.is_dispatchable() {
        return (
            StatusCode::BAD_REQUEST,
            Json(LeadResponse::error("Missing required fields")),
        );
    }

    match state.dispatcher.dispatch(&lead).await {
        DispatchOutcome::Delivered => (StatusCode::OK, Json(LeadResponse::ok(None))),
        DispatchOutcome::Failed { last_error } => {
            warn!(error = %last_error, "lead ingestion failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(LeadResponse::error("Failed to ingest lead")),
            )
        }
    }
}

/// POST /api/lead/submit
///
/// Contact-form path: records a local lead (with dedupe), then syncs to
/// the CRM intake. The local record is kept even when the sync fails.
pub async fn submit_lead(
    State(state): State<LeadAppState>,
    Json(request): Json<SubmitLeadRequest>,
) -> impl IntoResponse {
    let full_name = trimmed(request.full_name.as_deref());
    let email = trimmed(request.email.as_deref());
    let lead_type = trimmed(request.lead_type.as_deref());

    let (full_name, email) = match (full_name, email) {
        (Some(name), Some(email)) => (name, email),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(LeadResponse::error("full_name and email are required.")),
            )
        }
    };
    let lead_type = match lead_type {
        Some(lead_type) => lead_type,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(LeadResponse::error("lead_type is required.")),
            )
        }
    };

    let phone = trimmed(request.phone.as_deref());
    let message = trimmed(request.message.as_deref());
    let source = trimmed(request.source.as_deref());
    let origin = trimmed(request.origin.as_deref())
        .or_else(|| source.clone())
        .unwrap_or_else(|| "form".to_string());
    let form_id = trimmed(request.form_id.as_deref()).unwrap_or_else(|| "evaluacion".to_string());

    // Bot-tagged submissions keep their channel; everything else is the
    // landing page.
    let is_bot = source.as_deref() == Some("bot");
    let slots = SlotSet {
        name: Some(full_name.clone()),
        email: Some(email.clone()),
        phone: phone.clone(),
        matter: message.clone(),
        ..Default::default()
    };
    let outcome = state
        .recorder
        .record(
            &slots,
            None,
            if is_bot { "bot" } else { "form" },
            if is_bot { "bot" } else { "landing" },
        )
        .await;

    if outcome == LeadOutcome::Error {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(LeadResponse::error("Local lead insert failed.")),
        );
    }

    let payload = CrmLeadPayload {
        full_name,
        email,
        phone,
        rut: trimmed(request.rut.as_deref()),
        message,
        lead_type,
        source,
        origin: Some(origin),
        conversation_id: None,
        form_id: Some(form_id),
    };

    match state.crm.deliver(&payload).await {
        Ok(delivery) => {
            info!(status = delivery.status, lead_id = ?delivery.lead_id, "form lead synced");
            (StatusCode::OK, Json(LeadResponse::ok(delivery.lead_id)))
        }
        Err(err) => {
            warn!(error = %err, "form lead sync failed");
            let status =
                StatusCode::from_u16(err.status()).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(LeadResponse::error(err.to_string())))
        }
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
