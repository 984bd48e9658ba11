//! Chat turn pipeline.
//!
//! One inbound user message in, one assistant reply out, with slot
//! steering, lead detection, local recording, and CRM sync along the way.
//! The pipeline is built to degrade instead of fail: a store outage turns
//! the turn stateless, a model outage returns a fixed apology, and a CRM
//! outage is reported in the response without touching the reply.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use super::record_lead::{LeadOutcome, LeadRecorder};
use crate::domain::conversation::{Conversation, Message, MAX_INPUT_CHARS};
use crate::domain::foundation::ConversationId;
use crate::domain::lead::normalize::{norm_email, norm_phone, norm_text, parse_amount_clp};
use crate::domain::lead::{
    compose_matter, extract_lead_block, extract_slots, render_lead_block, strip_lead_block,
    LeadBlock, SlotSet,
};
use crate::ports::{AiProvider, ConversationStore, CrmLeadPayload, CrmSink};

/// Default system prompt for the legal intake assistant.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"
Eres "Asistente Legal", la IA oficial del estudio jurídico (Chile).
Tu misión: captar datos y derivar a nuestros abogados expertos. Tono profesional, empático y breve (máx. 2 líneas).

SLOTS OBLIGATORIOS (en orden):
1) name
2) contact (email O phone válido)
3) motivo (Familia, Penal, Civil, Laboral, Deudas, etc.)
4) acreedor (Opcional, si aplica a deudas)
5) monto (Opcional, si aplica)
6) region
7) comuna

REGLAS:
- Una sola pregunta por turno.
- Validar contacto: email con formato y/o phone 8-15 dígitos.
- No prometer plazos ni resultados, solo evaluación.
- Cierre positivo y comercial cuando tengas los datos esenciales (nombre, contacto, motivo).

FORMATO LEAD OBLIGATORIO (UNA sola línea al final del cierre):
<LEAD>{"name":"...","email":"...","phone":"...","motivo":"...","acreedor":"...","monto":"...","region":"...","comuna":"..."}</LEAD>
"#;

/// User-facing reply when no model is reachable in production.
const LLM_DOWN_MESSAGE: &str = "En este momento el asistente no está disponible. Déjanos tu email/teléfono y te contactamos, o escríbenos por WhatsApp.";

// Geo slots are only trusted when the transcript carries an explicit
// "region:"/"comuna:" anchor, i.e. the model asked and the user answered.
static REGION_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(region|región)\s*:?\s*([a-záéíóúñ\s]{2,60})").expect("region anchor regex")
});
static COMMUNE_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bcomuna\s*:?\s*([a-záéíóúñ\s]{2,60})").expect("comuna anchor regex"));

/// One inbound chat turn.
#[derive(Debug, Clone)]
pub struct ChatTurnRequest {
    pub message: String,
    pub conversation_id: Option<ConversationId>,
    /// Caller-supplied system prompt override.
    pub system_prompt: Option<String>,
    /// Caller-carried history; when present it replaces the stored log.
    pub history: Option<Vec<Message>>,
}

/// Where this turn's history was persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    Postgres,
    None,
}

impl Persistence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persistence::Postgres => "postgres",
            Persistence::None => "none",
        }
    }
}

/// Result of the CRM sync attempt for this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrmSyncStatus {
    Ok,
    Failed,
}

impl CrmSyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrmSyncStatus::Ok => "ok",
            CrmSyncStatus::Failed => "failed",
        }
    }
}

/// Finalized lead handed back to the widget, which forwards it to the
/// ingestion endpoint on its own. Present whenever a lead block was
/// detected, even when normalization left some fields empty.
#[derive(Debug, Clone, Default)]
pub struct LeadData {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

/// Outcome of one chat turn.
#[derive(Debug, Clone)]
pub struct ChatTurnResponse {
    pub conversation_id: ConversationId,
    /// User-visible reply, lead block stripped.
    pub reply: String,
    /// Finalized lead for the widget to forward, when one was detected.
    pub lead_data: Option<LeadData>,
    pub lead_outcome: LeadOutcome,
    pub crm_sync: Option<CrmSyncStatus>,
    pub crm_lead_id: Option<String>,
    pub persistence: Persistence,
}

/// The only hard failure a turn can produce; everything else degrades.
#[derive(Debug, thiserror::Error)]
pub enum ChatTurnError {
    #[error("message is required")]
    EmptyMessage,
}

/// Orchestrates one chat turn end to end.
pub struct ChatTurnHandler {
    store: Arc<dyn ConversationStore>,
    provider: Arc<dyn AiProvider>,
    recorder: Arc<LeadRecorder>,
    crm: Arc<dyn CrmSink>,
    max_history: usize,
    production: bool,
}

impl ChatTurnHandler {
    /// Creates a new handler.
    pub fn new(
        store: Arc<dyn ConversationStore>,
        provider: Arc<dyn AiProvider>,
        recorder: Arc<LeadRecorder>,
        crm: Arc<dyn CrmSink>,
        max_history: usize,
        production: bool,
    ) -> Self {
        Self {
            store,
            provider,
            recorder,
            crm,
            max_history,
            production,
        }
    }

    /// Runs one turn of the dialogue.
    pub async fn handle(&self, request: ChatTurnRequest) -> Result<ChatTurnResponse, ChatTurnError> {
        let trimmed = request.message.trim();
        if trimmed.is_empty() {
            return Err(ChatTurnError::EmptyMessage);
        }
        let message: String = trimmed.chars().take(MAX_INPUT_CHARS).collect();

        // Load or create the conversation; a store failure downgrades the
        // turn to stateless, carried history only.
        let mut persistence = Persistence::Postgres;
        let mut conversation = match self.store.get_or_create(request.conversation_id).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "store unavailable, running stateless");
                persistence = Persistence::None;
                Conversation::new(request.conversation_id.unwrap_or_default())
            }
        };
        if let Some(history) = request.history {
            conversation.replace_messages(history);
        }

        conversation.append_user_idempotent(&message);
        conversation.truncate_to_last(self.max_history);
        self.persist(&mut persistence, &conversation).await;

        // Derive state from the transcript and steer the model toward the
        // next unmet slot so it never re-asks a resolved one.
        let base_slots = extract_slots(&conversation.transcript_lowercase());
        let next = base_slots.next_slot();
        let steering = format!(
            "KnownSlots: {}\nPróximo paso: {}. Pregunta SOLO por ese slot y no repitas slots ya resueltos.",
            serde_json::json!({
                "name": &base_slots.name,
                "email": &base_slots.email,
                "phone": &base_slots.phone,
                "motivo": &base_slots.matter,
                "acreedor": &base_slots.creditor,
                "monto": base_slots.amount,
                "region": serde_json::Value::Null,
                "comuna": serde_json::Value::Null,
            }),
            next.as_str()
        );
        let system_instruction = format!(
            "{}\n\n{}",
            request.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT),
            steering
        );

        let mut reply = match self
            .provider
            .complete(&system_instruction, conversation.messages())
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                warn!(provider = self.provider.name(), error = %err, "model call failed");
                let user_message = if self.production {
                    LLM_DOWN_MESSAGE.to_string()
                } else {
                    format!("Error del modelo ({}): {}", self.provider.name(), err)
                };
                return Ok(ChatTurnResponse {
                    conversation_id: *conversation.id(),
                    reply: user_message,
                    lead_data: None,
                    lead_outcome: LeadOutcome::Disabled,
                    crm_sync: None,
                    crm_lead_id: None,
                    persistence,
                });
            }
        };

        conversation.append_assistant(&reply);
        conversation.truncate_to_last(self.max_history);
        self.persist(&mut persistence, &conversation).await;

        let mut lead_block = extract_lead_block(&reply);

        // The model sometimes collects every slot but forgets the block.
        // Recover the geo slots from their anchored mentions and close the
        // lead ourselves when the set is complete.
        if lead_block.is_none() {
            let transcript = conversation.transcript_lowercase();
            let mut recovered = base_slots.clone();
            recovered.region = norm_text(
                REGION_ANCHOR
                    .captures(&transcript)
                    .and_then(|c| c.get(2))
                    .map(|m| m.as_str()),
            );
            recovered.commune = norm_text(
                COMMUNE_ANCHOR
                    .captures(&transcript)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str()),
            );

            if recovered.is_complete() {
                let block = LeadBlock {
                    name: recovered.name.clone(),
                    email: recovered.email.clone(),
                    phone: recovered.phone.clone(),
                    motivo: recovered.matter.clone(),
                    acreedor: recovered.creditor.clone(),
                    monto: recovered.amount.map(|n| n.to_string()),
                    region: recovered.region.clone(),
                    comuna: recovered.commune.clone(),
                };
                let close = format!(
                    "Excelente, {}. Ya registré tu caso. Nuestro equipo te contactará a la brevedad.",
                    recovered.name.as_deref().unwrap_or("")
                );
                reply = format!("{}\n\n{}\n{}", reply, close, render_lead_block(&block));
                conversation.append_assistant(&reply);
                conversation.truncate_to_last(self.max_history);
                self.persist(&mut persistence, &conversation).await;
                info!(conversation_id = %conversation.id(), "lead closed without model block");
                lead_block = Some(block);
            }
        }

        let mut lead_outcome = LeadOutcome::Skipped;
        let mut lead_data = None;
        let mut crm_sync = None;
        let mut crm_lead_id = None;

        if let Some(block) = lead_block {
            // Model-declared fields win over pattern-extracted ones; geo
            // only ever comes from the model.
            let merged = SlotSet {
                name: block.name.clone().or(base_slots.name.clone()),
                email: block.email.clone().or(base_slots.email.clone()),
                phone: block.phone.clone().or(base_slots.phone.clone()),
                matter: block.motivo.clone().or(base_slots.matter.clone()),
                creditor: block.acreedor.clone().or(base_slots.creditor.clone()),
                amount: parse_amount_clp(block.monto.as_deref()).or(base_slots.amount),
                region: norm_text(block.region.as_deref()),
                commune: norm_text(block.comuna.as_deref()),
            };

            lead_outcome = if persistence == Persistence::Postgres {
                self.recorder
                    .record(&merged, Some(*conversation.id()), "bot", "bot")
                    .await
            } else {
                LeadOutcome::Disabled
            };

            let full_name = norm_text(merged.name.as_deref());
            let email = norm_email(merged.email.as_deref());
            let phone = norm_phone(merged.phone.as_deref());
            let message = compose_matter(
                norm_text(merged.matter.as_deref()).as_deref(),
                norm_text(merged.creditor.as_deref()).as_deref(),
                merged.amount,
                merged.region.as_deref(),
                merged.commune.as_deref(),
            );

            // Intake sync requires both identity anchors.
            match (&full_name, &email) {
                (Some(full_name), Some(email)) => {
                    let payload = CrmLeadPayload {
                        full_name: full_name.clone(),
                        email: email.clone(),
                        phone: phone.clone(),
                        rut: None,
                        message: message.clone(),
                        lead_type: "consulta".to_string(),
                        source: None,
                        origin: Some("bot".to_string()),
                        conversation_id: Some(conversation.id().to_string()),
                        form_id: None,
                    };
                    match self.crm.deliver(&payload).await {
                        Ok(delivery) => {
                            info!(status = delivery.status, lead_id = ?delivery.lead_id, "lead synced to intake");
                            crm_sync = Some(CrmSyncStatus::Ok);
                            crm_lead_id = delivery.lead_id;
                        }
                        Err(err) => {
                            warn!(error = %err, "intake sync failed");
                            crm_sync = Some(CrmSyncStatus::Failed);
                        }
                    }
                }
                _ => {
                    warn!("intake sync skipped (missing email or name)");
                    crm_sync = Some(CrmSyncStatus::Failed);
                }
            }

            lead_data = Some(LeadData {
                name: full_name,
                email,
                phone,
                message,
            });
        }

        Ok(ChatTurnResponse {
            conversation_id: *conversation.id(),
            reply: strip_lead_block(&reply),
            lead_data,
            lead_outcome,
            crm_sync,
            crm_lead_id,
            persistence,
        })
    }

    /// Best-effort write of the log; a failure flips the turn stateless.
    async fn persist(&self, persistence: &mut Persistence, conversation: &Conversation) {
        if *persistence != Persistence::Postgres {
            return;
        }
        if let Err(err) = self
            .store
            .update_messages(conversation.id(), conversation.messages())
            .await
        {
            warn!(error = %err, "store update failed, continuing stateless");
            *persistence = Persistence::None;
        }
    }
}
