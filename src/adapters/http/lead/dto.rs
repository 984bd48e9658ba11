//! HTTP DTOs for the lead endpoints.
//!
//! Both endpoints accept the localized field names older widget builds and
//! landing pages still send (nombre/correo/telefono/mensaje/servicio);
//! canonical names win when both are present.

use serde::{Deserialize, Serialize};

/// Inbound widget lead for the ingestion path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestLeadRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub correo: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub mensaje: Option<String>,
    #[serde(default)]
    pub motivo: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub servicio: Option<String>,
}

impl IngestLeadRequest {
    pub fn resolved_name(&self) -> Option<String> {
        non_blank(self.name.as_deref()).or_else(|| non_blank(self.nombre.as_deref()))
    }

    pub fn resolved_phone(&self) -> Option<String> {
        non_blank(self.phone.as_deref()).or_else(|| non_blank(self.telefono.as_deref()))
    }

    pub fn resolved_email(&self) -> Option<String> {
        non_blank(self.email.as_deref()).or_else(|| non_blank(self.correo.as_deref()))
    }

    /// Message, falling back through its alias and then the motive fields
    /// (motivo/service/servicio) when no explicit message was sent.
    pub fn resolved_message(&self) -> Option<String> {
        non_blank(self.message.as_deref())
            .or_else(|| non_blank(self.mensaje.as_deref()))
            .or_else(|| non_blank(self.motivo.as_deref()))
            .or_else(|| non_blank(self.service.as_deref()))
            .or_else(|| non_blank(self.servicio.as_deref()))
    }
}

/// Inbound contact-form lead for the submit path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitLeadRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub rut: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub lead_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub form_id: Option<String>,
}

/// Shared `{ok, ...}` response shape.
#[derive(Debug, Clone, Serialize)]
pub struct LeadResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LeadResponse {
    pub fn ok(lead_id: Option<String>) -> Self {
        Self {
            ok: true,
            lead_id,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            lead_id: None,
            error: Some(message.into()),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
