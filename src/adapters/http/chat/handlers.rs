//! HTTP handler for the chat endpoint.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::error;

use crate::application::{ChatTurnError, ChatTurnHandler, ChatTurnRequest};
use crate::domain::foundation::ConversationId;

use super::dto::{ChatMessageRequest, ChatMessageResponse, ErrorResponse};

/// Shared state for the chat routes.
#[derive(Clone)]
pub struct ChatAppState {
    pub chat_turn: Arc<ChatTurnHandler>,
}

impl ChatAppState {
    pub fn new(chat_turn: Arc<ChatTurnHandler>) -> Self {
        Self { chat_turn }
    }
}

/// POST /api/bot/message
///
/// Runs one chat turn. Degraded turns (model or store down) still return
/// 200 with a usable reply; only a blank message is a client error.
pub async fn post_message(
    State(state): State<ChatAppState>,
    Json(request): Json<ChatMessageRequest>,
) -> impl IntoResponse {
    // An unparseable id starts a fresh conversation, same as an unknown one.
    let conversation_id = request
        .conversation_id
        .as_deref()
        .and_then(|id| id.parse::<ConversationId>().ok());

    let history = request.history.map(|entries| {
        entries
            .into_iter()
            .filter_map(|entry| entry.into_message())
            .collect()
    });

    let turn = ChatTurnRequest {
        message: request.message.unwrap_or_default(),
        conversation_id,
        system_prompt: request.system_prompt,
        history,
    };

    match state.chat_turn.handle(turn).await {
        Ok(response) => {
            (StatusCode::OK, Json(ChatMessageResponse::from(response))).into_response()
        }
        Err(ChatTurnError::EmptyMessage) => {
            error!("chat turn rejected: empty message");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Message is required")),
            )
                .into_response()
        }
    }
}
