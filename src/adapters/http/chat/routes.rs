//! Route configuration for the chat endpoint.

use axum::routing::post;
use axum::Router;

use super::handlers::{post_message, ChatAppState};

/// Creates the chat router.
///
/// Routes:
/// - `POST /api/bot/message` - one chat turn
pub fn chat_router() -> Router<ChatAppState> {
    Router::new().route("/api/bot/message", post(post_message))
}
