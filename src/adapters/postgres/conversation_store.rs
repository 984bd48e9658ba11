//! PostgreSQL implementation of ConversationStore.
//!
//! Conversations are stored as a single row per conversation with the
//! message log in a JSONB column, matching the append-and-rewrite access
//! pattern of the turn pipeline.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::map_sqlx_error;
use crate::domain::conversation::{Conversation, ConversationStatus, Message};
use crate::domain::foundation::ConversationId;
use crate::ports::{ConversationStore, StoreError};

/// PostgreSQL implementation of ConversationStore.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    /// Creates a new PostgresConversationStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn create(&self) -> Result<Conversation, StoreError> {
        let conversation = Conversation::new(ConversationId::new());
        sqlx::query(
            r#"
            INSERT INTO conversations (id, messages, status, created_at, updated_at)
            VALUES ($1, $2, $3, now(), now())
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(serde_json::json!([]))
        .bind(status_to_str(conversation.status()))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("failed to insert conversation", e))?;

        Ok(conversation)
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn get_or_create(
        &self,
        id: Option<ConversationId>,
    ) -> Result<Conversation, StoreError> {
        let id = match id {
            Some(id) => id,
            None => return self.create().await,
        };

        let row = sqlx::query(
            r#"
            SELECT id, messages, status
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("failed to fetch conversation", e))?;

        let row = match row {
            Some(row) => row,
            // Unknown ids start a fresh conversation instead of erroring,
            // so stale client-side ids never break the chat widget.
            None => return self.create().await,
        };

        let id_uuid: uuid::Uuid = row.get("id");
        let messages_json: serde_json::Value = row.get("messages");
        let status_str: String = row.get("status");

        let messages: Vec<Message> = serde_json::from_value(messages_json)
            .map_err(|e| StoreError::Database(format!("corrupt message log: {}", e)))?;

        Ok(Conversation::reconstitute(
            ConversationId::from_uuid(id_uuid),
            messages,
            str_to_status(&status_str),
        ))
    }

    async fn update_messages(
        &self,
        id: &ConversationId,
        messages: &[Message],
    ) -> Result<(), StoreError> {
        let messages_json = serde_json::to_value(messages)
            .map_err(|e| StoreError::Database(format!("failed to encode messages: {}", e)))?;

        let result = sqlx::query(
            r#"
            UPDATE conversations SET messages = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(messages_json)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("failed to update conversation", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(*id));
        }

        Ok(())
    }
}

fn status_to_str(status: ConversationStatus) -> &'static str {
    match status {
        ConversationStatus::Active => "active",
        ConversationStatus::Closed => "closed",
    }
}

fn str_to_status(s: &str) -> ConversationStatus {
    match s {
        "closed" => ConversationStatus::Closed,
        _ => ConversationStatus::Active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        assert_eq!(str_to_status(status_to_str(ConversationStatus::Active)), ConversationStatus::Active);
        assert_eq!(str_to_status(status_to_str(ConversationStatus::Closed)), ConversationStatus::Closed);
    }

    #[test]
    fn unknown_status_defaults_to_active() {
        assert_eq!(str_to_status("weird"), ConversationStatus::Active);
    }
}
