//! PostgreSQL implementation of LeadRepository.
//!
//! Persists leads and answers the contact-based dedupe query used to
//! suppress repeat submissions inside the dedupe window.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::map_sqlx_error;
use crate::domain::foundation::{LeadId, Timestamp};
use crate::domain::lead::NewLead;
use crate::ports::{LeadRepository, StoreError};

/// PostgreSQL implementation of LeadRepository.
#[derive(Clone)]
pub struct PostgresLeadRepository {
    pool: PgPool,
}

impl PostgresLeadRepository {
    /// Creates a new PostgresLeadRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadRepository for PostgresLeadRepository {
    async fn find_recent_by_contact(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<LeadId>, StoreError> {
        let row = match (email, phone) {
            (Some(email), Some(phone)) => {
                sqlx::query(
                    r#"
                    SELECT id FROM leads
                    WHERE created_at >= $1 AND (email = $2 OR phone = $3)
                    ORDER BY created_at DESC
                    LIMIT 1
                    "#,
                )
                .bind(since.as_datetime())
                .bind(email)
                .bind(phone)
                .fetch_optional(&self.pool)
                .await
            }
            (Some(email), None) => {
                sqlx::query(
                    r#"
                    SELECT id FROM leads
                    WHERE created_at >= $1 AND email = $2
                    ORDER BY created_at DESC
                    LIMIT 1
                    "#,
                )
                .bind(since.as_datetime())
                .bind(email)
                .fetch_optional(&self.pool)
                .await
            }
            (None, Some(phone)) => {
                sqlx::query(
                    r#"
                    SELECT id FROM leads
                    WHERE created_at >= $1 AND phone = $2
                    ORDER BY created_at DESC
                    LIMIT 1
                    "#,
                )
                .bind(since.as_datetime())
                .bind(phone)
                .fetch_optional(&self.pool)
                .await
            }
            (None, None) => return Ok(None),
        }
        .map_err(|e| map_sqlx_error("failed to query recent leads", e))?;

        Ok(row.map(|row| {
            let id: uuid::Uuid = row.get("id");
            LeadId::from_uuid(id)
        }))
    }

    async fn insert(&self, lead: &NewLead) -> Result<LeadId, StoreError> {
        let id = LeadId::new();
        sqlx::query(
            r#"
            INSERT INTO leads (
                id, name, email, phone, matter, channel, source,
                conversation_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
            "#,
        )
        .bind(id.as_uuid())
        .bind(&lead.name)
        .bind(lead.email.as_deref())
        .bind(lead.phone.as_deref())
        .bind(lead.matter.as_deref())
        .bind(&lead.channel)
        .bind(&lead.source)
        .bind(lead.conversation_id.as_ref().map(|c| *c.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("failed to insert lead", e))?;

        Ok(id)
    }
}
