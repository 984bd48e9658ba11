//! PostgreSQL adapters for the conversation and lead repositories.

mod conversation_store;
mod lead_repository;

pub use conversation_store::PostgresConversationStore;
pub use lead_repository::PostgresLeadRepository;

use crate::ports::StoreError;

/// Maps a sqlx error into the store error taxonomy: connection-level
/// failures downgrade the session to stateless mode, query failures are
/// reported as database errors.
pub(crate) fn map_sqlx_error(context: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("{}: {}", context, err))
        }
        other => StoreError::Database(format!("{}: {}", context, other)),
    }
}
