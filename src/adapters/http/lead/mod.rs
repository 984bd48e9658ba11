//! Lead ingestion and submission endpoints.

mod dto;
mod handlers;
mod routes;

pub use handlers::LeadAppState;
pub use routes::lead_router;
