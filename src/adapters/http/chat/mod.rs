//! Chat endpoint.

mod dto;
mod handlers;
mod routes;

pub use handlers::ChatAppState;
pub use routes::chat_router;
