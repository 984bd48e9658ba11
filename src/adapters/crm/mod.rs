//! Outbound CRM adapters.
//!
//! Two destinations with different contracts: the intake endpoint receives
//! the full dual-alias lead sync, the ingestion endpoint receives the
//! compact widget-path payload with bounded retries.

mod geimser_dispatcher;
mod xel_intake;

pub use geimser_dispatcher::{GeimserConfig, GeimserDispatcher};
pub use xel_intake::{XelIntakeClient, XelIntakeConfig};
