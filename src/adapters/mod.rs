//! Adapters - implementations of the ports against concrete technology.

pub mod ai;
pub mod crm;
pub mod http;
pub mod postgres;
