//! Lexbot - Lead-Capture Chatbot Backend
//!
//! This crate implements the conversational lead-capture pipeline behind a
//! law firm marketing site: a slot-filling dialogue manager, an LLM gateway
//! with model fallback and discovery, lead deduplication, and delivery to
//! external CRM endpoints.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
