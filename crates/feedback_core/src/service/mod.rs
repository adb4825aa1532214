//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the store and admin use-cases.
//! - Keep the CLI decoupled from document storage details.

pub mod admin;
pub mod feedback_store;
