//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate schema, change-set and mutation calls into use-case level
//!   APIs.
//! - Keep host layers decoupled from storage details.

pub mod edit_service;
