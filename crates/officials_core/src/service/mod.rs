//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, storage and repository calls into admin actions.
//! - Keep host layers (CLI, web) decoupled from storage details.

pub mod official_service;
