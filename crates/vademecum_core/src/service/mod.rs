//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate import stages and repository calls into use-case APIs.
//! - Keep the CLI decoupled from storage details.

pub mod content_service;
pub mod grouping;
pub mod import_service;
