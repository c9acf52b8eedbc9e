//! Domain model for reference-content families.
//!
//! # Responsibility
//! - Define the closed family set and the record shapes shared by import,
//!   persistence and retrieval.
//!
//! # Invariants
//! - Every record belongs to exactly one `Family`.
//! - Deletion is represented by soft-delete tombstones, not hard delete.

pub mod family;
pub mod record;
