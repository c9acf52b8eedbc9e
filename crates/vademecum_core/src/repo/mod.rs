//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `AlreadyExists`,
//!   `WriteTimeout`) in addition to DB transport errors.
//! - Table and column names only ever come from the static schema registry.

pub mod content_repo;
