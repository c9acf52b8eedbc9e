//! Core domain logic for the vade-mécum content store.
//! This crate is the single source of truth for import and retrieval
//! invariants.

pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schema;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError};
pub use import::{EmptySheetKind, ImportError, ImportResult};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::family::{Family, FamilyParseError};
pub use model::record::{ContentRecord, RecordPatch};
pub use repo::content_repo::{
    ContentRepository, RepoError, RepoResult, SqliteContentRepository, DEFAULT_WRITE_TIMEOUT,
};
pub use schema::{schema_for, FamilySchema, Layout, Slot};
pub use service::content_service::ContentService;
pub use service::grouping::{group_by_code, normalize_priority, RecordGroup};
pub use service::import_service::{prepare_batch, ImportService, ImportSummary, PreparedBatch};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
