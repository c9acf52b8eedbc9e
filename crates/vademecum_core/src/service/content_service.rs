//! Content use-case service for direct edits and grouped retrieval.
//!
//! # Responsibility
//! - Provide the non-import CRUD entry points (create, get, patch, delete,
//!   reset).
//! - Serve grouped retrieval with priority ordering.
//!
//! # Invariants
//! - Identifiers for direct creates come from the same identity resolver
//!   as imports; storage never invents identifiers.
//! - Service APIs never bypass repository validation/persistence contracts.

use crate::import::identity::resolve_identifier;
use crate::model::family::Family;
use crate::model::record::{ContentRecord, RecordPatch};
use crate::repo::content_repo::{ContentRepository, RepoResult};
use crate::schema::schema_for;
use crate::service::grouping::{group_by_code, RecordGroup};

/// Use-case service wrapper for content CRUD and retrieval.
pub struct ContentService<R: ContentRepository> {
    repo: R,
}

impl<R: ContentRepository> ContentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one record and returns its identifier.
    ///
    /// # Contract
    /// - A blank identifier is resolved from the natural key, or randomly.
    /// - An active record with the same identifier yields `AlreadyExists`.
    pub fn create(&self, mut record: ContentRecord) -> RepoResult<String> {
        let schema = schema_for(record.family());
        let identifier = resolve_identifier(&record, schema);
        record.set_identifier(&identifier);
        self.repo.create(schema, &record)?;
        Ok(identifier)
    }

    /// Gets one active record by identifier.
    pub fn get_by_id(&self, family: Family, id: &str) -> RepoResult<Option<ContentRecord>> {
        self.repo.get_by_id(schema_for(family), id)
    }

    /// Lists every active record of a family in insertion order.
    pub fn list(&self, family: Family) -> RepoResult<Vec<ContentRecord>> {
        self.repo.find_all(schema_for(family))
    }

    /// Applies a field-level patch; untouched columns keep their values.
    pub fn update(&self, family: Family, id: &str, patch: &RecordPatch) -> RepoResult<()> {
        self.repo.update_fields(schema_for(family), id, patch)
    }

    /// Soft-deletes one record.
    pub fn delete(&self, family: Family, id: &str) -> RepoResult<()> {
        self.repo.soft_delete(schema_for(family), id)
    }

    /// Soft-deletes every active record of a family; returns the count.
    pub fn reset(&self, family: Family) -> RepoResult<usize> {
        self.repo.soft_delete_all(schema_for(family))
    }

    /// Returns active records grouped by code, prioritized groups first.
    ///
    /// `priority` entries may hold comma-separated lists; see
    /// `normalize_priority`.
    pub fn grouped_by_code<S: AsRef<str>>(
        &self,
        family: Family,
        priority: &[S],
    ) -> RepoResult<Vec<RecordGroup>> {
        let schema = schema_for(family);
        let records = self.repo.find_all(schema)?;
        Ok(group_by_code(records, schema, priority))
    }
}
