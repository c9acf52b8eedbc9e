//! Identity resolver.
//!
//! # Responsibility
//! - Assign every normalized record a stable identifier before persistence.
//!
//! # Invariants
//! - Precedence: supplied identifier, then content-derived, then random.
//! - Identical natural-key values (after trim and lower-case) always yield
//!   the same content-derived identifier.
//! - Content-derived identifiers are UUID v5 over `NAMESPACE_OID`, so they
//!   stay stable across processes and releases.

use crate::model::record::ContentRecord;
use crate::schema::FamilySchema;
use uuid::Uuid;

/// Natural-key fields are joined with this separator before hashing.
const KEY_SEPARATOR: &str = "|";

/// Derives the content fingerprint identifier for `record`.
///
/// Returns `None` when every natural-key field is blank.
pub fn content_identifier(schema: &FamilySchema, record: &ContentRecord) -> Option<String> {
    let parts: Vec<String> = schema
        .natural_key
        .iter()
        .map(|column| record.get(column).unwrap_or("").trim().to_lowercase())
        .collect();
    if parts.iter().all(String::is_empty) {
        return None;
    }

    let key = parts.join(KEY_SEPARATOR);
    Some(Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string())
}

/// Returns the identifier `record` should be stored under.
pub fn resolve_identifier(record: &ContentRecord, schema: &FamilySchema) -> String {
    let supplied = record.identifier().trim();
    if !supplied.is_empty() {
        return supplied.to_string();
    }

    content_identifier(schema, record).unwrap_or_else(|| Uuid::new_v4().to_string())
}
