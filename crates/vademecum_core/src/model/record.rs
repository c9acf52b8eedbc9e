//! Content record and direct-edit patch models.
//!
//! # Responsibility
//! - Hold one normalized row of any family as schema-aligned values.
//! - Keep whole-row overwrite (`ContentRecord`) and field-level patch
//!   (`RecordPatch`) as distinct shapes.
//!
//! # Invariants
//! - `values` has exactly one entry per data column of the family schema.
//! - Every stored value is trimmed; absent cells are empty strings.
//! - The key column lives in `identifier`, never in `values`.
//!
//! # See also
//! - `crate::schema` for column order per family.

use crate::model::family::Family;
use crate::schema::schema_for;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// One row of reference content, aligned to its family schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    family: Family,
    identifier: String,
    values: Vec<String>,
}

impl ContentRecord {
    /// Creates a record with a blank identifier and blank columns.
    pub fn new(family: Family) -> Self {
        let width = schema_for(family).columns.len();
        Self {
            family,
            identifier: String::new(),
            values: vec![String::new(); width],
        }
    }

    /// Rebuilds a record from stored values in schema column order.
    ///
    /// Returns `None` when `values` does not match the schema width.
    pub fn from_values(
        family: Family,
        identifier: impl Into<String>,
        values: Vec<String>,
    ) -> Option<Self> {
        if values.len() != schema_for(family).columns.len() {
            return None;
        }
        Some(Self {
            family,
            identifier: identifier.into(),
            values,
        })
    }

    /// Builder-style setter; unknown columns are ignored.
    pub fn with(mut self, column: &str, value: impl AsRef<str>) -> Self {
        self.set(column, value);
        self
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Primary-key value (may be blank before identity resolution).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn set_identifier(&mut self, identifier: impl AsRef<str>) {
        self.identifier = identifier.as_ref().trim().to_string();
    }

    /// Returns the value stored for `column`, or `None` for unknown columns.
    pub fn get(&self, column: &str) -> Option<&str> {
        schema_for(self.family)
            .column_index(column)
            .map(|index| self.values[index].as_str())
    }

    /// Stores a trimmed value. Returns `false` for unknown columns.
    pub fn set(&mut self, column: &str, value: impl AsRef<str>) -> bool {
        match schema_for(self.family).column_index(column) {
            Some(index) => {
                self.values[index] = value.as_ref().trim().to_string();
                true
            }
            None => false,
        }
    }

    /// Values in schema column order.
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl Serialize for ContentRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let schema = schema_for(self.family);
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(schema.key_column, &self.identifier)?;
        for (column, value) in schema.columns.iter().zip(&self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Sparse column -> value update for the direct-edit path.
///
/// Only named columns change; everything else in the stored row is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordPatch {
    fields: BTreeMap<String, String>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one column update; the value is trimmed.
    pub fn set(mut self, column: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.fields
            .insert(column.into(), value.as_ref().trim().to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterates `(column, trimmed value)` pairs in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(column, value)| (column.as_str(), value.as_str().trim()))
    }
}
