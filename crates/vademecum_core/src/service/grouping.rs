//! Grouped retrieval with priority ordering.
//!
//! # Responsibility
//! - Normalize caller-supplied priority lists.
//! - Partition records by their family's group column and order the groups.
//!
//! # Invariants
//! - Grouping is case-sensitive; priority matching is case-insensitive.
//! - Prioritized groups come first, in priority order, then every other
//!   group in lexical order.
//! - Items keep the order they were passed in (store insertion order).

use crate::model::record::ContentRecord;
use crate::schema::FamilySchema;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Records sharing one group-column value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordGroup {
    /// Group column value, e.g. the code name.
    pub code: String,
    /// 0-based position in the normalized priority list, if prioritized.
    pub priority: Option<usize>,
    pub items: Vec<ContentRecord>,
}

/// Trims entries, drops blanks and removes case-insensitive duplicates
/// keeping the first occurrence. Entries are whole code names; commas are
/// part of the name.
pub fn normalize_priority<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|entry| entry.as_ref().trim())
        .filter(|entry| !entry.is_empty())
        .filter(|entry| seen.insert(entry.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Groups `records` by `schema.group_column` and orders the groups.
///
/// Priority entries that match no group are ignored.
pub fn group_by_code<S: AsRef<str>>(
    records: Vec<ContentRecord>,
    schema: &FamilySchema,
    priority: &[S],
) -> Vec<RecordGroup> {
    let mut buckets: BTreeMap<String, Vec<ContentRecord>> = BTreeMap::new();
    for record in records {
        let code = record.get(schema.group_column).unwrap_or("").to_string();
        buckets.entry(code).or_default().push(record);
    }

    let mut groups = Vec::with_capacity(buckets.len());
    for (position, entry) in normalize_priority(priority).iter().enumerate() {
        let wanted = entry.to_lowercase();
        let matched: Vec<String> = buckets
            .keys()
            .filter(|code| code.to_lowercase() == wanted)
            .cloned()
            .collect();
        for code in matched {
            if let Some(items) = buckets.remove(&code) {
                groups.push(RecordGroup {
                    code,
                    priority: Some(position),
                    items,
                });
            }
        }
    }

    groups.extend(buckets.into_iter().map(|(code, items)| RecordGroup {
        code,
        priority: None,
        items,
    }));
    groups
}
