//! Batch deduplicator.
//!
//! # Invariants
//! - Output keeps the position of each identifier's first appearance.
//! - The last occurrence's values win.
//! - Records with a blank identifier receive a fresh random identifier and
//!   are never merged.

use crate::model::record::ContentRecord;
use std::collections::HashMap;
use uuid::Uuid;

/// Collapses records that share an identifier within one batch.
pub fn dedupe_batch(records: Vec<ContentRecord>) -> Vec<ContentRecord> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut out: Vec<ContentRecord> = Vec::with_capacity(records.len());

    for mut record in records {
        if record.identifier().is_empty() {
            record.set_identifier(Uuid::new_v4().to_string());
            out.push(record);
            continue;
        }

        match positions.get(record.identifier()) {
            Some(&index) => out[index] = record,
            None => {
                positions.insert(record.identifier().to_string(), out.len());
                out.push(record);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::dedupe_batch;
    use crate::model::family::Family;
    use crate::model::record::ContentRecord;

    fn law(id: &str, article: &str) -> ContentRecord {
        let mut record = ContentRecord::new(Family::Laws)
            .with("nomecodigo", "Lei 1")
            .with("num_artigo", article);
        record.set_identifier(id);
        record
    }

    #[test]
    fn last_occurrence_wins_at_first_position() {
        let out = dedupe_batch(vec![law("a", "1"), law("b", "2"), law("a", "3")]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].identifier(), "a");
        assert_eq!(out[0].get("num_artigo"), Some("3"));
        assert_eq!(out[1].identifier(), "b");
    }

    #[test]
    fn blank_identifiers_are_never_merged() {
        let out = dedupe_batch(vec![law("", "1"), law("", "1")]);
        assert_eq!(out.len(), 2);
        assert!(!out[0].identifier().is_empty());
        assert_ne!(out[0].identifier(), out[1].identifier());
    }
}
