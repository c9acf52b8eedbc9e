//! Row normalizer.
//!
//! # Responsibility
//! - Map one data row onto a `ContentRecord` through a matched layout.
//! - Skip blank rows and enforce required columns.
//!
//! # Invariants
//! - Out-of-range cells read as empty strings, never as errors.
//! - Every value is trimmed.
//! - Statement parts are joined with one space; blank parts are omitted.

use super::{ImportError, ImportResult};
use crate::model::record::ContentRecord;
use crate::schema::{FamilySchema, Layout, Slot};
use std::collections::BTreeMap;

/// Normalizes one data row.
///
/// `row_number` is the 1-based spreadsheet row (header is row 1).
///
/// Returns `Ok(None)` when every cell is blank.
///
/// # Errors
/// - `RowValidation` when a required column is blank.
pub fn normalize_row(
    row: &[String],
    layout: &Layout,
    schema: &FamilySchema,
    row_number: usize,
) -> ImportResult<Option<ContentRecord>> {
    if row.iter().all(|cell| cell.trim().is_empty()) {
        return Ok(None);
    }

    let mut record = ContentRecord::new(schema.family);
    let mut statements: BTreeMap<&'static str, Vec<&str>> = BTreeMap::new();

    for (offset, slot) in layout.slots.iter().enumerate() {
        let value = cell_at(row, offset);
        match slot {
            Slot::Identifier => record.set_identifier(value),
            Slot::Column(column) => {
                record.set(column, value);
            }
            Slot::StatementPart(column) => {
                let parts = statements.entry(*column).or_default();
                if !value.is_empty() {
                    parts.push(value);
                }
            }
        }
    }

    for (column, parts) in statements {
        record.set(column, parts.join(" "));
    }

    for field in schema.required {
        if record.get(field).map_or(true, str::is_empty) {
            return Err(ImportError::RowValidation {
                row: row_number,
                field: *field,
            });
        }
    }

    Ok(Some(record))
}

fn cell_at(row: &[String], offset: usize) -> &str {
    row.get(offset).map_or("", |cell| cell.trim())
}

#[cfg(test)]
mod tests {
    use super::normalize_row;
    use crate::import::ImportError;
    use crate::model::family::Family;
    use crate::schema::schema_for;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn blank_row_is_skipped() {
        let schema = schema_for(Family::Laws);
        let layout = schema.layout("legacy").unwrap();
        let row = cells(&["", "  ", "\t"]);
        assert_eq!(normalize_row(&row, layout, schema, 5).unwrap(), None);
    }

    #[test]
    fn maps_offsets_and_trims_values() {
        let schema = schema_for(Family::Codes);
        let layout = schema.layout("v2").unwrap();
        let mut row = vec![String::new(); 23];
        row[0] = " cod-1 ".to_string();
        row[3] = " Código Civil ".to_string();
        row[20] = "Art. 1".to_string();
        row[21] = " Toda pessoa ".to_string();

        let record = normalize_row(&row, layout, schema, 2).unwrap().unwrap();
        assert_eq!(record.identifier(), "cod-1");
        assert_eq!(record.get("nomecodigo"), Some("Código Civil"));
        assert_eq!(record.get("num_artigo"), Some("Art. 1"));
        assert_eq!(record.get("normativo"), Some("Toda pessoa"));
        assert_eq!(record.get("parte"), Some(""));
    }

    #[test]
    fn short_rows_read_missing_cells_as_empty() {
        let schema = schema_for(Family::Exam);
        let layout = schema.layout("legacy").unwrap();
        let row = cells(&["1", "T", "OAB 1"]);
        let record = normalize_row(&row, layout, schema, 3).unwrap().unwrap();
        assert_eq!(record.get("nomecodigo"), Some("OAB 1"));
        assert_eq!(record.get("artigos"), Some(""));
    }

    #[test]
    fn blank_required_column_reports_spreadsheet_row() {
        let schema = schema_for(Family::Statutes);
        let layout = schema.layout("legacy").unwrap();
        let row = cells(&["1", "Estatuto", "id-9", "   "]);
        let err = normalize_row(&row, layout, schema, 2).unwrap_err();
        assert!(matches!(
            err,
            ImportError::RowValidation {
                row: 2,
                field: "nomecodigo"
            }
        ));
    }

    #[test]
    fn constitution_requires_normativo() {
        let schema = schema_for(Family::Constitution);
        let layout = &schema.layouts[0];
        let row = cells(&["1", "CF", "", "1", "TÍTULO I"]);
        let err = normalize_row(&row, layout, schema, 7).unwrap_err();
        assert_eq!(err.to_string(), "row 7: normativo is required");
    }

    #[test]
    fn statement_parts_join_with_single_space() {
        let schema = schema_for(Family::Jurisprudence);
        let layout = schema.layout("split_statement").unwrap();
        let mut row = vec![String::new(); 27];
        row[3] = "STF".to_string();
        row[11] = " Primeira parte ".to_string();
        row[12] = "   ".to_string();
        row[13] = "segunda".to_string();
        row[17] = " final".to_string();

        let record = normalize_row(&row, layout, schema, 2).unwrap().unwrap();
        assert_eq!(record.get("enunciado"), Some("Primeira parte segunda final"));
        assert_eq!(record.identifier(), "");
    }
}
