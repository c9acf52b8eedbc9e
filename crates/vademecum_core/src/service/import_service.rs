//! Spreadsheet import orchestration.
//!
//! # Responsibility
//! - Run reader, header matcher, row normalizer, identity resolver and
//!   batch deduplicator, then hand the batch to the upsert writer.
//! - Report one `ImportSummary` per successful call.
//!
//! # Invariants
//! - Any validation error aborts the import before the store is touched.
//! - The store sees one deduplicated batch, written atomically.
//! - Re-importing an unchanged spreadsheet leaves the stored set unchanged.

use crate::import::{
    dedupe_batch, match_layout, normalize_row, read_first_sheet, resolve_identifier,
    EmptySheetKind, ImportError, ImportResult,
};
use crate::model::family::Family;
use crate::model::record::ContentRecord;
use crate::repo::content_repo::ContentRepository;
use crate::schema::{schema_for, Layout};
use log::{error, info};
use serde::Serialize;
use std::time::Instant;

/// Outcome of one successful import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub family: Family,
    /// Name of the matched header layout.
    pub layout: &'static str,
    /// Records written after in-batch deduplication.
    pub imported: usize,
    /// Data rows skipped because every cell was blank.
    pub skipped_blank: usize,
}

/// Normalized, identified and deduplicated rows ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBatch {
    pub layout: &'static Layout,
    pub records: Vec<ContentRecord>,
    pub skipped_blank: usize,
}

/// Runs every pure import stage over a text grid.
///
/// # Errors
/// - `EmptySheet(NoDataRows)` when there is no row below the header, checked
///   before the header itself, or when every data row is blank.
/// - `HeaderMismatch` and `RowValidation` from the matching stages.
pub fn prepare_batch(family: Family, grid: &[Vec<String>]) -> ImportResult<PreparedBatch> {
    let schema = schema_for(family);
    let Some((header, rows)) = grid.split_first().filter(|(_, rows)| !rows.is_empty()) else {
        return Err(ImportError::EmptySheet(EmptySheetKind::NoDataRows));
    };

    let layout = match_layout(header, schema)?;

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped_blank = 0usize;
    for (index, row) in rows.iter().enumerate() {
        // Header is row 1.
        let row_number = index + 2;
        match normalize_row(row, layout, schema, row_number)? {
            Some(mut record) => {
                let identifier = resolve_identifier(&record, schema);
                record.set_identifier(identifier);
                records.push(record);
            }
            None => skipped_blank += 1,
        }
    }

    if records.is_empty() {
        return Err(ImportError::EmptySheet(EmptySheetKind::NoDataRows));
    }

    Ok(PreparedBatch {
        layout,
        records: dedupe_batch(records),
        skipped_blank,
    })
}

/// Use-case service for bulk spreadsheet imports.
pub struct ImportService<R: ContentRepository> {
    repo: R,
}

impl<R: ContentRepository> ImportService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Imports the first sheet of a workbook into `family`.
    pub fn import_workbook(&mut self, family: Family, bytes: &[u8]) -> ImportResult<ImportSummary> {
        let grid = read_first_sheet(bytes)?;
        self.import_rows(family, &grid)
    }

    /// Imports an already-read grid whose first row is the header.
    pub fn import_rows(
        &mut self,
        family: Family,
        grid: &[Vec<String>],
    ) -> ImportResult<ImportSummary> {
        let started_at = Instant::now();
        info!("event=import module=import status=start family={family} rows={}", grid.len());

        let batch = match prepare_batch(family, grid) {
            Ok(batch) => batch,
            Err(err) => {
                error!(
                    "event=import module=import status=error family={family} stage=prepare error={err}"
                );
                return Err(err);
            }
        };

        let imported = match self.repo.upsert_batch(schema_for(family), &batch.records) {
            Ok(written) => written,
            Err(err) => {
                error!(
                    "event=import module=import status=error family={family} stage=persist error={err}"
                );
                return Err(err.into());
            }
        };

        let summary = ImportSummary {
            family,
            layout: batch.layout.name,
            imported,
            skipped_blank: batch.skipped_blank,
        };
        info!(
            "event=import module=import status=ok family={family} layout={} imported={} skipped_blank={} duration_ms={}",
            summary.layout,
            summary.imported,
            summary.skipped_blank,
            started_at.elapsed().as_millis()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::prepare_batch;
    use crate::import::{EmptySheetKind, ImportError};
    use crate::model::family::Family;
    use crate::schema::schema_for;

    fn exam_grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        let header = schema_for(Family::Exam)
            .layout("legacy")
            .unwrap()
            .headers
            .iter()
            .map(|header| header.to_string())
            .collect();
        std::iter::once(header)
            .chain(
                rows.iter()
                    .map(|row| row.iter().map(|cell| cell.to_string()).collect()),
            )
            .collect()
    }

    #[test]
    fn header_only_grid_has_no_data_rows() {
        let err = prepare_batch(Family::Exam, &exam_grid(&[])).unwrap_err();
        assert!(matches!(
            err,
            ImportError::EmptySheet(EmptySheetKind::NoDataRows)
        ));
    }

    #[test]
    fn missing_data_rows_are_reported_before_header_mismatch() {
        let grid = vec![vec!["nomecodigo".to_string(), "colunas".to_string()]];
        assert!(matches!(
            prepare_batch(Family::Exam, &grid),
            Err(ImportError::EmptySheet(EmptySheetKind::NoDataRows))
        ));

        let mut with_row = grid.clone();
        with_row.push(vec!["OAB".to_string()]);
        assert!(matches!(
            prepare_batch(Family::Exam, &with_row),
            Err(ImportError::HeaderMismatch { .. })
        ));
    }

    #[test]
    fn empty_grid_has_no_data_rows() {
        assert!(matches!(
            prepare_batch(Family::Exam, &[]),
            Err(ImportError::EmptySheet(EmptySheetKind::NoDataRows))
        ));
    }

    #[test]
    fn all_blank_rows_have_no_data_rows() {
        let err = prepare_batch(Family::Exam, &exam_grid(&[&["", " "], &["\t"]])).unwrap_err();
        assert!(matches!(
            err,
            ImportError::EmptySheet(EmptySheetKind::NoDataRows)
        ));
    }

    #[test]
    fn natural_key_duplicates_collapse_to_last_row() {
        let grid = exam_grid(&[
            &["1", "T", "OAB", "", "", "", "", "", "", "", "", "", "", "", "", "", "Art. 1", "Texto", "velho"],
            &[],
            &["1", "T", " oab ", "", "", "", "", "", "", "", "", "", "", "", "", "", "ART. 1", "texto"],
        ]);
        let batch = prepare_batch(Family::Exam, &grid).unwrap();
        assert_eq!(batch.layout.name, "legacy");
        assert_eq!(batch.skipped_blank, 1);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].get("nomecodigo"), Some("oab"));
    }
}
