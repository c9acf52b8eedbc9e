//! Spreadsheet import stages.
//!
//! # Responsibility
//! - Turn uploaded spreadsheet bytes into a deduplicated batch of
//!   `ContentRecord`s ready for the upsert writer.
//! - Define the error surface shared by every import stage.
//!
//! # Invariants
//! - Stages run in order: reader, header matcher, row normalizer, identity
//!   resolver, batch deduplicator.
//! - Validation errors are raised before any store call.
//!
//! # See also
//! - `crate::service::import_service` for orchestration.

use crate::model::family::Family;
use crate::repo::content_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod dedupe;
pub mod header;
pub mod identity;
pub mod normalize;
pub mod reader;

pub use dedupe::dedupe_batch;
pub use header::match_layout;
pub use identity::{content_identifier, resolve_identifier};
pub use normalize::normalize_row;
pub use reader::{read_first_sheet, Grid};

pub type ImportResult<T> = Result<T, ImportError>;

/// Why a workbook carries nothing importable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptySheetKind {
    /// The document has no worksheets.
    NoSheets,
    /// The first sheet has no header row or no non-blank data row.
    NoDataRows,
}

/// Error type for one import call.
#[derive(Debug)]
pub enum ImportError {
    /// The uploaded bytes are not a readable spreadsheet.
    FileOpen(calamine::Error),
    EmptySheet(EmptySheetKind),
    /// The header row matches none of the family's layouts.
    HeaderMismatch {
        family: Family,
        /// Every accepted layout, rendered as `name: h1, h2, ...`.
        accepted: Vec<String>,
    },
    /// A data row breaks a required-column rule. `row` is 1-based and
    /// counts the header row, so the first data row is row 2.
    RowValidation { row: usize, field: &'static str },
    Persistence(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileOpen(err) => write!(f, "unable to read spreadsheet: {err}"),
            Self::EmptySheet(EmptySheetKind::NoSheets) => {
                write!(f, "spreadsheet has no sheets")
            }
            Self::EmptySheet(EmptySheetKind::NoDataRows) => {
                write!(f, "spreadsheet has no data rows")
            }
            Self::HeaderMismatch { family, accepted } => write!(
                f,
                "header does not match any layout for `{family}`; accepted layouts: [{}]",
                accepted.join("] [")
            ),
            Self::RowValidation { row, field } => write!(f, "row {row}: {field} is required"),
            Self::Persistence(err) => write!(f, "persistence failed: {err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::FileOpen(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::EmptySheet(_) | Self::HeaderMismatch { .. } | Self::RowValidation { .. } => None,
        }
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Persistence(value)
    }
}

impl From<calamine::Error> for ImportError {
    fn from(value: calamine::Error) -> Self {
        Self::FileOpen(value)
    }
}
