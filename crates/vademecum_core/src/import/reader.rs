//! Spreadsheet reader.
//!
//! # Responsibility
//! - Open spreadsheet bytes (`xlsx`, `xls`, `xlsb`, `ods`; auto-detected).
//! - Render the first sheet as a grid of text cells.
//!
//! # Invariants
//! - The grid is anchored at A1: `grid[0]` is spreadsheet row 1 even when
//!   the used range starts lower or further right.
//! - Integral numbers render without a fraction (`12`, not `12.0`).

use super::{EmptySheetKind, ImportError, ImportResult};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use log::{error, info};
use std::io::Cursor;

/// Row-major text cells of one sheet.
pub type Grid = Vec<Vec<String>>;

/// Reads the first sheet of a workbook into a text grid.
///
/// # Errors
/// - `FileOpen` when the bytes are not a readable workbook.
/// - `EmptySheet(NoSheets)` when the workbook has no sheets.
pub fn read_first_sheet(bytes: &[u8]) -> ImportResult<Grid> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|err| {
        error!(
            "event=sheet_read module=import status=error error_code=file_open_failed error={err}"
        );
        ImportError::FileOpen(err)
    })?;

    let sheet_names = workbook.sheet_names();
    let Some(first) = sheet_names.first() else {
        return Err(ImportError::EmptySheet(EmptySheetKind::NoSheets));
    };

    let range = workbook.worksheet_range(first)?;
    let (row_offset, col_offset) = range
        .start()
        .map_or((0, 0), |(row, col)| (row as usize, col as usize));

    let mut grid: Grid = vec![Vec::new(); row_offset];
    for cells in range.rows() {
        let mut row = vec![String::new(); col_offset];
        row.extend(cells.iter().map(render_cell));
        grid.push(row);
    }

    info!(
        "event=sheet_read module=import status=ok sheet_count={} rows={}",
        sheet_names.len(),
        grid.len()
    );
    Ok(grid)
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{read_first_sheet, render_cell};
    use crate::import::ImportError;
    use calamine::Data;

    #[test]
    fn integral_floats_drop_fraction() {
        assert_eq!(render_cell(&Data::Float(12.0)), "12");
        assert_eq!(render_cell(&Data::Float(1.5)), "1.5");
        assert_eq!(render_cell(&Data::Int(7)), "7");
        assert_eq!(render_cell(&Data::Empty), "");
    }

    #[test]
    fn garbage_bytes_fail_to_open() {
        let err = read_first_sheet(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, ImportError::FileOpen(_)));
    }
}
