use rusqlite::Connection;
use rust_xlsxwriter::Workbook;
use std::io::{Cursor, Write};
use vademecum_core::db::open_db_in_memory;
use vademecum_core::import::read_first_sheet;
use vademecum_core::{
    schema_for, EmptySheetKind, Family, ImportError, ImportResult, ImportService, ImportSummary,
    SqliteContentRepository,
};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

enum Cell<'a> {
    Text(&'a str),
    Number(f64),
}

/// Builds an xlsx workbook; the first sheet gets `header` on row 1 and
/// `rows` from row 2, keyed by zero-based spreadsheet row.
fn workbook(header: &[&str], rows: &[(u32, Vec<(u16, Cell<'_>)>)], extra_sheet: bool) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *name).unwrap();
    }
    for (row, cells) in rows {
        for (col, cell) in cells {
            match cell {
                Cell::Text(value) => sheet.write_string(*row, *col, *value).unwrap(),
                Cell::Number(value) => sheet.write_number(*row, *col, *value).unwrap(),
            };
        }
    }
    if extra_sheet {
        let other = workbook.add_worksheet();
        other.write_string(0, 0, "unrelated").unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

/// Packs a minimal xlsx whose workbook part declares no sheets.
fn workbook_without_sheets() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let parts: [(&str, &str); 2] = [
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#,
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheets></sheets></workbook>"#,
        ),
    ];
    for (name, body) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn exam_header() -> Vec<&'static str> {
    schema_for(Family::Exam).layout("legacy").unwrap().headers.clone()
}

fn import(conn: &mut Connection, family: Family, bytes: &[u8]) -> ImportResult<ImportSummary> {
    ImportService::new(SqliteContentRepository::new(conn)).import_workbook(family, bytes)
}

#[test]
fn reads_first_sheet_as_text_grid() {
    let bytes = workbook(
        &exam_header(),
        &[(1, vec![(0, Cell::Number(1.0)), (2, Cell::Text("OAB")), (16, Cell::Number(12.0))])],
        true,
    );

    let grid = read_first_sheet(&bytes).unwrap();
    assert_eq!(grid.len(), 2);
    assert_eq!(grid[0][0], "idtipo");
    assert_eq!(grid[1][0], "1");
    assert_eq!(grid[1][2], "OAB");
    assert_eq!(grid[1][16], "12");
}

#[test]
fn imports_exam_workbook_with_numeric_cells() {
    let mut conn = open_db_in_memory().unwrap();
    let bytes = workbook(
        &exam_header(),
        &[
            (
                1,
                vec![
                    (0, Cell::Number(3.0)),
                    (2, Cell::Text("Ética")),
                    (16, Cell::Number(7.0)),
                    (17, Cell::Text("Art. 7 texto")),
                ],
            ),
            (
                3,
                vec![(2, Cell::Text("Ética")), (16, Cell::Number(8.0))],
            ),
        ],
        false,
    );

    let summary = import(&mut conn, Family::Exam, &bytes).unwrap();
    assert_eq!(summary.layout, "legacy");
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.skipped_blank, 1);

    let article: String = conn
        .query_row(
            "SELECT num_artigo FROM vade_mecum_oab WHERE idtipo = '3';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(article, "7");
}

#[test]
fn row_errors_use_spreadsheet_row_numbers() {
    let mut conn = open_db_in_memory().unwrap();
    // Row 2 is valid, rows 3-4 are empty, row 5 lacks nomecodigo.
    let bytes = workbook(
        &exam_header(),
        &[
            (1, vec![(2, Cell::Text("OAB"))]),
            (4, vec![(0, Cell::Number(1.0)), (16, Cell::Text("Art. 1"))]),
        ],
        false,
    );

    let err = import(&mut conn, Family::Exam, &bytes).unwrap_err();
    assert!(matches!(
        err,
        ImportError::RowValidation {
            row: 5,
            field: "nomecodigo"
        }
    ));
}

#[test]
fn reimporting_workbook_keeps_record_set() {
    let mut conn = open_db_in_memory().unwrap();
    let bytes = workbook(
        &exam_header(),
        &[
            (1, vec![(2, Cell::Text("OAB")), (16, Cell::Text("Art. 1"))]),
            (2, vec![(2, Cell::Text("OAB")), (16, Cell::Text("Art. 2"))]),
        ],
        false,
    );

    import(&mut conn, Family::Exam, &bytes).unwrap();
    import(&mut conn, Family::Exam, &bytes).unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM vade_mecum_oab;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn unreadable_upload_fails_before_any_write() {
    let mut conn = open_db_in_memory().unwrap();
    let err = import(&mut conn, Family::Codes, b"nomecodigo;num_artigo\nCC;1").unwrap_err();
    assert!(matches!(err, ImportError::FileOpen(_)));
}

#[test]
fn workbook_without_sheets_is_rejected() {
    let bytes = workbook_without_sheets();
    assert!(matches!(
        read_first_sheet(&bytes),
        Err(ImportError::EmptySheet(EmptySheetKind::NoSheets))
    ));

    let mut conn = open_db_in_memory().unwrap();
    let err = import(&mut conn, Family::Laws, &bytes).unwrap_err();
    assert!(matches!(err, ImportError::EmptySheet(EmptySheetKind::NoSheets)));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM vade_mecum_leis;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}
