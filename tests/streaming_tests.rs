//! Streaming discipline: forward-only rows, commit semantics, and the
//! many-sheets scenario.
#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

mod common;

use common::{finish, memory_workbook, read_rows};
use sheetpack::{SheetpackError, WorkbookReader, WriterOptions};

#[test]
fn test_ninety_sheets() {
    let mut book = memory_workbook(WriterOptions::default());
    for i in 1..=90u32 {
        let mut sheet = book.add_worksheet(None).unwrap();
        sheet.set_cell("A1", f64::from(i)).unwrap();
        sheet.commit().unwrap();
    }
    let bytes = finish(&mut book);

    let mut reader = WorkbookReader::from_bytes(bytes).unwrap();
    let names: Vec<String> = reader.sheet_names().map(ToString::to_string).collect();
    assert_eq!(names.len(), 90);
    for (i, name) in names.iter().enumerate() {
        assert_eq!(*name, format!("sheet{}", i + 1));
        let rows = reader
            .worksheet(name)
            .unwrap()
            .unwrap()
            .collect::<sheetpack::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].cell(1).unwrap().value.as_number(),
            Some(f64::from(i as u32 + 1))
        );
    }
}

#[test]
fn test_incremental_commits_emit_every_row() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("big")).unwrap();
    for i in 1..=100u32 {
        sheet.add_row([f64::from(i)]).unwrap();
        if i % 10 == 0 {
            sheet.commit_rows_through(i).unwrap();
        }
    }
    sheet.commit().unwrap();
    let rows = read_rows(finish(&mut book), "big");

    assert_eq!(rows.len(), 100);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.number, i as u32 + 1);
        assert_eq!(
            row.cell(1).unwrap().value.as_number(),
            Some(f64::from(i as u32 + 1))
        );
    }
}

#[test]
fn test_committed_rows_cannot_be_revisited() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("s")).unwrap();
    sheet.add_row(["a"]).unwrap();
    sheet.add_row(["b"]).unwrap();
    sheet.commit_rows_through(2).unwrap();

    assert!(matches!(
        sheet.set_cell("A2", "late"),
        Err(SheetpackError::RowAlreadyCommitted(2))
    ));
    assert!(matches!(
        sheet.row_mut(1),
        Err(SheetpackError::RowOrderViolation {
            row: 1,
            committed: 2
        })
    ));
    assert!(matches!(
        sheet.commit_rows_through(1),
        Err(SheetpackError::RowAlreadyCommitted(1))
    ));

    // Rows above the mark are still open.
    sheet.set_cell("A3", "c").unwrap();
    sheet.commit().unwrap();
    let rows = read_rows(finish(&mut book), "s");
    assert_eq!(rows.len(), 3);
}

#[test]
fn test_commit_advances_past_unpopulated_rows() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("sparse")).unwrap();
    sheet.add_row(["a"]).unwrap();
    sheet.commit_rows_through(10).unwrap();
    assert_eq!(sheet.committed_row(), 10);
    assert_eq!(sheet.add_row(["b"]).unwrap(), 11);
    sheet.commit().unwrap();

    let rows = read_rows(finish(&mut book), "sparse");
    let numbers: Vec<u32> = rows.iter().map(|r| r.number).collect();
    assert_eq!(numbers, [1, 11]);
}

#[test]
fn test_worksheet_commit_is_terminal() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("done")).unwrap();
    sheet.add_row([1.0]).unwrap();
    sheet.commit().unwrap();

    assert!(matches!(
        sheet.commit(),
        Err(SheetpackError::WorksheetCommitted(n)) if n == "done"
    ));
    assert!(matches!(
        sheet.add_row([2.0]),
        Err(SheetpackError::WorksheetCommitted(_))
    ));
    assert!(matches!(
        sheet.set_cell("A5", 2.0),
        Err(SheetpackError::WorksheetCommitted(_))
    ));
}

#[test]
fn test_workbook_commit_is_terminal() {
    let mut book = memory_workbook(WriterOptions::default());
    book.add_worksheet(None).unwrap().commit().unwrap();
    book.commit().unwrap();
    assert!(matches!(
        book.commit(),
        Err(SheetpackError::WorkbookAlreadyCommitted)
    ));
    assert!(matches!(
        book.add_worksheet(None),
        Err(SheetpackError::WorkbookAlreadyCommitted)
    ));
}

#[test]
fn test_open_sheet_blocks_workbook() {
    let mut book = memory_workbook(WriterOptions::default());
    {
        let mut sheet = book.add_worksheet(Some("open")).unwrap();
        sheet.add_row(["x"]).unwrap();
    }
    assert!(matches!(
        book.add_worksheet(Some("next")),
        Err(SheetpackError::PreviousSheetNotCommitted)
    ));
    assert!(matches!(
        book.commit(),
        Err(SheetpackError::PreviousSheetNotCommitted)
    ));
}
