//! Defined names: accumulation across cells, address (not value) binding,
//! and annotation of named cells on the read side.
#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

mod common;

use common::{finish, memory_workbook};
use sheetpack::{WorkbookReader, WriterOptions};

#[test]
fn test_names_accumulate_across_cells() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("blort")).unwrap();
    sheet.add_row([1.0, 2.0, 3.0]).unwrap();
    sheet.add_row([4.0, 5.0, 6.0]).unwrap();
    sheet.add_row([7.0, 8.0, 9.0]).unwrap();
    sheet.set_cell_name("A3", "threes").unwrap();
    sheet.set_cell_name("B3", "threes").unwrap();
    // Re-binding the same address is a no-op.
    sheet.set_cell_name("B3", "threes").unwrap();
    sheet.set_cell_name("E1", "greens").unwrap();
    sheet.set_cell_name("E2", "greens").unwrap();
    sheet.commit().unwrap();
    let bytes = finish(&mut book);

    let reader = WorkbookReader::from_bytes(bytes).unwrap();
    assert_eq!(
        reader.defined_names().resolve("threes").unwrap(),
        &["'blort'!$A$3".to_string(), "'blort'!$B$3".to_string()]
    );
    assert_eq!(
        reader.defined_names().resolve("greens").unwrap(),
        &["'blort'!$E$1".to_string(), "'blort'!$E$2".to_string()]
    );
    assert!(reader.defined_names().resolve("missing").is_none());
}

#[test]
fn test_named_cells_are_annotated_on_read() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("s")).unwrap();
    sheet.add_row([10.0, 20.0]).unwrap();
    sheet.set_cell_name("B1", "target").unwrap();
    sheet.commit().unwrap();
    let bytes = finish(&mut book);

    let mut reader = WorkbookReader::from_bytes(bytes).unwrap();
    let rows = reader
        .worksheet("s")
        .unwrap()
        .unwrap()
        .collect::<sheetpack::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(rows[0].cell(1).unwrap().name, None);
    assert_eq!(rows[0].cell(2).unwrap().name.as_deref(), Some("target"));
}

#[test]
fn test_name_binds_to_address_not_value() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("s")).unwrap();
    sheet.set_cell("A1", "first").unwrap();
    sheet.set_cell_name("A1", "label").unwrap();
    sheet.set_cell("A1", "second").unwrap();
    sheet.commit().unwrap();
    let bytes = finish(&mut book);

    let mut reader = WorkbookReader::from_bytes(bytes).unwrap();
    assert_eq!(
        reader.defined_names().resolve("label").unwrap(),
        &["'s'!$A$1".to_string()]
    );
    let rows = reader
        .worksheet("s")
        .unwrap()
        .unwrap()
        .collect::<sheetpack::Result<Vec<_>>>()
        .unwrap();
    let cell = rows[0].cell(1).unwrap();
    assert_eq!(cell.value.as_str(), Some("second"));
    assert_eq!(cell.name.as_deref(), Some("label"));
}

#[test]
fn test_names_span_sheets() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut first = book.add_worksheet(Some("first")).unwrap();
    first.set_cell("A1", 1.0).unwrap();
    first.set_cell_name("A1", "anchor").unwrap();
    first.commit().unwrap();
    let mut second = book.add_worksheet(Some("second")).unwrap();
    second.set_cell("B2", 2.0).unwrap();
    second.set_cell_name("B2", "anchor").unwrap();
    second.commit().unwrap();
    let bytes = finish(&mut book);

    let reader = WorkbookReader::from_bytes(bytes).unwrap();
    assert_eq!(
        reader.defined_names().resolve("anchor").unwrap(),
        &["'first'!$A$1".to_string(), "'second'!$B$2".to_string()]
    );
}

#[test]
fn test_sheet_names_with_commas_stay_whole() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("a,b")).unwrap();
    sheet.set_cell("A1", 1.0).unwrap();
    sheet.set_cell_name("A1", "comma").unwrap();
    sheet.commit().unwrap();
    let bytes = finish(&mut book);

    let reader = WorkbookReader::from_bytes(bytes).unwrap();
    assert_eq!(
        reader.defined_names().resolve("comma").unwrap(),
        &["'a,b'!$A$1".to_string()]
    );
}

#[test]
fn test_sheet_names_with_quotes_are_escaped() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("it's data")).unwrap();
    sheet.set_cell("A1", 1.0).unwrap();
    sheet.set_cell_name("A1", "quoted").unwrap();
    sheet.commit().unwrap();
    let bytes = finish(&mut book);

    let reader = WorkbookReader::from_bytes(bytes).unwrap();
    assert_eq!(
        reader.defined_names().resolve("quoted").unwrap(),
        &["'it''s data'!$A$1".to_string()]
    );
}
