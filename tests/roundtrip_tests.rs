//! Write-then-read fidelity for every cell value type, in both string
//! modes, plus sheet-level geometry (row heights, column widths).
#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

mod common;

use common::{finish, memory_workbook, read_rows};
use sheetpack::{CellValue, Column, Font, RichTextRun, WorkbookReader, WriterOptions};

#[test]
fn test_value_types_roundtrip_inline() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("values")).unwrap();
    sheet.add_row([CellValue::number(3.25)]).unwrap();
    sheet.add_row([CellValue::string("hello <&> world")]).unwrap();
    sheet.add_row([CellValue::bool(true), CellValue::bool(false)]).unwrap();
    sheet.add_row([CellValue::date(45123.5)]).unwrap();
    sheet.commit().unwrap();
    let rows = read_rows(finish(&mut book), "values");

    assert_eq!(rows[0].cell(1).unwrap().value, CellValue::number(3.25));
    assert_eq!(
        rows[1].cell(1).unwrap().value,
        CellValue::string("hello <&> world")
    );
    assert_eq!(rows[2].cell(1).unwrap().value, CellValue::bool(true));
    assert_eq!(rows[2].cell(2).unwrap().value, CellValue::bool(false));
    assert_eq!(rows[3].cell(1).unwrap().value, CellValue::date(45123.5));
}

#[test]
fn test_string_roundtrip_shared_mode() {
    let options = WriterOptions {
        use_shared_strings: true,
        ..WriterOptions::default()
    };
    let mut book = memory_workbook(options);
    let mut sheet = book.add_worksheet(Some("s")).unwrap();
    sheet.add_row(["alpha", "beta"]).unwrap();
    sheet.add_row(["alpha", "alpha"]).unwrap();
    sheet.commit().unwrap();
    let bytes = finish(&mut book);

    let mut reader = WorkbookReader::from_bytes(bytes).unwrap();
    // Four references, two distinct strings.
    assert_eq!(reader.shared_strings().len(), 2);
    let rows = reader
        .worksheet("s")
        .unwrap()
        .unwrap()
        .collect::<sheetpack::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(rows[0].cell(2).unwrap().value.as_str(), Some("beta"));
    assert_eq!(rows[1].cell(2).unwrap().value.as_str(), Some("alpha"));
}

#[test]
fn test_whitespace_strings_preserved() {
    for shared in [false, true] {
        let options = WriterOptions {
            use_shared_strings: shared,
            ..WriterOptions::default()
        };
        let mut book = memory_workbook(options);
        let mut sheet = book.add_worksheet(Some("s")).unwrap();
        sheet.add_row(["  leading and trailing  "]).unwrap();
        sheet.commit().unwrap();
        let rows = read_rows(finish(&mut book), "s");
        assert_eq!(
            rows[0].cell(1).unwrap().value.as_str(),
            Some("  leading and trailing  ")
        );
    }
}

#[test]
fn test_formula_with_cached_result() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("f")).unwrap();
    sheet.add_row([2.0, 5.0]).unwrap();
    sheet
        .set_cell(
            "C1",
            CellValue::Formula {
                formula: "A1+B1".to_string(),
                result: Some("7".to_string()),
                shared_index: None,
            },
        )
        .unwrap();
    sheet.commit().unwrap();
    let rows = read_rows(finish(&mut book), "f");

    assert_eq!(
        rows[0].cell(3).unwrap().value,
        CellValue::Formula {
            formula: "A1+B1".to_string(),
            result: Some("7".to_string()),
            shared_index: None,
        }
    );
}

#[test]
fn test_shared_formula_group_roundtrip() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("f")).unwrap();
    sheet
        .set_cell(
            "A1",
            CellValue::Formula {
                formula: "ROW()*2".to_string(),
                result: Some("2".to_string()),
                shared_index: Some(0),
            },
        )
        .unwrap();
    sheet
        .set_cell(
            "A2",
            CellValue::SharedFormula {
                shared_index: 0,
                result: Some("4".to_string()),
            },
        )
        .unwrap();
    sheet.commit().unwrap();
    let rows = read_rows(finish(&mut book), "f");

    assert_eq!(
        rows[0].cell(1).unwrap().value,
        CellValue::Formula {
            formula: "ROW()*2".to_string(),
            result: Some("2".to_string()),
            shared_index: Some(0),
        }
    );
    assert_eq!(
        rows[1].cell(1).unwrap().value,
        CellValue::SharedFormula {
            shared_index: 0,
            result: Some("4".to_string()),
        }
    );
}

#[test]
fn test_rich_text_roundtrip() {
    let value = CellValue::RichText {
        runs: vec![
            RichTextRun {
                font: Some(Font {
                    bold: true,
                    color: Some("FFFF0000".to_string()),
                    ..Font::default()
                }),
                text: "bold red ".to_string(),
            },
            RichTextRun {
                font: None,
                text: "plain".to_string(),
            },
        ],
    };
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("rich")).unwrap();
    sheet.set_cell("A1", value.clone()).unwrap();
    sheet.commit().unwrap();
    let rows = read_rows(finish(&mut book), "rich");
    assert_eq!(rows[0].cell(1).unwrap().value, value);
}

#[test]
fn test_empty_worksheet_roundtrip() {
    let mut book = memory_workbook(WriterOptions::default());
    book.add_worksheet(Some("empty")).unwrap().commit().unwrap();
    let rows = read_rows(finish(&mut book), "empty");
    assert!(rows.is_empty());
}

#[test]
fn test_row_height_and_column_width_roundtrip() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("geom")).unwrap();
    sheet
        .set_columns(vec![
            Column {
                width: Some(10.0),
                ..Column::default()
            },
            Column {
                width: Some(32.5),
                ..Column::default()
            },
        ])
        .unwrap();
    sheet.add_row(["a", "b"]).unwrap();
    sheet.set_row_height(1, 25.5).unwrap();
    sheet.commit().unwrap();
    let bytes = finish(&mut book);

    let mut reader = WorkbookReader::from_bytes(bytes).unwrap();
    let mut ws = reader.worksheet("geom").unwrap().unwrap();
    assert_eq!(ws.columns().len(), 2);
    assert_eq!(ws.columns()[0].width, Some(10.0));
    assert_eq!(ws.columns()[1].width, Some(32.5));
    let row = ws.next().unwrap().unwrap();
    assert_eq!(row.height, Some(25.5));
}

#[test]
fn test_multiple_sheets_keep_their_rows() {
    let mut book = memory_workbook(WriterOptions::default());
    for name in ["one", "two", "three"] {
        let mut sheet = book.add_worksheet(Some(name)).unwrap();
        sheet.add_row([name]).unwrap();
        sheet.commit().unwrap();
    }
    let bytes = finish(&mut book);

    let mut reader = WorkbookReader::from_bytes(bytes).unwrap();
    let names: Vec<String> = reader.sheet_names().map(ToString::to_string).collect();
    assert_eq!(names, ["one", "two", "three"]);
    for name in names {
        let rows = reader
            .worksheet(&name)
            .unwrap()
            .unwrap()
            .collect::<sheetpack::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(rows[0].cell(1).unwrap().value.as_str(), Some(name.as_str()));
    }
}
