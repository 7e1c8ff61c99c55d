//! Style round-trips and inheritance: cell takes precedence over row, row
//! over column; disabled styling degrades to defaults.
#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

mod common;

use common::{finish, memory_workbook, read_rows};
use sheetpack::{Column, Fill, Font, Style, WorkbookReader, WriterOptions};

fn italic() -> Style {
    Style {
        font: Some(Font {
            italic: true,
            ..Font::default()
        }),
        ..Style::default()
    }
}

fn bold() -> Style {
    Style {
        font: Some(Font {
            bold: true,
            ..Font::default()
        }),
        ..Style::default()
    }
}

fn green_fill() -> Style {
    Style {
        fill: Some(Fill::solid("FF00FF00")),
        ..Style::default()
    }
}

#[test]
fn test_column_style_applies_to_header_row() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("cols")).unwrap();
    sheet
        .set_columns(vec![
            Column {
                header: Some("id".to_string()),
                width: Some(10.0),
                style: Some(italic()),
            },
            Column {
                header: Some("name".to_string()),
                width: Some(32.0),
                style: None,
            },
        ])
        .unwrap();
    sheet.add_row([7.0, 8.0]).unwrap();
    sheet.commit().unwrap();
    let rows = read_rows(finish(&mut book), "cols");

    // Headers land in row 1 and inherit the column style.
    assert_eq!(rows[0].number, 1);
    assert_eq!(rows[0].cell(1).unwrap().value.as_str(), Some("id"));
    assert_eq!(rows[0].cell(1).unwrap().style, Some(italic()));
    assert_eq!(rows[0].cell(2).unwrap().value.as_str(), Some("name"));
    assert_eq!(rows[0].cell(2).unwrap().style, None);
    // Data rows in the styled column inherit it too.
    assert_eq!(rows[1].cell(1).unwrap().style, Some(italic()));
}

#[test]
fn test_row_style_overrides_column_style() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("mix")).unwrap();
    sheet
        .set_columns(vec![Column {
            width: Some(10.0),
            style: Some(italic()),
            header: None,
        }])
        .unwrap();
    sheet.add_row([1.0]).unwrap();
    sheet.add_row([2.0]).unwrap();
    sheet.set_row_style(2, bold()).unwrap();
    sheet.commit().unwrap();
    let rows = read_rows(finish(&mut book), "mix");

    assert_eq!(rows[0].cell(1).unwrap().style, Some(italic()));
    assert_eq!(rows[1].style, Some(bold()));
    assert_eq!(rows[1].cell(1).unwrap().style, Some(bold()));
}

#[test]
fn test_cell_style_overrides_row_and_column() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("cell")).unwrap();
    sheet
        .set_columns(vec![Column {
            width: Some(10.0),
            style: Some(italic()),
            header: None,
        }])
        .unwrap();
    sheet.add_row([1.0, 2.0]).unwrap();
    sheet.set_row_style(1, bold()).unwrap();
    sheet.set_cell_style("A1", green_fill()).unwrap();
    sheet.commit().unwrap();
    let rows = read_rows(finish(&mut book), "cell");

    assert_eq!(rows[0].cell(1).unwrap().style, Some(green_fill()));
    assert_eq!(rows[0].cell(2).unwrap().style, Some(bold()));
}

#[test]
fn test_equal_styles_share_an_index() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("dedup")).unwrap();
    for i in 1..=20 {
        sheet.add_row([f64::from(i)]).unwrap();
        sheet
            .set_cell_style(&format!("A{i}"), green_fill())
            .unwrap();
    }
    sheet.commit().unwrap();
    let bytes = finish(&mut book);

    let reader = WorkbookReader::from_bytes(bytes).unwrap();
    // Default entry plus one shared entry.
    assert_eq!(reader.styles().len(), 2);
}

#[test]
fn test_styles_disabled_drops_all_styling() {
    let options = WriterOptions {
        use_styles: false,
        ..WriterOptions::default()
    };
    let mut book = memory_workbook(options);
    let mut sheet = book.add_worksheet(Some("plain")).unwrap();
    sheet
        .set_columns(vec![Column {
            width: Some(10.0),
            style: Some(italic()),
            header: None,
        }])
        .unwrap();
    sheet.add_row([1.0]).unwrap();
    sheet.set_row_style(1, bold()).unwrap();
    sheet.set_cell_style("A1", green_fill()).unwrap();
    sheet.commit().unwrap();
    let bytes = finish(&mut book);

    let mut reader = WorkbookReader::from_bytes(bytes).unwrap();
    assert_eq!(reader.styles().len(), 1);
    let rows = reader
        .worksheet("plain")
        .unwrap()
        .unwrap()
        .collect::<sheetpack::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(rows[0].style, None);
    assert_eq!(rows[0].cell(1).unwrap().style, None);
}

#[test]
fn test_number_format_roundtrip() {
    let percent = Style {
        num_fmt: Some("0.00%".to_string()),
        ..Style::default()
    };
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("fmt")).unwrap();
    sheet.add_row([0.125]).unwrap();
    sheet.set_cell_style("A1", percent.clone()).unwrap();
    sheet.commit().unwrap();
    let rows = read_rows(finish(&mut book), "fmt");
    assert_eq!(rows[0].cell(1).unwrap().style, Some(percent));
}
