//! JSON serialization of the data model: typed cell values tag themselves,
//! absent style components stay absent.
#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

use sheetpack::{CellValue, Font, Style};

#[test]
fn test_cell_value_tags() {
    let json = serde_json::to_value(CellValue::number(3.5)).unwrap();
    assert_eq!(json["type"], "number");
    assert_eq!(json["value"], 3.5);

    let json = serde_json::to_value(CellValue::string("hi")).unwrap();
    assert_eq!(json["type"], "string");
    assert_eq!(json["value"], "hi");

    let json = serde_json::to_value(CellValue::formula("A1+1")).unwrap();
    assert_eq!(json["type"], "formula");
    assert_eq!(json["formula"], "A1+1");
    assert!(json.get("result").is_none());
}

#[test]
fn test_cell_value_json_roundtrip() {
    for value in [
        CellValue::Empty,
        CellValue::number(1.5),
        CellValue::string("x"),
        CellValue::bool(true),
        CellValue::date(45000.0),
    ] {
        let json = serde_json::to_string(&value).unwrap();
        let back: CellValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}

#[test]
fn test_style_omits_absent_components() {
    let style = Style {
        font: Some(Font {
            bold: true,
            ..Font::default()
        }),
        ..Style::default()
    };
    let json = serde_json::to_value(&style).unwrap();
    assert_eq!(json["font"]["bold"], true);
    assert!(json.get("fill").is_none());
    assert!(json.get("border").is_none());
    assert!(json.get("numFmt").is_none());
}
