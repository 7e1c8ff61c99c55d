//! Data validation round-trips: rules survive the write/read cycle and are
//! exposed once the row iterator is drained.
#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

mod common;

use common::{finish, memory_workbook};
use sheetpack::{
    DataValidation, SheetpackError, ValidationOperator, ValidationType, WorkbookReader,
    WriterOptions,
};

fn list_validation() -> DataValidation {
    DataValidation {
        sqref: "A1:A100".to_string(),
        vtype: ValidationType::List,
        formula1: Some("\"One,Two,Three\"".to_string()),
        allow_blank: true,
        show_error_message: true,
        error_title: Some("Bad pick".to_string()),
        error: Some("Choose from the list".to_string()),
        ..DataValidation::default()
    }
}

#[test]
fn test_list_validation_roundtrip() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("v")).unwrap();
    sheet.add_row(["One"]).unwrap();
    sheet.add_data_validation(list_validation()).unwrap();
    sheet.commit().unwrap();
    let bytes = finish(&mut book);

    let mut reader = WorkbookReader::from_bytes(bytes).unwrap();
    let mut ws = reader.worksheet("v").unwrap().unwrap();
    while let Some(row) = ws.next() {
        row.unwrap();
    }
    assert_eq!(ws.data_validations(), &[list_validation()]);
}

#[test]
fn test_between_validation_keeps_both_formulas() {
    let rule = DataValidation {
        sqref: "B2:B9".to_string(),
        vtype: ValidationType::Whole,
        operator: Some(ValidationOperator::Between),
        formula1: Some("1".to_string()),
        formula2: Some("9".to_string()),
        show_input_message: true,
        prompt_title: Some("Digits".to_string()),
        prompt: Some("1 through 9".to_string()),
        ..DataValidation::default()
    };
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("v")).unwrap();
    sheet.add_row([5.0]).unwrap();
    sheet.add_data_validation(rule.clone()).unwrap();
    sheet.commit().unwrap();
    let bytes = finish(&mut book);

    let mut reader = WorkbookReader::from_bytes(bytes).unwrap();
    let mut ws = reader.worksheet("v").unwrap().unwrap();
    while let Some(row) = ws.next() {
        row.unwrap();
    }
    assert_eq!(ws.data_validations(), &[rule]);
}

#[test]
fn test_multiple_rules_keep_order() {
    let second = DataValidation {
        sqref: "C1:C4 D1:D4".to_string(),
        vtype: ValidationType::Decimal,
        operator: Some(ValidationOperator::GreaterThan),
        formula1: Some("0".to_string()),
        ..DataValidation::default()
    };
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("v")).unwrap();
    sheet.add_data_validation(list_validation()).unwrap();
    sheet.add_data_validation(second.clone()).unwrap();
    sheet.commit().unwrap();
    let bytes = finish(&mut book);

    let mut reader = WorkbookReader::from_bytes(bytes).unwrap();
    let mut ws = reader.worksheet("v").unwrap().unwrap();
    while let Some(row) = ws.next() {
        row.unwrap();
    }
    assert_eq!(ws.data_validations(), &[list_validation(), second]);
}

#[test]
fn test_malformed_range_is_rejected() {
    let mut book = memory_workbook(WriterOptions::default());
    let mut sheet = book.add_worksheet(Some("v")).unwrap();
    let bad = DataValidation {
        sqref: "A1:ZZZZ99".to_string(),
        vtype: ValidationType::List,
        ..DataValidation::default()
    };
    assert!(matches!(
        sheet.add_data_validation(bad),
        Err(SheetpackError::InvalidAddress(_))
    ));
    sheet.commit().unwrap();
}
