//! Shared helpers for the integration tests: in-memory write/read cycles.
#![allow(dead_code)]

use std::io::Cursor;

use sheetpack::{Row, WorkbookReader, WorkbookWriter, WriterOptions};

pub type MemoryWorkbook = WorkbookWriter<Cursor<Vec<u8>>>;

pub fn memory_workbook(options: WriterOptions) -> MemoryWorkbook {
    WorkbookWriter::new(Cursor::new(Vec::new()), options)
}

pub fn finish(book: &mut MemoryWorkbook) -> Vec<u8> {
    book.commit().unwrap().into_inner()
}

/// Write-then-read helper: drain one sheet's rows from a finished package.
pub fn read_rows(bytes: Vec<u8>, sheet: &str) -> Vec<Row> {
    let mut reader = WorkbookReader::from_bytes(bytes).unwrap();
    reader
        .worksheet(sheet)
        .unwrap()
        .unwrap()
        .collect::<sheetpack::Result<Vec<_>>>()
        .unwrap()
}
