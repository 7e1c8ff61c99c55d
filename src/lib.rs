//! sheetpack - streaming XLSX workbook writer and reader
//!
//! Writes spreadsheet packages forward-only with bounded memory: rows are
//! serialized and evicted as they commit, worksheets stream one at a time,
//! and the workbook tables (styles, shared strings, defined names) are the
//! only state held for the document's lifetime. The read side decodes the
//! same packages back, eagerly for the workbook tables and lazily per row.
//!
//! # Usage
//!
//! ```
//! use std::io::Cursor;
//! use sheetpack::{WorkbookReader, WorkbookWriter, WriterOptions};
//!
//! # fn main() -> sheetpack::Result<()> {
//! let mut book = WorkbookWriter::new(Cursor::new(Vec::new()), WriterOptions::default());
//! let mut sheet = book.add_worksheet(Some("data"))?;
//! sheet.add_row(["name", "count"])?;
//! sheet.add_row(["widgets"])?;
//! sheet.set_cell("B2", 42.0)?;
//! sheet.commit()?;
//! let bytes = book.commit()?.into_inner();
//!
//! let mut reader = WorkbookReader::from_bytes(bytes)?;
//! let rows = reader
//!     .worksheet("data")?
//!     .expect("sheet exists")
//!     .collect::<sheetpack::Result<Vec<_>>>()?;
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[1].cell(2).unwrap().value.as_number(), Some(42.0));
//! # Ok(())
//! # }
//! ```

pub mod cell_ref;
pub mod defined_names;
pub mod error;
pub mod package;
pub mod reader;
pub mod shared_strings;
pub mod style_table;
pub mod types;
pub mod writer;
mod xml;

pub use error::{Result, SheetpackError};

pub use defined_names::{DefinedName, DefinedNameRegistry};
pub use shared_strings::{SharedStringTable, StringMode};
pub use style_table::StyleTable;
pub use types::{
    Alignment, Border, BorderSide, BorderStyle, Cell, CellValue, Column, DataValidation, Fill,
    Font, HAlign, PatternType, RichTextRun, Row, Style, UnderlineStyle, VAlign,
    ValidationOperator, ValidationType,
};

pub use reader::{ColumnInfo, SheetInfo, WorkbookReader, WorksheetReader};
pub use writer::{WorkbookWriter, WorksheetWriter, WriterOptions};
