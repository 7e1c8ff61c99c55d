//! The logical row/column/cell data model shared by the writer and reader.

mod cell;
mod style;
mod validation;

pub use cell::{Cell, CellValue, Column, RichTextRun, Row};
pub use style::{
    Alignment, Border, BorderSide, BorderStyle, Fill, Font, HAlign, PatternType, Style,
    UnderlineStyle, VAlign,
};
pub use validation::{DataValidation, ValidationOperator, ValidationType};
