//! Forward-only streaming write path.

mod parts;
mod workbook;
mod worksheet;

pub use workbook::{WorkbookWriter, WriterOptions};
pub use worksheet::WorksheetWriter;
