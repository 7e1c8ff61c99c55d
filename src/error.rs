//! Structured error types for sheetpack.
//!
//! Streaming-discipline violations (row order, double commit, addressing)
//! surface immediately at the call site; archive-integrity failures on read
//! are terminal for that read.

/// All errors that can occur while writing or reading a package.
#[derive(Debug, thiserror::Error)]
pub enum SheetpackError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error from the underlying sink or source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed cell reference or range.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Style index outside the style table.
    #[error("Unknown style index {0}")]
    UnknownStyleIndex(u32),

    /// Shared string index outside the string table.
    #[error("Unknown shared string index {0}")]
    UnknownStringIndex(u32),

    /// A row at or below the committed high-water mark was opened.
    #[error("Row {row} violates streaming order (highest committed row is {committed})")]
    RowOrderViolation { row: u32, committed: u32 },

    /// A cell on an already-committed row was addressed.
    #[error("Row {0} has already been committed")]
    RowAlreadyCommitted(u32),

    /// Column configuration was attempted after row streaming began.
    #[error("Worksheet {0:?} has streamed rows; columns are fixed")]
    SheetDataStarted(String),

    /// The worksheet was mutated after its commit.
    #[error("Worksheet {0:?} is already committed")]
    WorksheetCommitted(String),

    /// A new worksheet was added while the previous one was still streaming.
    #[error("Previous worksheet has not been committed")]
    PreviousSheetNotCommitted,

    /// `commit` was called on an already-committed workbook.
    #[error("Workbook is already committed")]
    WorkbookAlreadyCommitted,

    /// A worksheet name collides with an existing sheet.
    #[error("Duplicate worksheet name {0:?}")]
    DuplicateSheetName(String),

    /// `finish` was called before every required part was written.
    #[error("Package incomplete: missing part {0:?}")]
    PackageIncomplete(String),

    /// A part was opened at a path that was already written.
    #[error("Part {0:?} was already written")]
    DuplicatePart(String),

    /// A part was opened while another part's stream was still open.
    #[error("Part {0:?} is still open")]
    PartStillOpen(String),

    /// The package has already been finished.
    #[error("Package is already finished")]
    PackageFinished,

    /// A chunk was written with no part stream open.
    #[error("No part is open for writing")]
    NoOpenPart,

    /// A requested part does not exist in the archive.
    #[error("Part not found: {0:?}")]
    PartNotFound(String),

    /// Central directory, headers, or cross-references are inconsistent.
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// The archive is a valid ZIP but not a spreadsheet package we support.
    #[error("Unsupported package: {0}")]
    UnsupportedPackage(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SheetpackError>;
