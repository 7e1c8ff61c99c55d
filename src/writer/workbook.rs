//! Streaming workbook writer.
//!
//! A workbook owns the package stream plus the three cross-sheet tables
//! (styles, shared strings, defined names). Worksheets stream through it one
//! at a time: `add_worksheet` opens the sheet part, the returned writer
//! borrows the workbook exclusively until the sheet commits, and `commit`
//! emits every remaining part and finalizes the archive.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use crate::defined_names::DefinedNameRegistry;
use crate::error::{Result, SheetpackError};
use crate::package::Package;
use crate::shared_strings::{SharedStringTable, StringMode};
use crate::style_table::StyleTable;

use super::parts;
use super::worksheet::WorksheetWriter;

/// Document-lifetime writer options, fixed at open time.
#[derive(Debug, Clone, Copy)]
pub struct WriterOptions {
    /// Register cell/row/column styles and emit `xl/styles.xml` entries.
    /// When off, all styling is ignored and every cell reports the default.
    pub use_styles: bool,
    /// Intern string cells into `xl/sharedStrings.xml`; otherwise strings
    /// are written inline per cell.
    pub use_shared_strings: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            use_styles: true,
            use_shared_strings: false,
        }
    }
}

/// Identity of an added sheet: display name plus the stable numeric id that
/// names its part (`xl/worksheets/sheet{id}.xml`).
#[derive(Debug, Clone)]
pub(super) struct SheetMeta {
    pub(super) name: String,
    pub(super) id: u32,
}

/// Forward-only workbook writer over any seekable byte sink.
pub struct WorkbookWriter<W: Write + Seek> {
    pub(super) package: Package<W>,
    pub(super) styles: StyleTable,
    pub(super) strings: SharedStringTable,
    pub(super) names: DefinedNameRegistry,
    pub(super) sheets: Vec<SheetMeta>,
    pub(super) sheet_open: bool,
    committed: bool,
}

impl WorkbookWriter<BufWriter<File>> {
    /// Create a workbook streaming to a file on disk.
    pub fn create(path: impl AsRef<Path>, options: WriterOptions) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), options))
    }
}

impl<W: Write + Seek> WorkbookWriter<W> {
    /// Create a workbook streaming to an arbitrary sink.
    pub fn new(sink: W, options: WriterOptions) -> Self {
        let mode = if options.use_shared_strings {
            StringMode::Shared
        } else {
            StringMode::Inline
        };
        Self {
            package: Package::new(sink),
            styles: StyleTable::new(options.use_styles),
            strings: SharedStringTable::new(mode),
            names: DefinedNameRegistry::new(),
            sheets: Vec::new(),
            sheet_open: false,
            committed: false,
        }
    }

    /// Names of the sheets added so far, in workbook order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    #[must_use]
    pub fn defined_names(&self) -> &DefinedNameRegistry {
        &self.names
    }

    /// Bind a workbook-level defined name to an absolute reference like
    /// `'sheet1'!$A$1`. Repeated bindings accumulate.
    pub fn define_name(&mut self, name: &str, reference: &str) {
        self.names.define(name, reference);
    }

    #[must_use]
    pub fn shared_strings(&self) -> &SharedStringTable {
        &self.strings
    }

    #[must_use]
    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Open the next worksheet for streaming.
    ///
    /// With `name: None` the sheet is auto-named `sheet<N>` from its
    /// position. The previous sheet must have committed: its part stream
    /// holds the archive until then.
    pub fn add_worksheet(&mut self, name: Option<&str>) -> Result<WorksheetWriter<'_, W>> {
        if self.committed {
            return Err(SheetpackError::WorkbookAlreadyCommitted);
        }
        if self.sheet_open {
            return Err(SheetpackError::PreviousSheetNotCommitted);
        }
        let name = match name {
            Some(n) => {
                if self.sheets.iter().any(|s| s.name == n) {
                    return Err(SheetpackError::DuplicateSheetName(n.to_string()));
                }
                n.to_string()
            }
            None => {
                let mut i = self.sheets.len() + 1;
                loop {
                    let candidate = format!("sheet{i}");
                    if !self.sheets.iter().any(|s| s.name == candidate) {
                        break candidate;
                    }
                    i += 1;
                }
            }
        };
        #[allow(clippy::cast_possible_truncation)] // sheet counts stay small
        let id = self.sheets.len() as u32 + 1;
        self.package
            .begin_part(&format!("xl/worksheets/sheet{id}.xml"))?;
        self.sheets.push(SheetMeta { name, id });
        self.sheet_open = true;
        let index = self.sheets.len() - 1;
        Ok(WorksheetWriter::new(self, index))
    }

    /// Commit the workbook: emit shared strings, styles, the workbook part,
    /// relationships and content types, then finalize the archive and
    /// return the sink.
    ///
    /// Every worksheet must already be committed. A second commit fails
    /// with `WorkbookAlreadyCommitted`.
    pub fn commit(&mut self) -> Result<W> {
        if self.committed {
            return Err(SheetpackError::WorkbookAlreadyCommitted);
        }
        if self.sheet_open {
            return Err(SheetpackError::PreviousSheetNotCommitted);
        }
        let shared = self.strings.is_shared();
        if shared {
            self.package
                .write_part("xl/sharedStrings.xml", self.strings.write_xml().as_bytes())?;
        }
        self.package
            .write_part("xl/styles.xml", self.styles.write_xml().as_bytes())?;
        self.package.write_part(
            "xl/workbook.xml",
            parts::workbook_xml(&self.sheets, &self.names).as_bytes(),
        )?;
        self.package.write_part(
            "xl/_rels/workbook.xml.rels",
            parts::workbook_rels_xml(&self.sheets, shared).as_bytes(),
        )?;
        self.package.write_part(
            "[Content_Types].xml",
            parts::content_types_xml(&self.sheets, shared).as_bytes(),
        )?;
        self.package
            .write_part("_rels/.rels", parts::root_rels_xml().as_bytes())?;
        let sink = self.package.finish()?;
        self.committed = true;
        Ok(sink)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn workbook() -> WorkbookWriter<Cursor<Vec<u8>>> {
        WorkbookWriter::new(Cursor::new(Vec::new()), WriterOptions::default())
    }

    #[test]
    fn test_auto_sheet_names() {
        let mut book = workbook();
        book.add_worksheet(None).unwrap().commit().unwrap();
        book.add_worksheet(Some("data")).unwrap().commit().unwrap();
        book.add_worksheet(None).unwrap().commit().unwrap();
        let names: Vec<&str> = book.sheet_names().collect();
        assert_eq!(names, ["sheet1", "data", "sheet3"]);
    }

    #[test]
    fn test_auto_name_skips_collisions() {
        let mut book = workbook();
        book.add_worksheet(Some("sheet1"))
            .unwrap()
            .commit()
            .unwrap();
        book.add_worksheet(None).unwrap().commit().unwrap();
        let names: Vec<&str> = book.sheet_names().collect();
        assert_eq!(names, ["sheet1", "sheet2"]);
    }

    #[test]
    fn test_duplicate_sheet_name_rejected() {
        let mut book = workbook();
        book.add_worksheet(Some("data")).unwrap().commit().unwrap();
        assert!(matches!(
            book.add_worksheet(Some("data")),
            Err(SheetpackError::DuplicateSheetName(n)) if n == "data"
        ));
    }

    #[test]
    fn test_previous_sheet_must_commit() {
        let mut book = workbook();
        {
            let mut sheet = book.add_worksheet(None).unwrap();
            sheet.add_row(["a"]).unwrap();
            // Dropped without commit.
        }
        assert!(matches!(
            book.add_worksheet(None),
            Err(SheetpackError::PreviousSheetNotCommitted)
        ));
        assert!(matches!(
            book.commit(),
            Err(SheetpackError::PreviousSheetNotCommitted)
        ));
    }

    #[test]
    fn test_commit_twice_fails() {
        let mut book = workbook();
        book.add_worksheet(None).unwrap().commit().unwrap();
        book.commit().unwrap();
        assert!(matches!(
            book.commit(),
            Err(SheetpackError::WorkbookAlreadyCommitted)
        ));
        assert!(matches!(
            book.add_worksheet(None),
            Err(SheetpackError::WorkbookAlreadyCommitted)
        ));
    }
}
