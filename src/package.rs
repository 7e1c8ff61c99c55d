//! ZIP packaging: the container layer beneath the XML parts.
//!
//! Writing follows an explicit two-phase protocol: phase 1 streams parts
//! one at a time (`begin_part` / `write_chunk` / `end_part`, append-only),
//! phase 2 (`finish`) writes the central directory. The phases never
//! interleave, and only one part stream may be open at a time; that rule is
//! what serializes sheet output.
//!
//! Reading scans the trailing central directory first and then offers
//! random-access part retrieval by path.

use std::io::{Read, Seek, Write};

use zip::read::ZipFile;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Result, SheetpackError};

/// Parts every spreadsheet package must contain before `finish`.
pub const REQUIRED_PARTS: [&str; 3] = ["[Content_Types].xml", "_rels/.rels", "xl/workbook.xml"];

fn part_options() -> FileOptions {
    FileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Streaming package writer over any seekable byte sink.
///
/// Backpressure is inherited from the sink: `write_chunk` blocks inside the
/// sink's `write_all` until the bytes are accepted, and byte order is
/// preserved across the suspension. Dropping the package before `finish`
/// leaves a structurally incomplete archive that readers must discard.
pub struct Package<W: Write + Seek> {
    zip: Option<ZipWriter<W>>,
    open_part: Option<String>,
    written: Vec<String>,
}

impl<W: Write + Seek> Package<W> {
    pub fn new(sink: W) -> Self {
        Self {
            zip: Some(ZipWriter::new(sink)),
            open_part: None,
            written: Vec::new(),
        }
    }

    /// Paths of all parts written so far, in emission order.
    #[must_use]
    pub fn part_names(&self) -> &[String] {
        &self.written
    }

    /// Open a new part for streaming write.
    ///
    /// Fails with `PartStillOpen` if another part's stream is open, with
    /// `DuplicatePart` if a part was already written at `path`, and with
    /// `PackageFinished` after `finish`.
    pub fn begin_part(&mut self, path: &str) -> Result<()> {
        if let Some(open) = &self.open_part {
            return Err(SheetpackError::PartStillOpen(open.clone()));
        }
        if self.written.iter().any(|p| p == path) {
            return Err(SheetpackError::DuplicatePart(path.to_string()));
        }
        let zip = self.zip.as_mut().ok_or(SheetpackError::PackageFinished)?;
        zip.start_file(path, part_options())?;
        self.open_part = Some(path.to_string());
        Ok(())
    }

    /// Append bytes to the open part's compressed stream.
    pub fn write_chunk(&mut self, bytes: &[u8]) -> Result<()> {
        if self.open_part.is_none() {
            return Err(SheetpackError::NoOpenPart);
        }
        let zip = self.zip.as_mut().ok_or(SheetpackError::PackageFinished)?;
        zip.write_all(bytes)?;
        Ok(())
    }

    /// Close the open part; it becomes immutable.
    pub fn end_part(&mut self) -> Result<()> {
        match self.open_part.take() {
            Some(path) => {
                self.written.push(path);
                Ok(())
            }
            None => Err(SheetpackError::NoOpenPart),
        }
    }

    /// Write a whole part in one call.
    pub fn write_part(&mut self, path: &str, content: &[u8]) -> Result<()> {
        self.begin_part(path)?;
        self.write_chunk(content)?;
        self.end_part()
    }

    /// Finalize the archive: verify the required parts were written, emit
    /// the central directory and trailing record, and return the sink.
    pub fn finish(&mut self) -> Result<W> {
        if let Some(open) = &self.open_part {
            return Err(SheetpackError::PartStillOpen(open.clone()));
        }
        for required in REQUIRED_PARTS {
            if !self.written.iter().any(|p| p == required) {
                return Err(SheetpackError::PackageIncomplete(required.to_string()));
            }
        }
        let mut zip = self.zip.take().ok_or(SheetpackError::PackageFinished)?;
        Ok(zip.finish()?)
    }
}

/// Random-access package reader.
pub struct PackageReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> PackageReader<R> {
    /// Open an archive by scanning its trailing central directory.
    pub fn open(source: R) -> Result<Self> {
        let archive = ZipArchive::new(source).map_err(corrupt)?;
        Ok(Self { archive })
    }

    /// Number of parts the central directory enumerates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Whether the directory lists a part at `path`.
    pub fn has_part(&mut self, path: &str) -> bool {
        self.archive.by_name(path).is_ok()
    }

    /// All part paths, in directory order.
    pub fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(ToString::to_string).collect()
    }

    /// Open a part's decompressed stream by path.
    pub fn part(&mut self, path: &str) -> Result<ZipFile<'_>> {
        match self.archive.by_name(path) {
            Ok(file) => Ok(file),
            Err(ZipError::FileNotFound) => Err(SheetpackError::PartNotFound(path.to_string())),
            Err(e) => Err(corrupt(e)),
        }
    }

    /// Read a whole part into a string.
    pub fn part_string(&mut self, path: &str) -> Result<String> {
        let mut file = self.part(path)?;
        let mut out = String::new();
        file.read_to_string(&mut out)
            .map_err(|e| SheetpackError::CorruptArchive(format!("{path}: {e}")))?;
        Ok(out)
    }
}

fn corrupt(e: ZipError) -> SheetpackError {
    match e {
        ZipError::Io(io) => SheetpackError::Io(io),
        other => SheetpackError::CorruptArchive(other.to_string()),
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

    fn write_minimal() -> Vec<u8> {
        let mut pkg = Package::new(Cursor::new(Vec::new()));
        pkg.write_part("[Content_Types].xml", b"<Types/>").unwrap();
        pkg.write_part("_rels/.rels", b"<Relationships/>").unwrap();
        pkg.begin_part("xl/workbook.xml").unwrap();
        pkg.write_chunk(b"<workbook>").unwrap();
        pkg.write_chunk(b"</workbook>").unwrap();
        pkg.end_part().unwrap();
        pkg.finish().unwrap().into_inner()
    }

    #[test]
    fn test_two_phase_write_then_read() {
        let bytes = write_minimal();
        let mut reader = PackageReader::open(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), 3);
        assert_eq!(
            reader.part_string("xl/workbook.xml").unwrap(),
            "<workbook></workbook>"
        );
    }

    #[test]
    fn test_single_open_part_rule() {
        let mut pkg = Package::new(Cursor::new(Vec::new()));
        pkg.begin_part("a.xml").unwrap();
        assert!(matches!(
            pkg.begin_part("b.xml"),
            Err(SheetpackError::PartStillOpen(p)) if p == "a.xml"
        ));
    }

    #[test]
    fn test_duplicate_part_path_rejected() {
        let mut pkg = Package::new(Cursor::new(Vec::new()));
        pkg.write_part("xl/workbook.xml", b"<workbook/>").unwrap();
        assert!(matches!(
            pkg.begin_part("xl/workbook.xml"),
            Err(SheetpackError::DuplicatePart(p)) if p == "xl/workbook.xml"
        ));
    }

    #[test]
    fn test_chunk_requires_open_part() {
        let mut pkg = Package::new(Cursor::new(Vec::new()));
        assert!(matches!(
            pkg.write_chunk(b"x"),
            Err(SheetpackError::NoOpenPart)
        ));
        assert!(matches!(pkg.end_part(), Err(SheetpackError::NoOpenPart)));
    }

    #[test]
    fn test_finish_requires_mandatory_parts() {
        let mut pkg = Package::new(Cursor::new(Vec::new()));
        pkg.write_part("xl/worksheets/sheet1.xml", b"<worksheet/>")
            .unwrap();
        assert!(matches!(
            pkg.finish(),
            Err(SheetpackError::PackageIncomplete(p)) if p == "[Content_Types].xml"
        ));
    }

    #[test]
    fn test_finish_twice_fails() {
        let mut pkg = Package::new(Cursor::new(Vec::new()));
        pkg.write_part("[Content_Types].xml", b"<Types/>").unwrap();
        pkg.write_part("_rels/.rels", b"<Relationships/>").unwrap();
        pkg.write_part("xl/workbook.xml", b"<workbook/>").unwrap();
        pkg.finish().unwrap();
        assert!(matches!(pkg.finish(), Err(SheetpackError::PackageFinished)));
    }

    #[test]
    fn test_part_not_found() {
        let bytes = write_minimal();
        let mut reader = PackageReader::open(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            reader.part("xl/styles.xml"),
            Err(SheetpackError::PartNotFound(p)) if p == "xl/styles.xml"
        ));
    }

    #[test]
    fn test_corrupt_archive() {
        let garbage = b"this is not a zip archive at all".to_vec();
        assert!(matches!(
            PackageReader::open(Cursor::new(garbage)),
            Err(SheetpackError::CorruptArchive(_))
        ));
    }
}
