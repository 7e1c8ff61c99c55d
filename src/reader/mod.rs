//! Read path: open a finished package and decode it back into the model.
//!
//! The workbook-level tables (sheet list, defined names, shared strings,
//! styles) are decoded eagerly at open; worksheet rows are decoded lazily
//! through [`WorksheetReader`].

mod styles;
mod worksheet;

pub use worksheet::{ColumnInfo, WorksheetReader};

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::defined_names::DefinedNameRegistry;
use crate::error::{Result, SheetpackError};
use crate::package::PackageReader;
use crate::shared_strings::SharedStringTable;
use crate::types::Style;
use crate::xml::{attr_string, attr_string_local, attr_u32};

const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";

/// One sheet as listed in `xl/workbook.xml`, resolved to its part path.
#[derive(Debug, Clone)]
pub struct SheetInfo {
    pub name: String,
    pub sheet_id: u32,
    pub(crate) part: String,
}

/// Reader for a complete spreadsheet package.
pub struct WorkbookReader<R: Read + Seek> {
    package: PackageReader<R>,
    sheets: Vec<SheetInfo>,
    names: DefinedNameRegistry,
    strings: SharedStringTable,
    styles: Vec<Style>,
}

impl WorkbookReader<BufReader<File>> {
    /// Open a package from a file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl WorkbookReader<Cursor<Vec<u8>>> {
    /// Open a package held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::new(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> WorkbookReader<R> {
    /// Open a package from any seekable source and decode the workbook
    /// tables.
    pub fn new(source: R) -> Result<Self> {
        let mut package = PackageReader::open(source)?;

        let content_types = match package.part_string("[Content_Types].xml") {
            Ok(s) => s,
            Err(SheetpackError::PartNotFound(_)) => {
                return Err(SheetpackError::UnsupportedPackage(
                    "no [Content_Types].xml part".to_string(),
                ))
            }
            Err(e) => return Err(e),
        };
        if !content_types.contains(CT_WORKBOOK) {
            return Err(SheetpackError::UnsupportedPackage(
                "archive does not declare a workbook part".to_string(),
            ));
        }

        let workbook_xml = match package.part_string("xl/workbook.xml") {
            Ok(s) => s,
            Err(SheetpackError::PartNotFound(p)) => {
                return Err(SheetpackError::CorruptArchive(format!("missing part {p}")))
            }
            Err(e) => return Err(e),
        };
        let rels = match package.part_string("xl/_rels/workbook.xml.rels") {
            Ok(xml) => parse_relationships(&xml)?,
            Err(SheetpackError::PartNotFound(_)) => HashMap::new(),
            Err(e) => return Err(e),
        };
        let (sheet_entries, name_entries) = parse_workbook(&workbook_xml)?;

        let mut sheets = Vec::with_capacity(sheet_entries.len());
        for (name, sheet_id, rid) in sheet_entries {
            let part = rid
                .as_deref()
                .and_then(|rid| rels.get(rid))
                .map_or_else(
                    || format!("xl/worksheets/sheet{sheet_id}.xml"),
                    |target| format!("xl/{target}"),
                );
            sheets.push(SheetInfo {
                name,
                sheet_id,
                part,
            });
        }

        let mut names = DefinedNameRegistry::new();
        for (name, refs) in name_entries {
            for reference in split_references(&refs) {
                let reference = reference.trim();
                if !reference.is_empty() {
                    names.define(&name, reference);
                }
            }
        }

        let strings = if package.has_part("xl/sharedStrings.xml") {
            let xml = package.part_string("xl/sharedStrings.xml")?;
            SharedStringTable::from_strings(parse_shared_strings(&xml)?)
        } else {
            SharedStringTable::from_strings(Vec::new())
        };

        let styles = if package.has_part("xl/styles.xml") {
            styles::parse_styles(&package.part_string("xl/styles.xml")?)?
        } else {
            vec![Style::default()]
        };

        Ok(Self {
            package,
            sheets,
            names,
            strings,
            styles,
        })
    }

    /// Sheets in workbook order.
    #[must_use]
    pub fn sheets(&self) -> &[SheetInfo] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    #[must_use]
    pub fn defined_names(&self) -> &DefinedNameRegistry {
        &self.names
    }

    #[must_use]
    pub fn shared_strings(&self) -> &SharedStringTable {
        &self.strings
    }

    /// Decoded cell style descriptors, indexed by style index.
    #[must_use]
    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    /// Open one worksheet by name for lazy row iteration, or `None` when no
    /// sheet carries that name. Re-iterating means calling this again: the
    /// part is reopened and decoded from the top.
    pub fn worksheet(&mut self, name: &str) -> Result<Option<WorksheetReader<'_>>> {
        let Some((sheet_name, part)) = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .map(|s| (s.name.clone(), s.part.clone()))
        else {
            return Ok(None);
        };
        let xml = self.package.part_string(&part)?;
        Ok(Some(WorksheetReader::new(
            sheet_name,
            xml,
            &self.strings,
            &self.styles,
            &self.names,
        )?))
    }
}

/// Split a defined name's reference list on commas, ignoring commas inside
/// single-quoted sheet names (a sheet may legally be called `a,b`).
#[allow(clippy::indexing_slicing)] // split points are ASCII, always char boundaries
fn split_references(refs: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (i, c) in refs.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                out.push(&refs[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&refs[start..]);
    out
}

/// Parse a `.rels` part into an Id -> Target map.
fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut rels = HashMap::new();
    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) | Event::Empty(e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) =
                    (attr_string(e, b"Id"), attr_string(e, b"Target"))
                {
                    rels.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rels)
}

type SheetEntry = (String, u32, Option<String>);

/// Parse `xl/workbook.xml` into its sheet list and raw defined-name
/// entries (name, comma-joined references).
#[allow(clippy::cast_possible_truncation)] // sheet counts stay small
fn parse_workbook(xml: &str) -> Result<(Vec<SheetEntry>, Vec<(String, String)>)> {
    let mut reader = Reader::from_str(xml);
    let mut sheets = Vec::new();
    let mut names: Vec<(String, String)> = Vec::new();
    let mut pending_name: Option<String> = None;
    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"sheet" => {
                    let name = attr_string(e, b"name").ok_or_else(|| {
                        SheetpackError::CorruptArchive("sheet without name".to_string())
                    })?;
                    let sheet_id = attr_u32(e, b"sheetId").unwrap_or(sheets.len() as u32 + 1);
                    sheets.push((name, sheet_id, attr_string_local(e, b"id")));
                }
                b"definedName" => {
                    pending_name = attr_string(e, b"name");
                }
                _ => {}
            },
            Event::Text(t) => {
                if let Some(name) = pending_name.as_ref() {
                    let refs = t.unescape()?.into_owned();
                    if !refs.trim().is_empty() {
                        names.push((name.clone(), refs));
                    }
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"definedName" => {
                pending_name = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok((sheets, names))
}

/// Parse `xl/sharedStrings.xml` into the interned string list. Rich-text
/// entries collapse to their concatenated run text.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = current.is_some(),
                _ => {}
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"si" {
                    strings.push(String::new());
                }
            }
            Event::Text(t) => {
                if in_text {
                    if let Some(s) = current.as_mut() {
                        s.push_str(&t.unescape()?);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => {
                    if let Some(s) = current.take() {
                        strings.push(s);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
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
    use crate::package::Package;
    use std::io::Cursor;

    /// Minimal package with one sheet named `s` whose part body is given.
    fn sheet_package(sheet_xml: &str) -> Vec<u8> {
        let content_types = format!("<Types><Override ContentType=\"{CT_WORKBOOK}\"/></Types>");
        let mut pkg = Package::new(Cursor::new(Vec::new()));
        pkg.write_part("[Content_Types].xml", content_types.as_bytes())
            .unwrap();
        pkg.write_part("_rels/.rels", b"<Relationships/>").unwrap();
        pkg.write_part(
            "xl/workbook.xml",
            b"<workbook><sheets><sheet name=\"s\" sheetId=\"1\"/></sheets></workbook>",
        )
        .unwrap();
        pkg.write_part("xl/worksheets/sheet1.xml", sheet_xml.as_bytes())
            .unwrap();
        pkg.finish().unwrap().into_inner()
    }

    #[test]
    fn test_split_references_quoted_commas() {
        assert_eq!(
            split_references("'a,b'!$A$1,'c'!$B$2"),
            ["'a,b'!$A$1", "'c'!$B$2"]
        );
        assert_eq!(split_references("'it''s, data'!$A$1"), ["'it''s, data'!$A$1"]);
        assert_eq!(split_references("one!$A$1,two!$B$2"), ["one!$A$1", "two!$B$2"]);
    }

    #[test]
    fn test_shared_string_index_out_of_range_is_corrupt() {
        let bytes = sheet_package(
            r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>7</v></c></row></sheetData></worksheet>"#,
        );
        let mut reader = WorkbookReader::from_bytes(bytes).unwrap();
        let mut ws = reader.worksheet("s").unwrap().unwrap();
        assert!(matches!(
            ws.next(),
            Some(Err(SheetpackError::CorruptArchive(_)))
        ));
    }

    #[test]
    fn test_style_index_out_of_range_is_corrupt() {
        let bytes = sheet_package(
            r#"<worksheet><sheetData><row r="1"><c r="A1" s="9"/></row></sheetData></worksheet>"#,
        );
        let mut reader = WorkbookReader::from_bytes(bytes).unwrap();
        let mut ws = reader.worksheet("s").unwrap().unwrap();
        assert!(matches!(
            ws.next(),
            Some(Err(SheetpackError::CorruptArchive(_)))
        ));
    }

    #[test]
    fn test_parse_relationships() {
        let xml = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
            <Relationship Id="rId1" Type="t" Target="worksheets/sheet1.xml"/>
            <Relationship Id="rId2" Type="t" Target="styles.xml"/>
        </Relationships>"#;
        let rels = parse_relationships(xml).unwrap();
        assert_eq!(rels["rId1"], "worksheets/sheet1.xml");
        assert_eq!(rels["rId2"], "styles.xml");
    }

    #[test]
    fn test_parse_workbook_sheets_and_names() {
        let xml = r#"<workbook xmlns="x" xmlns:r="y"><sheets>
            <sheet name="alpha" sheetId="1" r:id="rId1"/>
            <sheet name="beta" sheetId="2" r:id="rId2"/>
        </sheets><definedNames>
            <definedName name="threes">'alpha'!$A$3,'alpha'!$B$3</definedName>
        </definedNames></workbook>"#;
        let (sheets, names) = parse_workbook(xml).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0], ("alpha".to_string(), 1, Some("rId1".to_string())));
        assert_eq!(names, [(
            "threes".to_string(),
            "'alpha'!$A$3,'alpha'!$B$3".to_string()
        )]);
    }

    #[test]
    fn test_parse_shared_strings() {
        let xml = r#"<sst count="3" uniqueCount="3">
            <si><t>plain</t></si>
            <si><t xml:space="preserve">  padded </t></si>
            <si><r><t>rich</t></r><r><t> text</t></r></si>
        </sst>"#;
        let strings = parse_shared_strings(xml).unwrap();
        assert_eq!(strings, ["plain", "  padded ", "rich text"]);
    }

    #[test]
    fn test_not_a_spreadsheet() {
        let mut pkg = Package::new(Cursor::new(Vec::new()));
        pkg.write_part("[Content_Types].xml", b"<Types/>").unwrap();
        pkg.write_part("_rels/.rels", b"<Relationships/>").unwrap();
        pkg.write_part("xl/workbook.xml", b"<workbook/>").unwrap();
        let bytes = pkg.finish().unwrap().into_inner();
        assert!(matches!(
            WorkbookReader::from_bytes(bytes),
            Err(SheetpackError::UnsupportedPackage(_))
        ));
    }
}
