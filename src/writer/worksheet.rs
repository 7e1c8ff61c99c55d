//! Streaming worksheet writer.
//!
//! Rows live in an open window until committed; commit serializes them into
//! the sheet's part stream in ascending order and evicts them. The committed
//! high-water mark only moves forward, so row numbers at or below it can
//! never be touched again.

use std::collections::BTreeMap;
use std::io::{Seek, Write};

use crate::cell_ref::{format_absolute, parse_cell_range, parse_cell_ref, to_address, MAX_ROW};
use crate::error::{Result, SheetpackError};
use crate::types::{Cell, CellValue, Column, DataValidation, Font, Row, Style};
use crate::xml::{xml_escape, NS_MAIN, NS_REL, XML_DECL};

use super::workbook::WorkbookWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SheetState {
    /// No rows streamed yet; columns may still be configured.
    Open,
    /// At least one row touched; the column layout is fixed.
    Streaming,
    Committed,
}

/// Writer for one worksheet, holding the workbook exclusively until commit.
pub struct WorksheetWriter<'a, W: Write + Seek> {
    book: &'a mut WorkbookWriter<W>,
    index: usize,
    state: SheetState,
    preamble_written: bool,
    columns: Vec<Column>,
    window: BTreeMap<u32, Row>,
    committed_to: u32,
    validations: Vec<DataValidation>,
}

impl<'a, W: Write + Seek> WorksheetWriter<'a, W> {
    pub(super) fn new(book: &'a mut WorkbookWriter<W>, index: usize) -> Self {
        Self {
            book,
            index,
            state: SheetState::Open,
            preamble_written: false,
            columns: Vec::new(),
            window: BTreeMap::new(),
            committed_to: 0,
            validations: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.book.sheets[self.index].name
    }

    /// Highest row number committed so far (0 before the first commit).
    #[must_use]
    pub fn committed_row(&self) -> u32 {
        self.committed_to
    }

    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.state == SheetState::Committed
    }

    /// Configure the column layout: widths, column-level default styles,
    /// and optional headers (written as string cells into row 1).
    ///
    /// Only allowed before any row has been streamed; once cells exist the
    /// layout is fixed.
    #[allow(clippy::cast_possible_truncation)] // column counts stay far below u32::MAX
    pub fn set_columns(&mut self, columns: Vec<Column>) -> Result<()> {
        match self.state {
            SheetState::Open => {}
            SheetState::Streaming => {
                return Err(SheetpackError::SheetDataStarted(self.name().to_string()))
            }
            SheetState::Committed => {
                return Err(SheetpackError::WorksheetCommitted(self.name().to_string()))
            }
        }
        if columns.iter().any(|c| c.header.is_some()) {
            let row = self.window.entry(1).or_insert_with(|| Row::new(1));
            for (i, col) in columns.iter().enumerate() {
                if let Some(header) = &col.header {
                    row.cell_mut(i as u32 + 1).value = CellValue::string(header.clone());
                }
            }
        }
        self.columns = columns;
        Ok(())
    }

    /// Append a row after the highest existing row, filling cells from
    /// column A. Returns the assigned 1-based row number.
    #[allow(clippy::cast_possible_truncation)] // column counts stay far below u32::MAX
    pub fn add_row<I, V>(&mut self, values: I) -> Result<u32>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.ensure_writable()?;
        let number = self.next_row();
        let mut row = Row::new(number);
        for (i, value) in values.into_iter().enumerate() {
            let value = value.into();
            if value != CellValue::Empty {
                row.cell_mut(i as u32 + 1).value = value;
            }
        }
        self.window.insert(number, row);
        self.state = SheetState::Streaming;
        Ok(number)
    }

    /// The cell at `address` (like `"B3"`), created on first access.
    ///
    /// The row must be above the committed high-water mark.
    pub fn cell_mut(&mut self, address: &str) -> Result<&mut Cell> {
        self.ensure_writable()?;
        let (row, col) = parse_cell_ref(address)?;
        if row <= self.committed_to {
            return Err(SheetpackError::RowAlreadyCommitted(row));
        }
        self.state = SheetState::Streaming;
        Ok(self
            .window
            .entry(row)
            .or_insert_with(|| Row::new(row))
            .cell_mut(col))
    }

    /// Set a cell's value by address.
    pub fn set_cell(&mut self, address: &str, value: impl Into<CellValue>) -> Result<()> {
        self.cell_mut(address)?.value = value.into();
        Ok(())
    }

    /// Attach an explicit style to a cell. Cell styles take precedence over
    /// row styles, which take precedence over column styles.
    pub fn set_cell_style(&mut self, address: &str, style: Style) -> Result<()> {
        self.cell_mut(address)?.style = Some(style);
        Ok(())
    }

    /// Bind a defined name to a cell's address. The binding is to the
    /// address, not the value: later writes to the cell keep the name.
    pub fn set_cell_name(&mut self, address: &str, name: &str) -> Result<()> {
        self.ensure_writable()?;
        let (row, col) = parse_cell_ref(address)?;
        if row <= self.committed_to {
            return Err(SheetpackError::RowAlreadyCommitted(row));
        }
        let reference = format_absolute(&self.book.sheets[self.index].name, row, col)?;
        self.book.names.define(name, &reference);
        self.state = SheetState::Streaming;
        self.window
            .entry(row)
            .or_insert_with(|| Row::new(row))
            .cell_mut(col)
            .name = Some(name.to_string());
        Ok(())
    }

    /// The row at `number`, created on first access. Rows at or below the
    /// committed mark fail with `RowOrderViolation`.
    pub fn row_mut(&mut self, number: u32) -> Result<&mut Row> {
        self.ensure_writable()?;
        if number == 0 || number > MAX_ROW {
            return Err(SheetpackError::InvalidAddress(format!("row {number}")));
        }
        if number <= self.committed_to {
            return Err(SheetpackError::RowOrderViolation {
                row: number,
                committed: self.committed_to,
            });
        }
        self.state = SheetState::Streaming;
        Ok(self.window.entry(number).or_insert_with(|| Row::new(number)))
    }

    /// Set a row-level default style, inherited by the row's cells unless
    /// they carry their own.
    pub fn set_row_style(&mut self, number: u32, style: Style) -> Result<()> {
        self.row_mut(number)?.style = Some(style);
        Ok(())
    }

    /// Set a row's height in points.
    pub fn set_row_height(&mut self, number: u32, height: f64) -> Result<()> {
        self.row_mut(number)?.height = Some(height);
        Ok(())
    }

    /// Attach a data validation rule. Ranges are checked for shape now and
    /// the rule is emitted after the sheet data at commit.
    pub fn add_data_validation(&mut self, validation: DataValidation) -> Result<()> {
        self.ensure_writable()?;
        if validation.sqref.trim().is_empty() {
            return Err(SheetpackError::InvalidAddress(validation.sqref));
        }
        for range in validation.sqref.split_whitespace() {
            parse_cell_range(range)?;
        }
        self.validations.push(validation);
        Ok(())
    }

    /// Serialize and evict every open row up to and including `through`.
    ///
    /// The high-water mark advances to `through` even when some of those
    /// rows were never populated, so the committed region is contiguous.
    pub fn commit_rows_through(&mut self, through: u32) -> Result<()> {
        self.ensure_writable()?;
        if through <= self.committed_to {
            return Err(SheetpackError::RowAlreadyCommitted(through));
        }
        self.ensure_preamble()?;
        while let Some(entry) = self.window.first_entry() {
            if *entry.key() > through {
                break;
            }
            let row = entry.remove();
            let xml = self.row_xml(&row)?;
            self.book.package.write_chunk(xml.as_bytes())?;
        }
        self.committed_to = through;
        self.state = SheetState::Streaming;
        Ok(())
    }

    /// Commit the worksheet: flush all remaining rows, close the sheet
    /// part, and release the workbook for the next sheet.
    pub fn commit(&mut self) -> Result<()> {
        if self.state == SheetState::Committed {
            return Err(SheetpackError::WorksheetCommitted(self.name().to_string()));
        }
        self.ensure_preamble()?;
        while let Some(entry) = self.window.first_entry() {
            let row = entry.remove();
            let number = row.number;
            let xml = self.row_xml(&row)?;
            self.book.package.write_chunk(xml.as_bytes())?;
            self.committed_to = self.committed_to.max(number);
        }
        let mut tail = String::from("</sheetData>");
        self.validations_xml(&mut tail);
        tail.push_str("</worksheet>");
        self.book.package.write_chunk(tail.as_bytes())?;
        self.book.package.end_part()?;
        self.book.sheet_open = false;
        self.state = SheetState::Committed;
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.state == SheetState::Committed {
            return Err(SheetpackError::WorksheetCommitted(self.name().to_string()));
        }
        Ok(())
    }

    fn next_row(&self) -> u32 {
        let open_max = self.window.keys().next_back().copied().unwrap_or(0);
        open_max.max(self.committed_to) + 1
    }

    /// Write the sheet header and open `<sheetData>`. Deferred to the first
    /// flush so the column layout is final when `<cols>` is emitted.
    fn ensure_preamble(&mut self) -> Result<()> {
        if self.preamble_written {
            return Ok(());
        }
        let mut out = String::with_capacity(256);
        out.push_str(XML_DECL);
        out.push('\n');
        out.push_str(&format!(
            r#"<worksheet xmlns="{NS_MAIN}" xmlns:r="{NS_REL}">"#
        ));

        let mut cols = String::new();
        for (i, col) in self.columns.iter().enumerate() {
            let style_id = match &col.style {
                Some(s) => self.book.styles.register(s),
                None => 0,
            };
            if col.width.is_none() && style_id == 0 {
                continue;
            }
            let n = i + 1;
            cols.push_str(&format!(r#"<col min="{n}" max="{n}""#));
            if let Some(width) = col.width {
                cols.push_str(&format!(r#" width="{width}" customWidth="1""#));
            }
            if style_id != 0 {
                cols.push_str(&format!(r#" style="{style_id}""#));
            }
            cols.push_str("/>");
        }
        if !cols.is_empty() {
            out.push_str("<cols>");
            out.push_str(&cols);
            out.push_str("</cols>");
        }

        out.push_str("<sheetData>");
        self.book.package.write_chunk(out.as_bytes())?;
        self.preamble_written = true;
        Ok(())
    }

    fn row_xml(&mut self, row: &Row) -> Result<String> {
        let style_id = match &row.style {
            Some(s) => self.book.styles.register(s),
            None => 0,
        };
        let mut out = format!(r#"<row r="{}""#, row.number);
        if style_id != 0 {
            out.push_str(&format!(r#" s="{style_id}" customFormat="1""#));
        }
        if let Some(height) = row.height {
            out.push_str(&format!(r#" ht="{height}" customHeight="1""#));
        }
        out.push('>');
        for (&col, cell) in &row.cells {
            out.push_str(&self.cell_xml(row.number, col, cell)?);
        }
        out.push_str("</row>");
        Ok(out)
    }

    fn cell_xml(&mut self, row: u32, col: u32, cell: &Cell) -> Result<String> {
        let address = to_address(row, col)?;
        let style_id = match cell.style_index {
            Some(id) => id,
            None => match &cell.style {
                Some(s) => self.book.styles.register(s),
                None => 0,
            },
        };
        let mut attrs = format!(r#" r="{address}""#);
        if style_id != 0 {
            attrs.push_str(&format!(r#" s="{style_id}""#));
        }

        let xml = match &cell.value {
            CellValue::Empty => {
                // A bare empty cell carries no information; skip it unless
                // it holds a style or a name binding.
                if style_id != 0 || cell.name.is_some() {
                    format!("<c{attrs}/>")
                } else {
                    String::new()
                }
            }
            CellValue::Number { value } => format!("<c{attrs}><v>{value}</v></c>"),
            CellValue::Date { serial } => format!(r#"<c{attrs} t="d"><v>{serial}</v></c>"#),
            CellValue::Bool { value } => {
                format!(r#"<c{attrs} t="b"><v>{}</v></c>"#, u8::from(*value))
            }
            CellValue::String { value } => {
                if self.book.strings.is_shared() {
                    let idx = self.book.strings.intern(value);
                    format!(r#"<c{attrs} t="s"><v>{idx}</v></c>"#)
                } else {
                    format!(
                        r#"<c{attrs} t="inlineStr"><is>{}</is></c>"#,
                        inline_text_xml(value)
                    )
                }
            }
            CellValue::RichText { runs } => {
                // Rich text is always inline; the shared table holds plain
                // strings only.
                let mut is = String::new();
                for run in runs {
                    is.push_str("<r>");
                    if let Some(font) = &run.font {
                        is.push_str(&run_props_xml(font));
                    }
                    is.push_str(&format!(
                        r#"<t xml:space="preserve">{}</t>"#,
                        xml_escape(&run.text)
                    ));
                    is.push_str("</r>");
                }
                format!(r#"<c{attrs} t="inlineStr"><is>{is}</is></c>"#)
            }
            CellValue::Formula {
                formula,
                result,
                shared_index,
            } => {
                let mut body = match shared_index {
                    Some(si) => format!(
                        r#"<f t="shared" si="{si}">{}</f>"#,
                        xml_escape(formula)
                    ),
                    None => format!("<f>{}</f>", xml_escape(formula)),
                };
                if let Some(result) = result {
                    body.push_str(&format!("<v>{}</v>", xml_escape(result)));
                }
                format!("<c{attrs}>{body}</c>")
            }
            CellValue::SharedFormula {
                shared_index,
                result,
            } => {
                let mut body = format!(r#"<f t="shared" si="{shared_index}"/>"#);
                if let Some(result) = result {
                    body.push_str(&format!("<v>{}</v>", xml_escape(result)));
                }
                format!("<c{attrs}>{body}</c>")
            }
        };
        Ok(xml)
    }

    fn validations_xml(&self, out: &mut String) {
        if self.validations.is_empty() {
            return;
        }
        out.push_str(&format!(
            r#"<dataValidations count="{}">"#,
            self.validations.len()
        ));
        for v in &self.validations {
            out.push_str(&format!(r#"<dataValidation type="{}""#, v.vtype.as_str()));
            if let Some(op) = v.operator {
                out.push_str(&format!(r#" operator="{}""#, op.as_str()));
            }
            if v.allow_blank {
                out.push_str(r#" allowBlank="1""#);
            }
            if v.show_input_message {
                out.push_str(r#" showInputMessage="1""#);
            }
            if v.show_error_message {
                out.push_str(r#" showErrorMessage="1""#);
            }
            for (key, value) in [
                ("promptTitle", &v.prompt_title),
                ("prompt", &v.prompt),
                ("errorTitle", &v.error_title),
                ("error", &v.error),
            ] {
                if let Some(value) = value {
                    out.push_str(&format!(r#" {key}="{}""#, xml_escape(value)));
                }
            }
            out.push_str(&format!(r#" sqref="{}""#, xml_escape(&v.sqref)));
            match (&v.formula1, &v.formula2) {
                (None, _) => out.push_str("/>"),
                (Some(f1), f2) => {
                    out.push('>');
                    out.push_str(&format!("<formula1>{}</formula1>", xml_escape(f1)));
                    if let Some(f2) = f2 {
                        out.push_str(&format!("<formula2>{}</formula2>", xml_escape(f2)));
                    }
                    out.push_str("</dataValidation>");
                }
            }
        }
        out.push_str("</dataValidations>");
    }
}

fn inline_text_xml(text: &str) -> String {
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        format!(r#"<t xml:space="preserve">{}</t>"#, xml_escape(text))
    } else {
        format!("<t>{}</t>", xml_escape(text))
    }
}

/// Run properties for a rich-text run. Same shape as a font fragment in
/// `styles.xml`, except the name tag is `rFont`.
fn run_props_xml(font: &Font) -> String {
    let mut out = String::from("<rPr>");
    if font.bold {
        out.push_str("<b/>");
    }
    if font.italic {
        out.push_str("<i/>");
    }
    if font.strike {
        out.push_str("<strike/>");
    }
    if let Some(u) = font.underline {
        out.push_str(&format!(r#"<u val="{}"/>"#, u.as_str()));
    }
    if let Some(size) = font.size {
        out.push_str(&format!(r#"<sz val="{size}"/>"#));
    }
    if let Some(color) = &font.color {
        out.push_str(&format!(r#"<color rgb="{}"/>"#, xml_escape(color)));
    }
    if let Some(name) = &font.name {
        out.push_str(&format!(r#"<rFont val="{}"/>"#, xml_escape(name)));
    }
    out.push_str("</rPr>");
    out
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
    use crate::writer::workbook::WriterOptions;
    use std::io::Cursor;

    fn workbook() -> WorkbookWriter<Cursor<Vec<u8>>> {
        WorkbookWriter::new(Cursor::new(Vec::new()), WriterOptions::default())
    }

    #[test]
    fn test_add_row_numbers_sequentially() {
        let mut book = workbook();
        let mut sheet = book.add_worksheet(None).unwrap();
        assert_eq!(sheet.add_row([1.0, 2.0]).unwrap(), 1);
        assert_eq!(sheet.add_row([3.0]).unwrap(), 2);
        sheet.set_cell("A10", 5.0).unwrap();
        assert_eq!(sheet.add_row([4.0]).unwrap(), 11);
        sheet.commit().unwrap();
    }

    #[test]
    fn test_committed_rows_are_sealed() {
        let mut book = workbook();
        let mut sheet = book.add_worksheet(None).unwrap();
        sheet.add_row(["a"]).unwrap();
        sheet.add_row(["b"]).unwrap();
        sheet.commit_rows_through(2).unwrap();
        assert!(matches!(
            sheet.cell_mut("A1"),
            Err(SheetpackError::RowAlreadyCommitted(1))
        ));
        assert!(matches!(
            sheet.row_mut(2),
            Err(SheetpackError::RowOrderViolation {
                row: 2,
                committed: 2
            })
        ));
        assert!(matches!(
            sheet.commit_rows_through(2),
            Err(SheetpackError::RowAlreadyCommitted(2))
        ));
        sheet.commit().unwrap();
    }

    #[test]
    fn test_high_water_mark_spans_unpopulated_rows() {
        let mut book = workbook();
        let mut sheet = book.add_worksheet(None).unwrap();
        sheet.add_row(["a"]).unwrap();
        sheet.commit_rows_through(10).unwrap();
        assert_eq!(sheet.committed_row(), 10);
        assert!(matches!(
            sheet.cell_mut("A7"),
            Err(SheetpackError::RowAlreadyCommitted(7))
        ));
        assert_eq!(sheet.add_row(["b"]).unwrap(), 11);
        sheet.commit().unwrap();
    }

    #[test]
    fn test_commit_twice_fails() {
        let mut book = workbook();
        let mut sheet = book.add_worksheet(Some("only")).unwrap();
        sheet.add_row([1.0]).unwrap();
        sheet.commit().unwrap();
        assert!(matches!(
            sheet.commit(),
            Err(SheetpackError::WorksheetCommitted(n)) if n == "only"
        ));
        assert!(matches!(
            sheet.add_row([2.0]),
            Err(SheetpackError::WorksheetCommitted(_))
        ));
    }

    #[test]
    fn test_columns_fixed_after_first_row() {
        let mut book = workbook();
        let mut sheet = book.add_worksheet(None).unwrap();
        sheet
            .set_columns(vec![Column::with_header("id", 10.0)])
            .unwrap();
        sheet.add_row([1.0]).unwrap();
        assert!(matches!(
            sheet.set_columns(vec![Column::default()]),
            Err(SheetpackError::SheetDataStarted(_))
        ));
        sheet.commit().unwrap();
    }

    #[test]
    fn test_headers_populate_row_one() {
        let mut book = workbook();
        let mut sheet = book.add_worksheet(None).unwrap();
        sheet
            .set_columns(vec![
                Column::with_header("id", 10.0),
                Column::with_header("name", 32.0),
            ])
            .unwrap();
        let row = sheet.row_mut(1).unwrap();
        assert_eq!(row.cell(1).unwrap().value.as_str(), Some("id"));
        assert_eq!(row.cell(2).unwrap().value.as_str(), Some("name"));
        sheet.commit().unwrap();
    }

    #[test]
    fn test_validation_sqref_is_checked() {
        let mut book = workbook();
        let mut sheet = book.add_worksheet(None).unwrap();
        let bad = DataValidation {
            sqref: "not-a-range".to_string(),
            ..DataValidation::default()
        };
        assert!(matches!(
            sheet.add_data_validation(bad),
            Err(SheetpackError::InvalidAddress(_))
        ));
        sheet.commit().unwrap();
    }
}
