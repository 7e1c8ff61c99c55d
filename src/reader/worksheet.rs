//! Lazy worksheet row iterator.
//!
//! The sheet preamble (`<cols>`) is parsed at construction; rows are decoded
//! one `<row>` element at a time as the iterator is driven. Data validations
//! sit after `<sheetData>` and become available once iteration is exhausted.

use std::io::Cursor;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::cell_ref::{format_absolute, parse_cell_ref};
use crate::defined_names::DefinedNameRegistry;
use crate::error::{Result, SheetpackError};
use crate::shared_strings::SharedStringTable;
use crate::types::{
    Cell, CellValue, DataValidation, Font, RichTextRun, Row, Style, UnderlineStyle,
    ValidationOperator, ValidationType,
};
use crate::xml::{attr_bool, attr_f64, attr_string, attr_u32, attr_val};

/// One `<col>` record: an inclusive column span with width and/or a
/// column-level default style.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub min: u32,
    pub max: u32,
    pub width: Option<f64>,
    pub style: Option<Style>,
}

/// Streaming reader for one worksheet part.
///
/// Iterate to drain the rows in document order; each item is a decoded
/// `Row`. Cells without their own style inherit the row style, then the
/// column style.
pub struct WorksheetReader<'a> {
    name: String,
    reader: Reader<Cursor<Vec<u8>>>,
    buf: Vec<u8>,
    strings: &'a SharedStringTable,
    styles: &'a [Style],
    names: &'a DefinedNameRegistry,
    columns: Vec<ColumnInfo>,
    validations: Vec<DataValidation>,
    done: bool,
}

/// Owned snapshot of a `<row>` start tag.
struct RowStart {
    number: u32,
    style_id: Option<u32>,
    height: Option<f64>,
    empty: bool,
}

/// Owned snapshot of a `<c>` start tag.
struct CellStart {
    row: u32,
    col: u32,
    type_tag: Option<String>,
    style_id: Option<u32>,
    empty: bool,
}

impl<'a> WorksheetReader<'a> {
    pub(super) fn new(
        name: String,
        xml: String,
        strings: &'a SharedStringTable,
        styles: &'a [Style],
        names: &'a DefinedNameRegistry,
    ) -> Result<Self> {
        let mut ws = Self {
            name,
            reader: Reader::from_reader(Cursor::new(xml.into_bytes())),
            buf: Vec::new(),
            strings,
            styles,
            names,
            columns: Vec::new(),
            validations: Vec::new(),
            done: false,
        };
        ws.read_preamble()?;
        Ok(ws)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column spans declared in the sheet preamble.
    #[must_use]
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Data validation rules. Complete only after the row iterator is
    /// exhausted, since the rules follow the sheet data in the part.
    #[must_use]
    pub fn data_validations(&self) -> &[DataValidation] {
        &self.validations
    }

    /// Consume everything up to the first row, collecting `<col>` records.
    fn read_preamble(&mut self) -> Result<()> {
        enum Step {
            Col(ColumnInfo, Option<u32>),
            SheetData { empty: bool },
            Eof,
            Skip,
        }
        loop {
            let step = {
                let event = self.reader.read_event_into(&mut self.buf)?;
                match &event {
                    Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                        b"col" => Step::Col(
                            ColumnInfo {
                                min: attr_u32(e, b"min").unwrap_or(0),
                                max: attr_u32(e, b"max").unwrap_or(0),
                                width: attr_f64(e, b"width"),
                                style: None,
                            },
                            attr_u32(e, b"style"),
                        ),
                        b"sheetData" => Step::SheetData {
                            empty: matches!(&event, Event::Empty(_)),
                        },
                        _ => Step::Skip,
                    },
                    Event::Eof => Step::Eof,
                    _ => Step::Skip,
                }
            };
            self.buf.clear();
            match step {
                Step::Col(mut col, style_id) => {
                    if let Some(id) = style_id {
                        col.style = Some(self.resolve_style(id)?);
                    }
                    self.columns.push(col);
                }
                Step::SheetData { empty } => {
                    if empty {
                        // No rows at all; go straight to the trailer.
                        self.read_trailer()?;
                    }
                    return Ok(());
                }
                Step::Eof => {
                    self.done = true;
                    return Ok(());
                }
                Step::Skip => {}
            }
        }
    }

    fn resolve_style(&self, index: u32) -> Result<Style> {
        self.styles.get(index as usize).cloned().ok_or_else(|| {
            SheetpackError::CorruptArchive(format!("style index {index} out of range"))
        })
    }

    fn column_style(&self, col: u32) -> Option<Style> {
        self.columns
            .iter()
            .find(|c| c.min <= col && col <= c.max)
            .and_then(|c| c.style.clone())
    }

    fn next_row_impl(&mut self) -> Result<Option<Row>> {
        enum Step {
            Row(RowStart),
            EndSheetData,
            Eof,
            Skip,
        }
        loop {
            let step = {
                let event = self.reader.read_event_into(&mut self.buf)?;
                match &event {
                    Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                        let number = attr_u32(e, b"r").ok_or_else(|| {
                            SheetpackError::CorruptArchive("row without r attribute".to_string())
                        })?;
                        Step::Row(RowStart {
                            number,
                            style_id: attr_u32(e, b"s"),
                            height: attr_f64(e, b"ht"),
                            empty: matches!(&event, Event::Empty(_)),
                        })
                    }
                    Event::End(e) if e.local_name().as_ref() == b"sheetData" => Step::EndSheetData,
                    Event::Eof => Step::Eof,
                    _ => Step::Skip,
                }
            };
            self.buf.clear();
            match step {
                Step::Row(start) => {
                    let mut row = Row::new(start.number);
                    row.style = match start.style_id {
                        Some(id) => Some(self.resolve_style(id)?),
                        None => None,
                    };
                    row.height = start.height;
                    if !start.empty {
                        self.read_row_cells(&mut row)?;
                    }
                    return Ok(Some(row));
                }
                Step::EndSheetData => {
                    self.read_trailer()?;
                    return Ok(None);
                }
                Step::Eof => {
                    self.done = true;
                    return Ok(None);
                }
                Step::Skip => {}
            }
        }
    }

    /// Decode the cells of one `<row>` element, through its end tag.
    fn read_row_cells(&mut self, row: &mut Row) -> Result<()> {
        enum Step {
            Cell(CellStart),
            EndRow,
            Skip,
        }
        loop {
            let step = {
                let event = self.reader.read_event_into(&mut self.buf)?;
                match &event {
                    Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                        let address = attr_string(e, b"r").ok_or_else(|| {
                            SheetpackError::CorruptArchive("cell without r attribute".to_string())
                        })?;
                        let (cell_row, col) = parse_cell_ref(&address)?;
                        Step::Cell(CellStart {
                            row: cell_row,
                            col,
                            type_tag: attr_string(e, b"t"),
                            style_id: attr_u32(e, b"s"),
                            empty: matches!(&event, Event::Empty(_)),
                        })
                    }
                    Event::End(e) if e.local_name().as_ref() == b"row" => Step::EndRow,
                    Event::Eof => {
                        return Err(SheetpackError::CorruptArchive(
                            "unterminated row element".to_string(),
                        ))
                    }
                    _ => Step::Skip,
                }
            };
            self.buf.clear();
            match step {
                Step::Cell(start) => {
                    let mut cell = if start.empty {
                        Cell::default()
                    } else {
                        self.read_cell_body(start.type_tag.as_deref())?
                    };
                    match start.style_id {
                        Some(id) => {
                            cell.style = Some(self.resolve_style(id)?);
                            cell.style_index = Some(id);
                        }
                        None => {
                            cell.style = row.style.clone().or_else(|| self.column_style(start.col));
                        }
                    }
                    let reference = format_absolute(&self.name, start.row, start.col)?;
                    cell.name = self.names.name_of(&reference).map(ToString::to_string);
                    row.cells.insert(start.col, cell);
                }
                Step::EndRow => return Ok(()),
                Step::Skip => {}
            }
        }
    }

    /// Decode one non-empty `<c>` element body into a value.
    fn read_cell_body(&mut self, type_tag: Option<&str>) -> Result<Cell> {
        #[derive(PartialEq)]
        enum Target {
            None,
            Value,
            Formula,
            InlineText,
        }
        let mut target = Target::None;
        let mut v_text: Option<String> = None;
        let mut formula: Option<String> = None;
        let mut shared_index: Option<u32> = None;
        let mut shared_follower = false;
        let mut runs: Vec<RichTextRun> = Vec::new();
        let mut run_font: Option<Font> = None;
        let mut run_text = String::new();
        let mut plain_text = String::new();
        let mut in_run = false;

        loop {
            let event = self.reader.read_event_into(&mut self.buf)?;
            let mut finished = false;
            match &event {
                Event::Start(e) | Event::Empty(e) => {
                    let empty = matches!(&event, Event::Empty(_));
                    match e.local_name().as_ref() {
                        b"v" if !empty => target = Target::Value,
                        b"f" => {
                            shared_index = attr_u32(e, b"si");
                            let shared = attr_string(e, b"t").as_deref() == Some("shared");
                            if empty {
                                shared_follower = shared;
                            } else {
                                target = Target::Formula;
                            }
                        }
                        b"r" if !empty => {
                            in_run = true;
                            run_font = None;
                            run_text.clear();
                        }
                        b"t" if !empty => target = Target::InlineText,
                        b"rFont" => {
                            run_font.get_or_insert_with(Font::default).name = attr_val(e);
                        }
                        b"sz" => {
                            run_font.get_or_insert_with(Font::default).size =
                                attr_val(e).and_then(|v| v.parse().ok());
                        }
                        b"color" => {
                            run_font.get_or_insert_with(Font::default).color =
                                attr_string(e, b"rgb");
                        }
                        b"b" => run_font.get_or_insert_with(Font::default).bold = true,
                        b"i" => run_font.get_or_insert_with(Font::default).italic = true,
                        b"strike" => run_font.get_or_insert_with(Font::default).strike = true,
                        b"u" => {
                            run_font.get_or_insert_with(Font::default).underline =
                                UnderlineStyle::parse(attr_val(e).as_deref().unwrap_or("single"));
                        }
                        _ => {}
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape()?.into_owned();
                    match target {
                        Target::Value => v_text = Some(text),
                        Target::Formula => formula = Some(text),
                        Target::InlineText => {
                            if in_run {
                                run_text.push_str(&text);
                            } else {
                                plain_text.push_str(&text);
                            }
                        }
                        Target::None => {}
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"v" | b"f" | b"t" => target = Target::None,
                    b"r" => {
                        runs.push(RichTextRun {
                            font: run_font.take(),
                            text: std::mem::take(&mut run_text),
                        });
                        in_run = false;
                    }
                    b"c" => finished = true,
                    _ => {}
                },
                Event::Eof => {
                    return Err(SheetpackError::CorruptArchive(
                        "unterminated cell element".to_string(),
                    ))
                }
                _ => {}
            }
            self.buf.clear();
            if finished {
                break;
            }
        }

        let value = if formula.is_some() || shared_follower {
            match (formula, shared_follower, shared_index) {
                (None, true, Some(si)) => CellValue::SharedFormula {
                    shared_index: si,
                    result: v_text,
                },
                (formula, _, shared_index) => CellValue::Formula {
                    formula: formula.unwrap_or_default(),
                    result: v_text,
                    shared_index,
                },
            }
        } else {
            match type_tag {
                Some("s") => {
                    let idx = v_text
                        .as_deref()
                        .unwrap_or_default()
                        .parse::<u32>()
                        .map_err(|_| {
                            SheetpackError::CorruptArchive(
                                "shared string cell without numeric index".to_string(),
                            )
                        })?;
                    let value = self.strings.resolve(idx).map_err(|_| {
                        SheetpackError::CorruptArchive(format!(
                            "shared string index {idx} out of range"
                        ))
                    })?;
                    CellValue::String {
                        value: value.to_string(),
                    }
                }
                Some("b") => CellValue::Bool {
                    value: v_text.as_deref() == Some("1"),
                },
                Some("d") => CellValue::Date {
                    serial: parse_number(v_text.as_deref())?,
                },
                Some("str") => CellValue::String {
                    value: v_text.unwrap_or_default(),
                },
                Some("inlineStr") => {
                    if runs.is_empty() {
                        CellValue::String { value: plain_text }
                    } else {
                        CellValue::RichText { runs }
                    }
                }
                _ => match v_text {
                    None => CellValue::Empty,
                    Some(_) => CellValue::Number {
                        value: parse_number(v_text.as_deref())?,
                    },
                },
            }
        };
        Ok(Cell::new(value))
    }

    /// Parse everything after `</sheetData>`: data validations, then the
    /// worksheet end tag.
    fn read_trailer(&mut self) -> Result<()> {
        let mut pending: Option<DataValidation> = None;
        let mut formula_slot: u8 = 0;
        loop {
            let event = self.reader.read_event_into(&mut self.buf)?;
            let mut finished = false;
            match &event {
                Event::Start(e) | Event::Empty(e) => {
                    let empty = matches!(&event, Event::Empty(_));
                    match e.local_name().as_ref() {
                        b"dataValidation" => {
                            let dv = parse_validation_attrs(e);
                            if empty {
                                self.validations.push(dv);
                            } else {
                                pending = Some(dv);
                            }
                        }
                        b"formula1" if !empty => formula_slot = 1,
                        b"formula2" if !empty => formula_slot = 2,
                        _ => {}
                    }
                }
                Event::Text(t) => {
                    if let Some(dv) = pending.as_mut() {
                        let text = t.unescape()?.into_owned();
                        match formula_slot {
                            1 => dv.formula1 = Some(text),
                            2 => dv.formula2 = Some(text),
                            _ => {}
                        }
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"formula1" | b"formula2" => formula_slot = 0,
                    b"dataValidation" => {
                        if let Some(dv) = pending.take() {
                            self.validations.push(dv);
                        }
                    }
                    _ => {}
                },
                Event::Eof => {
                    self.done = true;
                    finished = true;
                }
                _ => {}
            }
            self.buf.clear();
            if finished {
                return Ok(());
            }
        }
    }
}

fn parse_number(text: Option<&str>) -> Result<f64> {
    text.unwrap_or_default()
        .parse()
        .map_err(|_| SheetpackError::CorruptArchive("non-numeric cell value".to_string()))
}

fn parse_validation_attrs(e: &BytesStart) -> DataValidation {
    DataValidation {
        sqref: attr_string(e, b"sqref").unwrap_or_default(),
        vtype: attr_string(e, b"type")
            .map(|t| ValidationType::parse(&t))
            .unwrap_or_default(),
        operator: attr_string(e, b"operator").and_then(|o| ValidationOperator::parse(&o)),
        formula1: None,
        formula2: None,
        allow_blank: attr_bool(e, b"allowBlank").unwrap_or(false),
        show_input_message: attr_bool(e, b"showInputMessage").unwrap_or(false),
        show_error_message: attr_bool(e, b"showErrorMessage").unwrap_or(false),
        prompt_title: attr_string(e, b"promptTitle"),
        prompt: attr_string(e, b"prompt"),
        error_title: attr_string(e, b"errorTitle"),
        error: attr_string(e, b"error"),
    }
}

impl<'a> Iterator for WorksheetReader<'a> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_row_impl() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
