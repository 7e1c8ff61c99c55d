use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Style;

/// A typed cell value.
///
/// Serialization switches exhaustively over the tag; there is no untyped
/// fallback. Dates are serial day numbers in the 1900 date system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum CellValue {
    #[default]
    Empty,
    Number {
        value: f64,
    },
    String {
        value: String,
    },
    Bool {
        value: bool,
    },
    /// Serial day number (days since 1899-12-30).
    Date {
        serial: f64,
    },
    Formula {
        formula: String,
        /// Cached result text, if any was carried in the file.
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        /// Shared-formula group this cell is the master of.
        #[serde(skip_serializing_if = "Option::is_none")]
        shared_index: Option<u32>,
    },
    /// A follower of a shared formula group; the formula text lives on the
    /// group's master cell.
    SharedFormula {
        shared_index: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },
    RichText {
        runs: Vec<RichTextRun>,
    },
}

impl CellValue {
    #[must_use]
    pub fn number(value: f64) -> Self {
        Self::Number { value }
    }

    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String {
            value: value.into(),
        }
    }

    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::Bool { value }
    }

    #[must_use]
    pub fn date(serial: f64) -> Self {
        Self::Date { serial }
    }

    #[must_use]
    pub fn formula(formula: impl Into<String>) -> Self {
        Self::Formula {
            formula: formula.into(),
            result: None,
            shared_index: None,
        }
    }

    /// The text of a string value, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String { value } => Some(value),
            _ => None,
        }
    }

    /// The numeric value, if this is a number or date.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number { value } => Some(*value),
            Self::Date { serial } => Some(*serial),
            _ => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number { value }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        Self::Number {
            value: value as f64,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::String {
            value: value.to_string(),
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::String { value }
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool { value }
    }
}

/// A run of identically-formatted text within a rich-text cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTextRun {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<super::Font>,
    pub text: String,
}

/// A single cell: typed value, resolved style index, optional descriptor
/// and optional defined-name binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub value: CellValue,
    /// Inline style descriptor, resolved into `style_index` when the cell
    /// is serialized (write) or when the index is decoded (read).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    /// Index into the workbook style table. `None` means default styling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_index: Option<u32>,
    /// Defined name bound to this cell's address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Cell {
    #[must_use]
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }
}

/// A row of cells keyed by 1-based column number.
///
/// On the write side a row lives in the worksheet's open window until it is
/// committed; commit serializes and evicts it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// 1-based row number.
    pub number: u32,
    pub cells: BTreeMap<u32, Cell>,
    /// Row-level style, applied as a default for the row's cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    /// Row height in points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Row {
    #[must_use]
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// The cell at the given 1-based column, if present.
    #[must_use]
    pub fn cell(&self, col: u32) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// The cell at the given 1-based column, created empty on first access.
    pub fn cell_mut(&mut self, col: u32) -> &mut Cell {
        self.cells.entry(col).or_default()
    }
}

/// Per-column configuration: width in Excel character units, a default
/// style for the column's cells, and an optional header written to row 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

impl Column {
    #[must_use]
    pub fn with_header(header: &str, width: f64) -> Self {
        Self {
            width: Some(width),
            style: None,
            header: Some(header.to_string()),
        }
    }
}
