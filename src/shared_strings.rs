//! Shared string interning.
//!
//! In shared mode, distinct string contents are interned in first-use order
//! and cells reference them by index; in inline mode the table is inert and
//! values are emitted verbatim inside the cell. The mode is fixed for the
//! document's lifetime.

use std::collections::HashMap;

use crate::error::{Result, SheetpackError};
use crate::xml::{xml_escape, XML_DECL, NS_MAIN};

/// String handling mode, selected at workbook-open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMode {
    /// Intern strings into `xl/sharedStrings.xml`, cells carry indices.
    Shared,
    /// Emit strings verbatim in each cell (`t="inlineStr"`); no table part.
    Inline,
}

/// First-occurrence-ordered string intern table.
#[derive(Debug)]
pub struct SharedStringTable {
    mode: StringMode,
    strings: Vec<String>,
    index: HashMap<String, u32>,
    /// Total references, including duplicates (the `count` attribute).
    references: u64,
}

impl SharedStringTable {
    #[must_use]
    pub fn new(mode: StringMode) -> Self {
        Self {
            mode,
            strings: Vec::new(),
            index: HashMap::new(),
            references: 0,
        }
    }

    /// Rebuild a table from an already-decoded part (read side).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_strings(strings: Vec<String>) -> Self {
        let index = strings
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i as u32))
            .collect();
        Self {
            mode: StringMode::Shared,
            strings,
            index,
            references: 0,
        }
    }

    #[must_use]
    pub fn mode(&self) -> StringMode {
        self.mode
    }

    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.mode == StringMode::Shared
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Intern a string, returning its stable first-occurrence index.
    #[allow(clippy::cast_possible_truncation)]
    pub fn intern(&mut self, value: &str) -> u32 {
        self.references += 1;
        if let Some(&idx) = self.index.get(value) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(value.to_string());
        self.index.insert(value.to_string(), idx);
        idx
    }

    /// Inverse lookup of an interned index.
    pub fn resolve(&self, index: u32) -> Result<&str> {
        self.strings
            .get(index as usize)
            .map(String::as_str)
            .ok_or(SheetpackError::UnknownStringIndex(index))
    }

    /// Serialize the table as the `xl/sharedStrings.xml` part.
    #[must_use]
    pub fn write_xml(&self) -> String {
        let mut out = String::with_capacity(256 + self.strings.len() * 24);
        out.push_str(XML_DECL);
        out.push('\n');
        out.push_str(&format!(
            r#"<sst xmlns="{NS_MAIN}" count="{}" uniqueCount="{}">"#,
            self.references,
            self.strings.len()
        ));
        for s in &self.strings {
            if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
                out.push_str(&format!(
                    r#"<si><t xml:space="preserve">{}</t></si>"#,
                    xml_escape(s)
                ));
            } else {
                out.push_str(&format!("<si><t>{}</t></si>", xml_escape(s)));
            }
        }
        out.push_str("</sst>");
        out
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

    #[test]
    fn test_intern_first_occurrence_order() {
        let mut table = SharedStringTable::new(StringMode::Shared);
        assert_eq!(table.intern("hello"), 0);
        assert_eq!(table.intern("world"), 1);
        assert_eq!(table.intern("hello"), 0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_resolve_roundtrip() {
        let mut table = SharedStringTable::new(StringMode::Shared);
        for s in ["a", "b", "a", "c", "ünïcodé"] {
            let idx = table.intern(s);
            assert_eq!(table.resolve(idx).unwrap(), s);
        }
    }

    #[test]
    fn test_resolve_out_of_range() {
        let table = SharedStringTable::new(StringMode::Shared);
        assert!(matches!(
            table.resolve(0),
            Err(crate::error::SheetpackError::UnknownStringIndex(0))
        ));
    }

    #[test]
    fn test_write_xml_counts() {
        let mut table = SharedStringTable::new(StringMode::Shared);
        table.intern("x");
        table.intern("y");
        table.intern("x");
        let xml = table.write_xml();
        assert!(xml.contains(r#"count="3" uniqueCount="2""#));
        assert!(xml.contains("<si><t>x</t></si>"));
    }

    #[test]
    fn test_write_xml_preserves_leading_whitespace() {
        let mut table = SharedStringTable::new(StringMode::Shared);
        table.intern("  padded ");
        let xml = table.write_xml();
        assert!(xml.contains(r#"<t xml:space="preserve">  padded </t>"#));
    }
}
