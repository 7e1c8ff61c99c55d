//! Defined-name registry.
//!
//! A name labels one or more cell addresses. Definitions accumulate:
//! binding an existing name to a new address appends, binding it to an
//! address it already covers is a no-op. Names bind to
//! addresses, not values; overwriting a named cell's value leaves the
//! binding in place.

use std::collections::HashMap;

use crate::xml::{xml_escape, xml_escape_text};

/// One name and its ordered reference set (absolute, sheet-qualified
/// references like `'blort'!$A$3`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedName {
    pub name: String,
    pub references: Vec<String>,
}

/// Registry of defined names in first-definition order.
#[derive(Debug, Default)]
pub struct DefinedNameRegistry {
    names: Vec<DefinedName>,
    by_name: HashMap<String, usize>,
}

impl DefinedNameRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Bind `reference` to `name`, preserving earlier bindings to other
    /// addresses. Re-binding the exact same address is idempotent.
    #[allow(clippy::indexing_slicing)] // by_name holds only live indices
    pub fn define(&mut self, name: &str, reference: &str) {
        match self.by_name.get(name) {
            Some(&i) => {
                let refs = &mut self.names[i].references;
                if !refs.iter().any(|r| r == reference) {
                    refs.push(reference.to_string());
                }
            }
            None => {
                self.by_name.insert(name.to_string(), self.names.len());
                self.names.push(DefinedName {
                    name: name.to_string(),
                    references: vec![reference.to_string()],
                });
            }
        }
    }

    /// All references bound to a name, in binding order.
    #[must_use]
    #[allow(clippy::indexing_slicing)] // by_name holds only live indices
    pub fn resolve(&self, name: &str) -> Option<&[String]> {
        self.by_name
            .get(name)
            .map(|&i| self.names[i].references.as_slice())
    }

    /// The name bound to an exact reference, if any.
    #[must_use]
    pub fn name_of(&self, reference: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|n| n.references.iter().any(|r| r == reference))
            .map(|n| n.name.as_str())
    }

    /// Iterate names in first-definition order.
    pub fn iter(&self) -> impl Iterator<Item = &DefinedName> {
        self.names.iter()
    }

    /// Append the `<definedNames>` block of `xl/workbook.xml`, if any
    /// names were registered. Multiple references for one name are joined
    /// with commas under a single `definedName` element.
    pub fn write_xml_into(&self, out: &mut String) {
        if self.names.is_empty() {
            return;
        }
        out.push_str("<definedNames>");
        for dn in &self.names {
            out.push_str(&format!(
                r#"<definedName name="{}">{}</definedName>"#,
                xml_escape(&dn.name),
                xml_escape_text(&dn.references.join(","))
            ));
        }
        out.push_str("</definedNames>");
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
    fn test_define_accumulates_addresses() {
        let mut reg = DefinedNameRegistry::new();
        reg.define("threes", "'blort'!$A$3");
        reg.define("threes", "'blort'!$B$3");
        reg.define("threes", "'blort'!$B$3");
        assert_eq!(
            reg.resolve("threes").unwrap(),
            &["'blort'!$A$3".to_string(), "'blort'!$B$3".to_string()]
        );
    }

    #[test]
    fn test_name_of() {
        let mut reg = DefinedNameRegistry::new();
        reg.define("five", "'s'!$A$1");
        reg.define("greens", "'s'!$E$1");
        reg.define("greens", "'s'!$E$2");
        assert_eq!(reg.name_of("'s'!$E$2"), Some("greens"));
        assert_eq!(reg.name_of("'s'!$A$1"), Some("five"));
        assert_eq!(reg.name_of("'s'!$Z$9"), None);
    }

    #[test]
    fn test_first_definition_order() {
        let mut reg = DefinedNameRegistry::new();
        reg.define("b", "'s'!$B$1");
        reg.define("a", "'s'!$A$1");
        reg.define("b", "'s'!$B$2");
        let order: Vec<&str> = reg.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(order, ["b", "a"]);
    }

    #[test]
    fn test_write_xml() {
        let mut reg = DefinedNameRegistry::new();
        reg.define("threes", "'blort'!$A$3");
        reg.define("threes", "'blort'!$B$3");
        let mut out = String::new();
        reg.write_xml_into(&mut out);
        assert_eq!(
            out,
            r#"<definedNames><definedName name="threes">'blort'!$A$3,'blort'!$B$3</definedName></definedNames>"#
        );
    }

    #[test]
    fn test_write_xml_keeps_quoted_sheet_names_raw() {
        let mut reg = DefinedNameRegistry::new();
        reg.define("note", "'it''s data'!$A$1");
        let mut out = String::new();
        reg.write_xml_into(&mut out);
        assert!(out.contains("<definedName name=\"note\">'it''s data'!$A$1</definedName>"));
    }
}
