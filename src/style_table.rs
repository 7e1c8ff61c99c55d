//! Workbook-level style deduplication.
//!
//! Canonicalizes style descriptors into the component tables a real
//! `styles.xml` is built from (fonts, fills, borders, numFmts, cellXfs).
//! Components are keyed by their serialized XML fragment, so structural
//! equality of descriptors, not identity, decides whether an index is
//! reused. Indices are append-only and stable for the table's lifetime.

use std::collections::HashMap;

use crate::error::{Result, SheetpackError};
use crate::types::{Alignment, Border, BorderSide, Fill, Font, PatternType, Style};
use crate::xml::{xml_escape, XML_DECL, NS_MAIN};

/// First numFmtId available for custom format codes (ids below 164 are
/// reserved for builtins).
pub const FIRST_CUSTOM_NUM_FMT: u32 = 164;

/// One `cellXfs` record: component ids plus apply flags.
#[derive(Debug, Clone)]
struct Xf {
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    num_fmt_id: u32,
    alignment: Option<Alignment>,
}

/// Deduplicating style table. Entry 0 is always the default (empty) style.
#[derive(Debug)]
pub struct StyleTable {
    enabled: bool,
    entries: Vec<Style>,
    xfs: Vec<Xf>,
    index_by_key: HashMap<String, u32>,
    fonts: Vec<String>,
    font_index: HashMap<String, u32>,
    fills: Vec<String>,
    fill_index: HashMap<String, u32>,
    borders: Vec<String>,
    border_index: HashMap<String, u32>,
    num_fmts: Vec<String>,
    num_fmt_index: HashMap<String, u32>,
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new(true)
    }
}

impl StyleTable {
    /// A disabled table (the `useStyles: false` mode) registers nothing and
    /// always reports the default index.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        let default_font = font_xml(&Font {
            name: Some("Calibri".to_string()),
            size: Some(11.0),
            ..Font::default()
        });
        let none_fill = fill_xml(&Fill {
            pattern: PatternType::None,
            fg_color: None,
            bg_color: None,
        });
        // Excel always reserves fill 1 for the gray125 pattern.
        let gray_fill = fill_xml(&Fill {
            pattern: PatternType::Gray125,
            fg_color: None,
            bg_color: None,
        });
        let empty_border = border_xml(&Border::default());

        let mut table = Self {
            enabled,
            entries: vec![Style::default()],
            xfs: vec![Xf {
                font_id: 0,
                fill_id: 0,
                border_id: 0,
                num_fmt_id: 0,
                alignment: None,
            }],
            index_by_key: HashMap::new(),
            fonts: vec![default_font.clone()],
            font_index: HashMap::from([(default_font, 0)]),
            fills: vec![none_fill.clone(), gray_fill.clone()],
            fill_index: HashMap::from([(none_fill, 0), (gray_fill, 1)]),
            borders: vec![empty_border.clone()],
            border_index: HashMap::from([(empty_border, 0)]),
            num_fmts: Vec::new(),
            num_fmt_index: HashMap::new(),
        };
        table.index_by_key.insert(style_key(&Style::default()), 0);
        table
    }

    /// Whether style registration is active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of registered entries (including the default entry 0).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        // Entry 0 always exists.
        false
    }

    /// Canonicalize a descriptor, returning its stable index.
    ///
    /// Registering content-equal descriptors in any order always yields the
    /// same index; new content appends.
    pub fn register(&mut self, style: &Style) -> u32 {
        if !self.enabled || style.is_default() {
            return 0;
        }
        let key = style_key(style);
        if let Some(&idx) = self.index_by_key.get(&key) {
            return idx;
        }

        let font_id = style
            .font
            .as_ref()
            .map_or(0, |f| intern(&mut self.fonts, &mut self.font_index, font_xml(f)));
        let fill_id = style
            .fill
            .as_ref()
            .map_or(0, |f| intern(&mut self.fills, &mut self.fill_index, fill_xml(f)));
        let border_id = style.border.as_ref().map_or(0, |b| {
            intern(&mut self.borders, &mut self.border_index, border_xml(b))
        });
        let num_fmt_id = style.num_fmt.as_ref().map_or(0, |code| {
            FIRST_CUSTOM_NUM_FMT
                + intern(&mut self.num_fmts, &mut self.num_fmt_index, code.clone())
        });

        #[allow(clippy::cast_possible_truncation)] // table stays far below u32::MAX entries
        let idx = self.entries.len() as u32;
        self.entries.push(style.clone());
        self.xfs.push(Xf {
            font_id,
            fill_id,
            border_id,
            num_fmt_id,
            alignment: style.alignment.clone(),
        });
        self.index_by_key.insert(key, idx);
        idx
    }

    /// Inverse lookup of a registered index.
    pub fn resolve(&self, index: u32) -> Result<&Style> {
        self.entries
            .get(index as usize)
            .ok_or(SheetpackError::UnknownStyleIndex(index))
    }

    /// Serialize the table as the `xl/styles.xml` part.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::indexing_slicing)] // entries and xfs grow in lockstep
    pub fn write_xml(&self) -> String {
        let mut out = String::with_capacity(1024);
        out.push_str(XML_DECL);
        out.push('\n');
        out.push_str(&format!(r#"<styleSheet xmlns="{NS_MAIN}">"#));

        if !self.num_fmts.is_empty() {
            out.push_str(&format!(r#"<numFmts count="{}">"#, self.num_fmts.len()));
            for (i, code) in self.num_fmts.iter().enumerate() {
                out.push_str(&format!(
                    r#"<numFmt numFmtId="{}" formatCode="{}"/>"#,
                    FIRST_CUSTOM_NUM_FMT + i as u32,
                    xml_escape(code)
                ));
            }
            out.push_str("</numFmts>");
        }

        out.push_str(&format!(r#"<fonts count="{}">"#, self.fonts.len()));
        for f in &self.fonts {
            out.push_str(f);
        }
        out.push_str("</fonts>");

        out.push_str(&format!(r#"<fills count="{}">"#, self.fills.len()));
        for f in &self.fills {
            out.push_str(f);
        }
        out.push_str("</fills>");

        out.push_str(&format!(r#"<borders count="{}">"#, self.borders.len()));
        for b in &self.borders {
            out.push_str(b);
        }
        out.push_str("</borders>");

        out.push_str(
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
        );

        out.push_str(&format!(r#"<cellXfs count="{}">"#, self.xfs.len()));
        for (i, xf) in self.xfs.iter().enumerate() {
            let style = &self.entries[i];
            out.push_str(&format!(
                r#"<xf numFmtId="{}" fontId="{}" fillId="{}" borderId="{}" xfId="0""#,
                xf.num_fmt_id, xf.font_id, xf.fill_id, xf.border_id
            ));
            // Apply flags record which components the descriptor actually
            // carried, so a font-less entry does not pick up font 0 on read.
            out.push_str(&format!(
                r#" applyNumberFormat="{}" applyFont="{}" applyFill="{}" applyBorder="{}" applyAlignment="{}""#,
                u8::from(style.num_fmt.is_some()),
                u8::from(style.font.is_some()),
                u8::from(style.fill.is_some()),
                u8::from(style.border.is_some()),
                u8::from(style.alignment.is_some()),
            ));
            match &xf.alignment {
                Some(a) => {
                    out.push('>');
                    out.push_str(&alignment_xml(a));
                    out.push_str("</xf>");
                }
                None => out.push_str("/>"),
            }
        }
        out.push_str("</cellXfs>");

        out.push_str(
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
        );
        out.push_str("</styleSheet>");
        out
    }
}

#[allow(clippy::cast_possible_truncation)]
fn intern(frags: &mut Vec<String>, index: &mut HashMap<String, u32>, frag: String) -> u32 {
    if let Some(&i) = index.get(&frag) {
        return i;
    }
    let i = frags.len() as u32;
    frags.push(frag.clone());
    index.insert(frag, i);
    i
}

/// Canonical identity key for a full descriptor. Absent components are
/// marked so that "no font" and "the default font" stay distinct entries.
fn style_key(style: &Style) -> String {
    let mut key = String::with_capacity(128);
    match &style.font {
        Some(f) => key.push_str(&font_xml(f)),
        None => key.push('-'),
    }
    key.push('|');
    match &style.fill {
        Some(f) => key.push_str(&fill_xml(f)),
        None => key.push('-'),
    }
    key.push('|');
    match &style.border {
        Some(b) => key.push_str(&border_xml(b)),
        None => key.push('-'),
    }
    key.push('|');
    match &style.alignment {
        Some(a) => key.push_str(&alignment_xml(a)),
        None => key.push('-'),
    }
    key.push('|');
    if let Some(code) = &style.num_fmt {
        key.push_str(code);
    }
    key
}

fn font_xml(font: &Font) -> String {
    let mut out = String::from("<font>");
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
        out.push_str(&format!(r#"<name val="{}"/>"#, xml_escape(name)));
    }
    out.push_str("</font>");
    out
}

fn fill_xml(fill: &Fill) -> String {
    let mut out = format!(
        r#"<fill><patternFill patternType="{}""#,
        fill.pattern.as_str()
    );
    if fill.fg_color.is_none() && fill.bg_color.is_none() {
        out.push_str("/></fill>");
        return out;
    }
    out.push('>');
    if let Some(fg) = &fill.fg_color {
        out.push_str(&format!(r#"<fgColor rgb="{}"/>"#, xml_escape(fg)));
    }
    if let Some(bg) = &fill.bg_color {
        out.push_str(&format!(r#"<bgColor rgb="{}"/>"#, xml_escape(bg)));
    }
    out.push_str("</patternFill></fill>");
    out
}

fn border_side_xml(tag: &str, side: Option<&BorderSide>) -> String {
    match side {
        None => format!("<{tag}/>"),
        Some(side) => {
            let mut out = format!(r#"<{tag} style="{}""#, side.style.as_str());
            match &side.color {
                Some(color) => {
                    out.push_str(&format!(
                        r#"><color rgb="{}"/></{tag}>"#,
                        xml_escape(color)
                    ));
                }
                None => out.push_str(&format!("></{tag}>")),
            }
            out
        }
    }
}

fn border_xml(border: &Border) -> String {
    let mut out = String::from("<border>");
    out.push_str(&border_side_xml("left", border.left.as_ref()));
    out.push_str(&border_side_xml("right", border.right.as_ref()));
    out.push_str(&border_side_xml("top", border.top.as_ref()));
    out.push_str(&border_side_xml("bottom", border.bottom.as_ref()));
    out.push_str("<diagonal/>");
    out.push_str("</border>");
    out
}

fn alignment_xml(a: &Alignment) -> String {
    let mut out = String::from("<alignment");
    if let Some(h) = a.horizontal {
        out.push_str(&format!(r#" horizontal="{}""#, h.as_str()));
    }
    if let Some(v) = a.vertical {
        out.push_str(&format!(r#" vertical="{}""#, v.as_str()));
    }
    if a.wrap_text {
        out.push_str(r#" wrapText="1""#);
    }
    if let Some(indent) = a.indent {
        out.push_str(&format!(r#" indent="{indent}""#));
    }
    out.push_str("/>");
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
    use crate::types::{HAlign, VAlign};

    fn red_bold() -> Style {
        Style {
            font: Some(Font {
                name: Some("Arial".to_string()),
                size: Some(12.0),
                color: Some("FFFF0000".to_string()),
                bold: true,
                ..Font::default()
            }),
            ..Style::default()
        }
    }

    #[test]
    fn test_equal_content_same_index() {
        let mut table = StyleTable::default();
        let a = table.register(&red_bold());
        let b = table.register(&red_bold());
        assert_eq!(a, b);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_distinct_content_distinct_index() {
        let mut table = StyleTable::default();
        let a = table.register(&red_bold());
        let mut other = red_bold();
        other.font.as_mut().unwrap().bold = false;
        let b = table.register(&other);
        assert_ne!(a, b);
    }

    #[test]
    fn test_register_order_independent() {
        let plain = Style {
            alignment: Some(Alignment {
                horizontal: Some(HAlign::Center),
                vertical: Some(VAlign::Center),
                ..Alignment::default()
            }),
            ..Style::default()
        };
        let mut t1 = StyleTable::default();
        let mut t2 = StyleTable::default();
        let i1 = (t1.register(&red_bold()), t1.register(&plain));
        let i2 = (t2.register(&red_bold()), t2.register(&plain));
        assert_eq!(i1, i2);
        // Re-register in the other order: indices stay put.
        assert_eq!(t1.register(&plain), i1.1);
        assert_eq!(t1.register(&red_bold()), i1.0);
    }

    #[test]
    fn test_default_style_is_index_zero() {
        let mut table = StyleTable::default();
        assert_eq!(table.register(&Style::default()), 0);
        assert!(table.resolve(0).unwrap().is_default());
    }

    #[test]
    fn test_no_font_distinct_from_default_font() {
        let mut table = StyleTable::default();
        let with_default_font = Style {
            font: Some(Font {
                name: Some("Calibri".to_string()),
                size: Some(11.0),
                ..Font::default()
            }),
            ..Style::default()
        };
        let idx = table.register(&with_default_font);
        assert_ne!(idx, 0);
    }

    #[test]
    fn test_resolve_out_of_range() {
        let table = StyleTable::default();
        assert!(matches!(
            table.resolve(99),
            Err(crate::error::SheetpackError::UnknownStyleIndex(99))
        ));
    }

    #[test]
    fn test_disabled_table_registers_nothing() {
        let mut table = StyleTable::new(false);
        assert_eq!(table.register(&red_bold()), 0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_custom_num_fmt_ids_start_at_164() {
        let mut table = StyleTable::default();
        let style = Style {
            num_fmt: Some("0.00%".to_string()),
            ..Style::default()
        };
        table.register(&style);
        let xml = table.write_xml();
        assert!(xml.contains(r#"<numFmt numFmtId="164" formatCode="0.00%"/>"#));
    }
}
