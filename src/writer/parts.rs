//! Fixed-structure package parts: content types, relationships, workbook.
//!
//! Relationship ids are positional: sheets take `rId1..rIdN` in sheet
//! order, styles and shared strings follow.

use crate::defined_names::DefinedNameRegistry;
use crate::xml::{xml_escape, XML_DECL, NS_MAIN, NS_REL};

use super::workbook::SheetMeta;

const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const CT_SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";

pub(super) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(super) const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub(super) const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub(super) const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

/// `[Content_Types].xml` enumerating every part in the package.
pub(super) fn content_types_xml(sheets: &[SheetMeta], has_shared_strings: bool) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(XML_DECL);
    out.push('\n');
    out.push_str(&format!(r#"<Types xmlns="{NS_CONTENT_TYPES}">"#));
    out.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    out.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    out.push_str(&format!(
        r#"<Override PartName="/xl/workbook.xml" ContentType="{CT_WORKBOOK}"/>"#
    ));
    for sheet in sheets {
        out.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="{CT_WORKSHEET}"/>"#,
            sheet.id
        ));
    }
    out.push_str(&format!(
        r#"<Override PartName="/xl/styles.xml" ContentType="{CT_STYLES}"/>"#
    ));
    if has_shared_strings {
        out.push_str(&format!(
            r#"<Override PartName="/xl/sharedStrings.xml" ContentType="{CT_SHARED_STRINGS}"/>"#
        ));
    }
    out.push_str("</Types>");
    out
}

/// `_rels/.rels` pointing at the workbook part.
pub(super) fn root_rels_xml() -> String {
    format!(
        "{XML_DECL}\n<Relationships xmlns=\"{NS_PKG_REL}\">\
         <Relationship Id=\"rId1\" Type=\"{REL_OFFICE_DOCUMENT}\" Target=\"xl/workbook.xml\"/>\
         </Relationships>"
    )
}

/// `xl/_rels/workbook.xml.rels` binding sheet rIds to their parts.
pub(super) fn workbook_rels_xml(sheets: &[SheetMeta], has_shared_strings: bool) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(XML_DECL);
    out.push('\n');
    out.push_str(&format!(r#"<Relationships xmlns="{NS_PKG_REL}">"#));
    for (i, sheet) in sheets.iter().enumerate() {
        out.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{REL_WORKSHEET}" Target="worksheets/sheet{}.xml"/>"#,
            i + 1,
            sheet.id
        ));
    }
    let mut next = sheets.len() + 1;
    out.push_str(&format!(
        r#"<Relationship Id="rId{next}" Type="{REL_STYLES}" Target="styles.xml"/>"#
    ));
    next += 1;
    if has_shared_strings {
        out.push_str(&format!(
            r#"<Relationship Id="rId{next}" Type="{REL_SHARED_STRINGS}" Target="sharedStrings.xml"/>"#
        ));
    }
    out.push_str("</Relationships>");
    out
}

/// `xl/workbook.xml`: sheet list in insertion order plus defined names.
pub(super) fn workbook_xml(sheets: &[SheetMeta], names: &DefinedNameRegistry) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(XML_DECL);
    out.push('\n');
    out.push_str(&format!(
        r#"<workbook xmlns="{NS_MAIN}" xmlns:r="{NS_REL}">"#
    ));
    out.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        out.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            xml_escape(&sheet.name),
            sheet.id,
            i + 1
        ));
    }
    out.push_str("</sheets>");
    names.write_xml_into(&mut out);
    out.push_str("</workbook>");
    out
}
