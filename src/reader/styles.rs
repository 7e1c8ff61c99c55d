//! Parsing of `xl/styles.xml` back into style descriptors.
//!
//! The component tables (fonts, fills, borders, numFmts) are read first,
//! then each `cellXfs` record is resolved into a full descriptor. The apply
//! flags decide which components a record actually carries, so an entry
//! that never set a font does not inherit font 0.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Result, SheetpackError};
use crate::types::{
    Alignment, Border, BorderSide, BorderStyle, Fill, Font, HAlign, PatternType, Style,
    UnderlineStyle, VAlign,
};
use crate::xml::{attr_bool, attr_string, attr_u32, attr_val};

/// Format codes for the builtin numFmt ids our writer's inverse can meet.
fn builtin_num_fmt(id: u32) -> Option<&'static str> {
    Some(match id {
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        49 => "@",
        _ => return None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

#[derive(Debug, Default)]
struct XfRecord {
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    num_fmt_id: u32,
    apply_font: bool,
    apply_fill: bool,
    apply_border: bool,
    apply_num_fmt: bool,
    apply_alignment: bool,
    alignment: Option<Alignment>,
}

fn corrupt(what: &str, id: u32) -> SheetpackError {
    SheetpackError::CorruptArchive(format!("styles.xml references unknown {what} {id}"))
}

/// Parse the styles part into the table of cell style descriptors, indexed
/// by `cellXfs` position.
pub(super) fn parse_styles(xml: &str) -> Result<Vec<Style>> {
    let mut reader = Reader::from_str(xml);

    let mut section = Section::None;
    let mut num_fmts: Vec<(u32, String)> = Vec::new();
    let mut fonts: Vec<Font> = Vec::new();
    let mut fills: Vec<Fill> = Vec::new();
    let mut borders: Vec<Border> = Vec::new();
    let mut xfs: Vec<XfRecord> = Vec::new();

    let mut font: Option<Font> = None;
    let mut fill: Option<Fill> = None;
    let mut border: Option<Border> = None;
    // Which border side the next <color> child belongs to.
    let mut border_side: Option<&'static str> = None;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let empty = matches!(&event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"numFmts" => section = Section::NumFmts,
                    b"fonts" => section = Section::Fonts,
                    b"fills" => section = Section::Fills,
                    b"borders" => section = Section::Borders,
                    b"cellXfs" => section = Section::CellXfs,
                    b"numFmt" if section == Section::NumFmts => {
                        if let (Some(id), Some(code)) =
                            (attr_u32(e, b"numFmtId"), attr_string(e, b"formatCode"))
                        {
                            num_fmts.push((id, code));
                        }
                    }
                    b"font" if section == Section::Fonts => {
                        if empty {
                            fonts.push(Font::default());
                        } else {
                            font = Some(Font::default());
                        }
                    }
                    b"b" => {
                        if let Some(f) = font.as_mut() {
                            f.bold = true;
                        }
                    }
                    b"i" => {
                        if let Some(f) = font.as_mut() {
                            f.italic = true;
                        }
                    }
                    b"strike" => {
                        if let Some(f) = font.as_mut() {
                            f.strike = true;
                        }
                    }
                    b"u" => {
                        if let Some(f) = font.as_mut() {
                            let val = attr_val(e);
                            f.underline = UnderlineStyle::parse(val.as_deref().unwrap_or("single"));
                        }
                    }
                    b"sz" => {
                        if let Some(f) = font.as_mut() {
                            f.size = attr_val(e).and_then(|v| v.parse().ok());
                        }
                    }
                    b"name" => {
                        if let Some(f) = font.as_mut() {
                            f.name = attr_val(e);
                        }
                    }
                    b"color" => {
                        let rgb = attr_string(e, b"rgb");
                        if let Some(side) = border_side {
                            if let Some(b) = border.as_mut() {
                                set_border_color(b, side, rgb);
                            }
                        } else if let Some(f) = font.as_mut() {
                            f.color = rgb;
                        }
                    }
                    b"fill" if section == Section::Fills => {
                        let blank = Fill {
                            pattern: PatternType::None,
                            fg_color: None,
                            bg_color: None,
                        };
                        if empty {
                            fills.push(blank);
                        } else {
                            fill = Some(blank);
                        }
                    }
                    b"patternFill" => {
                        if let Some(f) = fill.as_mut() {
                            if let Some(p) =
                                attr_string(e, b"patternType").and_then(|p| PatternType::parse(&p))
                            {
                                f.pattern = p;
                            }
                        }
                    }
                    b"fgColor" => {
                        if let Some(f) = fill.as_mut() {
                            f.fg_color = attr_string(e, b"rgb");
                        }
                    }
                    b"bgColor" => {
                        if let Some(f) = fill.as_mut() {
                            f.bg_color = attr_string(e, b"rgb");
                        }
                    }
                    b"border" if section == Section::Borders => {
                        border = Some(Border::default());
                        border_side = None;
                        if empty {
                            borders.push(border.take().unwrap_or_default());
                        }
                    }
                    side @ (b"left" | b"right" | b"top" | b"bottom") if border.is_some() => {
                        let tag = match side {
                            b"left" => "left",
                            b"right" => "right",
                            b"top" => "top",
                            _ => "bottom",
                        };
                        if let Some(style) =
                            attr_string(e, b"style").and_then(|s| BorderStyle::parse(&s))
                        {
                            if let Some(b) = border.as_mut() {
                                set_border_side(b, tag, BorderSide { style, color: None });
                            }
                            border_side = if empty { None } else { Some(tag) };
                        }
                    }
                    b"xf" if section == Section::CellXfs => {
                        let mut xf = XfRecord {
                            font_id: attr_u32(e, b"fontId").unwrap_or(0),
                            fill_id: attr_u32(e, b"fillId").unwrap_or(0),
                            border_id: attr_u32(e, b"borderId").unwrap_or(0),
                            num_fmt_id: attr_u32(e, b"numFmtId").unwrap_or(0),
                            apply_font: attr_bool(e, b"applyFont").unwrap_or(false),
                            apply_fill: attr_bool(e, b"applyFill").unwrap_or(false),
                            apply_border: attr_bool(e, b"applyBorder").unwrap_or(false),
                            apply_num_fmt: attr_bool(e, b"applyNumberFormat").unwrap_or(false),
                            apply_alignment: attr_bool(e, b"applyAlignment").unwrap_or(false),
                            alignment: None,
                        };
                        // Files that omit apply flags mean the ids literally.
                        if attr_string(e, b"applyFont").is_none() {
                            xf.apply_font = xf.font_id != 0;
                            xf.apply_fill = xf.fill_id != 0;
                            xf.apply_border = xf.border_id != 0;
                            xf.apply_num_fmt = xf.num_fmt_id != 0;
                            xf.apply_alignment = true;
                        }
                        xfs.push(xf);
                    }
                    b"alignment" if section == Section::CellXfs => {
                        if let Some(xf) = xfs.last_mut() {
                            xf.alignment = Some(Alignment {
                                horizontal: attr_string(e, b"horizontal")
                                    .and_then(|h| HAlign::parse(&h)),
                                vertical: attr_string(e, b"vertical")
                                    .and_then(|v| VAlign::parse(&v)),
                                wrap_text: attr_bool(e, b"wrapText").unwrap_or(false),
                                indent: attr_u32(e, b"indent"),
                            });
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"font" => {
                    if let Some(f) = font.take() {
                        fonts.push(f);
                    }
                }
                b"fill" => {
                    if let Some(f) = fill.take() {
                        fills.push(f);
                    }
                }
                b"border" => {
                    if let Some(b) = border.take() {
                        borders.push(b);
                    }
                }
                b"left" | b"right" | b"top" | b"bottom" => border_side = None,
                b"numFmts" | b"fonts" | b"fills" | b"borders" | b"cellXfs" => {
                    section = Section::None;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let find_fmt = |id: u32| -> Option<String> {
        num_fmts
            .iter()
            .find(|(i, _)| *i == id)
            .map(|(_, code)| code.clone())
            .or_else(|| builtin_num_fmt(id).map(ToString::to_string))
    };

    let mut styles = Vec::with_capacity(xfs.len());
    for xf in &xfs {
        let style = Style {
            font: if xf.apply_font {
                Some(
                    fonts
                        .get(xf.font_id as usize)
                        .cloned()
                        .ok_or_else(|| corrupt("font", xf.font_id))?,
                )
            } else {
                None
            },
            fill: if xf.apply_fill {
                Some(
                    fills
                        .get(xf.fill_id as usize)
                        .cloned()
                        .ok_or_else(|| corrupt("fill", xf.fill_id))?,
                )
            } else {
                None
            },
            border: if xf.apply_border {
                Some(
                    borders
                        .get(xf.border_id as usize)
                        .cloned()
                        .ok_or_else(|| corrupt("border", xf.border_id))?,
                )
            } else {
                None
            },
            alignment: if xf.apply_alignment {
                xf.alignment.clone()
            } else {
                None
            },
            num_fmt: if xf.apply_num_fmt && xf.num_fmt_id != 0 {
                find_fmt(xf.num_fmt_id)
            } else {
                None
            },
        };
        styles.push(style);
    }
    Ok(styles)
}

fn set_border_side(border: &mut Border, tag: &str, side: BorderSide) {
    match tag {
        "left" => border.left = Some(side),
        "right" => border.right = Some(side),
        "top" => border.top = Some(side),
        _ => border.bottom = Some(side),
    }
}

fn set_border_color(border: &mut Border, tag: &str, color: Option<String>) {
    let slot = match tag {
        "left" => &mut border.left,
        "right" => &mut border.right,
        "top" => &mut border.top,
        _ => &mut border.bottom,
    };
    if let Some(side) = slot.as_mut() {
        side.color = color;
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
    use crate::style_table::StyleTable;

    fn roundtrip(styles: &[Style]) -> Vec<Style> {
        let mut table = StyleTable::default();
        for s in styles {
            table.register(s);
        }
        parse_styles(&table.write_xml()).unwrap()
    }

    #[test]
    fn test_default_entry_parses_empty() {
        let parsed = roundtrip(&[]);
        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].is_default());
    }

    #[test]
    fn test_font_roundtrip() {
        let style = Style {
            font: Some(Font {
                name: Some("Arial".to_string()),
                size: Some(12.0),
                color: Some("FFFF0000".to_string()),
                bold: true,
                italic: true,
                ..Font::default()
            }),
            ..Style::default()
        };
        let parsed = roundtrip(std::slice::from_ref(&style));
        assert_eq!(parsed[1], style);
    }

    #[test]
    fn test_fill_border_alignment_roundtrip() {
        let style = Style {
            fill: Some(Fill::solid("FF00FF00")),
            border: Some(Border::all(BorderStyle::Thin, "FF000000")),
            alignment: Some(Alignment {
                horizontal: Some(HAlign::Center),
                vertical: Some(VAlign::Top),
                wrap_text: true,
                indent: None,
            }),
            ..Style::default()
        };
        let parsed = roundtrip(std::slice::from_ref(&style));
        assert_eq!(parsed[1], style);
    }

    #[test]
    fn test_custom_num_fmt_roundtrip() {
        let style = Style {
            num_fmt: Some("0.00%".to_string()),
            ..Style::default()
        };
        let parsed = roundtrip(std::slice::from_ref(&style));
        assert_eq!(parsed[1], style);
    }

    #[test]
    fn test_absent_components_stay_absent() {
        let style = Style {
            font: Some(Font {
                bold: true,
                ..Font::default()
            }),
            ..Style::default()
        };
        let parsed = roundtrip(std::slice::from_ref(&style));
        assert!(parsed[1].fill.is_none());
        assert!(parsed[1].border.is_none());
        assert!(parsed[1].num_fmt.is_none());
    }

    #[test]
    fn test_dangling_component_id_is_corrupt() {
        let xml = r#"<?xml version="1.0"?><styleSheet>
            <fonts count="1"><font/></fonts>
            <cellXfs count="1"><xf numFmtId="0" fontId="7" fillId="0" borderId="0" applyFont="1"/></cellXfs>
        </styleSheet>"#;
        assert!(matches!(
            parse_styles(xml),
            Err(SheetpackError::CorruptArchive(_))
        ));
    }
}
