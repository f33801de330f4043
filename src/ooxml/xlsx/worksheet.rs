//! Worksheet parts (`xl/worksheets/sheet{N}.xml`).
//!
//! A worksheet holds its cells, an optional drawing and its embedded objects. Parsing
//! returns the relationship ids the sheet refers to; the package layer resolves them
//! against the sheet's `.rels` part. Serializing takes freshly minted ids back.
use crate::ooxml::common::xml::{XML_DECLARATION, attr_value, escape_xml, parse_i64, to_u32, u32_attr};
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::xlsx::cell::{Cell, CellValue, MAX_COLUMNS, MAX_ROWS, coords_to_reference, reference_to_coords};
use crate::ooxml::xlsx::drawing::DrawingId;
use crate::ooxml::xlsx::ole::OleObject;
use crate::ooxml::xlsx::shared_strings::SharedStrings;
use log::warn;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    /// Keyed by 1-based (row, column), so iteration is row-major.
    cells: BTreeMap<(u32, u32), Cell>,
    drawing: Option<DrawingId>,
    ole_objects: Vec<OleObject>,
}

/// An `<oleObject>` element as read, before its relationship is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OleReference {
    pub r_id: String,
    pub prog_id: String,
    pub shape_id: u32,
}

/// Relationship ids a worksheet refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct WorksheetRefs {
    pub drawing: Option<String>,
    pub ole_objects: Vec<OleReference>,
}

/// Which part of a `<c>` element text belongs to.
#[derive(Clone, Copy, PartialEq, Eq)]
enum CellText {
    Value,
    Formula,
    Inline,
}

impl Worksheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a worksheet, resolving `t="s"` cells through `strings`.
    pub(crate) fn from_xml(xml: &[u8], strings: &SharedStrings) -> Result<(Self, WorksheetRefs)> {
        let mut sheet = Self::new();
        let mut refs = WorksheetRefs::default();

        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        let mut skip_buf = Vec::new();

        let mut row = 0u32;
        let mut next_col = 1u32;
        let mut cell: Option<(u32, u32, Option<String>, Option<u32>)> = None;
        let mut target: Option<CellText> = None;
        let mut value = String::new();
        let mut formula = String::new();
        let mut inline = String::new();
        let mut has_value = false;
        let mut has_formula = false;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                    row = match attr_value(&e, b"r")?.as_deref().and_then(parse_i64) {
                        Some(r) if r > 0 => to_u32(r, "row")?,
                        _ => row + 1,
                    };
                    next_col = 1;
                },
                Event::Start(e) if e.local_name().as_ref() == b"c" => {
                    let (r, c) = attr_value(&e, b"r")?
                        .as_deref()
                        .and_then(reference_to_coords)
                        .unwrap_or((row.max(1), next_col));
                    let style = u32_attr(&e, b"s")?;
                    cell = Some((r, c, attr_value(&e, b"t")?, style));
                    value.clear();
                    formula.clear();
                    inline.clear();
                    has_value = false;
                    has_formula = false;
                },
                Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                    if let Some((_, c)) = attr_value(&e, b"r")?.as_deref().and_then(reference_to_coords) {
                        next_col = c + 1;
                    } else {
                        next_col += 1;
                    }
                },
                Event::Start(e) if cell.is_some() => match e.local_name().as_ref() {
                    b"v" => {
                        target = Some(CellText::Value);
                        has_value = true;
                    },
                    b"f" => {
                        target = Some(CellText::Formula);
                        has_formula = true;
                    },
                    b"t" => target = Some(CellText::Inline),
                    b"rPh" => {
                        reader.read_to_end_into(e.name(), &mut skip_buf)?;
                    },
                    _ => {},
                },
                Event::Text(t) => {
                    let text = t.unescape()?;
                    match target {
                        Some(CellText::Value) => value.push_str(&text),
                        Some(CellText::Formula) => formula.push_str(&text),
                        Some(CellText::Inline) => inline.push_str(&text),
                        None => {},
                    }
                },
                Event::End(e) => match e.local_name().as_ref() {
                    b"v" | b"f" | b"t" => target = None,
                    b"c" => {
                        if let Some((r, c, kind, style)) = cell.take() {
                            let base = if has_value || kind.as_deref() == Some("inlineStr") {
                                decode_value(kind.as_deref(), &value, &inline, strings)
                            } else {
                                None
                            };
                            let parsed = if has_formula && !formula.is_empty() {
                                Some(CellValue::Formula {
                                    formula: formula.clone(),
                                    cached: base.map(Box::new),
                                })
                            } else {
                                base
                            };
                            if let Some(v) = parsed {
                                sheet.cells.insert((r, c), Cell { value: v, style });
                            }
                            next_col = c + 1;
                        }
                    },
                    _ => {},
                },
                Event::Start(e) if e.local_name().as_ref() == b"Fallback" => {
                    reader.read_to_end_into(e.name(), &mut skip_buf)?;
                },
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"drawing" => refs.drawing = attr_value(&e, b"id")?,
                    b"oleObject" => {
                        if let Some(r_id) = attr_value(&e, b"id")? {
                            refs.ole_objects.push(OleReference {
                                r_id,
                                prog_id: attr_value(&e, b"progId")?.unwrap_or_default(),
                                shape_id: u32_attr(&e, b"shapeId")?.unwrap_or(0),
                            });
                        }
                    },
                    _ => {},
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        Ok((sheet, refs))
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cell(row, col).map(|c| &c.value)
    }

    /// Store a cell at 1-based (row, column).
    pub fn set_cell(&mut self, row: u32, col: u32, cell: Cell) -> Result<()> {
        if row == 0 || col == 0 || row > MAX_ROWS || col > MAX_COLUMNS {
            return Err(OpcError::XmlError(format!(
                "cell ({}, {}) is outside the sheet",
                row, col
            )));
        }
        self.cells.insert((row, col), cell);
        Ok(())
    }

    pub fn set_value<V: Into<CellValue>>(&mut self, row: u32, col: u32, value: V) -> Result<()> {
        let style = self.cell(row, col).and_then(|c| c.style);
        self.set_cell(
            row,
            col,
            Cell {
                value: value.into(),
                style,
            },
        )
    }

    pub fn remove_cell(&mut self, row: u32, col: u32) -> Option<Cell> {
        self.cells.remove(&(row, col))
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = ((u32, u32), &Cell)> {
        self.cells.iter().map(|(k, v)| (*k, v))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Used range as (first row, first column, last row, last column).
    pub fn dimension(&self) -> Option<(u32, u32, u32, u32)> {
        let (first_row, last_row) = (self.cells.keys().next()?.0, self.cells.keys().next_back()?.0);
        let first_col = self.cells.keys().map(|k| k.1).min()?;
        let last_col = self.cells.keys().map(|k| k.1).max()?;
        Some((first_row, first_col, last_row, last_col))
    }

    pub fn drawing(&self) -> Option<DrawingId> {
        self.drawing
    }

    pub(crate) fn set_drawing(&mut self, drawing: Option<DrawingId>) {
        self.drawing = drawing;
    }

    pub fn ole_objects(&self) -> &[OleObject] {
        &self.ole_objects
    }

    pub(crate) fn ole_objects_mut(&mut self) -> &mut Vec<OleObject> {
        &mut self.ole_objects
    }

    /// Copy of the cell data only; drawings and embedded objects stay with the original.
    pub(crate) fn copy_cells(&self) -> Self {
        Self {
            cells: self.cells.clone(),
            drawing: None,
            ole_objects: Vec::new(),
        }
    }

    /// Number of cells written through the shared string table.
    pub fn shared_string_count(&self) -> usize {
        self.cells
            .values()
            .filter(|c| matches!(c.value, CellValue::String(_)))
            .count()
    }

    /// Serialize the worksheet. `drawing_rid` and `ole_rids` (one per embedded object,
    /// in order) are the ids minted in the sheet's relationship graph.
    pub(crate) fn to_xml(
        &self,
        strings: &mut SharedStrings,
        drawing_rid: Option<&str>,
        ole_rids: &[String],
        tab_selected: bool,
    ) -> Result<String> {
        let mut xml = String::with_capacity(1024 + self.cells.len() * 48);
        xml.push_str(XML_DECLARATION);
        xml.push('\n');
        write!(
            xml,
            r#"<worksheet xmlns="{}" xmlns:r="{}">"#,
            namespace::SML_MAIN,
            namespace::OFC_RELATIONSHIPS
        )
        .map_err(|e| OpcError::XmlError(format!("XML write error: {}", e)))?;

        match self.dimension() {
            Some((r1, c1, r2, c2)) if (r1, c1) != (r2, c2) => write!(
                xml,
                r#"<dimension ref="{}:{}"/>"#,
                coords_to_reference(r1, c1),
                coords_to_reference(r2, c2)
            )
            .map_err(|e| OpcError::XmlError(format!("XML write error: {}", e)))?,
            Some((r1, c1, _, _)) => write!(xml, r#"<dimension ref="{}"/>"#, coords_to_reference(r1, c1))
                .map_err(|e| OpcError::XmlError(format!("XML write error: {}", e)))?,
            None => xml.push_str(r#"<dimension ref="A1"/>"#),
        }

        xml.push_str("<sheetViews><sheetView workbookViewId=\"0\"");
        if tab_selected {
            xml.push_str(" tabSelected=\"1\"");
        }
        xml.push_str("/></sheetViews>");
        xml.push_str("<sheetFormatPr defaultRowHeight=\"15\"/>");

        xml.push_str("<sheetData>");
        let mut current_row = None;
        for (&(row, col), cell) in &self.cells {
            if current_row != Some(row) {
                if current_row.is_some() {
                    xml.push_str("</row>");
                }
                write!(xml, r#"<row r="{}">"#, row)
                    .map_err(|e| OpcError::XmlError(format!("XML write error: {}", e)))?;
                current_row = Some(row);
            }
            write_cell(&mut xml, &coords_to_reference(row, col), cell, strings)?;
        }
        if current_row.is_some() {
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData>");

        if let Some(r_id) = drawing_rid {
            write!(xml, r#"<drawing r:id="{}"/>"#, r_id)
                .map_err(|e| OpcError::XmlError(format!("XML write error: {}", e)))?;
        }

        if !self.ole_objects.is_empty() {
            xml.push_str("<oleObjects>");
            for (object, r_id) in self.ole_objects.iter().zip(ole_rids) {
                write!(
                    xml,
                    r#"<oleObject progId="{}" shapeId="{}" r:id="{}"/>"#,
                    escape_xml(object.prog_id()),
                    object.shape_id(),
                    r_id
                )
                .map_err(|e| OpcError::XmlError(format!("XML write error: {}", e)))?;
            }
            xml.push_str("</oleObjects>");
        }

        xml.push_str("</worksheet>");
        Ok(xml)
    }
}

/// Value of a `<c>` element from its type attribute and collected text.
fn decode_value(kind: Option<&str>, value: &str, inline: &str, strings: &SharedStrings) -> Option<CellValue> {
    match kind {
        Some("s") => {
            let index = parse_i64(value)?;
            match strings.get(index.max(0) as usize) {
                Some(s) => Some(CellValue::String(s.to_string())),
                None => {
                    warn!(index = index; "shared string index out of range");
                    Some(CellValue::String(String::new()))
                },
            }
        },
        Some("str") => Some(CellValue::String(value.to_string())),
        Some("inlineStr") => Some(CellValue::String(inline.to_string())),
        Some("b") => Some(CellValue::Bool(value.trim() == "1")),
        Some("e") => Some(CellValue::Error(value.to_string())),
        _ => value.trim().parse::<f64>().ok().map(CellValue::Number),
    }
}

fn write_cell(xml: &mut String, cell_ref: &str, cell: &Cell, strings: &mut SharedStrings) -> Result<()> {
    let style_attr = match cell.style {
        Some(s) => format!(r#" s="{}""#, s),
        None => String::new(),
    };

    let written = match &cell.value {
        CellValue::String(s) => {
            let index = strings.add(s);
            write!(xml, r#"<c r="{}"{} t="s"><v>{}</v></c>"#, cell_ref, style_attr, index)
        },
        CellValue::Number(n) if n.is_finite() => {
            write!(xml, r#"<c r="{}"{}><v>{}</v></c>"#, cell_ref, style_attr, n)
        },
        CellValue::Number(_) => {
            write!(xml, r#"<c r="{}"{} t="e"><v>#NUM!</v></c>"#, cell_ref, style_attr)
        },
        CellValue::Bool(b) => write!(
            xml,
            r#"<c r="{}"{} t="b"><v>{}</v></c>"#,
            cell_ref,
            style_attr,
            if *b { "1" } else { "0" }
        ),
        CellValue::Error(e) => write!(
            xml,
            r#"<c r="{}"{} t="e"><v>{}</v></c>"#,
            cell_ref,
            style_attr,
            escape_xml(e)
        ),
        CellValue::Formula { formula, cached } => {
            let (kind, cached_text) = match cached.as_deref() {
                Some(CellValue::String(s)) => (r#" t="str""#, Some(escape_xml(s))),
                Some(CellValue::Bool(b)) => (r#" t="b""#, Some(if *b { "1" } else { "0" }.to_string())),
                Some(CellValue::Error(e)) => (r#" t="e""#, Some(escape_xml(e))),
                Some(CellValue::Number(n)) if n.is_finite() => ("", Some(n.to_string())),
                _ => ("", None),
            };
            write!(
                xml,
                r#"<c r="{}"{}{}><f>{}</f>"#,
                cell_ref,
                style_attr,
                kind,
                escape_xml(formula)
            )
            .and_then(|_| match cached_text {
                Some(text) => write!(xml, "<v>{}</v></c>", text),
                None => write!(xml, "</c>"),
            })
        },
    };
    written.map_err(|e| OpcError::XmlError(format!("XML write error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_xml_value_kinds() {
        let mut strings = SharedStrings::new();
        strings.add("Region");
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" s="2"><v>12.5</v></c><c r="C1" t="b"><v>1</v></c></row>
    <row r="3"><c r="A3" t="e"><v>#DIV/0!</v></c><c r="B3"><f>SUM(B1:B2)</f><v>12.5</v></c>
      <c r="C3" t="str"><f>A1&amp;"x"</f><v>Regionx</v></c><c r="D3" t="inlineStr"><is><t>inline</t></is></c><c r="E3" s="4"/></row>
  </sheetData>
  <drawing r:id="rId1"/>
  <oleObjects>
    <mc:AlternateContent xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006">
      <mc:Choice Requires="x14"><oleObject progId="Package" shapeId="1025" r:id="rId2"><objectPr/></oleObject></mc:Choice>
      <mc:Fallback><oleObject progId="Package" shapeId="1025" r:id="rId2"/></mc:Fallback>
    </mc:AlternateContent>
  </oleObjects>
</worksheet>"#;

        let (sheet, refs) = Worksheet::from_xml(xml, &strings).unwrap();
        assert_eq!(sheet.value(1, 1), Some(&CellValue::String("Region".into())));
        assert_eq!(sheet.cell(1, 2).unwrap().style, Some(2));
        assert_eq!(sheet.value(1, 2), Some(&CellValue::Number(12.5)));
        assert_eq!(sheet.value(1, 3), Some(&CellValue::Bool(true)));
        assert_eq!(sheet.value(3, 1), Some(&CellValue::Error("#DIV/0!".into())));
        assert_eq!(
            sheet.value(3, 2),
            Some(&CellValue::Formula {
                formula: "SUM(B1:B2)".into(),
                cached: Some(Box::new(CellValue::Number(12.5))),
            })
        );
        assert_eq!(
            sheet.value(3, 3),
            Some(&CellValue::Formula {
                formula: "A1&\"x\"".into(),
                cached: Some(Box::new(CellValue::String("Regionx".into()))),
            })
        );
        assert_eq!(sheet.value(3, 4), Some(&CellValue::String("inline".into())));
        assert_eq!(sheet.cell(3, 5), None);
        assert_eq!(sheet.dimension(), Some((1, 1, 3, 4)));

        assert_eq!(refs.drawing.as_deref(), Some("rId1"));
        assert_eq!(
            refs.ole_objects,
            vec![OleReference {
                r_id: "rId2".into(),
                prog_id: "Package".into(),
                shape_id: 1025,
            }]
        );
    }

    #[test]
    fn test_cells_without_references() {
        let xml = br#"<worksheet><sheetData><row><c><v>1</v></c><c><v>2</v></c></row><row><c><v>3</v></c></row></sheetData></worksheet>"#;
        let (sheet, _) = Worksheet::from_xml(xml, &SharedStrings::new()).unwrap();
        assert_eq!(sheet.value(1, 2), Some(&CellValue::Number(2.0)));
        assert_eq!(sheet.value(2, 1), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn test_out_of_range_numbers_are_rejected() {
        let row = br#"<worksheet><sheetData><row r="4294967296"><c><v>1</v></c></row></sheetData></worksheet>"#;
        assert!(Worksheet::from_xml(row, &SharedStrings::new()).is_err());

        let style = br#"<worksheet><sheetData><row r="1"><c r="A1" s="-1"><v>1</v></c></row></sheetData></worksheet>"#;
        assert!(Worksheet::from_xml(style, &SharedStrings::new()).is_err());
    }

    #[test]
    fn test_to_xml_round_trip() {
        let mut sheet = Worksheet::new();
        sheet.set_value(1, 1, "name").unwrap();
        sheet.set_value(1, 2, 3).unwrap();
        sheet.set_value(2, 1, true).unwrap();
        sheet
            .set_cell(
                2,
                2,
                Cell {
                    value: CellValue::Formula {
                        formula: "B1*2".into(),
                        cached: Some(Box::new(CellValue::Number(6.0))),
                    },
                    style: Some(1),
                },
            )
            .unwrap();
        sheet.set_value(3, 3, "name").unwrap();

        let mut strings = SharedStrings::new();
        let xml = sheet.to_xml(&mut strings, Some("rId1"), &[], true).unwrap();
        assert!(xml.contains(r#"<dimension ref="A1:C3"/>"#));
        assert!(xml.contains(r#"tabSelected="1""#));
        assert!(xml.contains(r#"<c r="B1"><v>3</v></c>"#));
        assert!(xml.contains(r#"<drawing r:id="rId1"/>"#));
        assert_eq!(strings.len(), 1);
        assert_eq!(sheet.shared_string_count(), 2);

        let (reparsed, refs) = Worksheet::from_xml(xml.as_bytes(), &strings).unwrap();
        assert_eq!(reparsed.cells, sheet.cells);
        assert_eq!(refs.drawing.as_deref(), Some("rId1"));
    }

    #[test]
    fn test_set_cell_bounds() {
        let mut sheet = Worksheet::new();
        assert!(sheet.set_value(0, 1, 1).is_err());
        assert!(sheet.set_value(1, MAX_COLUMNS + 1, 1).is_err());
        assert!(sheet.set_value(MAX_ROWS, MAX_COLUMNS, 1).is_ok());
    }

    #[test]
    fn test_ole_objects_written_with_ids() {
        let mut sheet = Worksheet::new();
        sheet
            .ole_objects_mut()
            .push(OleObject::new("oleObject1.bin", "Package", vec![1], None).with_shape_id(1025));
        let xml = sheet
            .to_xml(&mut SharedStrings::new(), None, &["rId3".to_string()], false)
            .unwrap();
        assert!(xml.contains(r#"<oleObjects><oleObject progId="Package" shapeId="1025" r:id="rId3"/></oleObjects>"#));
        assert!(!xml.contains("<drawing"));
    }
}
