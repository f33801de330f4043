//! Chart sheets (`xl/chartsheets/sheet{N}.xml`): a sheet whose only content is a
//! drawing holding one chart.
use crate::ooxml::common::xml::{XML_DECLARATION, attr_value};
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::error::Result;
use crate::ooxml::xlsx::drawing::DrawingId;
use quick_xml::Reader;
use quick_xml::events::Event;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chartsheet {
    drawing: Option<DrawingId>,
}

impl Chartsheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a chart sheet, returning the relationship id of its drawing.
    pub(crate) fn from_xml(xml: &[u8]) -> Result<(Self, Option<String>)> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        let mut drawing_rid = None;
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"drawing" => {
                    drawing_rid = attr_value(&e, b"id")?;
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }
        Ok((Self::new(), drawing_rid))
    }

    pub fn drawing(&self) -> Option<DrawingId> {
        self.drawing
    }

    pub(crate) fn set_drawing(&mut self, drawing: Option<DrawingId>) {
        self.drawing = drawing;
    }

    pub(crate) fn to_xml(&self, drawing_rid: Option<&str>, tab_selected: bool) -> String {
        let mut xml = String::with_capacity(512);
        xml.push_str(XML_DECLARATION);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<chartsheet xmlns="{}" xmlns:r="{}">"#,
            namespace::SML_MAIN,
            namespace::OFC_RELATIONSHIPS
        ));
        xml.push_str("<sheetPr/><sheetViews><sheetView");
        if tab_selected {
            xml.push_str(r#" tabSelected="1""#);
        }
        xml.push_str(r#" zoomToFit="1" workbookViewId="0"/></sheetViews>"#);
        if let Some(r_id) = drawing_rid {
            xml.push_str(&format!(r#"<drawing r:id="{}"/>"#, r_id));
        }
        xml.push_str("</chartsheet>");
        xml
    }
}
