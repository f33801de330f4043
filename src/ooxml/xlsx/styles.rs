//! Styles part (`xl/styles.xml`).
//!
//! The stylesheet is carried verbatim; cells refer to it only through their opaque
//! style index. The one thing read out of it is the number of cell formats, so that
//! callers can be told when an index points past the end.
use crate::ooxml::common::xml::{attr_value, parse_i64, to_u32};
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::part::XmlPart;
use crate::ooxml::xlsx::template::DEFAULT_STYLES_XML;
use quick_xml::events::Event;

#[derive(Debug, Clone)]
pub struct Styles {
    part: XmlPart,
    cell_format_count: u32,
}

impl Styles {
    /// Load a stylesheet read from a package.
    pub fn load(xml: Vec<u8>) -> Result<Self> {
        let part = XmlPart::load(ct::SML_STYLES, xml)?;
        let cell_format_count = Self::count_cell_formats(&part)?;
        Ok(Self {
            part,
            cell_format_count,
        })
    }

    fn count_cell_formats(part: &XmlPart) -> Result<u32> {
        let mut reader = part.reader();
        let mut buf = Vec::new();
        let mut in_cell_xfs = false;
        let mut counted = 0u32;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => {
                    if let Some(count) = attr_value(&e, b"count")?.as_deref().and_then(parse_i64) {
                        return to_u32(count.max(0), "cellXfs count");
                    }
                    in_cell_xfs = true;
                },
                Event::Start(e) | Event::Empty(e) if in_cell_xfs && e.local_name().as_ref() == b"xf" => {
                    counted += 1;
                },
                Event::End(e) if e.local_name().as_ref() == b"cellXfs" => break,
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }
        Ok(counted)
    }

    /// Number of entries in `<cellXfs>`; valid style indices are below it.
    pub fn cell_format_count(&self) -> u32 {
        self.cell_format_count
    }

    pub fn part(&self) -> &XmlPart {
        &self.part
    }
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            part: XmlPart::new(ct::SML_STYLES, DEFAULT_STYLES_XML.as_bytes().to_vec()),
            cell_format_count: 1,
        }
    }
}
