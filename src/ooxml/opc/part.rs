/// Opaque package parts.
///
/// Parts whose inner structure the package engine does not model (styles, theme,
/// chart bodies, external links, media, embedded objects) are carried as payloads that
/// only know their content type and how to turn themselves into bytes. Where a part
/// lives in the archive is decided by the writer at save time, not by the part.
use crate::ooxml::opc::error::{OpcError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// A part the package writer can serialize.
pub trait Part {
    /// Content type declared for this part.
    fn content_type(&self) -> &str;

    /// Serialized content.
    fn blob(&self) -> &[u8];
}

/// Binary payload such as an image or an embedded OLE object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobPart {
    content_type: String,
    blob: Vec<u8>,
}

impl BlobPart {
    pub fn new<S: Into<String>>(content_type: S, blob: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            blob,
        }
    }

    pub fn set_content_type<S: Into<String>>(&mut self, content_type: S) {
        self.content_type = content_type.into();
    }

    pub fn len(&self) -> usize {
        self.blob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }
}

impl Part for BlobPart {
    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> &[u8] {
        &self.blob
    }
}

/// Well-formed XML payload kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlPart {
    content_type: String,
    xml_bytes: Vec<u8>,
}

impl XmlPart {
    /// Wrap XML produced by this crate. No validation.
    pub fn new<S: Into<String>>(content_type: S, xml_bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            xml_bytes,
        }
    }

    /// Wrap XML read from a package, rejecting input that is not UTF-8 or not well formed.
    pub fn load<S: Into<String>>(content_type: S, xml_bytes: Vec<u8>) -> Result<Self> {
        std::str::from_utf8(&xml_bytes)?;
        Self::check_well_formed(&xml_bytes)?;
        Ok(Self::new(content_type, xml_bytes))
    }

    /// Walk the whole document once; fails on syntax errors or a missing root element.
    fn check_well_formed(xml: &[u8]) -> Result<()> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().check_end_names = true;

        let mut buf = Vec::new();
        let mut depth = 0usize;
        let mut saw_root = false;
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(_) => {
                    depth += 1;
                    saw_root = true;
                },
                Event::End(_) => depth = depth.saturating_sub(1),
                Event::Empty(_) => saw_root = true,
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        if !saw_root || depth != 0 {
            return Err(OpcError::XmlError(
                "document has no complete root element".to_string(),
            ));
        }
        Ok(())
    }

    /// Reader over the payload.
    pub fn reader(&self) -> Reader<&[u8]> {
        let mut reader = Reader::from_reader(self.xml_bytes.as_slice());
        reader.config_mut().trim_text(true);
        reader
    }

    /// Payload as text. Loaded parts are validated as UTF-8; lossy for the rest.
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.xml_bytes)
    }
}

impl Part for XmlPart {
    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> &[u8] {
        &self.xml_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;

    #[test]
    fn test_xml_part_load_accepts_well_formed() {
        let part = XmlPart::load(ct::SML_STYLES, b"<styleSheet><fonts count=\"0\"/></styleSheet>".to_vec())
            .unwrap();
        assert_eq!(part.content_type(), ct::SML_STYLES);
        assert_eq!(part.blob(), b"<styleSheet><fonts count=\"0\"/></styleSheet>");
    }

    #[test]
    fn test_xml_part_load_rejects_malformed() {
        assert!(XmlPart::load(ct::SML_STYLES, b"<styleSheet><fonts>".to_vec()).is_err());
        assert!(XmlPart::load(ct::SML_STYLES, b"<a></b>".to_vec()).is_err());
        assert!(XmlPart::load(ct::SML_STYLES, b"   ".to_vec()).is_err());
        assert!(XmlPart::load(ct::SML_STYLES, vec![0x3c, 0xff, 0x3e]).is_err());
    }

    #[test]
    fn test_blob_part() {
        let mut part = BlobPart::new(ct::OCTET_STREAM, vec![1, 2, 3]);
        part.set_content_type(ct::PNG);
        assert_eq!(part.content_type(), ct::PNG);
        assert_eq!(part.len(), 3);
        assert!(!part.is_empty());
    }
}
