//! The `[Content_Types].xml` registry.
//!
//! Defaults map a lower-cased file extension to a content type; overrides map a full
//! part name to one. An override wins over a default for the same part.
use crate::ooxml::common::xml::{XML_DECLARATION, escape_xml};
use crate::ooxml::opc::constants::{content_type as ct, namespace};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeMap;

/// Content type registry of one package.
///
/// Both tables are ordered maps so serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypes {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    /// Registry holding the two defaults every package needs (`rels` and `xml`).
    pub fn new() -> Self {
        let mut types = Self::empty();
        types.add_default("rels", ct::OPC_RELATIONSHIPS);
        types.add_default("xml", ct::XML);
        types
    }

    fn empty() -> Self {
        Self {
            defaults: BTreeMap::new(),
            overrides: BTreeMap::new(),
        }
    }

    /// Parse `[Content_Types].xml` exactly as found, without adding defaults.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut types = Self::empty();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut saw_root = false;
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                    b"Types" => saw_root = true,
                    b"Default" => {
                        let mut extension = None;
                        let mut content_type = None;
                        for attr in e.attributes() {
                            let attr = attr?;
                            match attr.key.as_ref() {
                                b"Extension" => extension = Some(attr.unescape_value()?.into_owned()),
                                b"ContentType" => {
                                    content_type = Some(attr.unescape_value()?.into_owned())
                                },
                                _ => {},
                            }
                        }
                        if let (Some(ext), Some(ct)) = (extension, content_type) {
                            types.add_default(&ext, &ct);
                        }
                    },
                    b"Override" => {
                        let mut partname = None;
                        let mut content_type = None;
                        for attr in e.attributes() {
                            let attr = attr?;
                            match attr.key.as_ref() {
                                b"PartName" => partname = Some(attr.unescape_value()?.into_owned()),
                                b"ContentType" => {
                                    content_type = Some(attr.unescape_value()?.into_owned())
                                },
                                _ => {},
                            }
                        }
                        if let (Some(pn), Some(ct)) = (partname, content_type) {
                            types.add_override(&pn, &ct);
                        }
                    },
                    _ => {},
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OpcError::XmlError(format!(
                        "Content types parse error: {}",
                        e
                    )));
                },
                _ => {},
            }
            buf.clear();
        }

        if !saw_root {
            return Err(OpcError::XmlError(
                "Content types part has no <Types> root".to_string(),
            ));
        }
        Ok(types)
    }

    /// Register a default for an extension. Re-adding the same pair is a no-op.
    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .insert(extension.trim_start_matches('.').to_lowercase(), content_type.to_string());
    }

    /// Register an override for a part name. Re-adding the same pair is a no-op.
    pub fn add_override(&mut self, partname: &str, content_type: &str) {
        let key = if partname.starts_with('/') {
            partname.to_string()
        } else {
            format!("/{}", partname)
        };
        self.overrides.insert(key, content_type.to_string());
    }

    /// Drop every override. Defaults stay.
    pub fn clear_overrides(&mut self) {
        self.overrides.clear();
    }

    /// Declared content type of a part: its override, else the default for its extension.
    pub fn content_type_for(&self, partname: &PackURI) -> Option<&str> {
        self.overrides
            .get(partname.as_str())
            .or_else(|| self.defaults.get(&partname.ext().to_lowercase()))
            .map(String::as_str)
    }

    /// Whether `partname` is covered by an override or a default.
    pub fn covers(&self, partname: &PackURI) -> bool {
        self.content_type_for(partname).is_some()
    }

    pub fn defaults(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defaults.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        self.overrides.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize as `[Content_Types].xml`.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(512 + self.overrides.len() * 160);
        xml.push_str(XML_DECLARATION);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns=""#);
        xml.push_str(namespace::OPC_CONTENT_TYPES);
        xml.push_str(r#"">"#);

        for (ext, content_type) in &self.defaults {
            xml.push_str(r#"<Default Extension=""#);
            xml.push_str(&escape_xml(ext));
            xml.push_str(r#"" ContentType=""#);
            xml.push_str(&escape_xml(content_type));
            xml.push_str(r#""/>"#);
        }
        for (partname, content_type) in &self.overrides {
            xml.push_str(r#"<Override PartName=""#);
            xml.push_str(&escape_xml(partname));
            xml.push_str(r#"" ContentType=""#);
            xml.push_str(&escape_xml(content_type));
            xml.push_str(r#""/>"#);
        }

        xml.push_str("</Types>");
        xml
    }
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> PackURI {
        PackURI::new(s).unwrap()
    }

    #[test]
    fn test_from_xml() {
        let xml = br#"<?xml version="1.0"?>
            <Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
                <Default Extension="XML" ContentType="application/xml"/>
                <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
                <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
            </Types>"#;

        let types = ContentTypes::from_xml(xml).unwrap();
        assert_eq!(types.content_type_for(&uri("/xl/styles.xml")), Some(ct::XML));
        assert_eq!(
            types.content_type_for(&uri("/xl/workbook.xml")),
            Some(ct::SML_SHEET_MAIN)
        );
        assert!(!types.covers(&uri("/xl/media/image1.png")));
    }

    #[test]
    fn test_from_xml_rejects_non_types_document() {
        assert!(ContentTypes::from_xml(b"<Relationships/>").is_err());
        assert!(ContentTypes::from_xml(b"<Types><Default").is_err());
    }

    #[test]
    fn test_defaults_and_overrides() {
        let mut types = ContentTypes::new();
        types.add_default("PNG", ct::PNG);
        types.add_default("png", ct::PNG);
        types.add_override("/xl/worksheets/sheet1.xml", ct::SML_WORKSHEET);
        types.add_override("/xl/worksheets/sheet1.xml", ct::SML_WORKSHEET);

        assert_eq!(types.defaults().count(), 3);
        assert_eq!(types.overrides().count(), 1);
        assert_eq!(types.content_type_for(&uri("/xl/media/image1.PNG")), Some(ct::PNG));

        types.clear_overrides();
        assert_eq!(types.overrides().count(), 0);
        assert_eq!(
            types.content_type_for(&uri("/xl/worksheets/sheet1.xml")),
            Some(ct::XML)
        );
    }

    #[test]
    fn test_to_xml_round_trip() {
        let mut types = ContentTypes::new();
        types.add_default("jpeg", ct::JPEG);
        types.add_override("/xl/workbook.xml", ct::SML_SHEET_MAIN);
        let xml = types.to_xml();
        assert!(xml.contains(r#"<Default Extension="jpeg" ContentType="image/jpeg"/>"#));
        assert_eq!(ContentTypes::from_xml(xml.as_bytes()).unwrap(), types);
    }
}
