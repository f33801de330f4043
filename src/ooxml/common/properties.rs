//! Document properties stored in `docProps/core.xml` and `docProps/app.xml`.
//!
//! Properties are a flat string map keyed by short names. Known keys are mapped to the
//! core or extended (app) property elements on save; everything loaded from either part
//! lands in the same map.
use crate::ooxml::common::xml::{XML_DECLARATION, escape_xml};
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeMap;

/// Keys stored in core.xml: (map key, qualified element name)
const CORE_KEYS: &[(&str, &str)] = &[
    ("title", "dc:title"),
    ("subject", "dc:subject"),
    ("creator", "dc:creator"),
    ("keywords", "cp:keywords"),
    ("description", "dc:description"),
    ("lastModifiedBy", "cp:lastModifiedBy"),
    ("category", "cp:category"),
    ("status", "cp:contentStatus"),
    ("language", "dc:language"),
    ("revision", "cp:revision"),
];

/// Keys stored in app.xml
const APP_KEYS: &[(&str, &str)] = &[
    ("manager", "Manager"),
    ("company", "Company"),
    ("application", "Application"),
    ("appVersion", "AppVersion"),
];

const DEFAULT_APPLICATION: &str = "Microsoft Excel";

/// Document property map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentProperties {
    values: BTreeMap<String, String>,
}

impl DocumentProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Property names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge every property found in a core.xml part.
    pub fn load_core_xml(&mut self, xml: &[u8]) -> Result<()> {
        self.load_simple_elements(xml, |local| match local {
            "contentStatus" => Some("status"),
            "created" => Some("created"),
            "modified" => Some("modified"),
            "status" => None,
            other => CORE_KEYS
                .iter()
                .find(|(key, _)| *key == other)
                .map(|(key, _)| *key),
        })
    }

    /// Merge every property found in an app.xml part.
    ///
    /// `HeadingPairs` and `TitlesOfParts` are skipped: they describe the sheet list and
    /// are regenerated on save.
    pub fn load_app_xml(&mut self, xml: &[u8]) -> Result<()> {
        self.load_simple_elements(xml, |local| {
            APP_KEYS
                .iter()
                .find(|(_, element)| *element == local)
                .map(|(key, _)| *key)
        })
    }

    fn load_simple_elements<F>(&mut self, xml: &[u8], key_for: F) -> Result<()>
    where
        F: Fn(&str) -> Option<&'static str>,
    {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut depth = 0usize;
        let mut current: Option<&'static str> = None;
        let mut text = String::new();
        let mut found = BTreeMap::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    depth += 1;
                    // Properties are direct children of the root element.
                    current = if depth == 2 {
                        let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                        key_for(&local)
                    } else {
                        None
                    };
                    text.clear();
                },
                Event::Text(t) if current.is_some() => text.push_str(&t.unescape()?),
                Event::CData(t) if current.is_some() => {
                    text.push_str(&String::from_utf8_lossy(&t.into_inner()))
                },
                Event::End(_) => {
                    if let Some(key) = current.take() {
                        found.insert(key.to_string(), std::mem::take(&mut text));
                    }
                    depth = depth.saturating_sub(1);
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        self.values.extend(found);
        Ok(())
    }

    /// Serialize core.xml. Missing `created` and `modified` use `now`.
    pub fn core_to_xml(&self, now: DateTime<Utc>) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECLARATION);
        xml.push('\n');
        xml.push_str(r#"<cp:coreProperties xmlns:cp=""#);
        xml.push_str(namespace::CORE_PROPERTIES);
        xml.push_str(r#"" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);

        for (key, element) in CORE_KEYS {
            if let Some(value) = self.get(key) {
                push_element(&mut xml, element, value);
            }
        }

        let created = w3cdtf(self.get("created"), now);
        xml.push_str(r#"<dcterms:created xsi:type="dcterms:W3CDTF">"#);
        xml.push_str(&created);
        xml.push_str("</dcterms:created>");

        let modified = w3cdtf(self.get("modified"), now);
        xml.push_str(r#"<dcterms:modified xsi:type="dcterms:W3CDTF">"#);
        xml.push_str(&modified);
        xml.push_str("</dcterms:modified>");

        xml.push_str("</cp:coreProperties>");
        xml
    }

    /// Serialize app.xml.
    ///
    /// `headings` are (category, count) pairs such as `("Worksheets", 2)`; `titles` lists
    /// the part titles in the same order.
    pub fn app_to_xml(&self, headings: &[(&str, usize)], titles: &[&str]) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECLARATION);
        xml.push('\n');
        xml.push_str(r#"<Properties xmlns=""#);
        xml.push_str(namespace::EXTENDED_PROPERTIES);
        xml.push_str(r#"" xmlns:vt=""#);
        xml.push_str(namespace::DOC_PROPS_VTYPES);
        xml.push_str(r#"">"#);

        push_element(
            &mut xml,
            "Application",
            self.get("application").unwrap_or(DEFAULT_APPLICATION),
        );
        xml.push_str("<DocSecurity>0</DocSecurity><ScaleCrop>false</ScaleCrop>");

        xml.push_str(&format!(
            r#"<HeadingPairs><vt:vector size="{}" baseType="variant">"#,
            headings.len() * 2
        ));
        for (name, count) in headings {
            xml.push_str("<vt:variant><vt:lpstr>");
            xml.push_str(&escape_xml(name));
            xml.push_str("</vt:lpstr></vt:variant><vt:variant><vt:i4>");
            xml.push_str(&count.to_string());
            xml.push_str("</vt:i4></vt:variant>");
        }
        xml.push_str("</vt:vector></HeadingPairs>");

        xml.push_str(&format!(
            r#"<TitlesOfParts><vt:vector size="{}" baseType="lpstr">"#,
            titles.len()
        ));
        for title in titles {
            push_element(&mut xml, "vt:lpstr", title);
        }
        xml.push_str("</vt:vector></TitlesOfParts>");

        for (key, element) in APP_KEYS.iter().filter(|(key, _)| *key != "application") {
            if let Some(value) = self.get(key) {
                push_element(&mut xml, element, value);
            }
        }
        xml.push_str(
            "<LinksUpToDate>false</LinksUpToDate><SharedDoc>false</SharedDoc><HyperlinksChanged>false</HyperlinksChanged>",
        );
        if self.get("appVersion").is_none() {
            xml.push_str("<AppVersion>12.0000</AppVersion>");
        }

        xml.push_str("</Properties>");
        xml
    }
}

fn push_element(xml: &mut String, name: &str, value: &str) {
    xml.push('<');
    xml.push_str(name);
    xml.push('>');
    xml.push_str(&escape_xml(value));
    xml.push_str("</");
    xml.push_str(name);
    xml.push('>');
}

/// Normalize a stored timestamp to `YYYY-MM-DDThh:mm:ssZ`, falling back to `now`.
fn w3cdtf(value: Option<&str>, now: DateTime<Utc>) -> String {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_map_operations() {
        let mut props = DocumentProperties::new();
        props.set("title", "Budget");
        props.set("company", "Acme");
        assert_eq!(props.get("title"), Some("Budget"));
        assert_eq!(props.names().collect::<Vec<_>>(), vec!["company", "title"]);
        assert_eq!(props.remove("company").as_deref(), Some("Acme"));
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_core_xml() {
        let mut props = DocumentProperties::new();
        props.set("title", "Q1 & Q2");
        props.set("status", "Draft");
        props.set("created", "2020-01-02T03:04:05Z");
        props.set("manager", "not a core key");

        let xml = props.core_to_xml(fixed_now());
        assert!(xml.contains("<dc:title>Q1 &amp; Q2</dc:title>"));
        assert!(xml.contains("<cp:contentStatus>Draft</cp:contentStatus>"));
        assert!(xml.contains(
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">2020-01-02T03:04:05Z</dcterms:created>"#
        ));
        assert!(xml.contains(
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">2024-03-01T12:00:00Z</dcterms:modified>"#
        ));
        assert!(!xml.contains("not a core key"));
    }

    #[test]
    fn test_load_core_xml() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
            <cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
                <dc:title>Sales &lt;2023&gt;</dc:title>
                <dc:creator>Jo</dc:creator>
                <cp:contentStatus>Final</cp:contentStatus>
                <dcterms:created xsi:type="dcterms:W3CDTF">2021-06-01T00:00:00Z</dcterms:created>
            </cp:coreProperties>"#;
        let mut props = DocumentProperties::new();
        props.load_core_xml(xml).unwrap();
        assert_eq!(props.get("title"), Some("Sales <2023>"));
        assert_eq!(props.get("creator"), Some("Jo"));
        assert_eq!(props.get("status"), Some("Final"));
        assert_eq!(props.get("created"), Some("2021-06-01T00:00:00Z"));
    }

    #[test]
    fn test_app_xml_round_trip() {
        let mut props = DocumentProperties::new();
        props.set("company", "Acme");
        props.set("manager", "Sam");
        let xml = props.app_to_xml(&[("Worksheets", 2)], &["Data", "Summary"]);
        assert!(xml.contains("<vt:lpstr>Worksheets</vt:lpstr>"));
        assert!(xml.contains("<vt:i4>2</vt:i4>"));
        assert!(xml.contains(r#"<TitlesOfParts><vt:vector size="2" baseType="lpstr"><vt:lpstr>Data</vt:lpstr><vt:lpstr>Summary</vt:lpstr>"#));

        let mut loaded = DocumentProperties::new();
        loaded.load_app_xml(xml.as_bytes()).unwrap();
        assert_eq!(loaded.get("company"), Some("Acme"));
        assert_eq!(loaded.get("manager"), Some("Sam"));
        assert_eq!(loaded.get("application"), Some(DEFAULT_APPLICATION));
        assert_eq!(loaded.get("appVersion"), Some("12.0000"));
        assert_eq!(loaded.len(), 4);
    }

    #[test]
    fn test_malformed_core_xml() {
        let mut props = DocumentProperties::new();
        assert!(props.load_core_xml(b"<cp:coreProperties><dc:title>x</dc:tit").is_err());
        assert!(props.is_empty());
    }
}
