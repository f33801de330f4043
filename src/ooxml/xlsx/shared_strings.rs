//! Shared strings table (`xl/sharedStrings.xml`).
//!
//! On load the table resolves `t="s"` cell indices; on save a fresh table is built from
//! the string cells actually present, so stale entries never survive a save.
use crate::ooxml::common::xml::{XML_DECLARATION, escape_xml};
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::error::Result;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;

/// Shared strings table for efficient string storage.
#[derive(Debug, Default, Clone)]
pub struct SharedStrings {
    strings: Vec<String>,
    string_to_index: HashMap<String, usize>,
}

impl SharedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `xl/sharedStrings.xml`.
    ///
    /// Each `<si>` yields one entry: its plain `<t>` text, or the concatenated runs of
    /// rich text. Phonetic runs (`<rPh>`) are not part of the value.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut table = Self::new();
        let mut reader = Reader::from_reader(xml);

        let mut buf = Vec::new();
        let mut current: Option<String> = None;
        let mut in_text = false;
        let mut phonetic_depth = 0usize;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"si" => current = Some(String::new()),
                    b"rPh" => phonetic_depth += 1,
                    b"t" if phonetic_depth == 0 => in_text = true,
                    _ => {},
                },
                Event::Empty(e) if e.local_name().as_ref() == b"si" => {
                    table.push(String::new());
                },
                Event::Text(t) if in_text => {
                    if let Some(s) = current.as_mut() {
                        s.push_str(&t.unescape()?);
                    }
                },
                Event::End(e) => match e.local_name().as_ref() {
                    b"si" => {
                        if let Some(s) = current.take() {
                            table.push(s);
                        }
                    },
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"t" => in_text = false,
                    _ => {},
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        Ok(table)
    }

    /// Append without de-duplication; indices must match the file order on load.
    fn push(&mut self, s: String) {
        let index = self.strings.len();
        self.string_to_index.entry(s.clone()).or_insert(index);
        self.strings.push(s);
    }

    /// Index of `s`, adding it if new.
    pub fn add(&mut self, s: &str) -> usize {
        if let Some(&index) = self.string_to_index.get(s) {
            return index;
        }
        let index = self.strings.len();
        self.strings.push(s.to_string());
        self.string_to_index.insert(s.to_string(), index);
        index
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Serialize as `xl/sharedStrings.xml`. `references` is the number of cells using the table.
    pub fn to_xml(&self, references: usize) -> String {
        let mut xml = String::with_capacity(256 + self.strings.len() * 32);
        xml.push_str(XML_DECLARATION);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<sst xmlns="{}" count="{}" uniqueCount="{}">"#,
            namespace::SML_MAIN,
            references,
            self.strings.len()
        ));
        for s in &self.strings {
            let needs_preserve = s.starts_with(char::is_whitespace)
                || s.ends_with(char::is_whitespace)
                || s.contains('\n');
            if needs_preserve {
                xml.push_str(r#"<si><t xml:space="preserve">"#);
            } else {
                xml.push_str("<si><t>");
            }
            xml.push_str(&escape_xml(s));
            xml.push_str("</t></si>");
        }
        xml.push_str("</sst>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_xml_plain_and_rich() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
            <sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
                <si><t>Region</t></si>
                <si><r><rPr><b/></rPr><t>Net </t></r><r><t xml:space="preserve">&amp; gross</t></r><rPh sb="0" eb="1"><t>ネット</t></rPh></si>
                <si/>
            </sst>"#.as_bytes();
        let table = SharedStrings::from_xml(xml).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0), Some("Region"));
        assert_eq!(table.get(1), Some("Net & gross"));
        assert_eq!(table.get(2), Some(""));
    }

    #[test]
    fn test_add_deduplicates() {
        let mut table = SharedStrings::new();
        assert_eq!(table.add("a"), 0);
        assert_eq!(table.add("b"), 1);
        assert_eq!(table.add("a"), 0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_to_xml() {
        let mut table = SharedStrings::new();
        table.add("x < y");
        table.add(" padded");
        let xml = table.to_xml(3);
        assert!(xml.contains(r#"count="3" uniqueCount="2""#));
        assert!(xml.contains("<si><t>x &lt; y</t></si>"));
        assert!(xml.contains(r#"<si><t xml:space="preserve"> padded</t></si>"#));

        let reparsed = SharedStrings::from_xml(xml.as_bytes()).unwrap();
        assert_eq!(reparsed.get(1), Some(" padded"));
    }
}
