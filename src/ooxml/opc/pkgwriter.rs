//! Package writer for OPC packages.
//!
//! Entries are buffered until [`PackageWriter::finish`], which checks the package
//! invariants and only then produces zip bytes. A failed check yields no archive at all.
use crate::ooxml::opc::constants::target_mode;
use crate::ooxml::opc::content_types::ContentTypes;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI};
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::phys_pkg::PhysPkgWriter;
use crate::ooxml::opc::rel::Relationships;
use log::debug;
use std::collections::HashSet;

/// Buffered archive assembly with content types and relationship bookkeeping.
pub struct PackageWriter {
    content_types: ContentTypes,
    entries: Vec<(PackURI, Vec<u8>)>,

    /// Internal targets declared by written `.rels` parts: (rels part, target)
    rel_targets: Vec<(PackURI, PackURI)>,
}

impl PackageWriter {
    /// Writer starting from a fresh registry.
    pub fn new() -> Self {
        Self::with_content_types(ContentTypes::new())
    }

    /// Writer reusing the defaults of an existing registry. Overrides are always rebuilt.
    pub fn with_content_types(mut content_types: ContentTypes) -> Self {
        content_types.clear_overrides();
        Self {
            content_types,
            entries: Vec::with_capacity(32),
            rel_targets: Vec::new(),
        }
    }

    /// Append one archive entry.
    pub fn add_file(&mut self, partname: &PackURI, blob: Vec<u8>) {
        self.entries.push((partname.clone(), blob));
    }

    /// Append a part and register its content type as an override.
    pub fn add_part(&mut self, partname: &PackURI, part: &dyn Part) {
        self.content_types.add_override(partname.as_str(), part.content_type());
        self.add_file(partname, part.blob().to_vec());
    }

    /// Append an XML part and register `content_type` as its override.
    pub fn add_xml(&mut self, partname: &PackURI, content_type: &str, xml: String) {
        self.content_types.add_override(partname.as_str(), content_type);
        self.add_file(partname, xml.into_bytes());
    }

    /// Write the relationships of `source` to its `.rels` sibling. Empty graphs are skipped.
    pub fn add_rels(&mut self, source: &PackURI, rels: &Relationships) -> Result<()> {
        if rels.is_empty() {
            return Ok(());
        }
        let rels_uri = source.rels_uri();
        for rel in rels.iter().filter(|rel| !rel.is_external()) {
            self.rel_targets.push((rels_uri.clone(), rel.target_partname()?));
        }
        self.add_file(&rels_uri, rels.to_xml().into_bytes());
        Ok(())
    }

    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.content_types.add_default(extension, content_type);
    }

    pub fn add_override(&mut self, partname: &PackURI, content_type: &str) {
        self.content_types.add_override(partname.as_str(), content_type);
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Check invariants, write `[Content_Types].xml` last, and return the archive bytes.
    ///
    /// Fails with [`OpcError::Consistency`] if an entry path repeats, an entry has no
    /// content type, or an internal relationship target was never written.
    pub fn finish(self) -> Result<Vec<u8>> {
        let content_types_uri = PackURI::new(CONTENT_TYPES_URI)?;
        let mut written: HashSet<&str> = HashSet::with_capacity(self.entries.len() + 1);
        written.insert(content_types_uri.as_str());

        for (partname, _) in &self.entries {
            if !written.insert(partname.as_str()) {
                return Err(OpcError::Consistency(format!(
                    "entry {} written twice",
                    partname
                )));
            }
            if !self.content_types.covers(partname) {
                return Err(OpcError::Consistency(format!(
                    "entry {} has no content type",
                    partname
                )));
            }
        }

        for (rels_uri, target) in &self.rel_targets {
            if !written.contains(target.as_str()) {
                return Err(OpcError::Consistency(format!(
                    "{} targets {} which is not in the package ({} mode)",
                    rels_uri,
                    target,
                    target_mode::INTERNAL
                )));
            }
        }

        let mut phys = PhysPkgWriter::new();
        for (partname, blob) in &self.entries {
            phys.write(partname, blob)?;
        }
        phys.write(&content_types_uri, self.content_types.to_xml().as_bytes())?;
        let bytes = phys.finish()?;

        debug!(entries = self.entries.len() + 1, bytes = bytes.len(); "package assembled");
        Ok(bytes)
    }
}

impl Default for PackageWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
    use crate::ooxml::opc::part::XmlPart;
    use crate::ooxml::opc::phys_pkg::PhysPkgReader;

    fn uri(s: &str) -> PackURI {
        PackURI::new(s).unwrap()
    }

    #[test]
    fn test_finish_writes_content_types_last() {
        let mut writer = PackageWriter::new();
        let workbook = uri("/xl/workbook.xml");
        writer.add_xml(&workbook, ct::SML_SHEET_MAIN, "<workbook/>".to_string());
        let mut pkg_rels = Relationships::new("/");
        pkg_rels.add_relationship(rt::OFFICE_DOCUMENT, "xl/workbook.xml", false);
        writer.add_rels(&uri("/"), &pkg_rels).unwrap();

        let bytes = writer.finish().unwrap();
        let reader = PhysPkgReader::from_bytes(&bytes).unwrap();
        let names: Vec<&str> = reader.member_names().collect();
        assert_eq!(names, vec!["xl/workbook.xml", "_rels/.rels", "[Content_Types].xml"]);

        let types = ContentTypes::from_xml(reader.content_types_xml().unwrap()).unwrap();
        assert_eq!(types.content_type_for(&workbook), Some(ct::SML_SHEET_MAIN));
    }

    #[test]
    fn test_duplicate_entry_is_rejected() {
        let mut writer = PackageWriter::new();
        let styles = XmlPart::new(ct::SML_STYLES, b"<styleSheet/>".to_vec());
        writer.add_part(&uri("/xl/styles.xml"), &styles);
        writer.add_part(&uri("/xl/styles.xml"), &styles);
        assert!(matches!(writer.finish(), Err(OpcError::Consistency(_))));
    }

    #[test]
    fn test_uncovered_entry_is_rejected() {
        let mut writer = PackageWriter::new();
        writer.add_file(&uri("/xl/media/image1.png"), vec![0x89, b'P', b'N', b'G']);
        assert!(matches!(writer.finish(), Err(OpcError::Consistency(_))));

        let mut writer = PackageWriter::new();
        writer.add_file(&uri("/xl/media/image1.png"), vec![0x89, b'P', b'N', b'G']);
        writer.add_default("png", ct::PNG);
        assert!(writer.finish().is_ok());
    }

    #[test]
    fn test_dangling_rel_target_is_rejected() {
        let mut writer = PackageWriter::new();
        let drawing = uri("/xl/drawings/drawing1.xml");
        writer.add_xml(&drawing, ct::OFC_DRAWING, "<xdr:wsDr/>".to_string());
        let mut rels = Relationships::new(drawing.base_uri());
        rels.add_relationship(rt::CHART, "../charts/chart1.xml", false);
        rels.add_relationship(rt::IMAGE, "https://example.com/a.png", true);
        writer.add_rels(&drawing, &rels).unwrap();

        match writer.finish() {
            Err(OpcError::Consistency(msg)) => assert!(msg.contains("/xl/charts/chart1.xml")),
            other => panic!("expected consistency error, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_loaded_overrides_do_not_survive() {
        let mut loaded = ContentTypes::new();
        loaded.add_default("jpeg", ct::JPEG);
        loaded.add_override("/xl/worksheets/sheet9.xml", ct::SML_WORKSHEET);

        let writer = PackageWriter::with_content_types(loaded);
        assert_eq!(writer.content_types().overrides().count(), 0);
        assert!(writer.content_types().covers(&uri("/xl/media/image1.jpeg")));
    }
}
