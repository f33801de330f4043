//! External workbook links (`xl/externalLinks/externalLink{N}.xml`).
//!
//! The link body is carried verbatim together with its own relationships, which point
//! at the external file.
use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::XmlPart;
use crate::ooxml::opc::rel::Relationships;

#[derive(Debug, Clone)]
pub struct ExternalLink {
    part: XmlPart,
    rels: Relationships,
}

impl ExternalLink {
    pub(crate) fn load(xml: Vec<u8>, rels: Option<Relationships>) -> Result<Self> {
        Ok(Self {
            part: XmlPart::load(ct::SML_EXTERNAL_LINK, xml)?,
            rels: rels.unwrap_or_else(|| Relationships::new("/xl/externalLinks")),
        })
    }

    pub fn part(&self) -> &XmlPart {
        &self.part
    }

    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    /// Target of the link's external-file relationship, if any.
    pub fn target(&self) -> Option<&str> {
        self.rels
            .iter()
            .find(|rel| rel.is_external())
            .map(|rel| rel.target_ref())
    }

    /// `/xl/externalLinks/externalLink{index + 1}.xml`.
    pub fn partname(index: usize) -> Result<PackURI> {
        PackURI::new(format!("/xl/externalLinks/externalLink{}.xml", index + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_keeps_external_target() {
        let rels_xml = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/externalLinkPath" Target="file:///C:/data/prices.xlsx" TargetMode="External"/></Relationships>"#;
        let rels = Relationships::from_xml(rels_xml, "/xl/externalLinks").unwrap();
        let link = ExternalLink::load(
            br#"<externalLink xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><externalBook/></externalLink>"#.to_vec(),
            Some(rels),
        )
        .unwrap();
        assert_eq!(link.target(), Some("file:///C:/data/prices.xlsx"));
        assert_eq!(
            ExternalLink::partname(1).unwrap().as_str(),
            "/xl/externalLinks/externalLink2.xml"
        );
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        assert!(ExternalLink::load(b"<externalLink>".to_vec(), None).is_err());
    }
}
