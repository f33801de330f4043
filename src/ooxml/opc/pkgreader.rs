//! Part-level read access to a serialized OPC package.
//!
//! Wraps the zip-level reader with the two package-wide tables every load needs first:
//! the content type registry and the package relationships.
use crate::ooxml::opc::content_types::ContentTypes;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::rel::Relationships;

/// Read side of a package: content types, package relationships, and part bytes.
pub struct PackageReader {
    phys: PhysPkgReader,
    content_types: ContentTypes,
    pkg_rels: Relationships,
}

impl PackageReader {
    /// Parse `[Content_Types].xml` and `_rels/.rels`.
    ///
    /// Both are required: a missing entry yields [`OpcError::PartNotFound`], a
    /// malformed one [`OpcError::XmlError`] naming the part.
    pub fn new(phys: PhysPkgReader) -> Result<Self> {
        let content_types = ContentTypes::from_xml(phys.content_types_xml()?)
            .map_err(|e| in_part(CONTENT_TYPES_URI, e))?;

        let package_uri = PackURI::new(PACKAGE_URI)?;
        let rels_uri = package_uri.rels_uri();
        let rels_xml = phys
            .rels_xml_for(&package_uri)
            .ok_or_else(|| OpcError::PartNotFound(rels_uri.to_string()))?;
        let pkg_rels = Relationships::from_xml(rels_xml, package_uri.base_uri())
            .map_err(|e| in_part(rels_uri.as_str(), e))?;

        Ok(Self {
            phys,
            content_types,
            pkg_rels,
        })
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Relationships declared by the package itself.
    pub fn pkg_rels(&self) -> &Relationships {
        &self.pkg_rels
    }

    /// Bytes of a part. Fails with `PartNotFound` when the exact entry is absent.
    pub fn blob_for(&self, partname: &PackURI) -> Result<&[u8]> {
        self.phys.blob_for(partname)
    }

    pub fn contains(&self, partname: &PackURI) -> bool {
        self.phys.contains(partname)
    }

    /// Relationships of `partname`: `Ok(None)` when it has no `.rels` entry.
    pub fn rels_for(&self, partname: &PackURI) -> Result<Option<Relationships>> {
        match self.phys.rels_xml_for(partname) {
            Some(xml) => Relationships::from_xml(xml, partname.base_uri())
                .map(Some)
                .map_err(|e| in_part(partname.rels_uri().as_str(), e)),
            None => Ok(None),
        }
    }

    /// Declared content type of a part, if any.
    pub fn content_type_for(&self, partname: &PackURI) -> Option<&str> {
        self.content_types.content_type_for(partname)
    }

    /// Every entry name in the archive.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.phys.member_names()
    }

    /// Give back the content type registry, for reuse of its defaults at save time.
    pub fn into_content_types(self) -> ContentTypes {
        self.content_types
    }
}

fn in_part(part: &str, err: OpcError) -> OpcError {
    match err {
        OpcError::XmlError(msg) => OpcError::XmlError(format!("{}: {}", part, msg)),
        OpcError::AttrError(msg) => OpcError::XmlError(format!("{}: {}", part, msg)),
        other => other,
    }
}
