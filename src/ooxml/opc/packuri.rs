//! Part names inside an OPC package.
//!
//! A part name is an absolute, slash-separated URI such as `/xl/workbook.xml`.
//! The zip entry for that part is the same string without the leading slash.
use crate::ooxml::opc::error::{OpcError, Result};

/// The package pseudo-partname. Root relationships (`/_rels/.rels`) hang off it.
pub const PACKAGE_URI: &str = "/";

/// The URI for the `[Content_Types].xml` part
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

/// A part name within an OPC package.
///
/// Always begins with a forward slash. Provides the pieces the package layer needs:
/// the directory (base URI) used to resolve relationship targets, the file name and
/// extension used for content types, and the numeric suffix used by sequential naming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    uri: String,
}

impl PackURI {
    /// Create a part name. Fails when `uri` does not begin with `/`.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(OpcError::InvalidPackUri(format!(
                "part name must begin with '/', got '{}'",
                uri
            )));
        }
        Ok(PackURI { uri })
    }

    /// Build a part name from a zip entry name (`xl/workbook.xml` -> `/xl/workbook.xml`).
    pub fn from_membername(name: &str) -> Self {
        let trimmed = name.trim_start_matches('/');
        PackURI {
            uri: format!("/{}", trimmed),
        }
    }

    /// Resolve a relationship target against the directory of its source part.
    ///
    /// `("/xl/worksheets", "../drawings/drawing1.xml")` resolves to
    /// `/xl/drawings/drawing1.xml`. A target that begins with `/` is already absolute
    /// and the base is ignored.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self> {
        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else {
            join_paths(base_uri, relative_ref)
        };
        Self::new(normalize_path(&joined))
    }

    /// Directory portion, e.g. `/xl/worksheets` for `/xl/worksheets/sheet1.xml`.
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// File name portion, e.g. `sheet1.xml`. Empty for the package pseudo-partname.
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// Extension without the period, e.g. `xml`.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Numeric suffix of a sequentially named part.
    ///
    /// `Some(21)` for `/xl/worksheets/sheet21.xml`, `None` for `/xl/workbook.xml`.
    pub fn idx(&self) -> Option<u32> {
        let filename = self.filename();
        let stem = match filename.rfind('.') {
            Some(pos) => &filename[..pos],
            None => filename,
        };
        let digits = stem
            .bytes()
            .rev()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits == 0 || digits == stem.len() {
            return None;
        }
        atoi_simd::parse::<u32>(&stem.as_bytes()[stem.len() - digits..]).ok()
    }

    /// Zip entry name: the URI without its leading slash.
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Relative reference from `base_uri` to this part.
    ///
    /// `/xl/media/image1.png` seen from `/xl/drawings` is `../media/image1.png`.
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.membername().to_string();
        }

        let from: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();
        let common = from
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut result = "../".repeat(from.len() - common);
        result.push_str(&to[common..].join("/"));
        result
    }

    /// The `.rels` part holding this part's relationships.
    ///
    /// `/xl/_rels/workbook.xml.rels` for `/xl/workbook.xml`; `/_rels/.rels` for the package.
    pub fn rels_uri(&self) -> PackURI {
        let base = self.base_uri();
        let uri = if base == "/" {
            format!("/_rels/{}.rels", self.filename())
        } else {
            format!("{}/_rels/{}.rels", base, self.filename())
        };
        PackURI { uri }
    }

    /// Full URI string.
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

fn join_paths(base: &str, rel: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, rel)
    } else {
        format!("{}/{}", base, rel)
    }
}

/// Collapse `.` and `..` segments. `..` never climbs above the root.
fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    format!("/{}", parts.join("/"))
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_packuri_new() {
        assert!(PackURI::new("/xl/workbook.xml").is_ok());
        assert!(matches!(
            PackURI::new("xl/workbook.xml"),
            Err(OpcError::InvalidPackUri(_))
        ));
    }

    #[test]
    fn test_components() {
        let uri = PackURI::new("/xl/worksheets/sheet12.xml").unwrap();
        assert_eq!(uri.base_uri(), "/xl/worksheets");
        assert_eq!(uri.filename(), "sheet12.xml");
        assert_eq!(uri.ext(), "xml");
        assert_eq!(uri.idx(), Some(12));
        assert_eq!(uri.membername(), "xl/worksheets/sheet12.xml");

        let root = PackURI::new(PACKAGE_URI).unwrap();
        assert_eq!(root.base_uri(), "/");
        assert_eq!(root.filename(), "");
        assert_eq!(root.membername(), "");
    }

    #[test]
    fn test_idx_singletons() {
        assert_eq!(PackURI::new("/xl/workbook.xml").unwrap().idx(), None);
        assert_eq!(PackURI::new("/xl/theme/theme1.xml").unwrap().idx(), Some(1));
        assert_eq!(PackURI::new("/xl/media/123.png").unwrap().idx(), None);
    }

    #[test]
    fn test_from_rel_ref() {
        let uri = PackURI::from_rel_ref("/xl/drawings", "../media/image1.png").unwrap();
        assert_eq!(uri.as_str(), "/xl/media/image1.png");

        let uri = PackURI::from_rel_ref("/xl", "worksheets/sheet1.xml").unwrap();
        assert_eq!(uri.as_str(), "/xl/worksheets/sheet1.xml");

        let uri = PackURI::from_rel_ref("/", "xl/workbook.xml").unwrap();
        assert_eq!(uri.as_str(), "/xl/workbook.xml");
    }

    #[test]
    fn test_from_rel_ref_absolute_target() {
        let uri = PackURI::from_rel_ref("/xl/worksheets", "/xl/drawings/drawing2.xml").unwrap();
        assert_eq!(uri.as_str(), "/xl/drawings/drawing2.xml");
    }

    #[test]
    fn test_relative_ref() {
        let uri = PackURI::new("/xl/media/image3.jpeg").unwrap();
        assert_eq!(uri.relative_ref("/xl/drawings"), "../media/image3.jpeg");
        assert_eq!(uri.relative_ref("/xl"), "media/image3.jpeg");
        assert_eq!(uri.relative_ref("/"), "xl/media/image3.jpeg");
    }

    #[test]
    fn test_rels_uri() {
        let uri = PackURI::new("/xl/workbook.xml").unwrap();
        assert_eq!(uri.rels_uri().as_str(), "/xl/_rels/workbook.xml.rels");

        let root = PackURI::new(PACKAGE_URI).unwrap();
        assert_eq!(root.rels_uri().as_str(), "/_rels/.rels");
    }

    proptest! {
        #[test]
        fn relative_ref_resolves_back(
            dirs in proptest::collection::vec("[a-z]{1,6}", 1..4),
            base in proptest::collection::vec("[a-z]{1,6}", 0..3),
            name in "[a-z]{1,8}[0-9]{0,2}\\.xml",
        ) {
            let target = PackURI::new(format!("/{}/{}", dirs.join("/"), name)).unwrap();
            let base_uri = format!("/{}", base.join("/"));
            let reference = target.relative_ref(&base_uri);
            let resolved = PackURI::from_rel_ref(&base_uri, &reference).unwrap();
            prop_assert_eq!(resolved, target);
        }
    }
}
