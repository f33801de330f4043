/// Relationship graph for a single source part.
///
/// Each part that points at other parts owns one `Relationships` collection, serialized
/// to its `_rels/*.rels` sibling. Entries keep document order; ids are minted
/// sequentially and never reused within one collection.
use crate::ooxml::common::xml::{XML_DECLARATION, escape_xml};
use crate::ooxml::opc::constants::{namespace, target_mode};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use quick_xml::Reader;
use quick_xml::events::Event;
use smallvec::SmallVec;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    r_id: String,
    reltype: String,
    target_ref: String,
    base_uri: String,
    is_external: bool,
}

impl Relationship {
    /// Relationship ID, e.g. `rId1`.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Full relationship type URI.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Target as written in the `.rels` part: relative part reference or external URL.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Whether the type of this relationship belongs to `category`.
    ///
    /// `category` is a short name such as `/officeDocument` or `officeDocument`; it matches
    /// a type equal to the short name or ending in `/` followed by it.
    pub fn matches_category(&self, category: &str) -> bool {
        let short = category.trim_start_matches('/');
        if short.is_empty() {
            return false;
        }
        self.reltype == short
            || (self.reltype.len() > short.len()
                && self.reltype.ends_with(short)
                && self.reltype.as_bytes()[self.reltype.len() - short.len() - 1] == b'/')
    }

    /// Absolute part name of an internal target.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidPackUri(format!(
                "relationship {} targets external resource '{}'",
                self.r_id, self.target_ref
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref)
    }
}

/// Ordered collection of relationships declared by one source part.
#[derive(Debug, Clone)]
pub struct Relationships {
    base_uri: String,
    rels: SmallVec<[Relationship; 8]>,
}

impl Relationships {
    /// Empty collection for a source part living in `base_uri` (e.g. `/xl`).
    pub fn new<S: Into<String>>(base_uri: S) -> Self {
        Self {
            base_uri: base_uri.into(),
            rels: SmallVec::new(),
        }
    }

    /// Directory used to resolve internal targets.
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Parse a `.rels` part. Entries missing `Id`, `Type` or `Target` are skipped.
    pub fn from_xml(xml: &[u8], base_uri: &str) -> Result<Self> {
        let mut rels = Self::new(base_uri);
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut r_id = None;
                    let mut reltype = None;
                    let mut target_ref = None;
                    let mut is_external = false;

                    for attr in e.attributes() {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"Id" => r_id = Some(attr.unescape_value()?.into_owned()),
                            b"Type" => reltype = Some(attr.unescape_value()?.into_owned()),
                            b"Target" => target_ref = Some(attr.unescape_value()?.into_owned()),
                            b"TargetMode" => {
                                is_external = attr.unescape_value()? == target_mode::EXTERNAL
                            },
                            _ => {},
                        }
                    }

                    if let (Some(id), Some(rt), Some(tr)) = (r_id, reltype, target_ref) {
                        rels.insert(id, rt, tr, is_external)?;
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::XmlError(format!("Rels parse error: {}", e))),
                _ => {},
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Register a relationship under an id read from an existing package.
    pub fn insert(
        &mut self,
        r_id: String,
        reltype: String,
        target_ref: String,
        is_external: bool,
    ) -> Result<()> {
        if self.relationship_by_id(&r_id).is_some() {
            return Err(OpcError::XmlError(format!(
                "duplicate relationship id '{}'",
                r_id
            )));
        }
        self.rels.push(Relationship {
            r_id,
            reltype,
            target_ref,
            base_uri: self.base_uri.clone(),
            is_external,
        });
        Ok(())
    }

    /// Append a relationship and return its freshly minted id.
    ///
    /// The id is `rId{len + 1}`, advanced past any number already taken by a loaded id.
    pub fn add_relationship(&mut self, reltype: &str, target_ref: &str, is_external: bool) -> String {
        let r_id = self.next_r_id();
        self.rels.push(Relationship {
            r_id: r_id.clone(),
            reltype: reltype.to_string(),
            target_ref: target_ref.to_string(),
            base_uri: self.base_uri.clone(),
            is_external,
        });
        r_id
    }

    fn next_r_id(&self) -> String {
        let mut n = self.rels.len() as u32 + 1;
        while self.rels.iter().any(|rel| r_id_number(&rel.r_id) == Some(n)) {
            n += 1;
        }
        format!("rId{}", n)
    }

    /// Look up a relationship by id. Absent ids yield `None`; the caller decides
    /// whether that is fatal.
    #[inline]
    pub fn relationship_by_id(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.r_id == r_id)
    }

    /// All relationships of a category, in document order.
    pub fn relationships_by_category<'a, 'c>(
        &'a self,
        category: &'c str,
    ) -> impl Iterator<Item = &'a Relationship> + use<'a, 'c> {
        self.rels.iter().filter(move |rel| rel.matches_category(category))
    }

    /// First relationship of a category, if any. The result borrows `self` only.
    pub fn first_by_category(&self, category: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.matches_category(category))
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Serialize as a `.rels` part, in document order.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(160 + self.rels.len() * 160);
        xml.push_str(XML_DECLARATION);
        xml.push('\n');
        xml.push_str(r#"<Relationships xmlns=""#);
        xml.push_str(namespace::OPC_RELATIONSHIPS);
        xml.push_str(r#"">"#);

        for rel in &self.rels {
            xml.push_str(r#"<Relationship Id=""#);
            xml.push_str(&escape_xml(&rel.r_id));
            xml.push_str(r#"" Type=""#);
            xml.push_str(&escape_xml(&rel.reltype));
            xml.push_str(r#"" Target=""#);
            xml.push_str(&escape_xml(&rel.target_ref));
            xml.push('"');
            if rel.is_external {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }

        xml.push_str("</Relationships>");
        xml
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/")
    }
}

/// Numeric part of an `rId{n}` id.
fn r_id_number(r_id: &str) -> Option<u32> {
    r_id.strip_prefix("rId")
        .and_then(|digits| atoi_simd::parse::<u32>(digits.as_bytes()).ok())
}
