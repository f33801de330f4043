/// Open Packaging Conventions (OPC) layer.
///
/// Knows about zip entries, part names, relationships and content types, but
/// nothing about spreadsheets:
///
/// - [`phys_pkg`]: zip container, fully buffered
/// - [`pkgreader`] / [`pkgwriter`]: part-level load and all-or-nothing assembly
/// - [`rel`]: per-part relationship graphs
/// - [`content_types`]: the `[Content_Types].xml` registry
pub mod constants;
pub mod content_types;
pub mod error;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

pub use content_types::ContentTypes;
pub use error::OpcError;
pub use packuri::PackURI;
pub use part::{BlobPart, Part, XmlPart};
pub use pkgreader::PackageReader;
pub use pkgwriter::PackageWriter;
pub use rel::{Relationship, Relationships};
