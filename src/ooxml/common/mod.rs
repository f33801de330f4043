//! Helpers shared by the spreadsheet parts: XML text handling and document properties.
pub mod properties;
pub mod xml;

pub use properties::DocumentProperties;
