//! SpreadsheetML (.xlsx) packages.
//!
//! A [`Document`] owns a [`Workbook`] graph and the document properties. The
//! `package` module turns that graph into an OPC archive and back:
//!
//! - sheets: [`Worksheet`] (cells, a drawing, embedded objects) or [`Chartsheet`]
//! - drawings: anchors placing pictures and charts, see [`anchor`]
//! - workbook-wide arenas: [`MediaCollection`], [`ChartCollection`], external links
//! - verbatim parts: styles and theme
//!
//! # Example
//!
//! ```rust,no_run
//! use xlsx_opc::ooxml::xlsx::{Document, SheetType};
//!
//! let mut doc = Document::open("input.xlsx")?;
//! doc.insert_sheet(0, Some("Cover"), SheetType::Worksheet)?;
//! doc.write(1, 1, "Quarterly report")?;
//! doc.insert_chart(3, 1, 480, 288)?;
//! doc.save_as("output.xlsx")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod anchor;
pub mod cell;
pub mod chart;
pub mod chartsheet;
pub mod document;
pub mod drawing;
pub mod external_link;
pub mod media;
pub mod ole;
pub(crate) mod package;
pub mod shared_strings;
pub mod sheet;
pub mod styles;
pub mod template;
pub mod theme;
pub mod workbook;
pub mod worksheet;

pub use anchor::{AnchorGeometry, DrawingAnchor, DrawingObject, EditAs, Extent, Marker, ObjectType, Position};
pub use cell::{Cell, CellValue};
pub use chart::{Chart, ChartCollection, ChartId};
pub use chartsheet::Chartsheet;
pub use document::{DEFAULT_PACKAGE_NAME, Document};
pub use drawing::{Drawing, DrawingId};
pub use external_link::ExternalLink;
pub use media::{MediaCollection, MediaFile, MediaId};
pub use ole::OleObject;
pub use shared_strings::SharedStrings;
pub use sheet::{Sheet, SheetKind, SheetState};
pub use styles::Styles;
pub use theme::Theme;
pub use workbook::{DefinedName, SheetType, Workbook};
pub use worksheet::Worksheet;
