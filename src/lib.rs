//! xlsx-opc - reading and writing SpreadsheetML (.xlsx) packages
//!
//! An xlsx file is an OPC package: a zip archive of parts tied together by
//! relationship graphs and typed by `[Content_Types].xml`. This crate loads such a
//! package into an owned workbook graph (sheets, drawings, charts, media, embedded
//! objects, external links) and writes the graph back, rebuilding every relationship
//! and content type entry on each save.
//!
//! # Features
//!
//! - **All-or-nothing load**: a failed load leaves the previous document untouched
//! - **Atomic save**: packages are assembled in memory and checked before any byte is written
//! - **Drawing anchors**: absolute, one-cell and two-cell anchors for pictures and charts
//! - **Shared media**: an image inserted twice is stored once
//!
//! # Example - Creating a workbook
//!
//! ```no_run
//! use xlsx_opc::ooxml::xlsx::Document;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = Document::new();
//! doc.write(1, 1, "Revenue")?;
//! doc.write(1, 2, 1250.5)?;
//! doc.insert_image(3, 1, "logo.png")?;
//! doc.add_chartsheet(Some("Trend"))?;
//! doc.save_as("revenue.xlsx")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Editing an existing workbook
//!
//! ```no_run
//! use xlsx_opc::ooxml::xlsx::Document;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = Document::open("revenue.xlsx")?;
//! doc.rename_sheet("Sheet1", "2024")?;
//! doc.copy_sheet("2024", "2025")?;
//! doc.select_sheet("2025")?;
//! doc.write(1, 2, 0.0)?;
//! doc.save()?;
//! # Ok(())
//! # }
//! ```

/// OOXML (Office Open XML) packages
///
/// Contains the OPC layer and the SpreadsheetML workbook graph.
pub mod ooxml;

pub use ooxml::xlsx::{Document, Workbook};
pub use ooxml::{OoxmlError, Result};
