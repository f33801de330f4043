//! Office Open XML (OOXML) spreadsheet packages.
//!
//! The module is organized into layers:
//!
//! 1. **OPC Layer** (`opc`): zip container, part names, relationships, content types
//! 2. **Shared Utilities** (`common`, `error`): XML helpers, document properties, errors
//! 3. **Spreadsheet** (`xlsx`): the workbook graph and its load/save orchestration
//!
//! # Example
//!
//! ```rust,no_run
//! use xlsx_opc::ooxml::xlsx::Document;
//!
//! let mut doc = Document::open("book.xlsx")?;
//! for name in doc.sheet_names() {
//!     println!("Sheet: {}", name);
//! }
//! doc.set_property("lastModifiedBy", "batch job");
//! doc.save()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod common;
pub mod error;
pub mod opc;
pub mod xlsx;

// Re-export commonly used types from OPC layer
pub use opc::{PackURI, Relationships};

// Re-export common utilities
pub use common::DocumentProperties;

// Re-export error types
pub use error::{OoxmlError, Result};
