/// Error types for spreadsheet package operations.
use crate::ooxml::opc::error::OpcError;
use thiserror::Error;

/// Result type for spreadsheet package operations.
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Error types for spreadsheet package operations.
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// Zip or package-structure error that is not mapped to a more specific kind
    #[error("OPC error: {0}")]
    Opc(#[from] OpcError),

    /// A mandatory part or mandatory relationship is missing
    #[error("Invalid package: {0}")]
    Format(String),

    /// Malformed XML in a mandatory part
    #[error("Malformed part {part}: {message}")]
    Parse { part: String, message: String },

    /// Archive entry requested by exact path does not exist
    #[error("Part not found: {0}")]
    NotFound(String),

    /// Internal invariant broken while assembling a package
    #[error("Package consistency error: {0}")]
    Consistency(String),

    /// Caller misuse: unknown or duplicate sheet name, unreadable image, ...
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OoxmlError {
    /// Classify an error raised while reading `part`.
    ///
    /// Missing entries become [`OoxmlError::NotFound`], XML trouble becomes
    /// [`OoxmlError::Parse`] naming the part.
    pub fn in_part(part: &str, err: OpcError) -> Self {
        match err {
            OpcError::PartNotFound(path) => OoxmlError::NotFound(path),
            OpcError::XmlError(message) | OpcError::AttrError(message) => OoxmlError::Parse {
                part: part.to_string(),
                message,
            },
            OpcError::Utf8Error(e) => OoxmlError::Parse {
                part: part.to_string(),
                message: e.to_string(),
            },
            other => OoxmlError::Opc(other),
        }
    }

    pub fn parse<P: Into<String>, M: std::fmt::Display>(part: P, message: M) -> Self {
        OoxmlError::Parse {
            part: part.into(),
            message: message.to_string(),
        }
    }
}

impl From<quick_xml::Error> for OoxmlError {
    fn from(err: quick_xml::Error) -> Self {
        OoxmlError::Opc(OpcError::from(err))
    }
}
