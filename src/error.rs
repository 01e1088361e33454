//! Error types for the restyle library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for restyle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a reconstruction.
///
/// Every variant is reported to callers as one failure carrying a kind
/// (see [`Error::kind`]) and a human-readable message.
#[derive(Error, Debug)]
pub enum Error {
    /// The destination template does not exist.
    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// The source document does not exist.
    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The source is neither a structured document nor a page-oriented one.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The destination could not be persisted.
    #[error("Failed to save document: {0}")]
    SaveFailed(String),

    /// I/O error when reading files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The document container could not be read.
    #[error("Package error: {0}")]
    Zip(String),

    /// Malformed WordprocessingML.
    #[error("XML error: {0}")]
    Xml(String),

    /// A required package part is missing or unusable.
    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    /// Error reading a PDF source.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// Invalid configuration file or value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected fault while walking the source body.
    #[error("{0}")]
    Processing(String),
}

/// Failure taxonomy exposed to front-ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TemplateNotFound,
    SourceNotFound,
    UnsupportedFormat,
    /// Never produced by [`Error::kind`]; see `engine::Degradation`.
    DateParseDegraded,
    SaveFailed,
    GenericProcessingFailure,
}

impl Error {
    /// Classify this error into the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TemplateNotFound(_) => ErrorKind::TemplateNotFound,
            Error::SourceNotFound(_) => ErrorKind::SourceNotFound,
            Error::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Error::SaveFailed(_) => ErrorKind::SaveFailed,
            Error::Io(_)
            | Error::Zip(_)
            | Error::Xml(_)
            | Error::InvalidPackage(_)
            | Error::PdfParse(_)
            | Error::Config(_)
            | Error::Processing(_) => ErrorKind::GenericProcessingFailure,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Zip(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TemplateNotFound(PathBuf::from("missing.docx"));
        assert_eq!(err.to_string(), "Template not found: missing.docx");

        let err = Error::UnsupportedFormat("txt".to_string());
        assert_eq!(err.to_string(), "Unsupported format: txt");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            Error::SourceNotFound(PathBuf::from("a.pdf")).kind(),
            ErrorKind::SourceNotFound
        );
        assert_eq!(
            Error::SaveFailed("disk full".into()).kind(),
            ErrorKind::SaveFailed
        );
        assert_eq!(
            Error::Xml("bad tag".into()).kind(),
            ErrorKind::GenericProcessingFailure
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::GenericProcessingFailure);
    }
}
