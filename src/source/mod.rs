//! Source readers providing a plugin architecture for input formats.
//!
//! A [`SourceReader`] turns a file into either a structured body (ordered
//! paragraphs and tables with their styling) or flat page text. The
//! [`SourceRegistry`] dispatches on file extension.
//!
//! # Example
//!
//! ```no_run
//! use restyle::source::SourceRegistry;
//! use std::path::Path;
//!
//! fn main() -> restyle::Result<()> {
//!     let registry = SourceRegistry::with_defaults();
//!     let content = registry.read(Path::new("letter.docx"))?;
//!     println!("{}", content.plain_text());
//!     Ok(())
//! }
//! ```

mod backend;
mod cleanup;
mod docx;
mod pdf;

pub use backend::{LopdfBackend, PdfBackend};
pub use cleanup::{CleanupOptions, CleanupPipeline};
pub use docx::DocxSource;
pub use pdf::PdfSource;

use crate::error::{Error, Result};
use crate::model::Document;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// What a source yields.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceContent {
    /// Ordered body blocks with their original styling.
    Structured(Document),

    /// Flattened text; paragraphs are separated by blank lines.
    PageOriented(String),
}

impl SourceContent {
    /// Text used for date detection and previews.
    pub fn plain_text(&self) -> String {
        match self {
            SourceContent::Structured(doc) => doc.plain_text(),
            SourceContent::PageOriented(text) => text.clone(),
        }
    }

    /// Check if the source kept its structure.
    pub fn is_structured(&self) -> bool {
        matches!(self, SourceContent::Structured(_))
    }
}

/// Trait for source readers.
///
/// Implement this trait to add support for a new input format.
pub trait SourceReader: Send + Sync {
    /// Get the supported file extensions for this reader.
    ///
    /// Extensions should be lowercase without the leading dot (e.g., `["pdf"]`).
    fn supported_extensions(&self) -> &[&str];

    /// Get the name of this reader.
    fn name(&self) -> &str;

    /// Read a file at the given path.
    fn read(&self, path: &Path) -> Result<SourceContent>;

    /// Read from bytes.
    fn read_bytes(&self, bytes: &[u8]) -> Result<SourceContent>;

    /// Check if this reader supports the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Registry for source readers.
pub struct SourceRegistry {
    readers: HashMap<String, Arc<dyn SourceReader>>,
    by_name: HashMap<String, Arc<dyn SourceReader>>,
}

impl SourceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            readers: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the default readers (Word and PDF).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DocxSource::new()));
        registry.register(Arc::new(PdfSource::new()));
        registry
    }

    /// Register a reader for all its supported extensions.
    ///
    /// A later registration replaces an earlier one for the same extension.
    pub fn register(&mut self, reader: Arc<dyn SourceReader>) {
        for ext in reader.supported_extensions() {
            self.readers.insert(ext.to_lowercase(), reader.clone());
        }
        self.by_name.insert(reader.name().to_lowercase(), reader);
    }

    /// Get a reader by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn SourceReader>> {
        self.readers.get(&ext.to_lowercase()).cloned()
    }

    /// Get a reader by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn SourceReader>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.readers.contains_key(&ext.to_lowercase())
    }

    /// Get all supported extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.readers.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }

    /// Read a file using the reader registered for its extension.
    pub fn read(&self, path: &Path) -> Result<SourceContent> {
        if !path.is_file() {
            return Err(Error::SourceNotFound(path.to_path_buf()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(format!("{} has no extension", path.display())))?;

        let reader = self
            .get_by_extension(ext)
            .ok_or_else(|| Error::UnsupportedFormat(format!("no reader for .{}", ext)))?;

        log::debug!("Reading {} with the {} reader", path.display(), reader.name());
        reader.read(path)
    }

    /// Read bytes using the extension to pick the reader.
    pub fn read_bytes(&self, bytes: &[u8], ext: &str) -> Result<SourceContent> {
        let ext = ext.trim_start_matches('.');
        let reader = self
            .get_by_extension(ext)
            .ok_or_else(|| Error::UnsupportedFormat(format!("no reader for .{}", ext)))?;

        reader.read_bytes(bytes)
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Plain text of a source file, as used for date detection.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(SourceRegistry::with_defaults().read(path.as_ref())?.plain_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Paragraph;

    #[test]
    fn test_registry_with_defaults() {
        let registry = SourceRegistry::with_defaults();
        assert!(registry.supports("docx"));
        assert!(registry.supports("DOC"));
        assert!(registry.supports("pdf"));
        assert!(!registry.supports("txt"));
        assert_eq!(registry.supported_extensions(), vec!["doc", "docx", "pdf"]);
    }

    #[test]
    fn test_registry_get_by_name() {
        let registry = SourceRegistry::with_defaults();
        assert_eq!(registry.get_by_name("PDF").map(|r| r.name().to_string()), Some("pdf".to_string()));
        assert!(registry.get_by_extension("docx").is_some());
    }

    #[test]
    fn test_missing_source() {
        let registry = SourceRegistry::with_defaults();
        let err = registry.read(Path::new("no/such/file.docx")).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let err = SourceRegistry::with_defaults().read(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_plain_text_of_content() {
        let doc = Document::from_blocks(vec![
            Paragraph::with_text("first").into(),
            Paragraph::new().into(),
            Paragraph::with_text("second").into(),
        ]);
        let content = SourceContent::Structured(doc);
        assert!(content.is_structured());
        assert_eq!(content.plain_text(), "first\nsecond");

        let flat = SourceContent::PageOriented("a\n\nb".to_string());
        assert!(!flat.is_structured());
        assert_eq!(flat.plain_text(), "a\n\nb");
    }
}
