//! PDF backend abstraction layer.
//!
//! Isolates the concrete PDF library (lopdf) from the page-oriented source,
//! which only ever needs page enumeration and per-page text.

use crate::error::{Error, Result};
use lopdf::Document as LopdfDocument;
use std::path::Path;

/// Abstract interface for PDF text access.
pub trait PdfBackend {
    /// Page numbers in reading order (1-based).
    fn page_numbers(&self) -> Vec<u32>;

    /// Extracted text of one page.
    fn page_text(&self, page: u32) -> Result<String>;

    /// Whether the document is encrypted.
    fn is_encrypted(&self) -> bool {
        false
    }
}

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Ok(Self { doc })
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self { doc })
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }
}

impl PdfBackend for LopdfBackend {
    fn page_numbers(&self) -> Vec<u32> {
        self.doc.get_pages().keys().copied().collect()
    }

    fn page_text(&self, page: u32) -> Result<String> {
        self.doc
            .extract_text(&[page])
            .map_err(|e| Error::PdfParse(format!("Page {}: {}", page, e)))
    }

    fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }
}
