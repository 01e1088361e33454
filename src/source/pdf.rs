//! PDF source: flattened page text only.

use super::backend::{LopdfBackend, PdfBackend};
use super::cleanup::CleanupPipeline;
use super::{SourceContent, SourceReader};
use crate::error::{Error, Result};
use std::path::Path;

/// Separator placed between the text of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Page-oriented source backed by [`LopdfBackend`].
///
/// Tables and images are not recovered: the result is the text of every
/// page, joined by a blank line.
#[derive(Debug, Clone)]
pub struct PdfSource {
    cleanup: Option<CleanupPipeline>,
    lenient: bool,
}

impl Default for PdfSource {
    fn default() -> Self {
        Self {
            cleanup: Some(CleanupPipeline::default()),
            lenient: false,
        }
    }
}

impl PdfSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cleanup pipeline, or `None` to keep the raw extraction.
    pub fn with_cleanup(mut self, cleanup: Option<CleanupPipeline>) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Skip pages whose text cannot be extracted instead of failing.
    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Concatenate the text of every page.
    pub fn extract<B: PdfBackend>(&self, backend: &B) -> Result<String> {
        if backend.is_encrypted() {
            return Err(Error::UnsupportedFormat("encrypted PDF".to_string()));
        }

        let mut pages = Vec::new();
        for number in backend.page_numbers() {
            match backend.page_text(number) {
                Ok(text) => pages.push(text.trim_end().to_string()),
                Err(e) if self.lenient => {
                    log::warn!("Skipping page {}: {}", number, e);
                }
                Err(e) => return Err(e),
            }
        }
        log::debug!("Extracted text from {} PDF pages", pages.len());

        Ok(match &self.cleanup {
            Some(pipeline) => pipeline.process_pages(pages.as_slice(), PAGE_SEPARATOR),
            None => pages.join(PAGE_SEPARATOR),
        })
    }
}

impl SourceReader for PdfSource {
    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn name(&self) -> &str {
        "pdf"
    }

    fn read(&self, path: &Path) -> Result<SourceContent> {
        let backend = LopdfBackend::load_file(path)?;
        Ok(SourceContent::PageOriented(self.extract(&backend)?))
    }

    fn read_bytes(&self, bytes: &[u8]) -> Result<SourceContent> {
        let backend = LopdfBackend::load_bytes(bytes)?;
        Ok(SourceContent::PageOriented(self.extract(&backend)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockBackend {
        pages: Vec<Option<&'static str>>,
    }

    impl PdfBackend for MockBackend {
        fn page_numbers(&self) -> Vec<u32> {
            (1..=self.pages.len() as u32).collect()
        }

        fn page_text(&self, page: u32) -> Result<String> {
            self.pages[page as usize - 1]
                .map(str::to_string)
                .ok_or_else(|| Error::PdfParse(format!("Page {}: broken stream", page)))
        }
    }

    #[test]
    fn test_pages_joined_by_blank_line() {
        let backend = MockBackend {
            pages: vec![Some("First page\n"), Some("Second page\n")],
        };
        let text = PdfSource::new().with_cleanup(None).extract(&backend).unwrap();
        assert_eq!(text, "First page\n\nSecond page");
    }

    #[test]
    fn test_strict_fails_on_bad_page() {
        let backend = MockBackend {
            pages: vec![Some("ok"), None],
        };
        assert!(matches!(PdfSource::new().extract(&backend), Err(Error::PdfParse(_))));
    }

    #[test]
    fn test_lenient_skips_bad_page() {
        let backend = MockBackend {
            pages: vec![Some("one"), None, Some("three")],
        };
        let text = PdfSource::new().with_lenient(true).extract(&backend).unwrap();
        assert_eq!(text, "one\n\nthree");
    }

    #[test]
    fn test_cleanup_applied() {
        let backend = MockBackend {
            pages: vec![Some("\u{FB01}nal   report")],
        };
        assert_eq!(PdfSource::new().extract(&backend).unwrap(), "final report");
    }

    #[test]
    fn test_page_footer_numbers_removed() {
        let backend = MockBackend {
            pages: vec![Some("Revenue\n250\nup from last year\n\n1\n"), Some("Outlook\n\n- 2 -\n")],
        };
        assert_eq!(
            PdfSource::new().extract(&backend).unwrap(),
            "Revenue\n250\nup from last year\n\nOutlook"
        );
    }
}
