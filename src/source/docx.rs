//! Word document source.

use super::{SourceContent, SourceReader};
use crate::docx::{Package, WordDocument};
use crate::error::Result;
use std::path::Path;

/// Structured source backed by the WordprocessingML reader.
///
/// `.doc` files are accepted when they are zip packages under a legacy
/// extension; real binary Word files are reported as unsupported.
#[derive(Debug, Clone, Default)]
pub struct DocxSource;

impl DocxSource {
    pub fn new() -> Self {
        Self
    }

    fn read_package(&self, package: Package) -> Result<SourceContent> {
        let doc = WordDocument::from_package(package)?.into_document();
        log::debug!("Structured source with {} body blocks", doc.blocks.len());
        Ok(SourceContent::Structured(doc))
    }
}

impl SourceReader for DocxSource {
    fn supported_extensions(&self) -> &[&str] {
        &["docx", "doc"]
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn read(&self, path: &Path) -> Result<SourceContent> {
        self.read_package(Package::open(path)?)
    }

    fn read_bytes(&self, bytes: &[u8]) -> Result<SourceContent> {
        self.read_package(Package::from_bytes(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::TemplateOptions;
    use crate::error::Error;
    use crate::model::{DocumentModel, Paragraph, Table};

    #[test]
    fn test_read_structured_bytes() {
        let mut doc = WordDocument::blank(&TemplateOptions::default()).unwrap();
        doc.push_paragraph(Paragraph::with_text("Intro"));
        doc.push_table(Table::with_size(2, 2));
        doc.push_paragraph(Paragraph::with_text("Outro"));

        let content = DocxSource::new().read_bytes(&doc.to_bytes().unwrap()).unwrap();
        match content {
            SourceContent::Structured(body) => {
                assert_eq!(body.blocks.len(), 4);
                assert!(body.blocks[2].is_table());
                assert_eq!(body.plain_text(), "Intro\nOutro");
            }
            other => panic!("expected structured content, got {other:?}"),
        }
    }

    #[test]
    fn test_binary_doc_rejected() {
        let ole = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0, 0, 0];
        let err = DocxSource::new().read_bytes(&ole).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }
}
