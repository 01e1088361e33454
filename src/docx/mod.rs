//! WordprocessingML (`.docx`) document model.
//!
//! A [`WordDocument`] keeps every package part of the file it was loaded from
//! and exposes the body as an ordered block list. Saving rewrites only body
//! blocks that were added or changed (plus any media that drawings pulled in).
//! Untouched template blocks, styles, headers, footers and section properties
//! pass through as they were.

mod body;
mod package;
mod reader;
mod rels;
mod section;
mod template;
mod writer;

use std::path::Path;

pub use package::Package;
pub use rels::{Relationship, Relationships};
pub use section::{Margins, TWIPS_PER_INCH};
pub use template::TemplateOptions;

use crate::error::{Error, Result};
use crate::model::{Block, Document, DocumentModel};

/// Main document part.
pub const DOCUMENT_XML: &str = "word/document.xml";

/// A loaded Word document.
#[derive(Debug, Clone)]
pub struct WordDocument {
    package: Package,
    prolog: String,
    blocks: Vec<Block>,
    sect_pr: Option<String>,
    epilog: String,
    retained: body::RetainedBody,
}

impl WordDocument {
    /// Load a document to write into; a missing file is `TemplateNotFound`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::TemplateNotFound(path.to_path_buf()));
        }
        log::debug!("Loading template {}", path.display());
        Self::from_package(Package::open(path)?)
    }

    /// Parse a document from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(data)?)
    }

    /// Parse the body of a package.
    pub fn from_package(package: Package) -> Result<Self> {
        let xml = package.require_str(DOCUMENT_XML)?;
        let rels = match package.part_str(rels::DOCUMENT_RELS)? {
            Some(rels_xml) => Relationships::parse(&rels_xml)?,
            None => Relationships::new(),
        };

        let body = reader::parse_document(&xml, &rels, &package)?;
        let retained = body::RetainedBody::new(&body.blocks, body.raw, body.tail, body.trailer);
        Ok(Self {
            package,
            prolog: body.prolog,
            blocks: body.blocks,
            sect_pr: body.sect_pr,
            epilog: body.epilog,
            retained,
        })
    }

    /// A blank document: one empty paragraph, default styles, optional
    /// header and footer.
    pub fn blank(options: &TemplateOptions) -> Result<Self> {
        Self::from_package(template::blank_package(options))
    }

    /// The underlying package as loaded (body changes are not reflected).
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Raw body-level section properties.
    pub fn section_properties(&self) -> Option<&str> {
        self.sect_pr.as_deref()
    }

    /// Page margins of the body section, if declared.
    pub fn margins(&self) -> Option<Margins> {
        self.sect_pr.as_deref().and_then(section::read_margins)
    }

    /// Set the page margins of the body section.
    pub fn set_margins(&mut self, margins: &Margins) {
        self.sect_pr = Some(match self.sect_pr.as_deref() {
            Some(sect) => section::apply_margins(sect, margins),
            None => section::default_section(margins, ""),
        });
    }

    /// Copy of the body as a plain [`Document`].
    pub fn to_document(&self) -> Document {
        Document::from_blocks(self.blocks.clone())
    }

    /// Consume into the body as a plain [`Document`].
    pub fn into_document(self) -> Document {
        Document::from_blocks(self.blocks)
    }

    /// Build the package with the current body.
    pub fn to_package(&self) -> Result<Package> {
        let mut package = self.package.clone();
        let mut rels = match package.part_str(rels::DOCUMENT_RELS)? {
            Some(xml) => Relationships::parse(&xml)?,
            None => Relationships::new(),
        };
        let mut content_types = package.require_str(rels::CONTENT_TYPES)?;

        let body = {
            let mut media = writer::MediaRegistry::new(&mut package, &mut rels, &mut content_types);
            let body = self.retained.write(&self.blocks, self.sect_pr.as_deref(), &mut media);
            if media.registered() > 0 {
                log::debug!("Copied {} media parts into the package", media.registered());
            }
            body
        };

        let mut xml = String::with_capacity(self.prolog.len() + body.len() + self.epilog.len() + 512);
        xml.push_str(&self.prolog);
        xml.push_str(&body);
        xml.push_str(&self.epilog);

        package.set_part(DOCUMENT_XML, xml);
        if !rels.is_empty() {
            package.set_part(rels::DOCUMENT_RELS, rels.to_xml());
        }
        package.set_part(rels::CONTENT_TYPES, content_types);
        Ok(package)
    }

    /// Serialize to `.docx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_package()?.to_bytes()
    }

    /// Save atomically to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_package()?.save_atomic(path)
    }
}

impl DocumentModel for WordDocument {
    fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, Table, TableCell, TableRow};

    #[test]
    fn test_missing_template() {
        let err = WordDocument::load("definitely/not/here.docx").unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound(_)));
    }

    #[test]
    fn test_blank_starts_with_empty_paragraph() {
        let doc = WordDocument::blank(&TemplateOptions::default()).unwrap();
        assert_eq!(doc.blocks().len(), 1);
        assert!(doc.blocks()[0].as_paragraph().unwrap().is_empty());
        assert_eq!(doc.margins(), Some(Margins::uniform(1.0)));
    }

    #[test]
    fn test_bytes_reload_preserves_body() {
        let mut doc = WordDocument::blank(&TemplateOptions::new().with_footer("Confidential")).unwrap();
        doc.push_paragraph(Paragraph::with_text("Hello"));
        let mut table = Table::new();
        table.add_row(TableRow::from_strings(["a", "b"]));
        table.add_row(TableRow::new(vec![TableCell::text("c"), TableCell::text("d")]));
        doc.push_table(table);
        doc.push_paragraph(Paragraph::with_text("Bye"));

        let reloaded = WordDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        let texts: Vec<String> = reloaded.blocks().iter().map(Block::plain_text).collect();
        assert_eq!(texts, vec!["", "Hello", "a\tb\nc\td", "Bye"]);
        assert!(reloaded.package().has_part("word/footer1.xml"));
        assert!(reloaded.section_properties().unwrap().contains("footerReference"));
    }

    #[test]
    fn test_template_markup_survives_save() {
        let template = WordDocument::blank(&TemplateOptions::default()).unwrap();
        let mut package = template.package().clone();
        let xml = package.require_str(DOCUMENT_XML).unwrap();
        let body_start = xml.find("<w:body>").unwrap() + "<w:body>".len();
        let letterhead = r#"<w:p><w:pPr><w:ind w:left="720"/></w:pPr><w:hyperlink w:anchor="top"><w:r><w:rPr><w:highlight w:val="yellow"/></w:rPr><w:t>ACME</w:t></w:r></w:hyperlink></w:p>"#;
        let custom = format!("{}<w:p/>{}{}", &xml[..body_start], letterhead, &xml[body_start..]);
        package.set_part(DOCUMENT_XML, custom);

        let mut doc = WordDocument::from_package(package).unwrap();
        doc.push_paragraph(Paragraph::with_text("Appended"));
        let saved = doc.to_package().unwrap().require_str(DOCUMENT_XML).unwrap();

        assert!(saved.contains(letterhead));
        let reloaded = WordDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        let texts: Vec<String> = reloaded.blocks().iter().map(Block::plain_text).collect();
        assert_eq!(texts, vec!["", "ACME", "", "Appended"]);
    }

    #[test]
    fn test_set_margins() {
        let mut doc = WordDocument::blank(&TemplateOptions::default()).unwrap();
        doc.set_margins(&Margins::classic());
        let reloaded = WordDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(reloaded.margins(), Some(Margins::classic()));
    }
}
