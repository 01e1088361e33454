//! # restyle
//!
//! Template-driven document reconstruction.
//!
//! This library takes free-form text or an existing Word/PDF document and
//! rebuilds it inside a Word template with a fixed style policy: the date is
//! normalized and moved to the top, headings and subheadings are detected
//! and styled, tables and inline images are carried over in body order, and
//! every paragraph gets pagination hints.
//!
//! ## Quick Start
//!
//! ```no_run
//! use restyle::build_from_text;
//!
//! fn main() -> restyle::Result<()> {
//!     let report = build_from_text(
//!         "Date: 16/06/24\nINTRODUCTION\nThis is the body.",
//!         "template.docx",
//!         "letter.docx",
//!     )?;
//!     println!("Date: {:?}, headings: {}", report.date, report.headings);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Heading detection**: crude but predictable plain-text heuristics
//! - **Date normalization**: several input formats, `Mon DD, YYYY` output
//! - **Structure preservation**: interleaved tables and inline images from `.docx`
//! - **PDF input**: page text with cleanup, reported as a degraded source
//! - **Atomic output**: a failed build never leaves a file behind

pub mod classify;
pub mod convert;
pub mod date;
pub mod docx;
pub mod engine;
pub mod error;
pub mod model;
pub mod render;
pub mod source;

// Re-export commonly used types
pub use classify::{Classification, ClassifierContext};
pub use date::ExtractedDate;
pub use docx::{Margins, TemplateOptions, WordDocument};
pub use engine::{
    BlockStyle, BuildReport, DatePolicy, Degradation, ErrorMode, ReconstructOptions,
    Reconstructor, StylePolicy,
};
pub use error::{Error, ErrorKind, Result};
pub use model::{
    Alignment, Block, Document, DocumentModel, Drawing, InlineContent, Paragraph, ParagraphStyle,
    Rgb, Table, TableCell, TableRow, TextRun, TextStyle,
};
pub use render::JsonFormat;
pub use source::{SourceContent, SourceReader, SourceRegistry};

use std::path::{Path, PathBuf};

/// Rebuild raw text inside a template and save the result.
///
/// # Example
///
/// ```no_run
/// use restyle::build_from_text;
///
/// let report = build_from_text("OVERVIEW\nSome text.", "template.docx", "out.docx").unwrap();
/// assert_eq!(report.headings, 1);
/// ```
pub fn build_from_text<T: AsRef<Path>, O: AsRef<Path>>(
    raw: &str,
    template: T,
    output: O,
) -> Result<BuildReport> {
    Reconstructor::default().build_from_text(raw, template.as_ref(), output.as_ref())
}

/// Rebuild a `.docx` or `.pdf` document inside a template and save the result.
pub fn build_from_document<S: AsRef<Path>, T: AsRef<Path>, O: AsRef<Path>>(
    source: S,
    template: T,
    output: O,
) -> Result<BuildReport> {
    Reconstructor::default().build_from_document(source.as_ref(), template.as_ref(), output.as_ref())
}

/// Extract the plain text a source yields.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    source::extract_text(path)
}

/// Classified outline of a source, one line per rebuilt block.
pub fn preview<P: AsRef<Path>>(path: P) -> Result<String> {
    let content = SourceRegistry::with_defaults().read(path.as_ref())?;
    Ok(render::to_outline(&content))
}

/// Write a blank template to `path`.
pub fn init_template<P: AsRef<Path>>(path: P, options: &TemplateOptions) -> Result<()> {
    WordDocument::blank(options)?.save(path)
}

/// Builder-style API for reconstruction.
///
/// # Example
///
/// ```no_run
/// use restyle::{Margins, Restyle};
///
/// let report = Restyle::new()
///     .with_template("template.docx")
///     .with_margins(Margins::classic())
///     .always_stamp_date()
///     .build_document("input.docx", "output.docx")?;
/// # Ok::<(), restyle::Error>(())
/// ```
pub struct Restyle {
    template: PathBuf,
    options: ReconstructOptions,
}

impl Restyle {
    /// Create a new builder using `template.docx` in the working directory.
    pub fn new() -> Self {
        Self {
            template: PathBuf::from(convert::DEFAULT_TEMPLATE_NAME),
            options: ReconstructOptions::default(),
        }
    }

    /// Set the destination template.
    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = template.into();
        self
    }

    /// Replace all options.
    pub fn with_options(mut self, options: ReconstructOptions) -> Self {
        self.options = options;
        self
    }

    /// Set page margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.options = self.options.with_margins(margins);
        self
    }

    /// Always stamp a date, falling back to today.
    pub fn always_stamp_date(mut self) -> Self {
        self.options = self.options.always_stamp_date();
        self
    }

    /// Keep raw PDF text without cleanup.
    pub fn raw_pdf_text(mut self) -> Self {
        self.options = self.options.with_pdf_cleanup(false);
        self
    }

    /// Skip unreadable PDF pages.
    pub fn lenient(mut self) -> Self {
        self.options = self.options.lenient();
        self
    }

    /// Rebuild raw text.
    pub fn build_text<P: AsRef<Path>>(self, raw: &str, output: P) -> Result<BuildReport> {
        Reconstructor::new(self.options).build_from_text(raw, &self.template, output.as_ref())
    }

    /// Rebuild a source document.
    pub fn build_document<S: AsRef<Path>, P: AsRef<Path>>(self, source: S, output: P) -> Result<BuildReport> {
        Reconstructor::new(self.options).build_from_document(source.as_ref(), &self.template, output.as_ref())
    }
}

impl Default for Restyle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restyle_builder() {
        let builder = Restyle::new()
            .with_template("custom.docx")
            .with_margins(Margins::classic())
            .always_stamp_date()
            .lenient();

        assert_eq!(builder.template, PathBuf::from("custom.docx"));
        assert_eq!(builder.options.margins, Some(Margins::classic()));
        assert_eq!(builder.options.date_policy, DatePolicy::AlwaysStamp);
        assert_eq!(builder.options.error_mode, ErrorMode::Lenient);
    }

    #[test]
    fn test_missing_template_is_reported_first() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_from_document(
            dir.path().join("missing-source.docx"),
            dir.path().join("missing-template.docx"),
            dir.path().join("out.docx"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TemplateNotFound);
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.docx");
        init_template(&template, &TemplateOptions::default()).unwrap();

        let err = build_from_document(dir.path().join("missing.docx"), &template, dir.path().join("out.docx"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceNotFound);
        assert!(!dir.path().join("out.docx").exists());
    }

    #[test]
    fn test_build_from_text_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.docx");
        init_template(&template, &TemplateOptions::default()).unwrap();
        let output = dir.path().join("out.docx");

        let report = build_from_text("Date: 16/06/24\nHEADER\nbody", &template, &output).unwrap();
        assert_eq!(report.output.as_deref(), Some(output.as_path()));
        assert_eq!(report.date.as_deref(), Some("Jun 16, 2024"));

        let doc = WordDocument::load(&output).unwrap();
        let texts: Vec<String> = doc.blocks().iter().map(Block::plain_text).collect();
        assert_eq!(texts, vec!["Jun 16, 2024", "HEADER", "body"]);
    }
}
