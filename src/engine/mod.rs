//! Reconstruction engine.
//!
//! Rebuilds raw text or a parsed source document inside a destination
//! template: the date is stamped first, then each block is classified and
//! restyled in source order, and every paragraph gets widow/orphan control.
//!
//! # Example
//!
//! ```no_run
//! use restyle::engine::{Reconstructor, ReconstructOptions};
//! use std::path::Path;
//!
//! fn main() -> restyle::Result<()> {
//!     let engine = Reconstructor::new(ReconstructOptions::default());
//!     let report = engine.build_from_text(
//!         "Date: 16/06/24\nINTRODUCTION\nSome text.",
//!         Path::new("template.docx"),
//!         Path::new("out.docx"),
//!     )?;
//!     println!("{} headings", report.headings);
//!     Ok(())
//! }
//! ```

mod options;
mod report;
mod style;
mod suppress;

pub use options::{DatePolicy, ErrorMode, ReconstructOptions};
pub use report::{BuildReport, Degradation};
pub use style::{BlockStyle, StylePolicy};
pub use suppress::DateLineFilter;

use crate::classify::{classify, Classification, ClassifierContext};
use crate::date::{self, ExtractedDate};
use crate::docx::WordDocument;
use crate::error::Result;
use crate::model::{Block, DocumentModel, InlineContent, Paragraph, TextRun};
use crate::source::{SourceContent, SourceRegistry};
use std::path::Path;

/// Drives a reconstruction into a destination document.
pub struct Reconstructor {
    options: ReconstructOptions,
    sources: SourceRegistry,
}

impl Reconstructor {
    /// Create an engine; source readers follow `options`.
    pub fn new(options: ReconstructOptions) -> Self {
        let sources = options.source_registry();
        Self { options, sources }
    }

    /// Replace the source readers.
    pub fn with_sources(mut self, sources: SourceRegistry) -> Self {
        self.sources = sources;
        self
    }

    pub fn options(&self) -> &ReconstructOptions {
        &self.options
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// Rebuild raw text inside `template` and save it to `output`.
    pub fn build_from_text(&self, raw: &str, template: &Path, output: &Path) -> Result<BuildReport> {
        let mut doc = WordDocument::load(template)?;
        let report = self.reconstruct_text(raw, &mut doc);
        self.finish(doc, output, report)
    }

    /// Rebuild the document at `source` inside `template` and save it to `output`.
    pub fn build_from_document(
        &self,
        source: &Path,
        template: &Path,
        output: &Path,
    ) -> Result<BuildReport> {
        let mut doc = WordDocument::load(template)?;
        let content = self.sources.read(source)?;
        let report = self.reconstruct_content(&content, &mut doc);
        self.finish(doc, output, report)
    }

    /// Rebuild raw text into `dest`, one paragraph per non-blank line.
    pub fn reconstruct_text<D: DocumentModel>(&self, raw: &str, dest: &mut D) -> BuildReport {
        let mut report = BuildReport::new();
        let found = self.place_date(raw, dest, &mut report);
        let mut filter = DateLineFilter::new(found.as_ref());
        let mut ctx = ClassifierContext::new();

        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if filter.should_skip(line) {
                log::debug!("Suppressed date line: {}", line.trim());
                continue;
            }

            let label = classify(line, &ctx);
            ctx.observe(line, label);
            log::debug!("{:?}: {}", label, line.trim());

            dest.push_paragraph(style::text_paragraph(line.trim(), self.options.styles.for_text(label)));
            report.record(label);
        }

        report.suppressed_date_line = filter.suppressed();
        dest.apply_widow_control();
        log::info!(
            "Rebuilt {} paragraphs from text ({} headings, {} subheadings)",
            report.paragraphs,
            report.headings,
            report.subheadings
        );
        report
    }

    /// Rebuild a parsed source into `dest`.
    pub fn reconstruct_content<D: DocumentModel>(&self, content: &SourceContent, dest: &mut D) -> BuildReport {
        self.rebuild(content, dest, |_| {})
    }

    /// Rebuild a parsed source into `dest`, reporting each emitted body block
    /// to `on_step` in output order. The date paragraph is not a step.
    pub(crate) fn rebuild<D, F>(
        &self,
        content: &SourceContent,
        dest: &mut D,
        mut on_step: F,
    ) -> BuildReport
    where
        D: DocumentModel,
        F: FnMut(Step<'_>),
    {
        let mut report = BuildReport::new();
        let found = self.place_date(&content.plain_text(), dest, &mut report);
        let mut filter = DateLineFilter::new(found.as_ref());

        match content {
            SourceContent::Structured(doc) => {
                self.copy_blocks(&doc.blocks, dest, &mut filter, &mut report, &mut on_step)
            }
            SourceContent::PageOriented(text) => {
                self.copy_page_text(text, dest, &mut filter, &mut report, &mut on_step);
                report.degrade(Degradation::PageOrientedSource);
            }
        }

        report.suppressed_date_line = filter.suppressed();
        dest.apply_widow_control();
        log::info!(
            "Rebuilt {} paragraphs, {} tables and {} images",
            report.paragraphs,
            report.tables,
            report.images
        );
        report
    }

    /// Walk structured blocks in body order.
    fn copy_blocks<D: DocumentModel, F: FnMut(Step<'_>)>(
        &self,
        blocks: &[Block],
        dest: &mut D,
        filter: &mut DateLineFilter,
        report: &mut BuildReport,
        on_step: &mut F,
    ) {
        let mut ctx = ClassifierContext::new();

        for block in blocks {
            match block {
                Block::Table(table) => {
                    log::debug!("Table: {}x{}", table.row_count(), table.column_count());
                    dest.push_table(style::copy_table(table));
                    report.tables += 1;
                    on_step(Step::Table {
                        rows: table.row_count(),
                        columns: table.column_count(),
                    });
                }
                Block::Paragraph(paragraph) if paragraph.has_drawing() => {
                    let drawings = paragraph
                        .content
                        .iter()
                        .filter(|c| matches!(c, InlineContent::Drawing(_)))
                        .count();
                    log::debug!("Paragraph with {} drawings", drawings);
                    dest.push_paragraph(style::copy_paragraph(paragraph));
                    report.images += drawings;
                    report.paragraphs += 1;
                    on_step(Step::Image { drawings });
                }
                Block::Paragraph(paragraph) => {
                    let text = paragraph.plain_text();
                    if text.trim().is_empty() {
                        continue;
                    }
                    if filter.should_skip(&text) {
                        log::debug!("Suppressed date paragraph: {}", text.trim());
                        continue;
                    }

                    let label = classify(&text, &ctx);
                    ctx.observe(&text, label);
                    log::debug!("{:?}: {}", label, text.trim());

                    let style = self.options.styles.for_document(label);
                    dest.push_paragraph(style::restyle_paragraph(paragraph, style));
                    report.record(label);
                    on_step(Step::Text { label, text: &text });
                }
            }
        }
    }

    /// Split page text on blank lines and restyle each paragraph.
    fn copy_page_text<D: DocumentModel, F: FnMut(Step<'_>)>(
        &self,
        text: &str,
        dest: &mut D,
        filter: &mut DateLineFilter,
        report: &mut BuildReport,
        on_step: &mut F,
    ) {
        let mut ctx = ClassifierContext::new();

        for chunk in split_paragraphs(text) {
            let lines: Vec<&str> = chunk
                .iter()
                .copied()
                .filter(|line| {
                    let skip = filter.should_skip(line);
                    if skip {
                        log::debug!("Suppressed date line: {}", line.trim());
                    }
                    !skip
                })
                .collect();
            if lines.is_empty() {
                continue;
            }

            let joined = lines.join("\n");
            let label = classify(&joined, &ctx);
            ctx.observe(&joined, label);
            log::debug!("{:?}: {}", label, joined.trim());

            let style = self.options.styles.for_document(label);
            dest.push_paragraph(style::lines_paragraph(lines.iter().map(|l| l.trim()), style));
            report.record(label);
            on_step(Step::Text { label, text: &joined });
        }
    }

    /// Stamp the date paragraph at the top of `dest` according to the date policy.
    fn place_date<D: DocumentModel>(
        &self,
        text: &str,
        dest: &mut D,
        report: &mut BuildReport,
    ) -> Option<ExtractedDate> {
        let found = date::extract(text);
        let stamp = match (&found, self.options.date_policy) {
            (Some(found), _) => found.clone(),
            (None, DatePolicy::AlwaysStamp) => ExtractedDate::stamped(chrono::Local::now().date_naive()),
            (None, DatePolicy::Detected) => {
                log::debug!("No date in the leading lines");
                return None;
            }
        };

        if stamp.degraded {
            report.degrade(Degradation::DateParseDegraded {
                raw: stamp.display.clone(),
            });
        }

        let style = &self.options.styles.date;
        let mut paragraph = Paragraph::new();
        paragraph.style = style.paragraph_style();
        paragraph.add_run(TextRun::styled(stamp.display.as_str(), style.run_style(false)));
        dest.set_leading_paragraph(paragraph);
        log::debug!("Date paragraph: {}", stamp.display);

        report.date = Some(stamp.display);
        found
    }

    fn finish(&self, mut doc: WordDocument, output: &Path, mut report: BuildReport) -> Result<BuildReport> {
        if let Some(margins) = &self.options.margins {
            doc.set_margins(margins);
        }
        doc.save(output)?;
        log::info!("Saved {}", output.display());
        report.output = Some(output.to_path_buf());
        Ok(report)
    }
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new(ReconstructOptions::default())
    }
}

/// A body block emitted during a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step<'a> {
    /// Classified text paragraph
    Text { label: Classification, text: &'a str },
    Table { rows: usize, columns: usize },
    /// Paragraph carried over for its drawings
    Image { drawings: usize },
}

/// Non-blank lines grouped into paragraphs at blank-line boundaries.
fn split_paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut paragraphs = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alignment, Document, Drawing, Paragraph, Rgb, Table};

    fn texts(doc: &Document) -> Vec<String> {
        doc.blocks.iter().map(Block::plain_text).collect()
    }

    fn paragraph(doc: &Document, index: usize) -> &Paragraph {
        doc.blocks[index].as_paragraph().unwrap()
    }

    #[test]
    fn test_text_date_and_heading() {
        let engine = Reconstructor::default();
        let mut doc = Document::new();
        let report = engine.reconstruct_text("Date: 16/06/24\nINTRODUCTION\nThis is body text.", &mut doc);

        assert_eq!(texts(&doc), vec!["Jun 16, 2024", "INTRODUCTION", "This is body text."]);
        assert_eq!(report.date.as_deref(), Some("Jun 16, 2024"));
        assert!(report.suppressed_date_line);
        assert_eq!(report.paragraphs, 2);
        assert_eq!(report.headings, 1);

        let date = paragraph(&doc, 0);
        assert_eq!(date.style.alignment, Some(Alignment::Right));
        let run = date.runs().next().unwrap();
        assert!(run.style.bold);
        assert_eq!(run.style.font_size, Some(12.0));

        let heading = paragraph(&doc, 1);
        assert!(heading.style.keep_with_next);
        assert_eq!(heading.style.alignment, Some(Alignment::Center));
        assert_eq!(heading.runs().next().unwrap().style.font_size, Some(14.0));

        let body = paragraph(&doc, 2);
        assert!(!body.style.keep_with_next);
        assert_eq!(body.style.alignment, Some(Alignment::Justify));
        assert!(doc.paragraphs().all(|p| p.style.widow_control));
    }

    #[test]
    fn test_text_without_date() {
        let engine = Reconstructor::default();
        let mut doc = Document::new();
        let report = engine.reconstruct_text("hello world\n\n   \nsecond line", &mut doc);

        assert_eq!(texts(&doc), vec!["hello world", "second line"]);
        assert!(report.date.is_none());
        assert!(!report.suppressed_date_line);
    }

    #[test]
    fn test_always_stamp_without_date() {
        let engine = Reconstructor::new(ReconstructOptions::new().always_stamp_date());
        let mut doc = Document::new();
        let report = engine.reconstruct_text("hello world", &mut doc);

        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(report.date.as_deref(), Some(texts(&doc)[0].as_str()));
        assert!(!report.suppressed_date_line);
    }

    #[test]
    fn test_subheading_after_heading() {
        let engine = Reconstructor::default();
        let mut doc = Document::new();
        let report = engine.reconstruct_text("OVERVIEW\n(a) Scope of work\nplain prose follows here", &mut doc);

        assert_eq!(report.headings, 1);
        assert_eq!(report.subheadings, 1);
        let sub = paragraph(&doc, 1);
        assert!(sub.style.keep_with_next);
        assert_eq!(sub.runs().next().unwrap().style.font_size, Some(13.0));
    }

    #[test]
    fn test_degraded_date_still_suppressed() {
        let engine = Reconstructor::default();
        let mut doc = Document::new();
        let report = engine.reconstruct_text("Date: 31/02/2024\nbody text here", &mut doc);

        assert!(report.suppressed_date_line);
        assert!(report
            .degradations
            .iter()
            .any(|d| matches!(d, Degradation::DateParseDegraded { .. })));
        assert_eq!(texts(&doc)[1], "body text here");
    }

    #[test]
    fn test_structured_order_and_tables() {
        let mut source = Document::new();
        source.push_paragraph(Paragraph::with_text("Date: 05/01/2024"));
        source.push_paragraph(Paragraph::with_text("SUMMARY"));
        source.push_table(Table::with_size(2, 2));
        source.push_paragraph(Paragraph::new());
        source.push_paragraph(Paragraph::with_text("Closing words."));
        let mut image = Paragraph::new();
        image.add_drawing(Drawing::new("<w:drawing/>"));
        source.push_paragraph(image);

        let engine = Reconstructor::default();
        let mut dest = Document::new();
        let report = engine.reconstruct_content(&SourceContent::Structured(source), &mut dest);

        assert_eq!(dest.blocks.len(), 5);
        assert_eq!(texts(&dest)[0], "Jan 05, 2024");
        assert_eq!(texts(&dest)[1], "SUMMARY");
        assert!(dest.blocks[2].is_table());
        assert_eq!(texts(&dest)[3], "Closing words.");
        assert!(paragraph(&dest, 4).has_drawing());

        assert_eq!(report.tables, 1);
        assert_eq!(report.images, 1);
        assert!(report.suppressed_date_line);
        assert!(!report.is_degraded());
        assert_eq!(paragraph(&dest, 3).style.alignment, Some(Alignment::Left));
        assert!(paragraph(&dest, 3).runs().all(|r| r.style.color == Some(Rgb::BLACK)));
    }

    #[test]
    fn test_page_text_degrades() {
        let text = "Date: 16/06/24\nDear reader,\n\nINTRODUCTION\n\nFirst line\nsecond line";
        let engine = Reconstructor::default();
        let mut dest = Document::new();
        let report = engine.reconstruct_content(&SourceContent::PageOriented(text.to_string()), &mut dest);

        assert_eq!(
            texts(&dest),
            vec!["Jun 16, 2024", "Dear reader,", "INTRODUCTION", "First line\nsecond line"]
        );
        assert_eq!(report.degradations, vec![Degradation::PageOrientedSource]);
        assert_eq!(report.tables, 0);
        assert_eq!(report.headings, 1);
    }

    #[test]
    fn test_split_paragraphs() {
        let chunks = split_paragraphs("a\nb\n\n\n c \n\n");
        assert_eq!(chunks, vec![vec!["a", "b"], vec![" c "]]);
    }

    #[test]
    fn test_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let err = Reconstructor::default()
            .build_from_text("x", &dir.path().join("missing.docx"), &dir.path().join("out.docx"))
            .unwrap_err();
        assert!(matches!(err, crate::Error::TemplateNotFound(_)));
        assert!(!dir.path().join("out.docx").exists());
    }
}
