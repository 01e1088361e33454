//! Style policy: how each kind of paragraph is written.

use crate::classify::Classification;
use crate::model::{
    Alignment, InlineContent, Paragraph, ParagraphStyle, Rgb, Table, TableCell, TableRow, TextRun,
    TextStyle,
};
use serde::{Deserialize, Serialize};

/// Formatting applied to one kind of paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockStyle {
    /// Run size in points
    pub font_size: f32,
    pub bold: bool,
    pub underline: bool,
    pub alignment: Alignment,

    /// Space after the paragraph in points
    pub space_after: f32,
    pub keep_with_next: bool,
}

impl Default for BlockStyle {
    fn default() -> Self {
        Self::body(Alignment::Left)
    }
}

impl BlockStyle {
    /// 14pt bold underlined, centered, kept with the next paragraph.
    pub fn heading() -> Self {
        Self {
            font_size: 14.0,
            bold: true,
            underline: true,
            alignment: Alignment::Center,
            space_after: 18.0,
            keep_with_next: true,
        }
    }

    /// 13pt bold underlined, centered, kept with the next paragraph.
    pub fn subheading() -> Self {
        Self {
            font_size: 13.0,
            space_after: 14.0,
            ..Self::heading()
        }
    }

    /// 12.5pt plain text.
    pub fn body(alignment: Alignment) -> Self {
        Self {
            font_size: 12.5,
            bold: false,
            underline: false,
            alignment,
            space_after: 12.0,
            keep_with_next: false,
        }
    }

    /// 12pt bold, right-aligned.
    pub fn date() -> Self {
        Self {
            font_size: 12.0,
            bold: true,
            underline: false,
            alignment: Alignment::Right,
            space_after: 12.0,
            keep_with_next: false,
        }
    }

    /// Paragraph properties for this style.
    pub fn paragraph_style(&self) -> ParagraphStyle {
        ParagraphStyle {
            alignment: Some(self.alignment),
            space_after: Some(self.space_after),
            keep_with_next: self.keep_with_next,
            ..ParagraphStyle::default()
        }
    }

    /// Run properties for this style, keeping the source's italic flag.
    pub fn run_style(&self, italic: bool) -> TextStyle {
        TextStyle {
            bold: self.bold,
            italic,
            underline: self.underline,
            font_name: None,
            font_size: Some(self.font_size),
            color: Some(Rgb::BLACK),
        }
    }
}

/// Styles for every classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePolicy {
    pub heading: BlockStyle,
    pub subheading: BlockStyle,

    /// Body paragraphs built from raw text
    pub text_body: BlockStyle,

    /// Body paragraphs copied from a source document
    pub document_body: BlockStyle,

    pub date: BlockStyle,
}

impl Default for StylePolicy {
    fn default() -> Self {
        Self {
            heading: BlockStyle::heading(),
            subheading: BlockStyle::subheading(),
            text_body: BlockStyle::body(Alignment::Justify),
            document_body: BlockStyle::body(Alignment::Left),
            date: BlockStyle::date(),
        }
    }
}

impl StylePolicy {
    /// Style for a paragraph built from raw text.
    pub fn for_text(&self, label: Classification) -> &BlockStyle {
        match label {
            Classification::Heading => &self.heading,
            Classification::Subheading => &self.subheading,
            Classification::Body => &self.text_body,
        }
    }

    /// Style for a paragraph copied from a source document.
    pub fn for_document(&self, label: Classification) -> &BlockStyle {
        match label {
            Classification::Heading => &self.heading,
            Classification::Subheading => &self.subheading,
            Classification::Body => &self.document_body,
        }
    }
}

/// A single-run paragraph.
pub fn text_paragraph(text: &str, style: &BlockStyle) -> Paragraph {
    let mut paragraph = Paragraph::new();
    paragraph.style = style.paragraph_style();
    paragraph.add_run(TextRun::styled(text, style.run_style(false)));
    paragraph
}

/// A paragraph with one run per line, separated by line breaks.
pub fn lines_paragraph<'a>(lines: impl IntoIterator<Item = &'a str>, style: &BlockStyle) -> Paragraph {
    let mut paragraph = Paragraph::new();
    paragraph.style = style.paragraph_style();
    for (i, line) in lines.into_iter().enumerate() {
        if i > 0 {
            paragraph.add_line_break();
        }
        paragraph.add_run(TextRun::styled(line, style.run_style(false)));
    }
    paragraph
}

/// Rewrite a source paragraph with `style`, run for run.
///
/// Line breaks and tabs are kept; italic comes from the source run.
pub fn restyle_paragraph(source: &Paragraph, style: &BlockStyle) -> Paragraph {
    let content = source
        .content
        .iter()
        .map(|item| match item {
            InlineContent::Text(run) => {
                InlineContent::Text(TextRun::styled(run.text.clone(), style.run_style(run.style.italic)))
            }
            other => other.clone(),
        })
        .collect();

    Paragraph {
        content,
        style: style.paragraph_style(),
    }
}

/// Copy run styling through unchanged except for a forced black color.
pub fn black_run_style(style: &TextStyle) -> TextStyle {
    TextStyle {
        color: Some(Rgb::BLACK),
        ..style.clone()
    }
}

/// Copy a paragraph as-is apart from black runs.
///
/// Only the alignment of the source paragraph survives; the template's styles
/// may not define the source's style ids.
pub fn copy_paragraph(source: &Paragraph) -> Paragraph {
    let content = source
        .content
        .iter()
        .map(|item| match item {
            InlineContent::Text(run) => {
                InlineContent::Text(TextRun::styled(run.text.clone(), black_run_style(&run.style)))
            }
            other => other.clone(),
        })
        .collect();

    Paragraph {
        content,
        style: ParagraphStyle {
            alignment: source.style.alignment,
            ..ParagraphStyle::default()
        },
    }
}

/// Copy a table with the same grid, cell by cell.
pub fn copy_table(source: &Table) -> Table {
    let rows = source
        .rows
        .iter()
        .map(|row| {
            TableRow::new(
                row.cells
                    .iter()
                    .map(|cell| TableCell {
                        content: cell.content.iter().map(copy_paragraph).collect(),
                        grid_span: cell.grid_span,
                    })
                    .collect(),
            )
        })
        .collect();

    Table {
        rows,
        column_widths: source.column_widths.clone(),
    }
}
