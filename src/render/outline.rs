//! Plain-text outline of how a source would be rebuilt.

use crate::classify::Classification;
use crate::engine::{DatePolicy, ReconstructOptions, Reconstructor, Step};
use crate::model::Document;
use crate::source::SourceContent;
use serde::Serialize;

/// Kind of an outline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineKind {
    Date,
    Heading,
    Subheading,
    Body,
    Table,
    Image,
}

impl OutlineKind {
    fn label(self) -> &'static str {
        match self {
            OutlineKind::Date => "date",
            OutlineKind::Heading => "heading",
            OutlineKind::Subheading => "subheading",
            OutlineKind::Body => "body",
            OutlineKind::Table => "table",
            OutlineKind::Image => "image",
        }
    }
}

impl From<Classification> for OutlineKind {
    fn from(label: Classification) -> Self {
        match label {
            Classification::Heading => OutlineKind::Heading,
            Classification::Subheading => OutlineKind::Subheading,
            Classification::Body => OutlineKind::Body,
        }
    }
}

/// One rebuilt block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub kind: OutlineKind,
    pub text: String,
}

impl OutlineEntry {
    fn new(kind: OutlineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Entries in output order: the detected date first, then each block with its
/// classification. The entries come from the same walk a build runs, so the
/// date's source line is left out just as it is there.
pub fn outline(content: &SourceContent) -> Vec<OutlineEntry> {
    let engine = Reconstructor::new(ReconstructOptions::default().with_date_policy(DatePolicy::Detected));
    let mut blocks = Vec::new();
    let report = engine.rebuild(content, &mut Document::new(), |step| {
        blocks.push(match step {
            Step::Text { label, text } => OutlineEntry::new(label.into(), text),
            Step::Table { rows, columns } => OutlineEntry::new(OutlineKind::Table, format!("{}x{}", rows, columns)),
            Step::Image { drawings } => OutlineEntry::new(OutlineKind::Image, format!("{} drawing(s)", drawings)),
        })
    });

    let mut entries = Vec::with_capacity(blocks.len() + 1);
    if let Some(date) = report.date {
        entries.push(OutlineEntry::new(OutlineKind::Date, date));
    }
    entries.extend(blocks);
    entries
}

/// Render the outline, one `kind  text` line per entry.
pub fn to_outline(content: &SourceContent) -> String {
    outline(content)
        .iter()
        .map(|entry| {
            let text = entry.text.trim().replace('\n', " / ");
            format!("{:<10} {}", entry.kind.label(), text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, Table};

    #[test]
    fn test_structured_outline() {
        let doc = Document::from_blocks(vec![
            Paragraph::with_text("Date: 16/06/24").into(),
            Paragraph::with_text("INTRODUCTION").into(),
            Table::with_size(2, 3).into(),
            Paragraph::with_text("Plain prose.").into(),
        ]);
        let entries = outline(&SourceContent::Structured(doc));
        let kinds: Vec<OutlineKind> = entries.iter().map(|e| e.kind).collect();

        assert_eq!(
            kinds,
            vec![OutlineKind::Date, OutlineKind::Heading, OutlineKind::Table, OutlineKind::Body]
        );
        assert_eq!(entries[0].text, "Jun 16, 2024");
        assert_eq!(entries[2].text, "2x3");
    }

    #[test]
    fn test_outline_matches_build_classification() {
        let doc = Document::from_blocks(vec![
            Paragraph::with_text("OVERVIEW").into(),
            Paragraph::with_text("Section scope details").into(),
            Paragraph::with_text("Body after the section line.").into(),
            Paragraph::with_text("   ").into(),
            Paragraph::with_text("Closing remarks").into(),
        ]);
        let content = SourceContent::Structured(doc);

        let mut built = Document::new();
        let report = Reconstructor::default().reconstruct_content(&content, &mut built);
        let entries = outline(&content);

        assert_eq!(entries.len(), built.blocks.len());
        let texts: Vec<String> = built.blocks.iter().map(|b| b.plain_text()).collect();
        let outlined: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(outlined, texts);
        assert_eq!(entries[1].kind, OutlineKind::Subheading);
        let headings = entries.iter().filter(|e| e.kind == OutlineKind::Heading).count();
        let subheadings = entries.iter().filter(|e| e.kind == OutlineKind::Subheading).count();
        assert_eq!(headings, report.headings);
        assert_eq!(subheadings, report.subheadings);
    }

    #[test]
    fn test_page_outline_rendering() {
        let content = SourceContent::PageOriented("SUMMARY\n\nfirst\nsecond".to_string());
        assert_eq!(to_outline(&content), "heading    SUMMARY\nbody       first / second");
    }
}
