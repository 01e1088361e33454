//! Paragraph and run-level types.

use super::Drawing;
use serde::{Deserialize, Serialize};

/// A paragraph: an ordered sequence of inline content with paragraph formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Runs, breaks and drawings in reading order
    pub content: Vec<InlineContent>,

    /// Paragraph style
    pub style: ParagraphStyle,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.add_text(text);
        p
    }

    /// Add plain text to the paragraph.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.content.push(InlineContent::Text(TextRun::new(text)));
    }

    /// Add a styled text run.
    pub fn add_run(&mut self, run: TextRun) {
        self.content.push(InlineContent::Text(run));
    }

    /// Add a line break.
    pub fn add_line_break(&mut self) {
        self.content.push(InlineContent::LineBreak);
    }

    /// Add an inline drawing.
    pub fn add_drawing(&mut self, drawing: Drawing) {
        self.content.push(InlineContent::Drawing(drawing));
    }

    /// Remove all inline content, keeping the paragraph style.
    pub fn clear(&mut self) {
        self.content.clear();
    }

    /// Get plain text content of the paragraph.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                InlineContent::Text(run) => run.text.as_str(),
                InlineContent::LineBreak => "\n",
                InlineContent::Tab => "\t",
                InlineContent::Drawing(_) => "",
            })
            .collect()
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.plain_text().trim().is_empty()
    }

    /// Check if the paragraph carries inline image content.
    pub fn has_drawing(&self) -> bool {
        self.content
            .iter()
            .any(|c| matches!(c, InlineContent::Drawing(_)))
    }

    /// Iterate over the text runs.
    pub fn runs(&self) -> impl Iterator<Item = &TextRun> {
        self.content.iter().filter_map(|c| match c {
            InlineContent::Text(run) => Some(run),
            _ => None,
        })
    }

    /// Iterate over the text runs mutably.
    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut TextRun> {
        self.content.iter_mut().filter_map(|c| match c {
            InlineContent::Text(run) => Some(run),
            _ => None,
        })
    }
}

/// Inline content within a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineContent {
    /// A text run with styling
    Text(TextRun),

    /// A line break
    LineBreak,

    /// A tab character
    Tab,

    /// An inline drawing, picture or embedded object
    Drawing(Drawing),
}

/// A run of text sharing one style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Text styling
    pub style: TextStyle,
}

impl TextRun {
    /// Create a new text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Create a text run with the given style.
    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Create a bold text run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::styled(
            text,
            TextStyle {
                bold: true,
                ..Default::default()
            },
        )
    }

    /// Check if this run is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Text styling properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Underlined text (single)
    pub underline: bool,

    /// Font name
    pub font_name: Option<String>,

    /// Font size in points (fractional sizes like 12.5 allowed)
    pub font_size: Option<f32>,

    /// Text color
    pub color: Option<Rgb>,
}

impl TextStyle {
    /// Check if any emphasis is applied.
    pub fn has_styling(&self) -> bool {
        self.bold || self.italic || self.underline
    }
}

/// An RGB color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Parse a six-digit hex color such as `"1F3864"`.
    ///
    /// Returns `None` for `"auto"` and anything that is not six hex digits.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Format as uppercase hex without a leading `#`.
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Paragraph formatting properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    /// Named paragraph style from the package style sheet
    pub style_id: Option<String>,

    /// Text alignment (`None` inherits from the style sheet)
    pub alignment: Option<Alignment>,

    /// Space after the paragraph in points
    pub space_after: Option<f32>,

    /// Keep this paragraph on the same page as the next one
    pub keep_with_next: bool,

    /// Widow/orphan control
    pub widow_control: bool,
}

/// Text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}

impl Alignment {
    /// WordprocessingML `w:jc` value.
    pub fn as_jc(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }

    /// Parse a `w:jc` value, accepting both transitional and strict spellings.
    pub fn from_jc(value: &str) -> Option<Self> {
        match value {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "distribute" | "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_plain_text() {
        let mut p = Paragraph::new();
        p.add_text("Hello ");
        p.add_run(TextRun::bold("world"));
        p.add_line_break();
        p.add_text("again");

        assert_eq!(p.plain_text(), "Hello world\nagain");
        assert_eq!(p.runs().count(), 3);
    }

    #[test]
    fn test_paragraph_empty() {
        assert!(Paragraph::new().is_empty());
        assert!(Paragraph::with_text("   ").is_empty());
        assert!(!Paragraph::with_text("x").is_empty());
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb::from_hex("FF0080"), Some(Rgb(255, 0, 128)));
        assert_eq!(Rgb::from_hex("auto"), None);
        assert_eq!(Rgb::BLACK.to_hex(), "000000");
    }

    #[test]
    fn test_alignment_jc() {
        assert_eq!(Alignment::Justify.as_jc(), "both");
        assert_eq!(Alignment::from_jc("start"), Some(Alignment::Left));
        assert_eq!(Alignment::from_jc("center"), Some(Alignment::Center));
        assert_eq!(Alignment::from_jc("bogus"), None);
    }
}
