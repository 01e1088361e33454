//! Heading and subheading detection from plain-text heuristics.
//!
//! Classification is a pure function of the paragraph text and a small
//! caller-owned [`ClassifierContext`]; nothing here touches a document. The
//! rules are deliberately crude pattern matching: prose that happens to be
//! upper-case or end with a colon is styled as a heading.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Paragraphs longer than this are never headings or subheadings.
pub const MAX_HEADING_LEN: usize = 100;

/// Length bound for the short-heading and prefix subheading rules.
pub const MAX_SUBHEADING_LEN: usize = 60;

/// Value the heading-recency budget is reset to after a heading.
pub const HEADING_BUDGET: u8 = 3;

/// Number of recent paragraph texts kept in the context window.
pub const RECENT_WINDOW: usize = 5;

const HEADING_MARKERS: [char; 3] = ['•', '-', '*'];

const SUBHEADING_PREFIXES: [&str; 5] = ["subsection", "part", "item", "sub", "section"];

/// "1.2", "1.2.3", "a.", "(a)", "(iv)" at the start of the text.
static NESTED_NUMBERING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:\d+(?:\.\d+)+\.?|[A-Za-z]\.|\([A-Za-z]\)|\((?:[ivxlcdm]+|[IVXLCDM]+)\))(?:\s|$)")
        .expect("valid nested numbering pattern")
});

/// Indentation followed by a sub-bullet or sub-number.
static INDENTED_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?: {2,}|\t+)(?:[-•*◦▪o]\s|\d+[.)]\s|[A-Za-z][.)]\s|\([A-Za-z0-9]+\)\s)")
        .expect("valid indented marker pattern")
});

/// Label assigned to a paragraph before styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Heading,
    Subheading,
    Body,
}

impl Classification {
    pub fn is_heading(self) -> bool {
        self == Classification::Heading
    }

    pub fn is_subheading(self) -> bool {
        self == Classification::Subheading
    }

    /// Headings and subheadings are kept with the following paragraph.
    pub fn keeps_with_next(self) -> bool {
        !matches!(self, Classification::Body)
    }
}

/// Recent-paragraph window and heading-recency budget.
///
/// Owned by the caller and threaded through each [`classify`] call; update it
/// with [`ClassifierContext::observe`] once a paragraph has been emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierContext {
    recent: VecDeque<String>,
    budget: u8,
}

impl ClassifierContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context with an explicit budget and no history.
    pub fn with_budget(budget: u8) -> Self {
        Self {
            recent: VecDeque::new(),
            budget,
        }
    }

    /// Remaining heading-recency budget.
    pub fn budget(&self) -> u8 {
        self.budget
    }

    /// Up to [`RECENT_WINDOW`] most recent texts, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &str> {
        self.recent.iter().map(String::as_str)
    }

    /// Record an emitted paragraph and its label.
    pub fn observe(&mut self, text: &str, label: Classification) {
        if label.is_heading() {
            self.budget = HEADING_BUDGET;
        } else {
            self.budget = self.budget.saturating_sub(1);
        }

        if self.recent.len() == RECENT_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(text.to_string());
    }
}

/// Classify a paragraph.
pub fn classify(text: &str, ctx: &ClassifierContext) -> Classification {
    if is_heading(text) {
        Classification::Heading
    } else if is_subheading(text, ctx.budget) {
        Classification::Subheading
    } else {
        Classification::Body
    }
}

/// Heading rule: short, and upper-case, colon-terminated, bulleted or numbered.
pub fn is_heading(text: &str) -> bool {
    let stripped = text.trim();
    if stripped.is_empty() || stripped.chars().count() >= MAX_HEADING_LEN {
        return false;
    }

    if is_upper(stripped) || stripped.ends_with(':') {
        return true;
    }

    if stripped.starts_with(HEADING_MARKERS) {
        return true;
    }

    let mut chars = stripped.chars();
    let leading_digit = chars.next().is_some_and(|c| c.is_ascii_digit());
    leading_digit && stripped.chars().take(3).any(|c| c == '.')
}

/// Subheading rule; never true for a heading.
pub fn is_subheading(text: &str, budget: u8) -> bool {
    if is_heading(text) {
        return false;
    }

    let stripped = text.trim();
    let len = stripped.chars().count();
    if stripped.is_empty() || len > MAX_HEADING_LEN {
        return false;
    }

    if budget > 0 && NESTED_NUMBERING.is_match(text) {
        return true;
    }

    if INDENTED_MARKER.is_match(text) {
        return true;
    }

    let lowered = stripped.to_lowercase();
    len < MAX_SUBHEADING_LEN && SUBHEADING_PREFIXES.iter().any(|p| lowered.starts_with(p))
}

/// At least one cased character and no lower-case ones.
fn is_upper(text: &str) -> bool {
    let mut has_cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}
