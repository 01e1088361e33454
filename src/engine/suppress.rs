//! One-shot suppression of the line a date was extracted from.

use crate::date::{is_date_line, ExtractedDate};

/// Skips the source line of an extracted date, at most once.
#[derive(Debug, Clone, Default)]
pub struct DateLineFilter {
    source_line: Option<String>,
    suppressed: bool,
}

impl DateLineFilter {
    /// A filter for `date`; stamped dates have no source line and never match.
    pub fn new(date: Option<&ExtractedDate>) -> Self {
        Self {
            source_line: date
                .filter(|d| d.has_source_line())
                .map(|d| d.source_line.clone()),
            suppressed: false,
        }
    }

    /// Whether `text` should be dropped from the body.
    ///
    /// Returns true for the first matching text only.
    pub fn should_skip(&mut self, text: &str) -> bool {
        if self.suppressed {
            return false;
        }
        match &self.source_line {
            Some(source) if is_date_line(text, source) => {
                self.suppressed = true;
                true
            }
            _ => false,
        }
    }

    /// Whether a line has been dropped.
    pub fn suppressed(&self) -> bool {
        self.suppressed
    }
}
