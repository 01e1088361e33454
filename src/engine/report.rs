//! Build report returned by every reconstruction.

use crate::classify::Classification;
use serde::Serialize;
use std::path::PathBuf;

/// A loss of fidelity that did not abort the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// The source only yielded page text; tables and images are absent.
    PageOrientedSource,

    /// A date pattern matched but did not form a calendar date; `raw` is shown as-is.
    DateParseDegraded { raw: String },
}

impl Degradation {
    pub fn message(&self) -> String {
        match self {
            Degradation::PageOrientedSource => {
                "page-oriented source: tables and images were not recovered".to_string()
            }
            Degradation::DateParseDegraded { raw } => {
                format!("date '{}' is not a valid calendar date; kept as written", raw)
            }
        }
    }
}

/// Summary of one reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    /// Where the destination was saved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Body paragraphs written, excluding the date paragraph
    pub paragraphs: usize,
    pub headings: usize,
    pub subheadings: usize,
    pub tables: usize,

    /// Inline drawings carried over
    pub images: usize,

    /// Display text of the stamped date
    pub date: Option<String>,

    /// Whether the date's source line was dropped from the body
    pub suppressed_date_line: bool,

    pub degradations: Vec<Degradation>,
}

impl BuildReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one emitted paragraph.
    pub fn record(&mut self, label: Classification) {
        self.paragraphs += 1;
        match label {
            Classification::Heading => self.headings += 1,
            Classification::Subheading => self.subheadings += 1,
            Classification::Body => {}
        }
    }

    /// Add a degradation, logging it.
    pub fn degrade(&mut self, degradation: Degradation) {
        log::warn!("{}", degradation.message());
        self.degradations.push(degradation);
    }

    /// Whether the build lost fidelity.
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}
