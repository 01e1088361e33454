//! Reconstruction options and configuration.

use super::style::StylePolicy;
use crate::docx::Margins;
use crate::error::{Error, Result};
use crate::source::{CleanupPipeline, DocxSource, PdfSource, SourceRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Options for a reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructOptions {
    /// When to stamp a date paragraph
    pub date_policy: DatePolicy,

    /// Page margins applied to the destination (template margins when unset)
    pub margins: Option<Margins>,

    /// Paragraph styles per classification
    pub styles: StylePolicy,

    /// Run the cleanup pipeline on PDF text
    pub clean_pdf_text: bool,

    /// Error handling mode for unreadable PDF pages
    pub error_mode: ErrorMode,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            date_policy: DatePolicy::default(),
            margins: None,
            styles: StylePolicy::default(),
            clean_pdf_text: true,
            error_mode: ErrorMode::default(),
        }
    }
}

impl ReconstructOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file; missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&data).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse options from a JSON string.
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Set the date policy.
    pub fn with_date_policy(mut self, policy: DatePolicy) -> Self {
        self.date_policy = policy;
        self
    }

    /// Always stamp a date, falling back to today.
    pub fn always_stamp_date(mut self) -> Self {
        self.date_policy = DatePolicy::AlwaysStamp;
        self
    }

    /// Set page margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = Some(margins);
        self
    }

    /// Set the style policy.
    pub fn with_styles(mut self, styles: StylePolicy) -> Self {
        self.styles = styles;
        self
    }

    /// Enable or disable PDF text cleanup.
    pub fn with_pdf_cleanup(mut self, clean: bool) -> Self {
        self.clean_pdf_text = clean;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip unreadable PDF pages).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Source readers configured from these options.
    pub fn source_registry(&self) -> SourceRegistry {
        let cleanup = self.clean_pdf_text.then(CleanupPipeline::default);
        let pdf = PdfSource::new()
            .with_cleanup(cleanup)
            .with_lenient(self.error_mode == ErrorMode::Lenient);

        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(DocxSource::new()));
        registry.register(Arc::new(pdf));
        registry
    }
}

/// When the date paragraph is added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePolicy {
    /// Only when a date is found in the leading lines of the input
    #[default]
    Detected,

    /// Always; today's date when none is found
    AlwaysStamp,
}

/// Error handling mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Fail on the first error
    #[default]
    Strict,

    /// Skip unreadable pages and continue
    Lenient,
}
