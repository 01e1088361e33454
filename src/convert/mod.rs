//! Front-end adapter around the reconstruction engine.
//!
//! Front-ends hand over raw text or uploaded bytes plus a desired output
//! name and get the finished document back as bytes. All intermediate files
//! live in a request-scoped [`Session`] directory that is removed when the
//! session is dropped, whether the build succeeded or not.
//!
//! # Example
//!
//! ```no_run
//! use restyle::convert::Session;
//!
//! fn main() -> restyle::Result<()> {
//!     let session = Session::new("template.docx")?;
//!     let rendered = session.render_text("INTRODUCTION\nHello.", Some("letter"))?;
//!     assert_eq!(rendered.file_name, "letter.docx");
//!     println!("{}", rendered.to_base64());
//!     Ok(())
//! }
//! ```

use crate::engine::{BuildReport, ReconstructOptions, Reconstructor};
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Output name used when the caller gives none.
pub const DEFAULT_OUTPUT_NAME: &str = "generated_document.docx";

/// Template file name looked up by default.
pub const DEFAULT_TEMPLATE_NAME: &str = "template.docx";

/// Normalize a requested output name: only the final path component is
/// kept, blank becomes the default and `.docx` is appended when missing.
pub fn output_file_name(requested: Option<&str>) -> String {
    let name = requested
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(str::trim)
        .unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        return DEFAULT_OUTPUT_NAME.to_string();
    }
    if name.to_lowercase().ends_with(".docx") {
        name.to_string()
    } else {
        format!("{}.docx", name)
    }
}

/// First candidate that exists as a file.
pub fn locate_template<I, P>(candidates: I) -> Result<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut last = None;
    for candidate in candidates {
        let path = candidate.as_ref();
        if path.is_file() {
            log::debug!("Using template {}", path.display());
            return Ok(path.to_path_buf());
        }
        last = Some(path.to_path_buf());
    }
    Err(Error::TemplateNotFound(
        last.unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_NAME)),
    ))
}

/// Default template locations, relative to the working directory.
pub fn default_template_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from(DEFAULT_TEMPLATE_NAME),
        Path::new("templates").join(DEFAULT_TEMPLATE_NAME),
    ]
}

/// Base64 text of a rendered document.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a base64 upload.
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| Error::Processing(format!("invalid base64 payload: {}", e)))
}

/// A finished document read back from the session directory.
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Normalized output file name
    pub file_name: String,

    /// Document bytes
    pub bytes: Vec<u8>,

    pub report: BuildReport,
}

impl Rendered {
    pub fn to_base64(&self) -> String {
        encode_base64(&self.bytes)
    }
}

/// Request-scoped scratch directory plus the engine that writes into it.
pub struct Session {
    dir: TempDir,
    template: PathBuf,
    engine: Reconstructor,
}

impl Session {
    /// Start a session writing into `template`.
    pub fn new<P: Into<PathBuf>>(template: P) -> Result<Self> {
        Self::with_options(template, ReconstructOptions::default())
    }

    /// Start a session with explicit options.
    pub fn with_options<P: Into<PathBuf>>(template: P, options: ReconstructOptions) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("restyle-").tempdir()?;
        log::debug!("Session directory {}", dir.path().display());
        Ok(Self {
            dir,
            template: template.into(),
            engine: Reconstructor::new(options),
        })
    }

    /// The scratch directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    /// Rebuild raw text and return the document bytes.
    pub fn render_text(&self, raw: &str, output_name: Option<&str>) -> Result<Rendered> {
        let file_name = output_file_name(output_name);
        let output = self.dir.path().join(&file_name);
        let report = self.engine.build_from_text(raw, &self.template, &output)?;
        self.read_back(file_name, &output, report)
    }

    /// Rebuild an uploaded document and return the document bytes.
    ///
    /// `upload_name` selects the reader by extension; only its final path
    /// component is used.
    pub fn render_upload(
        &self,
        upload_name: &str,
        bytes: &[u8],
        output_name: Option<&str>,
    ) -> Result<Rendered> {
        let base = Path::new(upload_name)
            .file_name()
            .ok_or_else(|| Error::UnsupportedFormat(format!("invalid upload name '{}'", upload_name)))?;
        let uploads = self.dir.path().join("uploads");
        std::fs::create_dir_all(&uploads)?;
        let source = uploads.join(base);
        std::fs::write(&source, bytes)?;

        let file_name = output_file_name(output_name);
        let output = self.dir.path().join(&file_name);
        let report = self.engine.build_from_document(&source, &self.template, &output)?;
        self.read_back(file_name, &output, report)
    }

    fn read_back(&self, file_name: String, output: &Path, mut report: BuildReport) -> Result<Rendered> {
        let bytes = std::fs::read(output)?;
        // The scratch copy goes away with the session
        report.output = None;
        Ok(Rendered {
            file_name,
            bytes,
            report,
        })
    }

    /// Remove the scratch directory now, reporting any failure.
    pub fn close(self) -> Result<()> {
        Ok(self.dir.close()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{TemplateOptions, WordDocument};

    fn template_in(dir: &Path) -> PathBuf {
        let path = dir.join("template.docx");
        WordDocument::blank(&TemplateOptions::default())
            .unwrap()
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(None), "generated_document.docx");
        assert_eq!(output_file_name(Some("   ")), "generated_document.docx");
        assert_eq!(output_file_name(Some("report")), "report.docx");
        assert_eq!(output_file_name(Some("report.DOCX")), "report.DOCX");
        assert_eq!(output_file_name(Some("notes.txt")), "notes.txt.docx");
    }

    #[test]
    fn test_output_file_name_drops_directories() {
        assert_eq!(output_file_name(Some("../x")), "x.docx");
        assert_eq!(output_file_name(Some("/tmp/escaped")), "escaped.docx");
        assert_eq!(output_file_name(Some("..\\..\\win.docx")), "win.docx");
        assert_eq!(output_file_name(Some("..")), "generated_document.docx");
        assert_eq!(output_file_name(Some("reports/")), "generated_document.docx");
    }

    #[test]
    fn test_session_writes_inside_scratch_dir() {
        let dir = tempfile::tempdir().unwrap();
        let template = template_in(dir.path());
        let outside = dir.path().join("escaped");

        let session = Session::new(&template).unwrap();
        let requested = outside.to_string_lossy().into_owned();
        let rendered = session.render_text("TITLE\nBody text.", Some(&requested)).unwrap();

        assert_eq!(rendered.file_name, "escaped.docx");
        assert!(session.path().join("escaped.docx").exists());
        assert!(!dir.path().join("escaped.docx").exists());
        assert!(!outside.exists());
    }

    #[test]
    fn test_locate_template() {
        let dir = tempfile::tempdir().unwrap();
        let template = template_in(dir.path());
        let missing = dir.path().join("nope.docx");

        assert_eq!(locate_template([&missing, &template]).unwrap(), template);
        let err = locate_template([&missing]).unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound(p) if p == missing));
    }

    #[test]
    fn test_base64_round_trip() {
        let encoded = encode_base64(b"PK\x03\x04");
        assert_eq!(decode_base64(&encoded).unwrap(), b"PK\x03\x04");
        assert!(decode_base64("***").is_err());
    }

    #[test]
    fn test_session_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let template = template_in(dir.path());

        let session = Session::new(&template).unwrap();
        let scratch = session.path().to_path_buf();
        let rendered = session.render_text("TITLE\nBody text.", Some("out")).unwrap();
        assert_eq!(rendered.file_name, "out.docx");
        assert!(rendered.bytes.starts_with(b"PK"));
        assert_eq!(rendered.report.headings, 1);
        assert!(scratch.exists());

        drop(session);
        assert!(!scratch.exists());
    }

    #[test]
    fn test_session_cleans_up_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(dir.path().join("missing.docx")).unwrap();
        let scratch = session.path().to_path_buf();

        let err = session.render_text("text", None).unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound(_)));
        session.close().unwrap();
        assert!(!scratch.exists());
    }

    #[test]
    fn test_upload_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let template = template_in(dir.path());
        let session = Session::new(&template).unwrap();

        let err = session.render_upload("notes.txt", b"plain", None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }
}
