//! Inline drawings and the package parts they reference.

use serde::{Deserialize, Serialize};

/// An inline drawing, VML picture or embedded object.
///
/// The markup is kept verbatim; relationship ids inside it refer to
/// [`MediaPart::rel_id`] and are remapped when the drawing is written into
/// another package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    /// Raw WordprocessingML for the element (`w:drawing`, `w:pict`, ...)
    pub markup: String,

    /// Parts referenced from the markup
    pub media: Vec<MediaPart>,
}

impl Drawing {
    /// Create a drawing from raw markup.
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            media: Vec::new(),
        }
    }

    /// Attach a referenced part.
    pub fn with_media(mut self, part: MediaPart) -> Self {
        self.media.push(part);
        self
    }
}

/// A binary part (usually an image) referenced by a drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPart {
    /// Relationship id used by the markup (e.g. `rId7`)
    pub rel_id: String,

    /// Relationship type URI
    pub rel_type: String,

    /// Original target, relative to `word/` (e.g. `media/image1.png`)
    pub target: String,

    /// Raw part bytes; empty for external targets
    #[serde(skip)]
    pub data: Vec<u8>,

    /// The target is a URI outside the package
    #[serde(default)]
    pub external: bool,
}

impl MediaPart {
    pub const IMAGE_REL_TYPE: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

    /// Create an image part.
    pub fn image(rel_id: impl Into<String>, target: impl Into<String>, data: Vec<u8>) -> Self {
        Self::internal(rel_id, Self::IMAGE_REL_TYPE, target, data)
    }

    /// Create a part stored inside the package.
    pub fn internal(
        rel_id: impl Into<String>,
        rel_type: impl Into<String>,
        target: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            rel_id: rel_id.into(),
            rel_type: rel_type.into(),
            target: target.into(),
            data,
            external: false,
        }
    }

    /// A relationship to a target outside the package.
    pub fn external(
        rel_id: impl Into<String>,
        rel_type: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            rel_id: rel_id.into(),
            rel_type: rel_type.into(),
            target: target.into(),
            data: Vec::new(),
            external: true,
        }
    }

    /// File extension of the target, lowercased, falling back to sniffed bytes.
    pub fn extension(&self) -> String {
        let from_target = self
            .target
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && !ext.contains('/'));

        from_target.unwrap_or_else(|| {
            match detect_mime_type(&self.data) {
                Some("image/jpeg") => "jpeg",
                Some("image/png") => "png",
                Some("image/gif") => "gif",
                Some("image/tiff") => "tiff",
                Some("image/bmp") => "bmp",
                _ => "bin",
            }
            .to_string()
        })
    }

    /// MIME type for the `[Content_Types].xml` default entry.
    pub fn content_type(&self) -> &'static str {
        content_type_for_extension(&self.extension())
    }
}

/// Content type registered for a part extension.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Detect MIME type from data magic bytes.
pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
    if data.len() < 8 {
        return None;
    }

    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }

    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return Some("image/tiff");
    }

    if data.starts_with(b"BM") {
        return Some("image/bmp");
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_extension_from_target() {
        let part = MediaPart::image("rId4", "media/image1.PNG", vec![]);
        assert_eq!(part.extension(), "png");
        assert_eq!(part.content_type(), "image/png");
    }

    #[test]
    fn test_media_extension_sniffed() {
        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        let part = MediaPart::image("rId4", "media/blob", jpeg);
        assert_eq!(part.extension(), "jpeg");
    }

    #[test]
    fn test_detect_mime_type() {
        let png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_mime_type(&png), Some("image/png"));
        assert_eq!(detect_mime_type(&[0u8; 8]), None);
    }
}
