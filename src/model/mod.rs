//! Document model shared by sources, the reconstruction engine and the writer.
//!
//! A body is an ordered sequence of [`Block`]s; paragraphs hold styled runs,
//! line breaks and inline drawings; tables hold cells of paragraphs.

mod block;
mod document;
mod media;
mod paragraph;
mod table;

pub use block::Block;
pub use document::{Document, DocumentModel};
pub use media::{content_type_for_extension, detect_mime_type, Drawing, MediaPart};
pub use paragraph::{
    Alignment, InlineContent, Paragraph, ParagraphStyle, Rgb, TextRun, TextStyle,
};
pub use table::{Table, TableCell, TableRow};
