//! Document-level types and the mutation interface the reconstruction writes through.

use super::{Block, Paragraph, Table};
use serde::{Deserialize, Serialize};

/// Mutation interface over an ordered body of blocks.
///
/// Implemented by the in-memory [`Document`] and by `docx::WordDocument`, so
/// the reconstruction engine can be exercised without touching the filesystem.
pub trait DocumentModel {
    /// Body blocks in document order.
    fn blocks(&self) -> &[Block];

    /// Mutable access to the body.
    fn blocks_mut(&mut self) -> &mut Vec<Block>;

    /// Append a paragraph to the end of the body.
    fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks_mut().push(Block::Paragraph(paragraph));
    }

    /// Append a table to the end of the body.
    fn push_table(&mut self, table: Table) {
        self.blocks_mut().push(Block::Table(table));
    }

    /// Put `paragraph` in the first body slot.
    ///
    /// A leading paragraph is replaced along with its runs; when the body is
    /// empty or starts with a table, the paragraph is inserted at the front.
    fn set_leading_paragraph(&mut self, paragraph: Paragraph) {
        let blocks = self.blocks_mut();
        match blocks.first_mut() {
            Some(Block::Paragraph(slot)) => *slot = paragraph,
            _ => blocks.insert(0, Block::Paragraph(paragraph)),
        }
    }

    /// Enable widow/orphan control on every paragraph, including table cells.
    fn apply_widow_control(&mut self) {
        for block in self.blocks_mut() {
            match block {
                Block::Paragraph(p) => p.style.widow_control = true,
                Block::Table(t) => {
                    for cell in t.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                        for p in &mut cell.content {
                            p.style.widow_control = true;
                        }
                    }
                }
            }
        }
    }
}

/// An in-memory document body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Body blocks in document order
    pub blocks: Vec<Block>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from blocks.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Body-level paragraphs, skipping tables.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(Block::as_paragraph)
    }

    /// Body-level tables.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(Block::as_table)
    }

    /// Check if the document has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Texts of the non-empty body paragraphs joined by newlines.
    pub fn plain_text(&self) -> String {
        self.paragraphs()
            .map(Paragraph::plain_text)
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl DocumentModel for Document {
    fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }
}
