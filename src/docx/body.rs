//! Template body markup carried through a save.
//!
//! Blocks read from the template keep their source markup. On save, every
//! output block that still equals a template block is written back
//! byte-for-byte, so hyperlinks, bookmarks, shading, indents and table styles
//! the block model does not represent survive. Only new or changed blocks go
//! through the writer.

use super::reader::RawBlock;
use super::writer::{self, MediaRegistry};
use crate::model::Block;

#[derive(Debug, Clone)]
struct Retained {
    /// The block as read
    block: Block,
    /// `block` with widow control cleared, for matching
    key: Block,
    lead: String,
    xml: String,
}

/// Source markup of a template body.
#[derive(Debug, Clone, Default)]
pub(crate) struct RetainedBody {
    entries: Vec<Retained>,
    tail: String,
    trailer: String,
}

impl RetainedBody {
    pub(crate) fn new(blocks: &[Block], raw: Vec<RawBlock>, tail: String, trailer: String) -> Self {
        if blocks.len() != raw.len() {
            log::warn!(
                "Body markup does not line up ({} blocks, {} slices); rewriting the whole body",
                blocks.len(),
                raw.len()
            );
            return Self::default();
        }

        let entries = blocks
            .iter()
            .zip(raw)
            .map(|(block, raw)| Retained {
                block: block.clone(),
                key: without_widow_control(block),
                lead: raw.lead,
                xml: raw.xml,
            })
            .collect();
        Self {
            entries,
            tail,
            trailer,
        }
    }

    /// Markup between `<w:body>` and `</w:body>` for `blocks`.
    ///
    /// Template blocks are matched in order. An unmatched block takes the
    /// slot of the next template block unless that block still appears
    /// later, in which case it is inserted before it. Blocks past the end of
    /// the template are written after the template's trailing markup.
    pub(crate) fn write(
        &self,
        blocks: &[Block],
        sect_pr: Option<&str>,
        media: &mut MediaRegistry<'_>,
    ) -> String {
        let keys: Vec<Block> = blocks.iter().map(without_widow_control).collect();
        let kept_len: usize = self.entries.iter().map(|e| e.lead.len() + e.xml.len()).sum();
        let mut out = String::with_capacity(kept_len + blocks.len() * 256);
        let mut cursor = 0;
        let mut tail_written = false;
        let mut kept = 0;

        for (index, block) in blocks.iter().enumerate() {
            let remaining = &self.entries[cursor..];
            if let Some(offset) = remaining.iter().position(|e| e.key == keys[index]) {
                for skipped in &remaining[..offset] {
                    out.push_str(&skipped.lead);
                }
                let entry = &remaining[offset];
                out.push_str(&entry.lead);
                if *block == entry.block {
                    out.push_str(&entry.xml);
                } else {
                    out.push_str(&writer::with_widow_control(&entry.xml));
                }
                cursor += offset + 1;
                kept += 1;
                continue;
            }

            if let Some(next) = remaining.first() {
                let reappears = keys[index + 1..].iter().any(|key| *key == next.key);
                if !reappears {
                    out.push_str(&next.lead);
                    cursor += 1;
                }
            } else if !tail_written {
                out.push_str(&self.tail);
                tail_written = true;
            }
            writer::write_block(&mut out, block, media);
        }

        for dropped in &self.entries[cursor..] {
            out.push_str(&dropped.lead);
        }
        if !tail_written {
            out.push_str(&self.tail);
        }
        if let Some(sect) = sect_pr {
            out.push_str(sect);
        }
        out.push_str(&self.trailer);

        log::debug!("Kept {} of {} template blocks verbatim", kept, self.entries.len());
        out
    }
}

fn without_widow_control(block: &Block) -> Block {
    let mut block = block.clone();
    match &mut block {
        Block::Paragraph(p) => p.style.widow_control = false,
        Block::Table(t) => {
            for cell in t.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                for p in &mut cell.content {
                    p.style.widow_control = false;
                }
            }
        }
    }
    block
}
