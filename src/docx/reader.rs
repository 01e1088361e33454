//! `word/document.xml` to an ordered block sequence.
//!
//! The body is walked once, in document order. Paragraphs and top-level
//! tables become [`Block`]s; nested tables are flattened into the enclosing
//! cell. Drawings, VML pictures and embedded objects are kept as raw markup,
//! made self-contained by re-declaring the namespaces they use, together with
//! the parts their relationships point at.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use super::package::Package;
use super::rels::{resolve_target, Relationships};
use crate::error::{Error, Result};
use crate::model::{
    Alignment, Block, Drawing, InlineContent, MediaPart, Paragraph, Rgb, Table, TableCell,
    TableRow, TextRun, TextStyle,
};

/// Prefixed element and attribute names inside captured markup.
static PREFIX_USE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:</?|\s)([A-Za-z_][\w.-]*):[\w.-]+"#).expect("valid prefix pattern")
});

/// Prefix lists carried in attribute values (`Requires`, `mc:Ignorable`).
static PREFIX_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s(?:Requires|mc:Ignorable)="([^"]*)""#).expect("valid prefix list pattern")
});

/// A parsed `word/document.xml`.
#[derive(Debug, Clone)]
pub(crate) struct BodyXml {
    /// Everything up to and including the `<w:body>` start tag
    pub prolog: String,
    pub blocks: Vec<Block>,
    /// Raw body-level `<w:sectPr>`
    pub sect_pr: Option<String>,
    /// Everything from the `</w:body>` end tag on
    pub epilog: String,
    /// Source markup of each entry in `blocks`
    pub raw: Vec<RawBlock>,
    /// Markup between the last block and the body `<w:sectPr>`
    pub tail: String,
    /// Markup between the body `<w:sectPr>` and `</w:body>`
    pub trailer: String,
}

/// Verbatim markup of one top-level body block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawBlock {
    /// Markup between the previous block and this one (bookmarks, content
    /// control tags, whitespace)
    pub lead: String,
    pub xml: String,
}

/// Parse a document part, resolving media through `rels` and `package`.
pub(crate) fn parse_document(
    xml: &str,
    rels: &Relationships,
    package: &Package,
) -> Result<BodyXml> {
    BodyReader::new(xml, rels, package).run()
}

struct Capture {
    start: usize,
    depth: usize,
    rel_ids: Vec<String>,
    section: bool,
}

struct TableState {
    table: Table,
    row: Option<TableRow>,
    cell: Option<TableCell>,
}

struct BodyReader<'a> {
    xml: &'a str,
    rels: &'a Relationships,
    package: &'a Package,
    namespaces: HashMap<String, String>,
    prolog: Option<String>,
    epilog: Option<String>,
    sect_pr: Option<String>,
    blocks: Vec<Block>,
    paragraph: Option<Paragraph>,
    nested_paragraphs: usize,
    run: Option<TextStyle>,
    in_ppr: bool,
    in_rpr: bool,
    in_text: bool,
    table: Option<TableState>,
    table_depth: usize,
    capture: Option<Capture>,
    block_start: usize,
    last_end: usize,
    section_span: Option<(usize, usize)>,
    raw: Vec<RawBlock>,
    tail: String,
    trailer: String,
}

impl<'a> BodyReader<'a> {
    fn new(xml: &'a str, rels: &'a Relationships, package: &'a Package) -> Self {
        Self {
            xml,
            rels,
            package,
            namespaces: HashMap::new(),
            prolog: None,
            epilog: None,
            sect_pr: None,
            blocks: Vec::new(),
            paragraph: None,
            nested_paragraphs: 0,
            run: None,
            in_ppr: false,
            in_rpr: false,
            in_text: false,
            table: None,
            table_depth: 0,
            capture: None,
            block_start: 0,
            last_end: 0,
            section_span: None,
            raw: Vec::new(),
            tail: String::new(),
            trailer: String::new(),
        }
    }

    fn run(mut self) -> Result<BodyXml> {
        let mut reader = Reader::from_str(self.xml);
        reader.trim_text(false);

        let mut buf = Vec::new();
        loop {
            let before = reader.buffer_position();
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                Error::Xml(format!("document.xml at {}: {e}", reader.buffer_position()))
            })?;
            let after = reader.buffer_position();

            match event {
                Event::Start(e) => self.open(&e, before, after, false),
                Event::Empty(e) => self.open(&e, before, after, true),
                Event::End(e) => self.close(e.name().as_ref(), before, after),
                Event::Text(t) if self.in_text && self.capture.is_none() => {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::Xml(format!("document.xml text: {e}")))?;
                    self.push_text(&text);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let prolog = self
            .prolog
            .ok_or_else(|| Error::InvalidPackage("word/document.xml has no body".to_string()))?;
        let epilog = self
            .epilog
            .unwrap_or_else(|| "</w:body></w:document>".to_string());

        log::debug!("Read {} body blocks", self.blocks.len());
        Ok(BodyXml {
            prolog,
            blocks: self.blocks,
            sect_pr: self.sect_pr,
            epilog,
            raw: self.raw,
            tail: self.tail,
            trailer: self.trailer,
        })
    }

    fn open(&mut self, e: &BytesStart<'_>, before: usize, after: usize, empty: bool) {
        if let Some(capture) = self.capture.as_mut() {
            collect_rel_ids(e, &mut capture.rel_ids);
            if !empty {
                capture.depth += 1;
            }
            return;
        }

        let qname = e.name();
        let name = qname.as_ref();

        if self.prolog.is_none() {
            if self.namespaces.is_empty() {
                self.collect_namespaces(e);
            }
            if name == b"w:body" {
                if empty {
                    self.prolog = Some(format!("{}<w:body>", &self.xml[..before]));
                    self.epilog = Some(format!("</w:body>{}", &self.xml[after..]));
                } else {
                    self.prolog = Some(self.xml[..after].to_string());
                    self.last_end = after;
                }
            }
            return;
        }

        match name {
            b"w:drawing" | b"w:pict" | b"w:object" | b"mc:AlternateContent"
                if self.paragraph.is_some() =>
            {
                self.begin_capture(e, before, after, empty, false);
            }
            b"w:sectPr" if self.paragraph.is_none() && self.table_depth == 0 => {
                self.begin_capture(e, before, after, empty, true);
            }
            b"w:p" => {
                if self.paragraph.is_some() {
                    if !empty {
                        self.nested_paragraphs += 1;
                    }
                    return;
                }
                if self.table_depth == 0 {
                    self.block_start = before;
                }
                if empty {
                    self.finish_paragraph(Paragraph::new(), after);
                } else {
                    self.paragraph = Some(Paragraph::new());
                }
            }
            b"w:pPr" if self.paragraph.is_some() && !empty => self.in_ppr = true,
            b"w:r" if self.paragraph.is_some() && !empty => self.run = Some(TextStyle::default()),
            b"w:rPr" if self.run.is_some() && !empty => self.in_rpr = true,
            b"w:t" if self.run.is_some() && !empty => self.in_text = true,
            b"w:tab" if self.run.is_some() && !self.in_rpr => self.push_inline(InlineContent::Tab),
            b"w:br" | b"w:cr" if self.run.is_some() => self.push_inline(InlineContent::LineBreak),
            b"w:tbl" => {
                if !empty {
                    self.table_depth += 1;
                    if self.table_depth == 1 {
                        self.block_start = before;
                        self.table = Some(TableState {
                            table: Table::new(),
                            row: None,
                            cell: None,
                        });
                    }
                }
            }
            b"w:tr" if self.table_depth == 1 => {
                if let Some(state) = self.table.as_mut() {
                    let row = TableRow::new(Vec::new());
                    if empty {
                        state.table.add_row(row);
                    } else {
                        state.row = Some(row);
                    }
                }
            }
            b"w:tc" if self.table_depth == 1 => {
                if let Some(state) = self.table.as_mut() {
                    let cell = TableCell::with_content(Vec::new());
                    match (empty, state.row.as_mut()) {
                        (true, Some(row)) => row.cells.push(cell),
                        (true, None) => {}
                        (false, _) => state.cell = Some(cell),
                    }
                }
            }
            b"w:gridCol" if self.table_depth == 1 => {
                if let (Some(state), Some(width)) = (
                    self.table.as_mut(),
                    get_attr(e, b"w:w").and_then(|v| v.parse::<u32>().ok()),
                ) {
                    state.table.column_widths.get_or_insert_with(Vec::new).push(width);
                }
            }
            b"w:gridSpan" if self.table_depth == 1 && self.paragraph.is_none() => {
                if let (Some(cell), Some(span)) = (
                    self.table.as_mut().and_then(|s| s.cell.as_mut()),
                    get_attr(e, b"w:val").and_then(|v| v.parse::<u32>().ok()),
                ) {
                    cell.grid_span = span.max(1);
                }
            }
            _ if self.in_rpr => self.run_property(name, e),
            _ if self.in_ppr => self.paragraph_property(name, e),
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8], before: usize, after: usize) {
        if let Some(capture) = self.capture.as_mut() {
            capture.depth -= 1;
            if capture.depth == 0 {
                if let Some(capture) = self.capture.take() {
                    self.finish_capture(capture, after);
                }
            }
            return;
        }

        if self.prolog.is_none() {
            return;
        }

        match name {
            b"w:body" if self.epilog.is_none() => {
                self.epilog = Some(self.xml[before..].to_string());
                match self.section_span {
                    Some((start, end)) if start >= self.last_end => {
                        self.tail = self.xml[self.last_end..start].to_string();
                        self.trailer = self.xml[end..before].to_string();
                    }
                    _ => self.tail = self.xml[self.last_end..before].to_string(),
                }
            }
            b"w:p" => {
                if self.nested_paragraphs > 0 {
                    self.nested_paragraphs -= 1;
                } else if let Some(paragraph) = self.paragraph.take() {
                    self.run = None;
                    self.in_ppr = false;
                    self.in_rpr = false;
                    self.in_text = false;
                    self.finish_paragraph(paragraph, after);
                }
            }
            b"w:pPr" => self.in_ppr = false,
            b"w:r" => {
                self.run = None;
                self.in_rpr = false;
                self.in_text = false;
            }
            b"w:rPr" => self.in_rpr = false,
            b"w:t" => self.in_text = false,
            b"w:tbl" if self.table_depth > 0 => {
                if self.table_depth == 1 {
                    if let Some(state) = self.table.take() {
                        self.push_block(Block::Table(state.table), after);
                    }
                }
                self.table_depth -= 1;
            }
            b"w:tr" if self.table_depth == 1 => {
                if let Some(state) = self.table.as_mut() {
                    if let Some(row) = state.row.take() {
                        state.table.add_row(row);
                    }
                }
            }
            b"w:tc" if self.table_depth == 1 => {
                if let Some(state) = self.table.as_mut() {
                    if let (Some(cell), Some(row)) = (state.cell.take(), state.row.as_mut()) {
                        row.cells.push(cell);
                    }
                }
            }
            _ => {}
        }
    }

    fn collect_namespaces(&mut self, e: &BytesStart<'_>) {
        for attr in e.attributes().flatten() {
            if let Some(prefix) = attr.key.as_ref().strip_prefix(b"xmlns:") {
                self.namespaces.insert(
                    String::from_utf8_lossy(prefix).into_owned(),
                    String::from_utf8_lossy(&attr.value).into_owned(),
                );
            }
        }
    }

    fn begin_capture(
        &mut self,
        e: &BytesStart<'_>,
        before: usize,
        after: usize,
        empty: bool,
        section: bool,
    ) {
        let mut capture = Capture {
            start: before,
            depth: 1,
            rel_ids: Vec::new(),
            section,
        };
        collect_rel_ids(e, &mut capture.rel_ids);

        if empty {
            self.finish_capture(capture, after);
        } else {
            self.capture = Some(capture);
        }
    }

    fn finish_capture(&mut self, capture: Capture, end: usize) {
        let markup = &self.xml[capture.start..end];

        if capture.section {
            self.sect_pr = Some(markup.to_string());
            self.section_span = Some((capture.start, end));
            return;
        }

        let mut drawing = Drawing::new(declare_namespaces(markup, &self.namespaces));
        for rel_id in &capture.rel_ids {
            if let Some(part) = self.resolve_media(rel_id) {
                drawing.media.push(part);
            }
        }

        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.add_drawing(drawing);
        }
    }

    fn resolve_media(&self, rel_id: &str) -> Option<MediaPart> {
        let Some(rel) = self.rels.get(rel_id) else {
            log::warn!("Drawing references unknown relationship {rel_id}");
            return None;
        };

        if rel.external {
            return Some(MediaPart::external(
                rel_id,
                rel.rel_type.as_str(),
                rel.target.as_str(),
            ));
        }

        let path = resolve_target(&rel.target);
        match self.package.part(&path) {
            Some(data) => Some(MediaPart::internal(
                rel_id,
                rel.rel_type.as_str(),
                rel.target.as_str(),
                data.to_vec(),
            )),
            None => {
                log::warn!("Relationship {rel_id} points at missing part {path}");
                None
            }
        }
    }

    fn finish_paragraph(&mut self, paragraph: Paragraph, end: usize) {
        if self.table_depth == 0 {
            self.push_block(Block::Paragraph(paragraph), end);
            return;
        }

        match self.table.as_mut().and_then(|s| s.cell.as_mut()) {
            Some(cell) => cell.content.push(paragraph),
            None => log::debug!("Dropping paragraph outside a table cell"),
        }
    }

    fn push_block(&mut self, block: Block, end: usize) {
        self.raw.push(RawBlock {
            lead: self.xml[self.last_end..self.block_start].to_string(),
            xml: self.xml[self.block_start..end].to_string(),
        });
        self.last_end = end;
        self.blocks.push(block);
    }

    fn push_text(&mut self, text: &str) {
        let (Some(paragraph), Some(style)) = (self.paragraph.as_mut(), self.run.as_ref()) else {
            return;
        };

        if let Some(InlineContent::Text(last)) = paragraph.content.last_mut() {
            if last.style == *style {
                last.text.push_str(text);
                return;
            }
        }
        paragraph.add_run(TextRun::styled(text, style.clone()));
    }

    fn push_inline(&mut self, item: InlineContent) {
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.content.push(item);
        }
    }

    fn run_property(&mut self, name: &[u8], e: &BytesStart<'_>) {
        let Some(style) = self.run.as_mut() else {
            return;
        };

        match name {
            b"w:b" => style.bold = !check_val_off(e),
            b"w:i" => style.italic = !check_val_off(e),
            b"w:u" => style.underline = get_attr(e, b"w:val").map_or(true, |v| v != "none"),
            b"w:sz" => {
                if let Some(half_points) = get_attr(e, b"w:val").and_then(|v| v.parse::<f32>().ok())
                {
                    style.font_size = Some(half_points / 2.0);
                }
            }
            b"w:color" => style.color = get_attr(e, b"w:val").and_then(|v| Rgb::from_hex(&v)),
            b"w:rFonts" => {
                style.font_name = get_attr(e, b"w:ascii").or_else(|| get_attr(e, b"w:hAnsi"));
            }
            _ => {}
        }
    }

    fn paragraph_property(&mut self, name: &[u8], e: &BytesStart<'_>) {
        let Some(paragraph) = self.paragraph.as_mut() else {
            return;
        };
        let style = &mut paragraph.style;

        match name {
            b"w:pStyle" => style.style_id = get_attr(e, b"w:val"),
            b"w:jc" => style.alignment = get_attr(e, b"w:val").and_then(|v| Alignment::from_jc(&v)),
            b"w:spacing" => {
                if let Some(twips) = get_attr(e, b"w:after").and_then(|v| v.parse::<f32>().ok()) {
                    style.space_after = Some(twips / 20.0);
                }
            }
            b"w:keepNext" => style.keep_with_next = !check_val_off(e),
            b"w:widowControl" => style.widow_control = !check_val_off(e),
            _ => {}
        }
    }
}

fn get_attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .find(|a| a.as_ref().ok().map(|x| x.key.as_ref()) == Some(key))
        .and_then(std::result::Result::ok)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Toggle properties are on unless `w:val` says otherwise.
fn check_val_off(e: &BytesStart<'_>) -> bool {
    matches!(
        get_attr(e, b"w:val").as_deref(),
        Some("0") | Some("false") | Some("off")
    )
}

fn collect_rel_ids(e: &BytesStart<'_>, ids: &mut Vec<String>) {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref().starts_with(b"r:") {
            let id = String::from_utf8_lossy(&attr.value).into_owned();
            if !id.is_empty() && !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
}

/// Add `xmlns:` declarations for prefixes the markup uses but does not declare.
fn declare_namespaces(markup: &str, namespaces: &HashMap<String, String>) -> String {
    let mut used: Vec<String> = Vec::new();
    let mut note = |prefix: &str| {
        if prefix != "xmlns" && prefix != "xml" && !used.iter().any(|u| u == prefix) {
            used.push(prefix.to_string());
        }
    };

    for caps in PREFIX_USE.captures_iter(markup) {
        note(&caps[1]);
    }
    for caps in PREFIX_LIST.captures_iter(markup) {
        for prefix in caps[1].split_whitespace() {
            note(prefix);
        }
    }

    let declarations: String = used
        .iter()
        .filter(|p| !markup.contains(&format!("xmlns:{p}=")))
        .filter_map(|p| namespaces.get(p).map(|uri| format!(r#" xmlns:{p}="{uri}""#)))
        .collect();
    if declarations.is_empty() {
        return markup.to_string();
    }

    let name_end = markup[1..]
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .map(|i| i + 1)
        .unwrap_or(markup.len());
    format!("{}{}{}", &markup[..name_end], declarations, &markup[name_end..])
}
