//! Body blocks to WordprocessingML markup, registering drawing media.

use std::collections::HashMap;
use std::fmt::Write as _;

use once_cell::sync::Lazy;
use quick_xml::escape::escape;
use regex::{Captures, Regex};

use super::package::Package;
use super::rels::{
    ensure_default_content_type, ensure_override_content_type, resolve_target, Relationships,
};
use crate::model::{
    Block, Drawing, InlineContent, MediaPart, Paragraph, ParagraphStyle, Table, TextRun,
    TextStyle,
};

/// Width used for tables that carry no grid, in twips.
pub const DEFAULT_TABLE_WIDTH: u32 = 9000;

const CHART_REL_SUFFIX: &str = "/chart";
const OLE_REL_SUFFIX: &str = "/oleObject";
const CHART_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";
const OLE_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.oleObject";

static REL_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\br:[A-Za-z]+)="([^"]*)""#).expect("valid relationship attribute pattern"));

/// `<w:p>` start tags, including the self-closing form.
static PARAGRAPH_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<w:p(?:\s[^>]*)?/?>").expect("valid paragraph tag pattern"));

/// `<w:pPr>` directly after a paragraph start tag.
static PROPERTIES_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*<w:pPr(?:\s[^>]*)?/?>").expect("valid paragraph properties pattern"));

/// Properties that precede `w:widowControl` in a `w:pPr`.
static LEADING_PROPERTIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\s*<w:(?:pStyle|keepNext|keepLines|pageBreakBefore|framePr)\b[^>]*/>)*")
        .expect("valid leading properties pattern")
});

static WIDOW_CONTROL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*<w:widowControl\b[^>]*/>").expect("valid widow control pattern"));

/// Registers drawing media in a destination package.
///
/// Parts already present under the same relationship id and bytes keep
/// their id; everything else is copied under a fresh name and id.
pub(crate) struct MediaRegistry<'a> {
    package: &'a mut Package,
    rels: &'a mut Relationships,
    content_types: &'a mut String,
    remapped: HashMap<(String, String), String>,
    counter: usize,
    registered: usize,
}

impl<'a> MediaRegistry<'a> {
    pub(crate) fn new(
        package: &'a mut Package,
        rels: &'a mut Relationships,
        content_types: &'a mut String,
    ) -> Self {
        Self {
            package,
            rels,
            content_types,
            remapped: HashMap::new(),
            counter: 0,
            registered: 0,
        }
    }

    /// Number of parts copied in.
    pub(crate) fn registered(&self) -> usize {
        self.registered
    }

    /// Markup for `drawing`, with relationship ids valid in the destination.
    pub(crate) fn place(&mut self, drawing: &Drawing) -> String {
        let mut ids: HashMap<String, String> = HashMap::new();
        for part in &drawing.media {
            let new_id = self.register(part);
            if new_id != part.rel_id {
                ids.insert(part.rel_id.clone(), new_id);
            }
        }

        if ids.is_empty() {
            return drawing.markup.clone();
        }

        REL_ATTR
            .replace_all(&drawing.markup, |caps: &Captures<'_>| match ids.get(&caps[2]) {
                Some(id) => format!(r#"{}="{}""#, &caps[1], id),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    fn register(&mut self, part: &MediaPart) -> String {
        let key = (part.rel_id.clone(), part.target.clone());
        if let Some(id) = self.remapped.get(&key) {
            return id.clone();
        }

        if self.already_present(part) {
            return part.rel_id.clone();
        }

        let id = if part.external {
            self.rels.add_external(&part.rel_type, &part.target)
        } else {
            let target = self.fresh_target(part);
            let path = resolve_target(&target);
            self.package.set_part(path.clone(), part.data.clone());
            self.declare_content_type(part, &target, &path);
            self.registered += 1;
            self.rels.add(&part.rel_type, &target)
        };

        log::debug!("Registered {} as {}", part.target, id);
        self.remapped.insert(key, id.clone());
        id
    }

    fn already_present(&self, part: &MediaPart) -> bool {
        let Some(rel) = self.rels.get(&part.rel_id) else {
            return false;
        };
        if rel.target != part.target || rel.rel_type != part.rel_type || rel.external != part.external
        {
            return false;
        }
        part.external || self.package.part(&resolve_target(&rel.target)) == Some(part.data.as_slice())
    }

    fn fresh_target(&mut self, part: &MediaPart) -> String {
        let ext = part.extension();
        let (dir, stem) = if part.rel_type == MediaPart::IMAGE_REL_TYPE {
            ("media".to_string(), "image".to_string())
        } else {
            let (dir, file) = part.target.rsplit_once('/').unwrap_or(("media", part.target.as_str()));
            let stem = file.rsplit_once('.').map_or(file, |(s, _)| s);
            (dir.to_string(), stem.to_string())
        };

        loop {
            self.counter += 1;
            let target = format!("{dir}/restyle_{stem}{}.{ext}", self.counter);
            if !self.package.has_part(&resolve_target(&target)) {
                return target;
            }
        }
    }

    fn declare_content_type(&mut self, part: &MediaPart, target: &str, path: &str) {
        let updated = if part.rel_type.ends_with(CHART_REL_SUFFIX) {
            ensure_override_content_type(self.content_types.as_str(), path, CHART_CONTENT_TYPE)
        } else if part.rel_type.ends_with(OLE_REL_SUFFIX) {
            let ext = target.rsplit_once('.').map_or("bin", |(_, e)| e);
            ensure_default_content_type(self.content_types.as_str(), ext, OLE_CONTENT_TYPE)
        } else {
            ensure_default_content_type(self.content_types.as_str(), &part.extension(), part.content_type())
        };
        *self.content_types = updated;
    }
}

/// Serialize one body block.
pub(crate) fn write_block(out: &mut String, block: &Block, media: &mut MediaRegistry<'_>) {
    match block {
        Block::Paragraph(p) => write_paragraph(out, p, media),
        Block::Table(t) => write_table(out, t, media),
    }
}

/// Switch on widow control in every paragraph of existing markup, leaving
/// everything else as it is.
pub(crate) fn with_widow_control(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() + 64);
    let mut last = 0;

    for tag in PARAGRAPH_TAG.find_iter(xml) {
        if tag.start() < last {
            continue;
        }
        out.push_str(&xml[last..tag.start()]);
        last = tag.end();

        if let Some(open) = tag.as_str().strip_suffix("/>") {
            out.push_str(open);
            out.push_str("><w:pPr><w:widowControl/></w:pPr></w:p>");
            continue;
        }
        out.push_str(tag.as_str());

        let rest = &xml[last..];
        let Some(props) = PROPERTIES_TAG.find(rest) else {
            out.push_str("<w:pPr><w:widowControl/></w:pPr>");
            continue;
        };
        if let Some(open) = props.as_str().strip_suffix("/>") {
            out.push_str(open);
            out.push_str("><w:widowControl/></w:pPr>");
            last += props.end();
            continue;
        }

        let inner = &rest[props.end()..];
        let leading = LEADING_PROPERTIES.find(inner).map_or(0, |m| m.end());
        out.push_str(&rest[..props.end() + leading]);
        out.push_str("<w:widowControl/>");
        last += props.end() + leading;
        if let Some(existing) = WIDOW_CONTROL.find(&inner[leading..]) {
            last += existing.end();
        }
    }

    out.push_str(&xml[last..]);
    out
}

fn write_paragraph(out: &mut String, p: &Paragraph, media: &mut MediaRegistry<'_>) {
    out.push_str("<w:p>");
    write_paragraph_properties(out, &p.style);

    for item in &p.content {
        match item {
            InlineContent::Text(run) => write_run(out, run),
            InlineContent::LineBreak => out.push_str("<w:r><w:br/></w:r>"),
            InlineContent::Tab => out.push_str("<w:r><w:tab/></w:r>"),
            InlineContent::Drawing(drawing) => {
                out.push_str("<w:r>");
                out.push_str(&media.place(drawing));
                out.push_str("</w:r>");
            }
        }
    }

    out.push_str("</w:p>");
}

fn write_paragraph_properties(out: &mut String, style: &ParagraphStyle) {
    let mut props = String::new();
    if let Some(id) = &style.style_id {
        let _ = write!(props, r#"<w:pStyle w:val="{}"/>"#, escape(id.as_str()));
    }
    if style.keep_with_next {
        props.push_str("<w:keepNext/>");
    }
    if style.widow_control {
        props.push_str("<w:widowControl/>");
    }
    if let Some(after) = style.space_after {
        let _ = write!(props, r#"<w:spacing w:after="{}"/>"#, (after * 20.0).round() as i64);
    }
    if let Some(alignment) = style.alignment {
        let _ = write!(props, r#"<w:jc w:val="{}"/>"#, alignment.as_jc());
    }

    if !props.is_empty() {
        out.push_str("<w:pPr>");
        out.push_str(&props);
        out.push_str("</w:pPr>");
    }
}

fn write_run(out: &mut String, run: &TextRun) {
    if run.text.is_empty() {
        return;
    }
    out.push_str("<w:r>");
    write_run_properties(out, &run.style);
    let _ = write!(
        out,
        r#"<w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape_text(&run.text)
    );
}

fn write_run_properties(out: &mut String, style: &TextStyle) {
    if *style == TextStyle::default() {
        return;
    }

    out.push_str("<w:rPr>");
    if let Some(font) = &style.font_name {
        let font = escape(font.as_str());
        let _ = write!(out, r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#);
    }
    if style.bold {
        out.push_str("<w:b/><w:bCs/>");
    }
    if style.italic {
        out.push_str("<w:i/><w:iCs/>");
    }
    if let Some(color) = style.color {
        let _ = write!(out, r#"<w:color w:val="{}"/>"#, color.to_hex());
    }
    if let Some(size) = style.font_size {
        let half_points = (size * 2.0).round() as i64;
        let _ = write!(out, r#"<w:sz w:val="{half_points}"/><w:szCs w:val="{half_points}"/>"#);
    }
    if style.underline {
        out.push_str(r#"<w:u w:val="single"/>"#);
    }
    out.push_str("</w:rPr>");
}

fn write_table(out: &mut String, table: &Table, media: &mut MediaRegistry<'_>) {
    let grid_cols = table
        .rows
        .iter()
        .map(|r| r.cells.iter().map(|c| c.grid_span.max(1) as usize).sum::<usize>())
        .max()
        .unwrap_or(0)
        .max(1);

    let widths: Vec<u32> = match &table.column_widths {
        Some(w) if w.len() == grid_cols => w.clone(),
        _ => vec![DEFAULT_TABLE_WIDTH / grid_cols as u32; grid_cols],
    };

    out.push_str("<w:tbl><w:tblPr>");
    out.push_str(r#"<w:tblW w:w="0" w:type="auto"/><w:tblBorders>"#);
    for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        let _ = write!(
            out,
            r#"<w:{side} w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#
        );
    }
    out.push_str(r#"</w:tblBorders><w:tblLook w:val="04A0"/></w:tblPr><w:tblGrid>"#);
    for w in &widths {
        let _ = write!(out, r#"<w:gridCol w:w="{w}"/>"#);
    }
    out.push_str("</w:tblGrid>");

    for row in &table.rows {
        out.push_str("<w:tr>");
        let mut col = 0usize;
        for cell in &row.cells {
            let span = cell.grid_span.max(1) as usize;
            let width: u32 = widths.iter().skip(col).take(span).sum();
            col += span;

            out.push_str("<w:tc><w:tcPr>");
            let _ = write!(out, r#"<w:tcW w:w="{width}" w:type="dxa"/>"#);
            if span > 1 {
                let _ = write!(out, r#"<w:gridSpan w:val="{span}"/>"#);
            }
            out.push_str("</w:tcPr>");

            if cell.content.is_empty() {
                out.push_str("<w:p/>");
            }
            for p in &cell.content {
                write_paragraph(out, p, media);
            }
            out.push_str("</w:tc>");
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
}

/// Escape text for a `w:t`, dropping characters XML 1.0 cannot carry.
fn escape_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= ' ')
        .filter(|&c| !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
        .collect();
    escape(cleaned.as_str()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alignment, Rgb, TableCell, TableRow};

    fn render(blocks: &[Block]) -> (String, Package, Relationships, String) {
        let mut package = Package::new();
        let mut rels = Relationships::new();
        let mut types = String::from("<Types></Types>");
        let xml = {
            let mut media = MediaRegistry::new(&mut package, &mut rels, &mut types);
            let mut out = String::new();
            for block in blocks {
                write_block(&mut out, block, &mut media);
            }
            out
        };
        (xml, package, rels, types)
    }

    #[test]
    fn test_paragraph_property_order() {
        let mut p = Paragraph::new();
        p.style = ParagraphStyle {
            style_id: Some("Body".into()),
            alignment: Some(Alignment::Justify),
            space_after: Some(12.0),
            keep_with_next: true,
            widow_control: true,
        };
        p.add_run(TextRun::styled(
            "Hi <you>",
            TextStyle {
                bold: true,
                underline: true,
                font_size: Some(12.5),
                color: Some(Rgb::BLACK),
                ..Default::default()
            },
        ));

        let (xml, ..) = render(&[p.into()]);
        assert_eq!(
            xml,
            concat!(
                r#"<w:p><w:pPr><w:pStyle w:val="Body"/><w:keepNext/><w:widowControl/><w:spacing w:after="240"/><w:jc w:val="both"/></w:pPr>"#,
                r#"<w:r><w:rPr><w:b/><w:bCs/><w:color w:val="000000"/><w:sz w:val="25"/><w:szCs w:val="25"/><w:u w:val="single"/></w:rPr>"#,
                r#"<w:t xml:space="preserve">Hi &lt;you&gt;</w:t></w:r></w:p>"#
            )
        );
    }

    #[test]
    fn test_table_grid_defaults() {
        let mut table = Table::new();
        table.add_row(TableRow::from_strings(["a", "b", "c"]));
        table.add_row(TableRow::new(vec![TableCell::empty()]));

        let (xml, ..) = render(&[table.into()]);
        assert_eq!(xml.matches("<w:gridCol w:w=\"3000\"/>").count(), 3);
        assert_eq!(xml.matches("<w:tr>").count(), 2);
        assert!(xml.contains("<w:tc><w:tcPr><w:tcW w:w=\"3000\" w:type=\"dxa\"/></w:tcPr><w:p/></w:tc>"));
    }

    #[test]
    fn test_drawing_media_registered() {
        let markup = r#"<w:drawing><a:blip r:embed="rId5"/></w:drawing>"#;
        let drawing = Drawing::new(markup)
            .with_media(MediaPart::image("rId5", "media/image1.png", vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]));
        let mut p = Paragraph::new();
        p.add_drawing(drawing.clone());
        p.add_drawing(drawing);

        let (xml, package, rels, types) = render(&[p.into()]);
        assert_eq!(xml.matches(r#"r:embed="rId1""#).count(), 2);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels.get("rId1").map(|r| r.target.as_str()), Some("media/restyle_image1.png"));
        assert!(package.has_part("word/media/restyle_image1.png"));
        assert!(types.contains(r#"Extension="png""#));
    }

    #[test]
    fn test_present_media_keeps_id() {
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let mut package = Package::new();
        package.set_part("word/media/image1.png", data.clone());
        let mut rels = Relationships::new();
        rels.add(MediaPart::IMAGE_REL_TYPE, "media/image1.png");
        let mut types = String::from("<Types></Types>");

        let drawing = Drawing::new(r#"<w:drawing><a:blip r:embed="rId1"/></w:drawing>"#)
            .with_media(MediaPart::image("rId1", "media/image1.png", data));
        let mut media = MediaRegistry::new(&mut package, &mut rels, &mut types);
        let markup = media.place(&drawing);

        assert_eq!(markup, drawing.markup);
        assert_eq!(media.registered(), 0);
    }

    #[test]
    fn test_widow_control_added_to_markup() {
        assert_eq!(with_widow_control("<w:p/>"), "<w:p><w:pPr><w:widowControl/></w:pPr></w:p>");
        assert_eq!(
            with_widow_control(r#"<w:p w:rsidR="00A1"><w:r><w:t>x</w:t></w:r></w:p>"#),
            r#"<w:p w:rsidR="00A1"><w:pPr><w:widowControl/></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#
        );
        assert_eq!(
            with_widow_control("<w:p><w:pPr/></w:p>"),
            "<w:p><w:pPr><w:widowControl/></w:pPr></w:p>"
        );
    }

    #[test]
    fn test_widow_control_keeps_property_order() {
        assert_eq!(
            with_widow_control(r#"<w:p><w:pPr><w:pStyle w:val="Title"/><w:keepNext/><w:ind w:left="720"/></w:pPr></w:p>"#),
            r#"<w:p><w:pPr><w:pStyle w:val="Title"/><w:keepNext/><w:widowControl/><w:ind w:left="720"/></w:pPr></w:p>"#
        );
        assert_eq!(
            with_widow_control(r#"<w:p><w:pPr><w:widowControl w:val="0"/><w:shd w:fill="ADD8E6"/></w:pPr></w:p>"#),
            r#"<w:p><w:pPr><w:widowControl/><w:shd w:fill="ADD8E6"/></w:pPr></w:p>"#
        );
    }

    #[test]
    fn test_widow_control_skips_other_p_elements() {
        let xml = r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:pict/></w:r></w:p></w:tc></w:tr></w:tbl>"#;
        assert_eq!(
            with_widow_control(xml),
            r#"<w:tbl><w:tr><w:tc><w:p><w:pPr><w:widowControl/></w:pPr><w:r><w:pict/></w:r></w:p></w:tc></w:tr></w:tbl>"#
        );
    }

    #[test]
    fn test_escape_text_drops_control_chars() {
        assert_eq!(escape_text("a\u{0}b\u{1F}c & d"), "abc &amp; d");
    }
}
