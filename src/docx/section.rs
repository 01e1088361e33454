//! Section properties: page size and margins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Twentieths of a point per inch.
pub const TWIPS_PER_INCH: f32 = 1440.0;

static PG_MAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<w:pgMar\b[^>]*?/>").expect("valid pgMar pattern"));

static PG_SZ: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<w:pgSz\b[^>]*?/>").expect("valid pgSz pattern"));

static SECT_PR_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<w:sectPr\b[^>]*?>").expect("valid sectPr pattern"));

/// Page margins in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Margins {
    /// The same margin on every side.
    pub fn uniform(inches: f32) -> Self {
        Self {
            top: inches,
            bottom: inches,
            left: inches,
            right: inches,
        }
    }

    /// 1.5in top and bottom, 1.0in left and right.
    pub fn classic() -> Self {
        Self {
            top: 1.5,
            bottom: 1.5,
            left: 1.0,
            right: 1.0,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

fn twips(inches: f32) -> i64 {
    (inches * TWIPS_PER_INCH).round() as i64
}

/// Read one attribute of a tag, returning the numeric value.
fn attr_value(tag: &str, name: &str) -> Option<i64> {
    let needle = format!(r#"{name}=""#);
    let start = tag.find(&needle)? + needle.len();
    let end = tag[start..].find('"')? + start;
    tag[start..end].parse().ok()
}

fn page_margin_tag(margins: &Margins, existing: Option<&str>) -> String {
    let keep = |name: &str, default: i64| existing.and_then(|t| attr_value(t, name)).unwrap_or(default);
    format!(
        r#"<w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="{}" w:footer="{}" w:gutter="{}"/>"#,
        twips(margins.top),
        twips(margins.right),
        twips(margins.bottom),
        twips(margins.left),
        keep("w:header", 720),
        keep("w:footer", 720),
        keep("w:gutter", 0),
    )
}

/// Section properties for a US Letter page with the given margins.
pub fn default_section(margins: &Margins, references: &str) -> String {
    format!(
        r#"<w:sectPr>{references}<w:pgSz w:w="12240" w:h="15840"/>{}<w:cols w:space="720"/></w:sectPr>"#,
        page_margin_tag(margins, None)
    )
}

/// Rewrite the page margins of a `<w:sectPr>` element.
pub fn apply_margins(sect_pr: &str, margins: &Margins) -> String {
    if let Some(found) = PG_MAR.find(sect_pr) {
        let tag = page_margin_tag(margins, Some(found.as_str()));
        return format!("{}{}{}", &sect_pr[..found.start()], tag, &sect_pr[found.end()..]);
    }

    let tag = page_margin_tag(margins, None);
    if let Some(size) = PG_SZ.find(sect_pr) {
        return format!("{}{}{}", &sect_pr[..size.end()], tag, &sect_pr[size.end()..]);
    }
    if let Some(pos) = sect_pr.rfind("</w:sectPr>") {
        return format!("{}{}{}", &sect_pr[..pos], tag, &sect_pr[pos..]);
    }
    if let Some(open) = SECT_PR_OPEN.find(sect_pr) {
        // Self-closing <w:sectPr/>
        if open.as_str().ends_with("/>") {
            let start = &open.as_str()[..open.as_str().len() - 2];
            return format!(
                "{}{}>{}</w:sectPr>{}",
                &sect_pr[..open.start()],
                start.trim_end(),
                tag,
                &sect_pr[open.end()..]
            );
        }
    }
    sect_pr.to_string()
}

/// Margins currently set on a `<w:sectPr>`, if it declares them.
pub fn read_margins(sect_pr: &str) -> Option<Margins> {
    let tag = PG_MAR.find(sect_pr)?.as_str();
    let inches = |name: &str| attr_value(tag, name).map(|v| v as f32 / TWIPS_PER_INCH);
    Some(Margins {
        top: inches("w:top")?,
        bottom: inches("w:bottom")?,
        left: inches("w:left")?,
        right: inches("w:right")?,
    })
}
