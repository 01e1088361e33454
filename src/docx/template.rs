//! A minimal blank WordprocessingML package.

use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

use super::package::Package;
use super::rels::{Relationships, CONTENT_TYPES, DOCUMENT_RELS};
use super::section::{default_section, Margins};
use super::DOCUMENT_XML;

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_HEADER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
const REL_FOOTER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";

const CT_MAIN: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const CT_HEADER: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
const CT_FOOTER: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";

/// Namespace declarations on the root of a generated `word/document.xml`.
pub const DOCUMENT_NAMESPACES: &str = concat!(
    r#"xmlns:wpc="http://schemas.microsoft.com/office/word/2010/wordprocessingCanvas" "#,
    r#"xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" "#,
    r#"xmlns:o="urn:schemas-microsoft-com:office:office" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:v="urn:schemas-microsoft-com:vml" "#,
    r#"xmlns:wp14="http://schemas.microsoft.com/office/word/2010/wordprocessingDrawing" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:w10="urn:schemas-microsoft-com:office:word" "#,
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml" "#,
    r#"xmlns:wpg="http://schemas.microsoft.com/office/word/2010/wordprocessingGroup" "#,
    r#"xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture" "#,
    r#"mc:Ignorable="w14 wp14""#,
);

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Options for a generated template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    /// Centered header text on every page
    pub header: Option<String>,

    /// Centered footer text on every page
    pub footer: Option<String>,

    /// Page margins
    pub margins: Margins,

    /// Default body font
    pub font_name: String,

    /// Default body size in points
    pub font_size: f32,

    /// Header and footer size in points
    pub header_font_size: f32,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            header: None,
            footer: None,
            margins: Margins::default(),
            font_name: "Calibri".to_string(),
            font_size: 11.0,
            header_font_size: 10.0,
        }
    }
}

impl TemplateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the header text.
    pub fn with_header(mut self, text: impl Into<String>) -> Self {
        self.header = Some(text.into());
        self
    }

    /// Set the footer text.
    pub fn with_footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    /// Set the page margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Set the default font.
    pub fn with_font(mut self, name: impl Into<String>, size: f32) -> Self {
        self.font_name = name.into();
        self.font_size = size;
        self
    }
}

/// Build the parts of a blank document.
pub(crate) fn blank_package(options: &TemplateOptions) -> Package {
    let mut package = Package::new();
    let mut doc_rels = Relationships::new();
    doc_rels.add(REL_STYLES, "styles.xml");

    let mut overrides = vec![("/word/document.xml", CT_MAIN), ("/word/styles.xml", CT_STYLES)];
    let mut references = String::new();

    if let Some(text) = options.header.as_deref().filter(|t| !t.trim().is_empty()) {
        let id = doc_rels.add(REL_HEADER, "header1.xml");
        references.push_str(&format!(r#"<w:headerReference w:type="default" r:id="{id}"/>"#));
        package.set_part("word/header1.xml", margin_part("hdr", text, options.header_font_size));
        overrides.push(("/word/header1.xml", CT_HEADER));
    }
    if let Some(text) = options.footer.as_deref().filter(|t| !t.trim().is_empty()) {
        let id = doc_rels.add(REL_FOOTER, "footer1.xml");
        references.push_str(&format!(r#"<w:footerReference w:type="default" r:id="{id}"/>"#));
        package.set_part("word/footer1.xml", margin_part("ftr", text, options.header_font_size));
        overrides.push(("/word/footer1.xml", CT_FOOTER));
    }

    let mut types = String::from(XML_DECL);
    types.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    types.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    types.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for (part, content_type) in &overrides {
        types.push_str(&format!(r#"<Override PartName="{part}" ContentType="{content_type}"/>"#));
    }
    types.push_str("</Types>");

    let mut root_rels = Relationships::new();
    root_rels.add(REL_OFFICE_DOCUMENT, DOCUMENT_XML);

    let document = format!(
        r#"{XML_DECL}<w:document {DOCUMENT_NAMESPACES}><w:body><w:p/>{}</w:body></w:document>"#,
        default_section(&options.margins, &references)
    );

    package.set_part(CONTENT_TYPES, types);
    package.set_part("_rels/.rels", root_rels.to_xml());
    package.set_part(DOCUMENT_XML, document);
    package.set_part("word/styles.xml", styles_part(options));
    package.set_part(DOCUMENT_RELS, doc_rels.to_xml());
    package
}

/// A header (`hdr`) or footer (`ftr`) part with one centered paragraph.
fn margin_part(root: &str, text: &str, size: f32) -> String {
    format!(
        r#"{XML_DECL}<w:{root} {DOCUMENT_NAMESPACES}><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:sz w:val="{half}"/><w:szCs w:val="{half}"/></w:rPr><w:t xml:space="preserve">{text}</w:t></w:r></w:p></w:{root}>"#,
        half = (size * 2.0).round() as i64,
        text = escape(text),
    )
}

fn styles_part(options: &TemplateOptions) -> String {
    let font = escape(options.font_name.as_str());
    let half = (options.font_size * 2.0).round() as i64;
    format!(
        concat!(
            "{decl}",
            r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:docDefaults><w:rPrDefault><w:rPr>"#,
            r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:eastAsia="{font}" w:cs="{font}"/>"#,
            r#"<w:sz w:val="{half}"/><w:szCs w:val="{half}"/><w:lang w:val="en-US"/>"#,
            r#"</w:rPr></w:rPrDefault><w:pPrDefault><w:pPr>"#,
            r#"<w:spacing w:after="160" w:line="259" w:lineRule="auto"/>"#,
            r#"</w:pPr></w:pPrDefault></w:docDefaults>"#,
            r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
            r#"<w:style w:type="character" w:default="1" w:styleId="DefaultParagraphFont"><w:name w:val="Default Paragraph Font"/><w:uiPriority w:val="1"/><w:semiHidden/></w:style>"#,
            r#"<w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/><w:tblPr><w:tblInd w:w="0" w:type="dxa"/>"#,
            r#"<w:tblCellMar><w:top w:w="0" w:type="dxa"/><w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>"#,
            r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:basedOn w:val="TableNormal"/><w:tblPr><w:tblBorders>"#,
            r#"<w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"<w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
            r#"</w:tblBorders></w:tblPr></w:style>"#,
            r#"</w:styles>"#
        ),
        decl = XML_DECL,
        font = font,
        half = half,
    )
}
