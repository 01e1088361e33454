//! Integration tests for rebuilding raw text inside a template.

use std::path::{Path, PathBuf};

use restyle::docx::{Margins, TemplateOptions, WordDocument, DOCUMENT_XML};
use restyle::model::{Alignment, Block, DocumentModel};
use restyle::{Reconstructor, ReconstructOptions, Restyle};

fn template(dir: &Path) -> PathBuf {
    let path = dir.join("template.docx");
    restyle::init_template(&path, &TemplateOptions::new().with_header("ACME LTD")).unwrap();
    path
}

fn texts(doc: &WordDocument) -> Vec<String> {
    doc.blocks().iter().map(Block::plain_text).collect()
}

#[test]
fn test_letter_layout() {
    let dir = tempfile::tempdir().unwrap();
    let template = template(dir.path());
    let output = dir.path().join("letter.docx");

    let raw = "Ref: 42/A\nDate: 16/06/24\n\nINTRODUCTION\nThis letter covers the agreement.\nPayment Terms:\nNet thirty days.";
    let report = restyle::build_from_text(raw, &template, &output).unwrap();

    assert_eq!(report.date.as_deref(), Some("Jun 16, 2024"));
    assert!(report.suppressed_date_line);
    assert_eq!(report.headings, 2);

    let doc = WordDocument::load(&output).unwrap();
    assert_eq!(
        texts(&doc),
        vec![
            "Jun 16, 2024",
            "Ref: 42/A",
            "INTRODUCTION",
            "This letter covers the agreement.",
            "Payment Terms:",
            "Net thirty days.",
        ]
    );

    let blocks = doc.blocks();
    let date = blocks[0].as_paragraph().unwrap();
    assert_eq!(date.style.alignment, Some(Alignment::Right));
    assert!(date.runs().all(|r| r.style.bold));

    let heading = blocks[2].as_paragraph().unwrap();
    assert_eq!(heading.style.alignment, Some(Alignment::Center));
    assert!(heading.style.keep_with_next);
    assert!(heading.runs().all(|r| r.style.bold && r.style.underline));

    let body = blocks[3].as_paragraph().unwrap();
    assert_eq!(body.style.alignment, Some(Alignment::Justify));
    assert!(!body.style.keep_with_next);
    assert!(doc.blocks().iter().filter_map(Block::as_paragraph).all(|p| p.style.widow_control));

    // Header from the template survives
    assert!(doc.package().has_part("word/header1.xml"));
}

/// Template whose body has a date slot, a styled letterhead table and a
/// bookmarked contact line with a hyperlink.
fn letterhead_template(dir: &Path) -> PathBuf {
    let mut package = WordDocument::blank(&TemplateOptions::default()).unwrap().package().clone();
    let xml = package.require_str(DOCUMENT_XML).unwrap();
    let (head, rest) = xml.split_at(xml.find("<w:body>").unwrap() + "<w:body>".len());
    let rest = rest.strip_prefix("<w:p/>").unwrap();
    let letterhead = concat!(
        r#"<w:p/>"#,
        r#"<w:tbl><w:tblPr><w:tblStyle w:val="LetterheadGrid"/><w:tblW w:w="0" w:type="auto"/></w:tblPr>"#,
        r#"<w:tblGrid><w:gridCol w:w="9000"/></w:tblGrid><w:tr><w:tc><w:tcPr><w:tcW w:w="9000" w:type="dxa"/>"#,
        r#"<w:shd w:val="clear" w:color="auto" w:fill="ADD8E6"/></w:tcPr>"#,
        r#"<w:p><w:r><w:t>ACME LTD</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        r#"<w:bookmarkStart w:id="1" w:name="contact"/>"#,
        r#"<w:p><w:pPr><w:ind w:left="720"/></w:pPr><w:hyperlink w:anchor="contact">"#,
        r#"<w:r><w:rPr><w:highlight w:val="yellow"/></w:rPr><w:t>Visit us</w:t></w:r></w:hyperlink></w:p>"#,
        r#"<w:bookmarkEnd w:id="1"/>"#,
    );
    package.set_part(DOCUMENT_XML, format!("{head}{letterhead}{rest}"));

    let path = dir.join("letterhead.docx");
    package.save_atomic(&path).unwrap();
    path
}

#[test]
fn test_template_body_kept_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let template = letterhead_template(dir.path());
    let output = dir.path().join("out.docx");

    restyle::build_from_text("Date: 16/06/24\nHELLO\nbody", &template, &output).unwrap();

    let doc = WordDocument::load(&output).unwrap();
    assert_eq!(texts(&doc), vec!["Jun 16, 2024", "ACME LTD", "Visit us", "HELLO", "body"]);

    let xml = doc.package().require_str(DOCUMENT_XML).unwrap();
    for kept in [
        r#"<w:tblStyle w:val="LetterheadGrid"/>"#,
        r#"w:fill="ADD8E6""#,
        r#"<w:bookmarkStart w:id="1" w:name="contact"/>"#,
        r#"<w:bookmarkEnd w:id="1"/>"#,
        r#"<w:hyperlink w:anchor="contact">"#,
        r#"<w:ind w:left="720"/>"#,
        r#"<w:highlight w:val="yellow"/>"#,
    ] {
        assert!(xml.contains(kept), "missing {kept}");
    }
    assert!(!xml.contains("<w:tblBorders>"));
    assert!(xml.find("Visit us").unwrap() < xml.find("HELLO").unwrap());
}

#[test]
fn test_margins_option_applied() {
    let dir = tempfile::tempdir().unwrap();
    let template = template(dir.path());
    let output = dir.path().join("out.docx");

    Restyle::new()
        .with_template(&template)
        .with_margins(Margins::classic())
        .build_text("OVERVIEW\nbody", &output)
        .unwrap();

    let doc = WordDocument::load(&output).unwrap();
    assert_eq!(doc.margins(), Some(Margins::classic()));
}

#[test]
fn test_template_margins_kept_without_option() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("template.docx");
    restyle::init_template(&template, &TemplateOptions::new().with_margins(Margins::uniform(0.5))).unwrap();
    let output = dir.path().join("out.docx");

    restyle::build_from_text("body only", &template, &output).unwrap();
    assert_eq!(WordDocument::load(&output).unwrap().margins(), Some(Margins::uniform(0.5)));
}

#[test]
fn test_empty_text_keeps_template_body() {
    let dir = tempfile::tempdir().unwrap();
    let template = template(dir.path());
    let output = dir.path().join("out.docx");

    let report = restyle::build_from_text("\n   \n", &template, &output).unwrap();
    assert_eq!(report.paragraphs, 0);
    assert!(report.date.is_none());
    assert_eq!(texts(&WordDocument::load(&output).unwrap()), vec![""]);
}

#[test]
fn test_always_stamp_date() {
    let dir = tempfile::tempdir().unwrap();
    let template = template(dir.path());
    let output = dir.path().join("out.docx");

    let engine = Reconstructor::new(ReconstructOptions::new().always_stamp_date());
    let report = engine.build_from_text("no date here", &template, &output).unwrap();

    let stamped = report.date.clone().unwrap();
    let expected = chrono::Local::now().date_naive().format("%b %d, %Y").to_string();
    assert_eq!(stamped, expected);
    assert_eq!(texts(&WordDocument::load(&output).unwrap()), vec![stamped, "no date here".to_string()]);
}

#[test]
fn test_rebuild_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let template = template(dir.path());
    let raw = "TITLE\n\nBody text here.";

    let first = dir.path().join("first.docx");
    let second = dir.path().join("second.docx");
    restyle::build_from_text(raw, &template, &first).unwrap();
    restyle::build_from_text(raw, &template, &second).unwrap();

    let a = WordDocument::load(&first).unwrap();
    let b = WordDocument::load(&second).unwrap();
    assert_eq!(a.blocks(), b.blocks());
    assert_eq!(texts(&a), vec!["", "TITLE", "Body text here."]);
}

#[test]
fn test_failed_build_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.docx");
    let err = restyle::build_from_text("text", dir.path().join("nope.docx"), &output).unwrap_err();

    assert_eq!(err.kind(), restyle::ErrorKind::TemplateNotFound);
    assert!(!output.exists());
}
