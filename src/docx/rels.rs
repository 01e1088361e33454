//! Relationship parts and `[Content_Types].xml` maintenance.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};

pub const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";
pub const CONTENT_TYPES: &str = "[Content_Types].xml";

const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// One `<Relationship>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `TargetMode="External"`
    pub external: bool,
}

/// The relationships of one package part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut items = Vec::new();
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut rel = Relationship {
                        id: String::new(),
                        rel_type: String::new(),
                        target: String::new(),
                        external: false,
                    };
                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| Error::Xml(format!("Invalid attribute: {e}")))?;
                        let value = attr
                            .unescape_value()
                            .map(|v| v.into_owned())
                            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                        match attr.key.as_ref() {
                            b"Id" => rel.id = value,
                            b"Type" => rel.rel_type = value,
                            b"Target" => rel.target = value,
                            b"TargetMode" => rel.external = value.eq_ignore_ascii_case("external"),
                            _ => {}
                        }
                    }
                    if !rel.id.is_empty() {
                        items.push(rel);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(format!("Error parsing relationships: {e}"))),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { items })
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First `rIdN` not in use.
    pub fn next_id(&self) -> String {
        let max = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }

    /// Add an internal relationship and return its id.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let id = self.next_id();
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        });
        id
    }

    /// Add a relationship to a URI outside the package and return its id.
    pub fn add_external(&mut self, rel_type: &str, target: &str) -> String {
        let id = self.add(rel_type, target);
        if let Some(rel) = self.items.last_mut() {
            rel.external = true;
        }
        id
    }

    /// Serialize as a `.rels` part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<Relationships xmlns="{RELS_NS}">"#));
        for rel in &self.items {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape(rel.id.as_str()),
                escape(rel.rel_type.as_str()),
                escape(rel.target.as_str())
            ));
            if rel.external {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// Ensure `[Content_Types].xml` declares a default content type for `ext`.
pub fn ensure_default_content_type(xml: &str, ext: &str, content_type: &str) -> String {
    let needle = format!(r#"Extension="{}""#, ext.to_ascii_lowercase());
    if xml.to_ascii_lowercase().contains(&needle.to_ascii_lowercase()) {
        return xml.to_string();
    }

    let entry = format!(
        r#"<Default Extension="{}" ContentType="{}"/>"#,
        escape(ext),
        escape(content_type)
    );
    match xml.rfind("</Types>") {
        Some(pos) => {
            let mut out = String::with_capacity(xml.len() + entry.len());
            out.push_str(&xml[..pos]);
            out.push_str(&entry);
            out.push_str(&xml[pos..]);
            out
        }
        None => xml.to_string(),
    }
}

/// Ensure `[Content_Types].xml` declares an override for `part_name`.
pub fn ensure_override_content_type(xml: &str, part_name: &str, content_type: &str) -> String {
    let part_name = format!("/{}", part_name.trim_start_matches('/'));
    if xml.contains(&format!(r#"PartName="{part_name}""#)) {
        return xml.to_string();
    }

    let entry = format!(
        r#"<Override PartName="{}" ContentType="{}"/>"#,
        escape(part_name.as_str()),
        escape(content_type)
    );
    match xml.rfind("</Types>") {
        Some(pos) => format!("{}{}{}", &xml[..pos], entry, &xml[pos..]),
        None => xml.to_string(),
    }
}

/// Resolve a relationship target relative to `word/`.
pub fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => {
            let mut segments: Vec<&str> = vec!["word"];
            for seg in target.split('/') {
                match seg {
                    "" | "." => {}
                    ".." => {
                        segments.pop();
                    }
                    s => segments.push(s),
                }
            }
            segments.join("/")
        }
    }
}
