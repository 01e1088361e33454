//! Text cleanup for page-oriented extraction.
//!
//! PDF text comes out with ligature glyphs, replacement characters, stray
//! page numbers and ragged whitespace. The pipeline repairs those while
//! keeping blank lines intact, since they are the paragraph boundaries.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*(?:[-–—][ \t]*)?\d{1,3}(?:[ \t]*[-–—])?[ \t]*$").expect("valid page number pattern")
});

static LINE_END_HYPHEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z])-[ \t]*\n[ \t]*([a-z])").expect("valid hyphenation pattern"));

static INNER_SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]{2,}").expect("valid whitespace pattern"));

const LIGATURES: [(&str, &str); 7] = [
    ("\u{FB00}", "ff"),
    ("\u{FB01}", "fi"),
    ("\u{FB02}", "fl"),
    ("\u{FB03}", "ffi"),
    ("\u{FB04}", "ffl"),
    ("\u{FB05}", "st"),
    ("\u{FB06}", "st"),
];

/// Options for text cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Fix ligatures (fi, fl, etc.)
    pub fix_ligatures: bool,

    /// Remove Unicode replacement character (U+FFFD)
    pub remove_replacement_char: bool,

    /// Remove Private Use Area (PUA) characters
    pub remove_pua: bool,

    /// Remove page-number lines at the top or bottom of each page
    pub remove_page_numbers: bool,

    /// Join words hyphenated across a line break
    pub fix_hyphenation: bool,

    /// Collapse runs of spaces and strip trailing whitespace
    pub normalize_whitespace: bool,

    /// Maximum consecutive newlines (0 = unlimited)
    pub max_consecutive_newlines: u8,
}

impl CleanupOptions {
    /// Unicode normalization and whitespace only.
    pub fn minimal() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: false,
            remove_replacement_char: false,
            remove_pua: false,
            remove_page_numbers: false,
            fix_hyphenation: false,
            normalize_whitespace: true,
            max_consecutive_newlines: 0,
        }
    }

    /// Every stage enabled.
    pub fn standard() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: true,
            remove_replacement_char: true,
            remove_pua: true,
            remove_page_numbers: true,
            fix_hyphenation: true,
            normalize_whitespace: true,
            max_consecutive_newlines: 2,
        }
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Text cleanup pipeline.
#[derive(Debug, Clone, Default)]
pub struct CleanupPipeline {
    options: CleanupOptions,
}

impl CleanupPipeline {
    /// Create a new cleanup pipeline with the given options.
    pub fn new(options: CleanupOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CleanupOptions {
        &self.options
    }

    /// Process text through the cleanup pipeline as a single page.
    pub fn process(&self, text: &str) -> String {
        self.process_pages(&[text], "")
    }

    /// Clean each page's edges, join the pages with `separator` and process
    /// the result.
    ///
    /// Page numbers are only recognized on the first or last non-blank line
    /// of a page, so numeric lines inside the body survive.
    pub fn process_pages<S: AsRef<str>>(&self, pages: &[S], separator: &str) -> String {
        let pages: Vec<String> = pages
            .iter()
            .map(|page| {
                let page = page.as_ref().replace("\r\n", "\n");
                if self.options.remove_page_numbers {
                    strip_page_numbers(&page)
                } else {
                    page
                }
            })
            .collect();
        let mut result = pages.join(separator);

        if self.options.normalize_unicode {
            result = result.nfc().collect();
        }

        if self.options.fix_ligatures {
            for (ligature, replacement) in LIGATURES {
                result = result.replace(ligature, replacement);
            }
        }

        if self.options.remove_replacement_char {
            result = result.replace('\u{FFFD}', "");
        }

        if self.options.remove_pua {
            result = remove_pua_chars(&result);
        }

        if self.options.fix_hyphenation {
            result = LINE_END_HYPHEN.replace_all(&result, "$1$2").into_owned();
        }

        if self.options.normalize_whitespace {
            result = normalize_whitespace(&result);
        }

        if self.options.max_consecutive_newlines > 0 {
            result = limit_newlines(&result, self.options.max_consecutive_newlines as usize);
        }

        result.trim().to_string()
    }
}

/// Drop the first and last non-blank lines of a page when they hold only a
/// page number.
fn strip_page_numbers(page: &str) -> String {
    let mut lines: Vec<&str> = page.split('\n').collect();

    if let Some(first) = lines.iter().position(|line| !line.trim().is_empty()) {
        if PAGE_NUMBER.is_match(lines[first]) {
            lines.remove(first);
        }
    }
    if let Some(last) = lines.iter().rposition(|line| !line.trim().is_empty()) {
        if PAGE_NUMBER.is_match(lines[last]) {
            lines.remove(last);
        }
    }

    lines.join("\n")
}

fn remove_pua_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            let code = *c as u32;
            !(0xE000..=0xF8FF).contains(&code)
                && !(0xF0000..=0xFFFFD).contains(&code)
                && !(0x100000..=0x10FFFD).contains(&code)
        })
        .collect()
}

fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| INNER_SPACES.replace_all(line.trim_end(), " ").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

fn limit_newlines(text: &str, max: usize) -> String {
    let mut result = String::with_capacity(text.len());
    let mut run = 0;
    for c in text.chars() {
        if c == '\n' {
            run += 1;
            if run > max {
                continue;
            }
        } else {
            run = 0;
        }
        result.push(c);
    }
    result
}
