//! Date detection and normalization.
//!
//! Scans the first [`SEARCH_LINES`] lines of a text for a date in one of
//! several known formats and renders it as `Mon DD, YYYY`. Numeric dates are
//! read day-first (`16/06/24` is the 16th of June).

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Number of leading lines searched for a date.
pub const SEARCH_LINES: usize = 15;

/// Display format for normalized dates.
pub const DISPLAY_FORMAT: &str = "%b %d, %Y";

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const MONTH_NAME: &str = r"(?i:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

/// How the captures of a pattern map onto a calendar date.
#[derive(Debug, Clone, Copy)]
enum Shape {
    /// day, month, year
    DayMonthYear,
    /// month name, day, year
    NameDayYear,
    /// day, month name, year
    DayNameYear,
    /// year, month, day
    YearMonthDay,
}

struct DatePattern {
    regex: Regex,
    shape: Shape,
}

static PATTERNS: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    let specs: Vec<(String, Shape)> = vec![
        (
            r"(?i)\bdate\s*:\s*(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4}|\d{2})\b".to_string(),
            Shape::DayMonthYear,
        ),
        (
            r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})\b".to_string(),
            Shape::DayMonthYear,
        ),
        (
            format!(r"\b({MONTH_NAME})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"),
            Shape::NameDayYear,
        ),
        (
            format!(r"\b(\d{{1,2}})(?:st|nd|rd|th)?\s+({MONTH_NAME})\.?,?\s+(\d{{4}})\b"),
            Shape::DayNameYear,
        ),
        (
            r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b".to_string(),
            Shape::DayMonthYear,
        ),
        (
            r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b".to_string(),
            Shape::YearMonthDay,
        ),
    ];

    specs
        .into_iter()
        .map(|(src, shape)| DatePattern {
            regex: Regex::new(&src).expect("valid date pattern"),
            shape,
        })
        .collect()
});

/// A shape-only check that a line carries something that looks like a date.
static DATE_SHAPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b\d{{1,4}}[/\-.]\d{{1,2}}[/\-.]\d{{2,4}}\b|\b{MONTH_NAME}\.?\s+\d{{1,2}}\b|\b\d{{1,2}}(?:st|nd|rd|th)?\s+{MONTH_NAME}\b"
    ))
    .expect("valid date shape pattern")
});

/// A date found in the leading lines of a text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDate {
    /// Normalized `Mon DD, YYYY` text, or the raw match when `degraded`
    pub display: String,

    /// The source line the date was found on, verbatim
    pub source_line: String,

    /// Zero-based index of the source line
    pub line_index: usize,

    /// The match did not form a valid calendar date
    pub degraded: bool,
}

impl ExtractedDate {
    /// A date stamped from a known calendar day rather than found in text.
    pub fn stamped(date: NaiveDate) -> Self {
        Self {
            display: format_date(date),
            source_line: String::new(),
            line_index: 0,
            degraded: false,
        }
    }

    /// Whether this date came from a line of the input.
    pub fn has_source_line(&self) -> bool {
        !self.source_line.trim().is_empty()
    }
}

/// Find the first date in the leading lines of `text`.
pub fn extract(text: &str) -> Option<ExtractedDate> {
    text.lines()
        .take(SEARCH_LINES)
        .enumerate()
        .find_map(|(index, line)| extract_from_line(line, index))
}

fn extract_from_line(line: &str, line_index: usize) -> Option<ExtractedDate> {
    PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.regex.captures(line)?;
        let matched = caps.get(0).map(|m| m.as_str()).unwrap_or_default();

        let (display, degraded) = match resolve(&caps, pattern.shape) {
            Some(date) => (format_date(date), false),
            None => {
                log::warn!("date-like text {matched:?} is not a valid calendar date");
                (matched.to_string(), true)
            }
        };

        Some(ExtractedDate {
            display,
            source_line: line.to_string(),
            line_index,
            degraded,
        })
    })
}

fn resolve(caps: &Captures<'_>, shape: Shape) -> Option<NaiveDate> {
    let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();

    let (year, month, day) = match shape {
        Shape::DayMonthYear => (
            normalize_year(group(3))?,
            group(2).parse().ok()?,
            group(1).parse().ok()?,
        ),
        Shape::NameDayYear => (
            normalize_year(group(3))?,
            month_from_name(group(1))?,
            group(2).parse().ok()?,
        ),
        Shape::DayNameYear => (
            normalize_year(group(3))?,
            month_from_name(group(2))?,
            group(1).parse().ok()?,
        ),
        Shape::YearMonthDay => (
            normalize_year(group(1))?,
            group(2).parse().ok()?,
            group(3).parse().ok()?,
        ),
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Two-digit years below 50 are 20xx, the rest 19xx.
pub fn normalize_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    match raw.len() {
        2 if year < 50 => Some(2000 + year),
        2 => Some(1900 + year),
        _ => Some(year),
    }
}

/// Month number from a name, matched case-insensitively on its first 3 letters.
pub fn month_from_name(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

/// Render a date as `Mon DD, YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// Whether `line` is the line a date was extracted from.
///
/// Exact match after trimming, or containment in either direction when the
/// line also carries a `Date:` marker or date-shaped text.
pub fn is_date_line(line: &str, source_line: &str) -> bool {
    let line = line.trim();
    let source = source_line.trim();
    if line.is_empty() || source.is_empty() {
        return false;
    }
    if line == source {
        return true;
    }

    let contains = line.contains(source) || source.contains(line);
    contains && (line.to_lowercase().contains("date:") || DATE_SHAPED.is_match(line))
}
