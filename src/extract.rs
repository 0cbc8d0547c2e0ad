//! # Value Extractor
//! Reads the small release table embedded in a calendar item's description.
//!
//! The table is a header row followed by a data row of five cells:
//! time left, impact, previous, consensus, actual. Markup that doesn't fit
//! that shape degrades to missing values; nothing here returns an error.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::borrow::Cow;

static TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("tr selector"));
static TD: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("td selector"));
static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d.\-]").expect("numeric regex"));

/// The five table cells of one feed entry. `None` means "not available".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRow {
    pub time_left: Option<String>,
    pub impact: Option<String>,
    pub previous: Option<String>,
    pub consensus: Option<String>,
    pub actual: Option<String>,
}

impl ExtractedRow {
    /// Row for an entry that carries no table at all.
    pub fn not_available() -> Self {
        Self::default()
    }
}

/// Keep digits, `.` and `-` only: `"3.7%"` → `"3.7"`, `"-12K"` → `"-12"`.
pub fn sanitize_numeric(s: &str) -> String {
    NON_NUMERIC.replace_all(s, "").into_owned()
}

/// Bulk path: trimmed cell texts of the data row, unsanitized.
///
/// - no data row → `Some(ExtractedRow::not_available())`
/// - data row without exactly five cells → `None` (entry is skipped)
pub fn extract_row(body: &str) -> Option<ExtractedRow> {
    let Some(cells) = data_row_texts(body, stripped_text) else {
        return Some(ExtractedRow::not_available());
    };
    let [time_left, impact, previous, consensus, actual]: [String; 5] = cells.try_into().ok()?;
    Some(ExtractedRow {
        time_left: Some(time_left),
        impact: Some(impact),
        previous: Some(previous),
        consensus: Some(consensus),
        actual: Some(actual),
    })
}

/// Live path: sanitized fifth cell of the data row (at least five cells required).
/// Only an empty cell counts as not yet published; `"TBA"` yields `Some("")`.
pub fn extract_actual(body: &str) -> Option<String> {
    let cells = data_row_texts(body, trimmed_text)?;
    let raw = cells.get(4)?;
    (!raw.is_empty()).then(|| sanitize_numeric(raw))
}

/// `<td>` texts of the second `<tr>`; `None` when there is no second row.
fn data_row_texts(body: &str, text: fn(ElementRef<'_>) -> String) -> Option<Vec<String>> {
    let doc = Html::parse_fragment(&with_table(body));
    let row = doc.select(&TR).nth(1)?;
    Some(row.select(&TD).map(text).collect())
}

// The HTML5 tree builder drops `<tr>` outside a table, so bare rows get one.
fn with_table(body: &str) -> Cow<'_, str> {
    if body.to_ascii_lowercase().contains("<table") {
        Cow::Borrowed(body)
    } else {
        Cow::Owned(format!("<table>{body}</table>"))
    }
}

// Each text node trimmed, then joined.
fn stripped_text(cell: ElementRef<'_>) -> String {
    cell.text().map(str::trim).collect()
}

fn trimmed_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}
