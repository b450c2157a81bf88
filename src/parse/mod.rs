// src/parse/mod.rs
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

pub mod line;

use line::{clean_field, tokenize_line};

/// Default record-boundary pattern: data rows open with a spreadsheet
/// timestamp, `DD/MM/YYYY HH:MM:SS`.
pub static DEFAULT_RECORD_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}\s+\d{2}:\d{2}:\d{2}").unwrap());

/// How many leading lines are scanned for the first data row before
/// falling back to "header is line one".
const HEADER_SCAN_WINDOW: usize = 10;

/// One logical data row: header string → field value, in column order.
/// Ephemeral; consumed immediately by the field resolver.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    columns: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(columns: Vec<(String, String)>) -> Self {
        Self { columns }
    }

    /// Exact header lookup.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// Case- and trim-insensitive header lookup.
    pub fn get_normalized(&self, header: &str) -> Option<&str> {
        let wanted = header.trim().to_lowercase();
        self.columns
            .iter()
            .find(|(h, _)| h.trim().to_lowercase() == wanted)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value in column order, for positional fallbacks.
    pub fn first_non_empty_value(&self) -> Option<&str> {
        self.columns
            .iter()
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(h, _)| h.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Knobs for the reconstructor. The record-boundary pattern is
/// configurable because the spreadsheet's timestamp format has drifted
/// before and will drift again.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub record_start: Regex,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            record_start: DEFAULT_RECORD_START.clone(),
        }
    }
}

/// Parse the full CSV export into logical rows.
///
/// The export is messy in two specific ways this handles:
/// - the header block can span several physical lines (wrapped titles),
///   so everything before the first timestamp-prefixed line is glued
///   together and tokenized as one header line;
/// - free-text cells contain embedded newlines, so a physical line that
///   does not open with the timestamp pattern is a continuation of the
///   previous logical row, not a new record.
///
/// Degenerate input (fewer than 2 usable lines) yields an empty Vec,
/// never an error.
pub fn parse_csv(csv_text: &str, opts: &ParseOptions) -> Vec<RawRow> {
    let lines: Vec<&str> = csv_text
        .split('\n')
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        warn!(lines = lines.len(), "CSV has fewer than 2 usable lines");
        return Vec::new();
    }

    // 1) find where data begins: first timestamp-prefixed line within the
    //    scan window; default boundary is right after the first line.
    let mut data_start = 1;
    for (i, l) in lines.iter().take(HEADER_SCAN_WINDOW).enumerate() {
        if opts.record_start.is_match(l) {
            data_start = i;
            break;
        }
    }

    // 2) glue the header block and tokenize it once.
    let header_line: String = lines[..data_start].concat();
    let headers: Vec<String> = tokenize_line(&header_line)
        .iter()
        .map(|h| clean_field(h))
        .filter(|h| !h.is_empty())
        .collect();
    debug!(columns = headers.len(), data_start, "header block resolved");

    // 3) walk data lines, folding continuation lines into the current
    //    logical row buffer.
    let mut rows = Vec::new();
    let mut buffer = String::new();
    for l in &lines[data_start..] {
        let l = l.trim();
        if opts.record_start.is_match(l) {
            if !buffer.is_empty() {
                if let Some(row) = build_row(&buffer, &headers) {
                    rows.push(row);
                }
            }
            buffer = l.to_string();
        } else {
            // Continuation of a wrapped cell.
            buffer.push(' ');
            buffer.push_str(l);
        }
    }
    if !buffer.is_empty() {
        if let Some(row) = build_row(&buffer, &headers) {
            rows.push(row);
        }
    }

    debug!(rows = rows.len(), "parsed logical rows");
    rows
}

/// Tokenize one buffered logical line and zip it against the headers.
/// Rows whose first value is empty are spreadsheet artifacts and are
/// dropped here.
fn build_row(logical_line: &str, headers: &[String]) -> Option<RawRow> {
    let values: Vec<String> = tokenize_line(logical_line)
        .iter()
        .map(|v| clean_field(v))
        .collect();

    if values.first().map(String::as_str).unwrap_or("").is_empty() {
        debug!("dropping row with empty first field");
        return None;
    }

    let columns = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.clone(), values.get(i).cloned().unwrap_or_default()))
        .collect();
    Some(RawRow::new(columns))
}
