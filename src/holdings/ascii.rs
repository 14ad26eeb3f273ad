//! Holdings from a pre-2013 complete submission text file, where the table is
//! a fixed-width block between `<TABLE>` and `</TABLE>`.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static TABLE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^<table>").expect("regex should parse"));
static TABLE_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^</table>$").expect("regex should parse"));
/// SGML column and page markers that carry no data.
static MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(?:s|c|caption|fn|page)>").expect("regex should parse"));
static WS_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("regex should parse"));

fn strip_markers(line: &str) -> String {
    MARKERS.replace_all(line, "").trim().to_string()
}

/// Lines inside every `<TABLE>` block, trimmed and with SGML markers removed.
pub fn extract_table_lines(text: &str) -> Vec<String> {
    let mut in_table = false;
    let mut lines = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        if TABLE_OPEN.is_match(line) {
            in_table = true;
            let rest = strip_markers(&TABLE_OPEN.replace(line, ""));
            if !rest.is_empty() {
                lines.push(rest);
            }
            continue;
        }
        if TABLE_CLOSE.is_match(line) {
            in_table = false;
            continue;
        }
        if in_table {
            let cleaned = strip_markers(line);
            if !cleaned.is_empty() {
                lines.push(cleaned);
            }
        }
    }

    lines
}

/// Split a fixed-width line on runs of two or more whitespace characters.
pub fn split_columns(line: &str) -> Vec<String> {
    WS_RUN
        .split(line.trim())
        .map(str::to_string)
        .collect()
}

pub fn parse_ascii_table(text: &str) -> Vec<Vec<String>> {
    let rows: Vec<Vec<String>> = extract_table_lines(text)
        .iter()
        .map(|l| split_columns(l))
        .collect();
    debug!(rows = rows.len(), "parsed ascii table");
    rows
}
