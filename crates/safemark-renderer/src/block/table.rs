//! Pipe tables.
//!
//! Extraction only records the raw row lines. Cells are split and rendered
//! when the table element is built, so a cache hit skips the per-cell
//! pipeline entirely.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::placeholder::{PlaceholderKind, PlaceholderRegistry};

/// A cell that is a whole fenced code span: ```` ```x``` ````.
static CELL_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```+([^`]*?)```+").unwrap());

/// `<br>` variants, or an inline code span that must be left alone.
static CELL_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(`[^`]*`)|<br\s*/?>").unwrap());

/// Recorded payload of a table placeholder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TablePayload {
    pub rows: Vec<String>,
    pub has_separator: bool,
}

fn is_table_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// Header separator: the first cell opens with `-` or `:`, as in `|---|:--:|`.
static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|\s*[-:]+.*\|\s*$").unwrap());

fn is_separator_line(line: &str) -> bool {
    SEPARATOR_RE.is_match(line.trim())
}

/// Replace each run of contiguous `|` lines with a block placeholder.
pub(crate) fn extract_tables(text: &str, registry: &mut PlaceholderRegistry) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        if !is_table_line(lines[i]) {
            out.push(lines[i].to_owned());
            i += 1;
            continue;
        }

        let start = i;
        while i < lines.len() && is_table_line(lines[i]) {
            i += 1;
        }
        let group = &lines[start..i];

        let payload = TablePayload {
            rows: group
                .iter()
                .filter(|line| !is_separator_line(line))
                .map(|line| line.trim().to_owned())
                .collect(),
            has_separator: group.iter().any(|line| is_separator_line(line)),
        };

        match registry.insert_json(PlaceholderKind::Table, &payload) {
            Some(token) => out.push(token.to_string()),
            None => out.extend(group.iter().map(|&l| l.to_owned())),
        }
    }

    out.join("\n")
}

/// Split a row line into trimmed cells.
///
/// `\|` is a literal pipe, not a delimiter. The outer pipes are optional.
pub(crate) fn split_cells(row: &str) -> Vec<String> {
    let row = row.trim();
    let row = row.strip_prefix('|').unwrap_or(row);

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = row.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        cells.push(current);
    }

    cells.into_iter().map(|c| c.trim().to_owned()).collect()
}

/// Rewrite cell markdown that the inline pipeline would otherwise mangle.
///
/// A fenced span becomes inline code without inner backticks, and `<br>`
/// outside inline code becomes a newline (rendered as a line break).
pub(crate) fn prepare_cell(cell: &str) -> String {
    let fenced = CELL_FENCE_RE.replace_all(cell, |caps: &Captures| {
        format!("`{}`", caps[1].replace('`', ""))
    });
    CELL_BREAK_RE
        .replace_all(&fenced, |caps: &Captures| match caps.get(1) {
            Some(code) => code.as_str().to_owned(),
            None => "\n".to_owned(),
        })
        .into_owned()
}

/// HTML for a table element.
///
/// Cells must already be rendered and sanitized; `download_label` must
/// already be escaped.
pub(crate) fn table_html(
    id: &str,
    index: usize,
    header: Option<&[String]>,
    body: &[Vec<String>],
    download_label: Option<&str>,
) -> String {
    let mut html = String::from(r#"<div class="table-wrapper">"#);
    if let Some(label) = download_label {
        html.push_str(&format!(
            r#"<button type="button" class="btn btn-circle btn-sm btn-tertiary element-download download-table-btn" data-table-id="{id}" data-table-index="{index}" aria-label="{label}"></button>"#
        ));
    }
    html.push_str(&format!(r#"<table class="table table-hover" id="{id}">"#));

    if let Some(header) = header {
        html.push_str("<thead><tr>");
        for cell in header {
            html.push_str(&format!("<th>{cell}</th>"));
        }
        html.push_str("</tr></thead>");
    }

    html.push_str("<tbody>");
    for row in body {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{cell}</td>"));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table></div>");
    html
}
