//! CSV export of table cell data.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

/// Original (pre-HTML) cell text of every table a renderer has built.
///
/// Indexes are handed out in build order and never reused. Entries live as
/// long as the renderer.
#[derive(Debug, Default)]
pub(crate) struct TableCellStore {
    tables: HashMap<usize, Vec<Vec<String>>>,
    next_index: usize,
}

impl TableCellStore {
    /// Store the cells of a new table and return its index.
    pub fn push(&mut self, rows: Vec<Vec<String>>) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        self.tables.insert(index, rows);
        index
    }

    pub fn get(&self, index: usize) -> Option<&[Vec<String>]> {
        self.tables.get(&index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

/// Serialize rows as CSV.
///
/// `<br>` variants become newlines. Cells containing a comma, quote or
/// newline are quoted with embedded quotes doubled. Rows are separated by
/// `\n`.
pub fn to_csv(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| quote_cell(&BR_RE.replace_all(cell, "\n")))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn quote_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_owned()
    }
}
