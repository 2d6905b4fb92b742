use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::table::{Row, Table};
use crate::text::{collapse_whitespace, strip_diacritics, strip_punctuation, SENTINEL};

/// Leading columns of every cleaned table, in this order.
pub const PRIORITY_COLUMNS: [&str; 5] = ["url", "title", "date", "type", "pdf_url"];

/// Columns whose names contain one of these get punctuation stripped.
const NAME_COLUMN_MARKERS: [&str; 3] = ["title", "alias", "parties_involved"];

const DASH: char = '–';

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\s_-]+$").unwrap());

/// Turn assembled rows into the final export table.
pub fn clean_rows(rows: &[Row]) -> Table {
    clean(Table::from_rows(rows))
}

/// Normalize a table: dedupe, scrub name columns, strip diacritics and extra
/// whitespace, fix column order, and fill every blank with the sentinel.
/// Running it on its own output changes nothing.
pub fn clean(table: Table) -> Table {
    let (columns, rows) = table.into_parts();
    let mut rows = dedupe(rows);

    for (i, column) in columns.iter().enumerate() {
        let scrub_names = is_name_column(column);
        for row in rows.iter_mut() {
            let mut cell = std::mem::take(&mut row[i]);
            if scrub_names {
                cell = strip_punctuation(&cell.replace(DASH, ""));
            }
            cell = collapse_whitespace(&strip_diacritics(&cell));
            row[i] = cell;
        }
    }

    for cell in rows.iter_mut().flatten() {
        if PLACEHOLDER_RE.is_match(cell.as_str()) {
            *cell = SENTINEL.to_string();
        }
    }

    let (columns, mut rows) = reorder(columns, rows);

    for cell in rows.iter_mut().flatten() {
        if cell.trim().is_empty() || *cell == "NA" {
            *cell = SENTINEL.to_string();
        }
    }

    Table::new(columns, dedupe(rows))
}

fn is_name_column(column: &str) -> bool {
    NAME_COLUMN_MARKERS.iter().any(|m| column.contains(m))
}

/// Drop exact duplicate rows, keeping the first occurrence and arrival order.
fn dedupe(rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    rows.into_iter().filter(|row| seen.insert(row.clone())).collect()
}

/// Priority columns first, the rest sorted. Priority columns missing from the
/// input are added with blank cells.
fn reorder(columns: Vec<String>, rows: Vec<Vec<String>>) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rest: Vec<&String> = columns
        .iter()
        .filter(|c| !PRIORITY_COLUMNS.contains(&c.as_str()))
        .collect();
    rest.sort();

    let order: Vec<String> = PRIORITY_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(rest.into_iter().cloned())
        .collect();
    let sources: Vec<Option<usize>> = order
        .iter()
        .map(|name| columns.iter().position(|c| c == name))
        .collect();

    let rows = rows
        .into_iter()
        .map(|row| {
            sources
                .iter()
                .map(|src| src.map(|i| row[i].clone()).unwrap_or_default())
                .collect()
        })
        .collect();

    (order, rows)
}
