//! Table grids cut from laid-out page text.
//!
//! Two flavors are supported: `stream` splits cells on runs of two or more
//! spaces, `delimited` splits on `|` or tabs. A table is a run of multi-cell
//! rows; a lone single-cell line inside a table is kept as a wrapped row,
//! two in a row end the table.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use super::Result;
use crate::error::ReadError;
use crate::models::delivery::Table;

pub const STREAM: &str = "stream";
pub const DELIMITED: &str = "delimited";

/// Flavors supported by [`tables_from_text`], in default trial order.
pub const TEXT_FLAVORS: &[&str] = &[STREAM, DELIMITED];

lazy_static! {
    static ref COLUMN_GAP: Regex = Regex::new(r"[ \t\u{a0}]{2,}").unwrap();
    static ref DELIMITER: Regex = Regex::new(r"[|\t]").unwrap();
}

fn split_cells(flavor: &str, line: &str) -> Result<Vec<String>> {
    let splitter: &Regex = match flavor {
        STREAM => &*COLUMN_GAP,
        DELIMITED => &*DELIMITER,
        other => return Err(ReadError::UnsupportedFlavor(other.to_string())),
    };

    let mut cells: Vec<String> = splitter.split(line.trim()).map(|c| c.trim().to_string()).collect();
    // table borders leave empty edge cells
    while cells.last().is_some_and(String::is_empty) {
        cells.pop();
    }
    while cells.first().is_some_and(String::is_empty) {
        cells.remove(0);
    }
    Ok(cells)
}

/// Cut tables out of page texts with one flavor.
pub fn tables_from_text(flavor: &str, pages: &[(usize, String)]) -> Result<Vec<Table>> {
    if !TEXT_FLAVORS.contains(&flavor) {
        return Err(ReadError::UnsupportedFlavor(flavor.to_string()));
    }
    let mut tables = Vec::new();

    for (page, text) in pages {
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut pending: Option<Vec<String>> = None;

        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let cells = split_cells(flavor, line)?;

            if cells.len() >= 2 {
                if let Some(wrapped) = pending.take() {
                    if !rows.is_empty() {
                        rows.push(wrapped);
                    }
                }
                rows.push(cells);
            } else if pending.is_some() {
                pending = None;
                close(&mut tables, *page, &mut rows);
            } else {
                pending = Some(cells);
            }
        }
        close(&mut tables, *page, &mut rows);
    }

    trace!("Flavor '{}' cut {} tables", flavor, tables.len());
    Ok(tables)
}

fn close(tables: &mut Vec<Table>, page: usize, rows: &mut Vec<Vec<String>>) {
    if !rows.is_empty() {
        tables.push(Table::new(page, std::mem::take(rows)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(text: &str) -> Vec<(usize, String)> {
        vec![(1, text.to_string())]
    }

    #[test]
    fn test_stream_cells() {
        let tables = tables_from_text(STREAM, &page("Code   Description    Qty\nA1  Cable 3x2.5  4")).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0], vec!["Code", "Description", "Qty"]);
        assert_eq!(tables[0].rows[1], vec!["A1", "Cable 3x2.5", "4"]);
    }

    #[test]
    fn test_delimited_cells() {
        let tables = tables_from_text(DELIMITED, &page("| Code | Qty |\n| A1 | 4 |")).unwrap();
        assert_eq!(tables[0].rows, vec![vec!["Code", "Qty"], vec!["A1", "4"]]);
    }

    #[test]
    fn test_wrapped_line_kept_inside_table() {
        let tables = tables_from_text(
            STREAM,
            &page("A1  Cable very  4\nlong name\nA2  Plug  2"),
        )
        .unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 3);
        assert_eq!(tables[0].rows[1], vec!["long name"]);
    }

    #[test]
    fn test_single_lines_split_tables() {
        let tables = tables_from_text(
            STREAM,
            &page("Title\nA  B\nC  D\nTotal\nSigned\nE  F"),
        )
        .unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows, vec![vec!["A", "B"], vec!["C", "D"]]);
        assert_eq!(tables[1].rows, vec![vec!["E", "F"]]);
    }

    #[test]
    fn test_tables_keep_page_number() {
        let pages = vec![(2, "A  B".to_string()), (3, "C  D".to_string())];
        let tables = tables_from_text(STREAM, &pages).unwrap();
        assert_eq!(tables.iter().map(|t| t.page).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_unknown_flavor() {
        let err = tables_from_text("lattice", &page("A  B")).unwrap_err();
        assert!(matches!(err, ReadError::UnsupportedFlavor(_)));
    }
}
