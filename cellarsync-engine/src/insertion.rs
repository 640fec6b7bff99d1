//! Insertion-point resolution.
//!
//! New rows go into the first blank row at or after the data-start row.
//! Anything below that gap belongs to operators (totals, formulas, notes) and
//! is never scanned past or written over.

use crate::types::is_blank_row;

/// Where the next block of rows may be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InsertionPoint {
    /// 1-based row of the first writable row.
    pub row: usize,
    /// Number of consecutive blank rows starting at `row` before the next
    /// non-empty row. `None` when nothing follows.
    pub capacity: Option<usize>,
}

impl InsertionPoint {
    /// Rows that must be opened up before `count` rows fit without touching
    /// the trailing zone.
    pub fn shortfall(&self, count: usize) -> usize {
        self.capacity.map_or(0, |cap| count.saturating_sub(cap))
    }
}

/// Finds the first writable row in `rows` (the tab's contents from row 1).
pub fn resolve_insertion_point(rows: &[Vec<String>], data_start_row: usize) -> InsertionPoint {
    let start = data_start_row.max(1);
    let first_blank = (start - 1..rows.len()).find(|&idx| is_blank_row(&rows[idx]));

    let Some(idx) = first_blank else {
        return InsertionPoint {
            row: (rows.len() + 1).max(start),
            capacity: None,
        };
    };

    let capacity = rows[idx..]
        .iter()
        .position(|row| !is_blank_row(row));

    InsertionPoint {
        row: idx + 1,
        capacity,
    }
}
