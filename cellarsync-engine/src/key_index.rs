//! Existing-key index over a destination tab.

use std::collections::HashSet;

/// Collects the identifiers already present in the data zone.
///
/// `data_start_row` is 1-based; rows above it are headers and never scanned.
/// Blank identifier cells are ignored. The index is rebuilt from the tab on
/// every cycle so manual edits are always reflected.
pub fn build_key_index(rows: &[Vec<String>], data_start_row: usize, id_column: usize) -> HashSet<String> {
    let skip = data_start_row.saturating_sub(1);
    rows.iter()
        .skip(skip)
        .filter_map(|row| row.get(id_column))
        .map(|cell| cell.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
