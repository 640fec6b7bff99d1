//! Capability traits for the two backing stores.
//!
//! The synchronizer only needs these few operations; concrete clients live in
//! `cellarsync-google` and tests substitute in-memory fakes.

use crate::error::SyncResult;
use crate::types::{CellRef, SourceRecord, TabHandle};
use async_trait::async_trait;

/// Read access to a document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns every document in `collection`, in store order.
    async fn list_documents(&self, collection: &str) -> SyncResult<Vec<SourceRecord>>;
}

/// Read/write access to a spreadsheet.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Resolves a tab by spreadsheet name and tab title.
    async fn get_tab(&self, spreadsheet: &str, tab: &str) -> SyncResult<TabHandle>;

    /// Returns every row of the tab starting at row 1. Trailing blank cells
    /// and rows may be omitted. Formula cells are returned as formula text.
    async fn read_region(&self, tab: &TabHandle) -> SyncResult<Vec<Vec<String>>>;

    /// Writes `rows` as a rectangle anchored at `top_left`.
    async fn write_region(&self, tab: &TabHandle, top_left: CellRef, rows: &[Vec<String>]) -> SyncResult<()>;

    /// Inserts `count` blank rows before 1-based `at_row`, shifting the rows
    /// below down.
    async fn insert_rows(&self, tab: &TabHandle, at_row: usize, count: usize) -> SyncResult<()>;
}
