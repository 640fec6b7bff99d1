//! In-memory fakes of the store traits.

#![allow(dead_code)]

use async_trait::async_trait;
use cellarsync_engine::{
    CellRef, DocumentStore, SheetStore, SourceRecord, SyncError, SyncResult, TabHandle,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

// ── Documents ──────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeDocuments {
    collections: Mutex<HashMap<String, Vec<SourceRecord>>>,
    unreachable: Mutex<HashSet<String>>,
}

impl FakeDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, collection: &str, records: Vec<SourceRecord>) {
        self.collections
            .lock()
            .unwrap()
            .insert(collection.to_string(), records);
    }

    pub fn push(&self, collection: &str, record: SourceRecord) {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    pub fn make_unreachable(&self, collection: &str) {
        self.unreachable.lock().unwrap().insert(collection.to_string());
    }
}

#[async_trait]
impl DocumentStore for FakeDocuments {
    async fn list_documents(&self, collection: &str) -> SyncResult<Vec<SourceRecord>> {
        if self.unreachable.lock().unwrap().contains(collection) {
            return Err(SyncError::Connection(format!("{collection}: connection reset")));
        }
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }
}

// ── Sheets ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeSheets {
    tabs: Mutex<HashMap<String, Vec<Vec<String>>>>,
    /// Number of data writes allowed before writes start failing.
    writes_before_failure: Mutex<Option<usize>>,
    write_calls: Mutex<Vec<(String, CellRef, usize)>>,
    insert_calls: Mutex<Vec<(String, usize, usize)>>,
}

impl FakeSheets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tab(&self, title: &str, rows: Vec<Vec<String>>) {
        self.tabs.lock().unwrap().insert(title.to_string(), rows);
    }

    pub fn rows(&self, title: &str) -> Vec<Vec<String>> {
        self.tabs.lock().unwrap().get(title).cloned().unwrap_or_default()
    }

    pub fn row(&self, title: &str, row: usize) -> Vec<String> {
        self.rows(title).get(row - 1).cloned().unwrap_or_default()
    }

    pub fn fail_writes_after(&self, successful_writes: usize) {
        *self.writes_before_failure.lock().unwrap() = Some(successful_writes);
    }

    pub fn heal(&self) {
        *self.writes_before_failure.lock().unwrap() = None;
    }

    pub fn write_calls(&self) -> Vec<(String, CellRef, usize)> {
        self.write_calls.lock().unwrap().clone()
    }

    pub fn insert_calls(&self) -> Vec<(String, usize, usize)> {
        self.insert_calls.lock().unwrap().clone()
    }
}

pub fn handle(title: &str) -> TabHandle {
    TabHandle {
        spreadsheet_id: "sheet-1".into(),
        sheet_id: 0,
        title: title.into(),
    }
}

#[async_trait]
impl SheetStore for FakeSheets {
    async fn get_tab(&self, spreadsheet: &str, tab: &str) -> SyncResult<TabHandle> {
        if self.tabs.lock().unwrap().contains_key(tab) {
            Ok(handle(tab))
        } else {
            Err(SyncError::TabNotFound {
                spreadsheet: spreadsheet.into(),
                tab: tab.into(),
            })
        }
    }

    async fn read_region(&self, tab: &TabHandle) -> SyncResult<Vec<Vec<String>>> {
        Ok(self.rows(&tab.title))
    }

    async fn write_region(&self, tab: &TabHandle, top_left: CellRef, rows: &[Vec<String>]) -> SyncResult<()> {
        {
            let mut budget = self.writes_before_failure.lock().unwrap();
            if let Some(remaining) = budget.as_mut() {
                if *remaining == 0 {
                    return Err(SyncError::Connection("write timed out".into()));
                }
                *remaining -= 1;
            }
        }

        let mut tabs = self.tabs.lock().unwrap();
        let grid = tabs.get_mut(&tab.title).ok_or_else(|| SyncError::TabNotFound {
            spreadsheet: tab.spreadsheet_id.clone(),
            tab: tab.title.clone(),
        })?;
        for (offset, values) in rows.iter().enumerate() {
            let idx = top_left.row - 1 + offset;
            if grid.len() <= idx {
                grid.resize(idx + 1, Vec::new());
            }
            let target = &mut grid[idx];
            let needed = top_left.column + values.len();
            if target.len() < needed {
                target.resize(needed, String::new());
            }
            for (col, value) in values.iter().enumerate() {
                target[top_left.column + col] = value.clone();
            }
        }
        self.write_calls
            .lock()
            .unwrap()
            .push((tab.title.clone(), top_left, rows.len()));
        Ok(())
    }

    async fn insert_rows(&self, tab: &TabHandle, at_row: usize, count: usize) -> SyncResult<()> {
        let mut tabs = self.tabs.lock().unwrap();
        let grid = tabs.get_mut(&tab.title).ok_or_else(|| SyncError::TabNotFound {
            spreadsheet: tab.spreadsheet_id.clone(),
            tab: tab.title.clone(),
        })?;
        let idx = at_row - 1;
        if grid.len() < idx {
            grid.resize(idx, Vec::new());
        }
        for _ in 0..count {
            grid.insert(idx, Vec::new());
        }
        self.insert_calls
            .lock()
            .unwrap()
            .push((tab.title.clone(), at_row, count));
        Ok(())
    }
}

// ── Fixtures ───────────────────────────────────────────────────

pub fn cells(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// A product document as the store returns it.
pub fn product(id: &str, name: &str, price: f64) -> SourceRecord {
    SourceRecord::new(id)
        .with_field("nombre", name)
        .with_field("precio", price)
        .with_field("stock", 10_i64)
        .with_field("categoria", "lupulo")
}

/// A fermentation reading.
pub fn reading(id: &str, original: f64, apparent: f64) -> SourceRecord {
    SourceRecord::new(id)
        .with_field("fecha", "2024-05-01")
        .with_field("lote", format!("L-{id}"))
        .with_field("tanque", "FV3")
        .with_field("extracto_original", original)
        .with_field("extracto_aparente", apparent)
}
