//! Per-collection reconciliation.
//!
//! One pass runs FETCH → INDEX → FILTER → PROJECT → LOCATE → WRITE for a
//! single collection. Writes are append-only and never rolled back: a write
//! that fails halfway leaves the persisted rows in place, and the next cycle's
//! index picks them up so they are not written twice.

use crate::error::{SyncError, SyncResult};
use crate::insertion::resolve_insertion_point;
use crate::key_index::build_key_index;
use crate::projector::project_record;
use crate::schema::CollectionSchema;
use crate::store::{DocumentStore, SheetStore};
use crate::types::{is_blank_row, CellRef, TabHandle};
use std::sync::Arc;
use tracing::{debug, info};

/// Default number of rows sent per write request.
pub const DEFAULT_WRITE_BATCH_ROWS: usize = 500;

/// Counts from one collection pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectionReport {
    pub collection: String,
    pub fetched: usize,
    pub already_present: usize,
    pub written: usize,
    /// 1-based row of the first written row, if anything was written.
    pub first_row: Option<usize>,
    /// Blank rows opened above the trailing zone to make room.
    pub rows_inserted: usize,
}

/// Reconciles one collection with its destination tab.
pub struct CollectionSynchronizer {
    documents: Arc<dyn DocumentStore>,
    sheets: Arc<dyn SheetStore>,
    write_batch_rows: usize,
}

impl CollectionSynchronizer {
    pub fn new(documents: Arc<dyn DocumentStore>, sheets: Arc<dyn SheetStore>) -> Self {
        Self {
            documents,
            sheets,
            write_batch_rows: DEFAULT_WRITE_BATCH_ROWS,
        }
    }

    pub fn with_write_batch_rows(mut self, rows: usize) -> Self {
        self.write_batch_rows = rows.max(1);
        self
    }

    /// Appends every record of `schema.collection` not yet present in `tab`.
    pub async fn sync(&self, schema: &CollectionSchema, tab: &TabHandle) -> SyncResult<CollectionReport> {
        schema.validate()?;
        let id_column = schema.id_column()?;
        let mut report = CollectionReport {
            collection: schema.collection.clone(),
            ..Default::default()
        };

        let records = self.documents.list_documents(&schema.collection).await?;
        report.fetched = records.len();

        let mut rows = self.sheets.read_region(tab).await?;
        self.check_or_write_header(schema, tab, &mut rows).await?;

        let mut index = build_key_index(&rows, schema.data_start_row, id_column);
        let mut pending = Vec::new();
        for record in &records {
            let id = record.id.trim();
            if id.is_empty() {
                debug!("{}: skipping document without identifier", schema.collection);
                continue;
            }
            if !index.insert(id.to_string()) {
                report.already_present += 1;
                continue;
            }
            pending.push(project_record(record, schema));
        }

        if pending.is_empty() {
            debug!("{}: nothing new ({} documents)", schema.collection, report.fetched);
            return Ok(report);
        }

        let point = resolve_insertion_point(&rows, schema.data_start_row);
        let shortfall = point.shortfall(pending.len());
        if shortfall > 0 {
            let at_row = point.row + point.capacity.unwrap_or(0);
            debug!(
                "{}: gap at row {} holds {:?} rows, opening {shortfall} more at row {at_row}",
                schema.collection, point.row, point.capacity
            );
            self.sheets.insert_rows(tab, at_row, shortfall).await?;
            report.rows_inserted = shortfall;
        }

        for chunk in pending.chunks(self.write_batch_rows) {
            let top_left = CellRef::new(point.row + report.written, 0);
            if let Err(e) = self.sheets.write_region(tab, top_left, chunk).await {
                return Err(SyncError::Write {
                    tab: tab.title.clone(),
                    message: format!(
                        "{e} ({} of {} rows already written)",
                        report.written,
                        pending.len()
                    ),
                });
            }
            report.written += chunk.len();
        }
        report.first_row = Some(point.row);

        info!(
            "{}: wrote {} new rows to '{}' starting at row {}",
            schema.collection, report.written, tab.title, point.row
        );
        Ok(report)
    }

    /// Writes the header labels into an empty tab, or verifies an existing
    /// header row against the schema. Blank sheet cells are tolerated.
    async fn check_or_write_header(
        &self,
        schema: &CollectionSchema,
        tab: &TabHandle,
        rows: &mut Vec<Vec<String>>,
    ) -> SyncResult<()> {
        let Some(header_row) = schema.header_row else {
            return Ok(());
        };

        if rows.iter().all(|row| is_blank_row(row)) {
            let headers = schema.headers();
            self.sheets
                .write_region(tab, CellRef::new(header_row, 0), std::slice::from_ref(&headers))
                .await?;
            info!("{}: wrote header row {header_row} to empty tab '{}'", schema.collection, tab.title);
            rows.resize(header_row, Vec::new());
            rows[header_row - 1] = headers;
            return Ok(());
        }

        let Some(sheet_headers) = rows.get(header_row - 1) else {
            return Ok(());
        };
        for (idx, column) in schema.columns.iter().enumerate() {
            let expected = column.header.trim();
            let actual = sheet_headers.get(idx).map(|c| c.trim()).unwrap_or("");
            if expected.is_empty() || actual.is_empty() {
                continue;
            }
            if expected.to_lowercase() != actual.to_lowercase() {
                return Err(SyncError::SchemaMismatch(format!(
                    "'{}' column {} is '{actual}', expected '{expected}'",
                    tab.title,
                    idx + 1
                )));
            }
        }
        Ok(())
    }
}
