//! Sync driver: one cycle over every configured collection.
//!
//! Collections are processed strictly in catalog order, one at a time. Each
//! collection's failure is logged here, once, and never stops the others.

use crate::error::SyncError;
use crate::schema::CollectionSchema;
use crate::store::{DocumentStore, SheetStore};
use crate::synchronizer::{CollectionReport, CollectionSynchronizer};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Result of one collection within a cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionOutcome {
    Synced(CollectionReport),
    Skipped { collection: String, reason: String },
    Failed { collection: String, error: String },
}

impl CollectionOutcome {
    pub fn collection(&self) -> &str {
        match self {
            Self::Synced(report) => &report.collection,
            Self::Skipped { collection, .. } | Self::Failed { collection, .. } => collection,
        }
    }

    pub fn written(&self) -> usize {
        match self {
            Self::Synced(report) => report.written,
            _ => 0,
        }
    }
}

/// Summary of one sync cycle.
#[derive(Clone, Debug)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<CollectionOutcome>,
}

impl CycleReport {
    /// New rows written across all collections.
    pub fn total_written(&self) -> usize {
        self.outcomes.iter().map(CollectionOutcome::written).sum()
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CollectionOutcome::Failed { .. }))
            .count()
    }

    pub fn outcome(&self, collection: &str) -> Option<&CollectionOutcome> {
        self.outcomes.iter().find(|o| o.collection() == collection)
    }
}

/// Runs sync cycles over a fixed schema catalog.
pub struct SyncDriver {
    sheets: Arc<dyn SheetStore>,
    synchronizer: CollectionSynchronizer,
    spreadsheet: String,
    schemas: Vec<CollectionSchema>,
}

impl SyncDriver {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        sheets: Arc<dyn SheetStore>,
        spreadsheet: impl Into<String>,
        schemas: Vec<CollectionSchema>,
    ) -> Self {
        Self {
            synchronizer: CollectionSynchronizer::new(documents, sheets.clone()),
            sheets,
            spreadsheet: spreadsheet.into(),
            schemas,
        }
    }

    pub fn with_write_batch_rows(mut self, rows: usize) -> Self {
        self.synchronizer = self.synchronizer.with_write_batch_rows(rows);
        self
    }

    pub fn schemas(&self) -> &[CollectionSchema] {
        &self.schemas
    }

    /// Runs one full cycle. Never fails: every error is folded into the
    /// returned report.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = Utc::now();
        info!(
            "sync cycle started: {} collections -> '{}'",
            self.schemas.len(),
            self.spreadsheet
        );

        let mut outcomes = Vec::with_capacity(self.schemas.len());
        for schema in &self.schemas {
            outcomes.push(self.sync_collection(schema).await);
        }

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        info!(
            "sync cycle finished: {} new rows, {} failed collections",
            report.total_written(),
            report.failures()
        );
        report
    }

    async fn sync_collection(&self, schema: &CollectionSchema) -> CollectionOutcome {
        let collection = schema.collection.clone();

        let tab = match self.sheets.get_tab(&self.spreadsheet, &schema.tab).await {
            Ok(tab) => tab,
            Err(e) => return Self::fold_error(collection, e),
        };

        match self.synchronizer.sync(schema, &tab).await {
            Ok(report) => CollectionOutcome::Synced(report),
            Err(e) => Self::fold_error(collection, e),
        }
    }

    fn fold_error(collection: String, e: SyncError) -> CollectionOutcome {
        if e.is_skippable() {
            warn!("{collection}: skipped this cycle: {e}");
            CollectionOutcome::Skipped {
                collection,
                reason: e.to_string(),
            }
        } else {
            error!("{collection}: sync failed: {e}");
            CollectionOutcome::Failed {
                collection,
                error: e.to_string(),
            }
        }
    }
}
