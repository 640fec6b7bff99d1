//! Incremental document-to-spreadsheet reconciliation.
//!
//! Copies new documents from named collections into spreadsheet tabs:
//! - Identifier-keyed dedup against the tab's current contents
//! - Insertion into the first blank row after the data zone, never over
//!   operator rows below it
//! - Declarative per-collection column layouts
//! - Derived fermentation metrics for the fermentation log
//!
//! Store access goes through the [`DocumentStore`] and [`SheetStore`] traits.

pub mod driver;
pub mod error;
pub mod insertion;
pub mod key_index;
pub mod metrics;
pub mod projector;
pub mod schema;
pub mod store;
pub mod synchronizer;
pub mod types;

pub use driver::{CollectionOutcome, CycleReport, SyncDriver};
pub use error::{SyncError, SyncResult};
pub use schema::{builtin_catalog, CollectionSchema, ColumnSpec};
pub use store::{DocumentStore, SheetStore};
pub use synchronizer::{CollectionReport, CollectionSynchronizer};
pub use types::*;
