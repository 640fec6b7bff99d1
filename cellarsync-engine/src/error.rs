//! Sync error types.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while reconciling a collection with its tab.
///
/// Adapters classify their transport failures into one of these kinds so the
/// driver can decide whether to skip a collection or report a failure.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("credential unavailable: {0}")]
    Credential(String),

    #[error("store unreachable: {0}")]
    Connection(String),

    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("spreadsheet not found: {0}")]
    SpreadsheetNotFound(String),

    #[error("tab '{tab}' not found in spreadsheet '{spreadsheet}'")]
    TabNotFound { spreadsheet: String, tab: String },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("write to '{tab}' failed: {message}")]
    Write { tab: String, message: String },

    #[error("API request failed: {0}")]
    Api(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Returns true for errors that mean "this collection cannot be synced
    /// this cycle" rather than a fault worth alerting on.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::TabNotFound { .. } | Self::SchemaMismatch(_))
    }
}
