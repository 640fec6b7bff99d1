//! Startup error types.

use cellarsync_engine::SyncError;
use cellarsync_google::{CredentialError, GoogleError};
use thiserror::Error;

/// Reasons the sync pipeline could not be assembled at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("firestore credentials: {0}")]
    FirestoreCredentials(#[source] CredentialError),

    #[error("sheets credentials: {0}")]
    SheetsCredentials(#[source] CredentialError),

    #[error("google client: {0}")]
    Google(#[from] GoogleError),

    #[error("schema catalog: {0}")]
    Catalog(#[from] SyncError),
}
