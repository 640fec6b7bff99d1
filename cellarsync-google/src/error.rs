//! Google adapter error types.

use cellarsync_engine::SyncError;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type for Google API operations.
pub type GoogleResult<T> = Result<T, GoogleError>;

/// Errors raised by the Google REST adapters.
#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status} from {endpoint}: {body}")]
    Status {
        status: StatusCode,
        endpoint: String,
        body: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("token signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// Errors while materializing or loading service-account keys.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("{source_name} is not a valid service-account key: {reason}")]
    Malformed { source_name: String, reason: String },

    #[error("key file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl GoogleError {
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Status { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        ) || matches!(self, Self::Jwt(_) | Self::Credential(_))
    }
}

impl From<GoogleError> for SyncError {
    fn from(e: GoogleError) -> Self {
        if e.is_auth() {
            return match e {
                GoogleError::Credential(inner) => SyncError::Credential(inner.to_string()),
                other => SyncError::Auth(other.to_string()),
            };
        }
        match e {
            GoogleError::Http(inner) if inner.is_timeout() || inner.is_connect() || inner.is_request() => {
                SyncError::Connection(inner.to_string())
            }
            GoogleError::Http(inner) => SyncError::Api(inner.to_string()),
            GoogleError::Status { status, .. } if status.is_server_error() => {
                SyncError::Connection(e.to_string())
            }
            GoogleError::Status { .. } => SyncError::Api(e.to_string()),
            GoogleError::Serialization(inner) => SyncError::Serialization(inner),
            GoogleError::NotFound(what) => SyncError::SpreadsheetNotFound(what),
            GoogleError::Malformed(msg) => SyncError::InvalidData(msg),
            GoogleError::Jwt(_) | GoogleError::Credential(_) => SyncError::Auth(e.to_string()),
        }
    }
}
