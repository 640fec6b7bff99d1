//! Google API client configuration.

use serde::{Deserialize, Serialize};

/// Endpoints and tuning for the Firestore, Sheets and Drive clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// Firestore REST base URL (override for the emulator).
    pub firestore_base_url: String,

    /// Firestore database id.
    pub firestore_database: String,

    /// Sheets v4 REST base URL.
    pub sheets_base_url: String,

    /// Drive v3 REST base URL, used to find spreadsheets by name.
    pub drive_base_url: String,

    /// Refresh access tokens this many seconds before they expire.
    pub token_refresh_margin_secs: i64,

    /// Per-request timeout.
    pub request_timeout_secs: u64,

    /// Documents per Firestore list page.
    pub page_size: u32,

    /// `RAW` stores every cell exactly as sent. `USER_ENTERED` lets Sheets
    /// reparse the text, so ids like `007` come back as numbers.
    pub value_input_option: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            firestore_base_url: "https://firestore.googleapis.com/v1".to_string(),
            firestore_database: "(default)".to_string(),
            sheets_base_url: "https://sheets.googleapis.com/v4".to_string(),
            drive_base_url: "https://www.googleapis.com/drive/v3".to_string(),
            token_refresh_margin_secs: 300, // 5 minutes before expiry
            request_timeout_secs: 30,
            page_size: 300,
            value_input_option: "RAW".to_string(),
        }
    }
}

impl GoogleConfig {
    /// Points every client at a single mock server.
    pub fn with_base_url(base: &str) -> Self {
        Self {
            firestore_base_url: format!("{base}/v1"),
            sheets_base_url: format!("{base}/v4"),
            drive_base_url: format!("{base}/drive/v3"),
            ..Self::default()
        }
    }
}
