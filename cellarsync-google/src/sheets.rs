//! Google Sheets v4 client.
//!
//! Spreadsheets are addressed by name through a Drive lookup unless an id is
//! pinned in configuration. Values are read with `FORMULA` rendering so a
//! formula cell never looks empty, even when it evaluates to "".

use crate::config::GoogleConfig;
use crate::credentials::ServiceAccountKey;
use crate::error::{GoogleError, GoogleResult};
use crate::http::{AuthorizedClient, build_client};
use crate::token::{SHEETS_SCOPES, ServiceAccountTokens};
use async_trait::async_trait;
use cellarsync_engine::{
    CellRef, SheetStore, SyncError, SyncResult, TabHandle, column_letters, format_number,
};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [Vec<String>],
}

/// Reads and writes tabs of Google spreadsheets.
pub struct SheetsClient {
    http: AuthorizedClient,
    sheets_url: String,
    drive_url: String,
    value_input_option: String,
    pinned_id: Option<String>,
    /// Spreadsheet name to id.
    resolved: RwLock<HashMap<String, String>>,
}

impl SheetsClient {
    pub fn new(http: AuthorizedClient, config: &GoogleConfig) -> Self {
        Self {
            http,
            sheets_url: config.sheets_base_url.trim_end_matches('/').to_string(),
            drive_url: config.drive_base_url.trim_end_matches('/').to_string(),
            value_input_option: config.value_input_option.clone(),
            pinned_id: None,
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// Builds a client authenticated as `key`.
    pub fn from_service_account(key: ServiceAccountKey, config: &GoogleConfig) -> GoogleResult<Self> {
        let client = build_client(config.request_timeout_secs)?;
        let tokens = ServiceAccountTokens::new(
            client.clone(),
            key,
            SHEETS_SCOPES,
            config.token_refresh_margin_secs,
        )?;
        Ok(Self::new(AuthorizedClient::new(client, Arc::new(tokens)), config))
    }

    /// Skips the Drive lookup and uses this spreadsheet id for every name.
    pub fn with_spreadsheet_id(mut self, id: Option<String>) -> Self {
        self.pinned_id = id.filter(|s| !s.trim().is_empty());
        self
    }

    /// Resolves a spreadsheet name to its id, caching the answer.
    pub async fn spreadsheet_id(&self, name: &str) -> GoogleResult<String> {
        if let Some(id) = &self.pinned_id {
            return Ok(id.clone());
        }
        if let Some(id) = self.resolved.read().await.get(name) {
            return Ok(id.clone());
        }

        let q = format!(
            "name='{}' and mimeType='{SPREADSHEET_MIME}' and trashed=false",
            name.replace('\\', "\\\\").replace('\'', "\\'")
        );
        let url = format!("{}/files", self.drive_url);
        let list: DriveFileList = self
            .http
            .get(
                &url,
                &[
                    ("q", q),
                    ("fields", "files(id,name)".to_string()),
                    ("pageSize", "10".to_string()),
                ],
            )
            .await?
            .json()
            .await?;

        let Some(file) = list.files.into_iter().next() else {
            return Err(GoogleError::NotFound(name.to_string()));
        };
        info!("spreadsheet '{name}' resolved to {}", file.id);
        self.resolved
            .write()
            .await
            .insert(name.to_string(), file.id.clone());
        Ok(file.id)
    }

    async fn tab_properties(&self, spreadsheet_id: &str) -> GoogleResult<Vec<SheetProperties>> {
        let url = format!("{}/spreadsheets/{spreadsheet_id}", self.sheets_url);
        let result = self
            .http
            .get(&url, &[("fields", "sheets.properties(sheetId,title)".to_string())])
            .await;
        let meta: SpreadsheetMeta = match result {
            Ok(resp) => resp.json().await?,
            Err(GoogleError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                return Err(GoogleError::NotFound(spreadsheet_id.to_string()));
            }
            Err(e) => return Err(e),
        };
        Ok(meta.sheets.into_iter().map(|s| s.properties).collect())
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/spreadsheets/{spreadsheet_id}/values/{}",
            self.sheets_url,
            urlencoding::encode(range)
        )
    }
}

/// Quotes a tab title for use in A1 notation.
pub fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// The A1 range covered by `rows` when anchored at `top_left`.
pub fn write_range(title: &str, top_left: CellRef, rows: &[Vec<String>]) -> String {
    let width = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
    let last_row = top_left.row + rows.len().max(1) - 1;
    let last_col = column_letters(top_left.column + width - 1);
    format!("{}!{top_left}:{last_col}{last_row}", quote_title(title))
}

/// Renders a cell value from the values API as text.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        },
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetStore for SheetsClient {
    async fn get_tab(&self, spreadsheet: &str, tab: &str) -> SyncResult<TabHandle> {
        let spreadsheet_id = self.spreadsheet_id(spreadsheet).await?;
        let tabs = self.tab_properties(&spreadsheet_id).await?;
        tabs.into_iter()
            .find(|p| p.title == tab)
            .map(|p| TabHandle {
                spreadsheet_id: spreadsheet_id.clone(),
                sheet_id: p.sheet_id,
                title: p.title,
            })
            .ok_or_else(|| SyncError::TabNotFound {
                spreadsheet: spreadsheet.to_string(),
                tab: tab.to_string(),
            })
    }

    async fn read_region(&self, tab: &TabHandle) -> SyncResult<Vec<Vec<String>>> {
        let url = self.values_url(&tab.spreadsheet_id, &quote_title(&tab.title));
        let range: ValueRange = self
            .http
            .get(
                &url,
                &[
                    ("majorDimension", "ROWS".to_string()),
                    ("valueRenderOption", "FORMULA".to_string()),
                ],
            )
            .await
            .map_err(SyncError::from)?
            .json()
            .await
            .map_err(GoogleError::from)?;

        debug!("'{}': read {} rows", tab.title, range.values.len());
        Ok(range
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    async fn write_region(&self, tab: &TabHandle, top_left: CellRef, rows: &[Vec<String>]) -> SyncResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let range = write_range(&tab.title, top_left, rows);
        let url = self.values_url(&tab.spreadsheet_id, &range);
        let body = ValueRangeBody {
            range: &range,
            major_dimension: "ROWS",
            values: rows,
        };
        self.http
            .send(
                Method::PUT,
                &url,
                &[("valueInputOption", self.value_input_option.clone())],
                Some(&body),
            )
            .await?;
        debug!("wrote {} rows to {range}", rows.len());
        Ok(())
    }

    async fn insert_rows(&self, tab: &TabHandle, at_row: usize, count: usize) -> SyncResult<()> {
        if count == 0 {
            return Ok(());
        }
        let start = at_row.saturating_sub(1);
        let body = json!({
            "requests": [{
                "insertDimension": {
                    "range": {
                        "sheetId": tab.sheet_id,
                        "dimension": "ROWS",
                        "startIndex": start,
                        "endIndex": start + count,
                    },
                    "inheritFromBefore": start > 0,
                }
            }]
        });
        let url = format!("{}/spreadsheets/{}:batchUpdate", self.sheets_url, tab.spreadsheet_id);
        self.http.send(Method::POST, &url, &[], Some(&body)).await?;
        info!("'{}': inserted {count} rows before row {at_row}", tab.title);
        Ok(())
    }
}
