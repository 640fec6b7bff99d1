//! Firestore REST client.
//!
//! Lists a collection page by page and flattens each document's typed value
//! map into a [`SourceRecord`].

use crate::config::GoogleConfig;
use crate::credentials::ServiceAccountKey;
use crate::error::{CredentialError, GoogleError, GoogleResult};
use crate::http::{AuthorizedClient, build_client};
use crate::token::{FIRESTORE_SCOPES, ServiceAccountTokens};
use async_trait::async_trait;
use cellarsync_engine::{DocumentStore, FieldValue, SourceRecord, SyncResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// A document as returned by the REST API.
#[derive(Debug, Deserialize)]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Reads collections from one Firestore database.
pub struct FirestoreClient {
    http: AuthorizedClient,
    documents_url: String,
    page_size: u32,
}

impl FirestoreClient {
    pub fn new(http: AuthorizedClient, project_id: &str, config: &GoogleConfig) -> Self {
        let documents_url = format!(
            "{}/projects/{}/databases/{}/documents",
            config.firestore_base_url.trim_end_matches('/'),
            project_id,
            config.firestore_database
        );
        Self {
            http,
            documents_url,
            page_size: config.page_size.max(1),
        }
    }

    /// Builds a client authenticated as `key`, reading the key's project.
    pub fn from_service_account(key: ServiceAccountKey, config: &GoogleConfig) -> GoogleResult<Self> {
        let project_id = key
            .project_id
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CredentialError::Malformed {
                source_name: key.client_email.clone(),
                reason: "missing project_id".to_string(),
            })?;
        let client = build_client(config.request_timeout_secs)?;
        let tokens = ServiceAccountTokens::new(
            client.clone(),
            key,
            FIRESTORE_SCOPES,
            config.token_refresh_margin_secs,
        )?;
        let http = AuthorizedClient::new(client, Arc::new(tokens));
        Ok(Self::new(http, &project_id, config))
    }

    async fn fetch_all(&self, collection: &str) -> GoogleResult<Vec<SourceRecord>> {
        let url = format!("{}/{}", self.documents_url, urlencoding::encode(collection));
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", self.page_size.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let page: ListDocumentsResponse = self.http.get(&url, &query).await?.json().await?;
            debug!("{collection}: fetched page of {} documents", page.documents.len());

            for doc in page.documents {
                match convert_document(doc) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("{collection}: skipping document: {e}"),
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!("{collection}: {} documents", records.len());
        Ok(records)
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn list_documents(&self, collection: &str) -> SyncResult<Vec<SourceRecord>> {
        Ok(self.fetch_all(collection).await?)
    }
}

/// Turns a REST document into a record. The id is the last path segment of
/// the document name; null and undecodable fields are dropped.
pub fn convert_document(doc: Document) -> GoogleResult<SourceRecord> {
    let id = doc
        .name
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GoogleError::Malformed(format!("document name '{}' has no id", doc.name)))?;

    let mut record = SourceRecord::new(id);
    for (key, value) in doc.fields {
        match decode_value(&value) {
            Ok(Some(field)) => {
                record.fields.insert(key, field);
            }
            Ok(None) => {}
            Err(e) => warn!("document {}: dropping field '{key}': {e}", record.id),
        }
    }
    Ok(record)
}

/// Decodes one Firestore typed value. Maps, arrays and references are kept
/// as their JSON text.
pub fn decode_value(value: &Value) -> GoogleResult<Option<FieldValue>> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(GoogleError::Malformed(format!("untyped value {value}")));
    };

    let decoded = match kind.as_str() {
        "nullValue" => return Ok(None),
        "stringValue" => FieldValue::Text(inner.as_str().unwrap_or_default().to_string()),
        "booleanValue" => FieldValue::Bool(inner.as_bool().unwrap_or_default()),
        // int64 travels as a JSON string
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            FieldValue::Integer(
                parsed.ok_or_else(|| GoogleError::Malformed(format!("bad integerValue {inner}")))?,
            )
        }
        "doubleValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<f64>().ok(),
                other => other.as_f64(),
            };
            FieldValue::Number(
                parsed.ok_or_else(|| GoogleError::Malformed(format!("bad doubleValue {inner}")))?,
            )
        }
        "timestampValue" => {
            let raw = inner.as_str().unwrap_or_default();
            let ts = DateTime::parse_from_rfc3339(raw)
                .map_err(|e| GoogleError::Malformed(format!("bad timestampValue {raw}: {e}")))?;
            FieldValue::Timestamp(ts.with_timezone(&Utc))
        }
        "referenceValue" => FieldValue::Text(inner.as_str().unwrap_or_default().to_string()),
        _ => FieldValue::Text(simplify(value).to_string()),
    };
    Ok(Some(decoded))
}

/// Strips Firestore type wrappers from nested values.
fn simplify(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return value.clone();
    };
    match kind.as_str() {
        "mapValue" => {
            let fields = inner.get("fields").and_then(Value::as_object);
            Value::Object(
                fields
                    .into_iter()
                    .flatten()
                    .map(|(k, v)| (k.clone(), simplify(v)))
                    .collect(),
            )
        }
        "arrayValue" => {
            let values = inner.get("values").and_then(Value::as_array);
            Value::Array(values.into_iter().flatten().map(simplify).collect())
        }
        "geoPointValue" | "bytesValue" | "stringValue" | "booleanValue" | "doubleValue"
        | "timestampValue" | "referenceValue" => inner.clone(),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "nullValue" => Value::Null,
        _ => value.clone(),
    }
}
