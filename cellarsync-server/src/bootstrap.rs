//! Assembles the sync pipeline from configuration.

use crate::config::ServiceConfig;
use crate::error::StartupError;
use cellarsync_engine::schema::{load_catalog, validate_catalog};
use cellarsync_engine::{CollectionSchema, SyncDriver, builtin_catalog};
use cellarsync_google::{FirestoreClient, SheetsClient, load_service_account};
use std::sync::Arc;
use tracing::info;

/// The configured catalog, or the built-in one.
pub fn load_schemas(config: &ServiceConfig) -> Result<Vec<CollectionSchema>, StartupError> {
    let schemas = match &config.schema_file {
        Some(path) => {
            info!("loading schema catalog from {}", path.display());
            load_catalog(path)?
        }
        None => builtin_catalog(),
    };
    validate_catalog(&schemas)?;
    Ok(schemas)
}

/// Loads both service-account keys and builds the driver. Called once at
/// startup; the clients are reused by every cycle.
pub fn build_driver(config: &ServiceConfig) -> Result<SyncDriver, StartupError> {
    let schemas = load_schemas(config)?;

    let firebase_key = load_service_account(&config.firebase_key_env, &config.firebase_key_path)
        .map_err(StartupError::FirestoreCredentials)?;
    let sheets_key = load_service_account(&config.sheets_key_env, &config.sheets_key_path)
        .map_err(StartupError::SheetsCredentials)?;
    info!(
        "credentials loaded: firestore as {}, sheets as {}",
        firebase_key.client_email, sheets_key.client_email
    );

    let documents = FirestoreClient::from_service_account(firebase_key, &config.google)?;
    let sheets = SheetsClient::from_service_account(sheets_key, &config.google)?
        .with_spreadsheet_id(config.spreadsheet_id.clone());

    Ok(SyncDriver::new(
        Arc::new(documents),
        Arc::new(sheets),
        config.spreadsheet_name.clone(),
        schemas,
    )
    .with_write_batch_rows(config.write_batch_rows))
}
