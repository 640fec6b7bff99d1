//! Service configuration.
//!
//! Layered with figment: built-in defaults, an optional `cellarsync.json`,
//! the platform's raw `PORT` and `RENDER_EXTERNAL_URL`, then `CELLARSYNC_*`
//! variables (`__` separates nested keys, e.g. `CELLARSYNC_GOOGLE__PAGE_SIZE`).

use cellarsync_engine::synchronizer::DEFAULT_WRITE_BATCH_ROWS;
use cellarsync_google::GoogleConfig;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const CONFIG_FILE: &str = "cellarsync.json";
pub const ENV_PREFIX: &str = "CELLARSYNC_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Figment(Box::new(e))
    }
}

/// Runtime settings for the sync service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Liveness endpoint port.
    pub port: u16,

    pub sync_interval_secs: u64,

    pub keepalive_interval_secs: u64,

    /// The service's own public URL. Keep-alive is off when unset.
    pub keepalive_url: Option<String>,

    /// Destination spreadsheet, looked up by name.
    pub spreadsheet_name: String,

    /// Pins the spreadsheet id and skips the name lookup.
    pub spreadsheet_id: Option<String>,

    /// JSON catalog replacing the built-in collection schemas.
    pub schema_file: Option<PathBuf>,

    pub firebase_key_env: String,
    pub firebase_key_path: PathBuf,
    pub sheets_key_env: String,
    pub sheets_key_path: PathBuf,

    /// Maximum rows per spreadsheet write call.
    pub write_batch_rows: usize,

    pub google: GoogleConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 10000,
            sync_interval_secs: 300,      // 5 minutes
            keepalive_interval_secs: 600, // 10 minutes
            keepalive_url: None,
            spreadsheet_name: "Mi Base de Datos Firebase".to_string(),
            spreadsheet_id: None,
            schema_file: None,
            firebase_key_env: "FIREBASE_KEY".to_string(),
            firebase_key_path: PathBuf::from("firebase-key.json"),
            sheets_key_env: "GOOGLE_SHEETS_KEY".to_string(),
            sheets_key_path: PathBuf::from("google-sheets-key.json"),
            write_batch_rows: DEFAULT_WRITE_BATCH_ROWS,
            google: GoogleConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// The provider stack, exposed so callers can add layers.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Json::file(CONFIG_FILE))
            .merge(Env::raw().only(&["PORT"]))
            .merge(
                Env::raw()
                    .only(&["RENDER_EXTERNAL_URL"])
                    .map(|_| "keepalive_url".into()),
            )
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Loads the configuration, falling back to defaults when it is invalid.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!("{e}; using default configuration");
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync_interval_secs == 0 {
            return Err(ConfigError::Invalid("sync_interval_secs must be positive".into()));
        }
        if self.keepalive_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "keepalive_interval_secs must be positive".into(),
            ));
        }
        if self.write_batch_rows == 0 {
            return Err(ConfigError::Invalid("write_batch_rows must be positive".into()));
        }
        if self.spreadsheet_name.trim().is_empty() && self.spreadsheet_id.is_none() {
            return Err(ConfigError::Invalid(
                "either spreadsheet_name or spreadsheet_id is required".into(),
            ));
        }
        Ok(())
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    /// The keep-alive target, if one is configured and non-empty.
    pub fn keepalive_target(&self) -> Option<&str> {
        self.keepalive_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}
