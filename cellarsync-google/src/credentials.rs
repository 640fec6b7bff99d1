//! Service-account key bootstrap.
//!
//! Hosting platforms hand the keys over as JSON in environment variables.
//! At startup each key is written to a local file; if the variable is absent
//! but a file from an earlier start exists, that file is used instead.

use crate::error::CredentialError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The fields of a Google service-account JSON key this crate uses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(source_name: &str, raw: &str) -> Result<Self, CredentialError> {
        serde_json::from_str(raw).map_err(|e| CredentialError::Malformed {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, CredentialError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CredentialError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&path.display().to_string(), &raw)
    }
}

/// Writes the JSON held in `env_var` to `path`.
///
/// The JSON is validated as a service-account key before anything is written.
pub fn materialize_from_env(env_var: &str, path: &Path) -> Result<PathBuf, CredentialError> {
    let raw = std::env::var(env_var).map_err(|_| CredentialError::MissingEnv(env_var.to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| CredentialError::Malformed {
            source_name: env_var.to_string(),
            reason: e.to_string(),
        })?;
    ServiceAccountKey::deserialize(&value).map_err(|e| CredentialError::Malformed {
        source_name: env_var.to_string(),
        reason: e.to_string(),
    })?;

    let pretty = serde_json::to_string_pretty(&value).map_err(|e| CredentialError::Malformed {
        source_name: env_var.to_string(),
        reason: e.to_string(),
    })?;
    std::fs::write(path, pretty).map_err(|source| CredentialError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!("wrote {env_var} key material to {}", path.display());
    Ok(path.to_path_buf())
}

/// Materializes `env_var` into `path` when set, then loads the key file.
pub fn load_service_account(env_var: &str, path: &Path) -> Result<ServiceAccountKey, CredentialError> {
    match materialize_from_env(env_var, path) {
        Ok(_) => {}
        Err(CredentialError::MissingEnv(_)) if path.exists() => {
            warn!("{env_var} not set, using existing {}", path.display());
        }
        Err(e) => return Err(e),
    }
    ServiceAccountKey::from_file(path)
}
