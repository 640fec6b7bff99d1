//! OAuth access tokens for service accounts.
//!
//! A signed JWT assertion is exchanged at the key's `token_uri` for a
//! short-lived bearer token. Tokens are cached and refreshed ahead of expiry.

use crate::credentials::ServiceAccountKey;
use crate::error::{GoogleError, GoogleResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

pub const SHEETS_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.readonly",
];
pub const FIRESTORE_SCOPES: &[&str] = &["https://www.googleapis.com/auth/datastore"];

const ASSERTION_LIFETIME_SECS: i64 = 3600;
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Anything that can hand out a bearer token.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> GoogleResult<String>;

    /// Drops any cached token so the next call mints a fresh one.
    async fn invalidate(&self) {}
}

/// A fixed token, for emulators and tests.
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> GoogleResult<String> {
        Ok(self.0.clone())
    }
}

#[derive(Clone, Debug)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn expires_within_secs(&self, secs: i64) -> bool {
        Utc::now() + Duration::seconds(secs) >= self.expires_at
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

/// Mints and caches tokens for one service account and scope set.
pub struct ServiceAccountTokens {
    client: Client,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    scopes: String,
    refresh_margin_secs: i64,
    cached: RwLock<Option<CachedToken>>,
    /// Serializes refreshes so concurrent callers share one exchange.
    refresh_lock: Mutex<()>,
}

impl ServiceAccountTokens {
    pub fn new(
        client: Client,
        key: ServiceAccountKey,
        scopes: &[&str],
        refresh_margin_secs: i64,
    ) -> GoogleResult<Self> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(Self {
            client,
            key,
            signing_key,
            scopes: scopes.join(" "),
            refresh_margin_secs,
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn assertion(&self) -> GoogleResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: self.scopes.clone(),
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        Ok(encode(&header, &claims, &self.signing_key)?)
    }

    /// Forces a token exchange.
    pub async fn refresh(&self) -> GoogleResult<String> {
        let assertion = self.assertion()?;
        let resp = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("token exchange for {} failed: {status}", self.key.client_email);
            return Err(GoogleError::Status {
                status,
                endpoint: self.key.token_uri.clone(),
                body,
            });
        }

        let token: TokenResponse = resp.json().await?;
        let expires_at = Utc::now() + Duration::seconds(token.expires_in);
        debug!(
            "refreshed access token for {}, expires at {expires_at}",
            self.key.client_email
        );

        *self.cached.write().await = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> GoogleResult<String> {
        // Fast path: cached token still valid
        if let Some(token) = self.cached.read().await.as_ref() {
            if !token.expires_within_secs(self.refresh_margin_secs) {
                return Ok(token.value.clone());
            }
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(token) = self.cached.read().await.as_ref() {
            if !token.expires_within_secs(self.refresh_margin_secs) {
                return Ok(token.value.clone());
            }
        }

        self.refresh().await
    }

    async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}
