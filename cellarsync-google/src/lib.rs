//! Google Cloud adapters for cellarsync.
//!
//! Implements the engine's store traits over REST:
//! - [`FirestoreClient`] lists Firestore collections page by page
//! - [`SheetsClient`] reads, writes and inserts rows in Google Sheets tabs
//! - Service-account JWT exchange with cached, auto-refreshed access tokens
//! - Key bootstrap from environment variables

pub mod config;
pub mod credentials;
pub mod error;
pub mod firestore;
pub mod http;
pub mod sheets;
pub mod token;

pub use config::GoogleConfig;
pub use credentials::{ServiceAccountKey, load_service_account, materialize_from_env};
pub use error::{CredentialError, GoogleError, GoogleResult};
pub use firestore::FirestoreClient;
pub use http::{AuthorizedClient, build_client};
pub use sheets::SheetsClient;
pub use token::{AccessTokenSource, ServiceAccountTokens, StaticToken};
