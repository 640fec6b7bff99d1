//! Bearer-authenticated requests shared by the Google clients.

use crate::error::{GoogleError, GoogleResult};
use crate::token::AccessTokenSource;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builds the HTTP client used by every adapter.
pub fn build_client(timeout_secs: u64) -> GoogleResult<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// An HTTP client that attaches an access token to every request.
#[derive(Clone)]
pub struct AuthorizedClient {
    client: Client,
    tokens: Arc<dyn AccessTokenSource>,
}

impl AuthorizedClient {
    pub fn new(client: Client, tokens: Arc<dyn AccessTokenSource>) -> Self {
        Self { client, tokens }
    }

    /// Sends a request, retrying once with a fresh token on 401.
    /// Non-success statuses become [`GoogleError::Status`].
    pub async fn send<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> GoogleResult<Response> {
        let build = |token: &str| -> RequestBuilder {
            let mut req = self
                .client
                .request(method.clone(), url)
                .bearer_auth(token)
                .query(query);
            if let Some(body) = body {
                req = req.json(body);
            }
            req
        };

        let token = self.tokens.access_token().await?;
        let mut resp = build(&token).send().await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            debug!("401 on {method} {url}, refreshing token");
            self.tokens.invalidate().await;
            let token = self.tokens.access_token().await?;
            resp = build(&token).send().await?;
        }

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GoogleError::Status {
                status,
                endpoint: format!("{method} {url}"),
                body,
            });
        }
        Ok(resp)
    }

    pub async fn get(&self, url: &str, query: &[(&str, String)]) -> GoogleResult<Response> {
        self.send::<()>(Method::GET, url, query, None).await
    }
}
