use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::config::ShopifyConfig;

use super::{Transport, TransportError, TransportResponse};

/// Production transport: basic auth with the app key and access token.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    api_key: String,
    access_token: String,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("api_key", &self.api_key)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Build a client with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ShopifyConfig, timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            access_token: config.access_token().to_string(),
        })
    }
}

impl Transport for ReqwestTransport {
    #[instrument(skip(self, body), fields(url = %url))]
    async fn post_json(&self, url: &Url, body: &Value) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(url.clone())
            .basic_auth(&self.api_key, Some(&self.access_token))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
