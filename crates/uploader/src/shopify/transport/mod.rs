//! HTTP seam for the upload client.
//!
//! [`ReqwestTransport`] talks to Shopify; [`MockTransport`] replays scripted
//! responses so the retry and rate-limit paths can be tested offline.

mod http;
mod mock;

use std::future::Future;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use thiserror::Error;
use url::Url;

pub use http::ReqwestTransport;
pub use mock::{MockTransport, RecordedRequest};

/// Sends one JSON POST and returns whatever came back.
pub trait Transport: Send + Sync {
    /// POST `body` to `url`.
    ///
    /// Any HTTP status is `Ok`; only failures to get a response at all are
    /// `Err`.
    fn post_json(
        &self,
        url: &Url,
        body: &Value,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// Status, headers, and body text of a completed request.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TransportResponse {
    /// Response with no headers. Unknown status codes become 500.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Add a header; invalid names or values are dropped.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}
