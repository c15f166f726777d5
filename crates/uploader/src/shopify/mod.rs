//! Shopify Admin REST API upload client.
//!
//! # Architecture
//!
//! - [`client`] - `UploadClient`, the retrying POST loop
//! - [`rate_limit`] - Call-limit header parsing and request spacing
//! - [`transport`] - The HTTP seam (`reqwest` in production, scripted in tests)

pub mod client;
pub mod rate_limit;
pub mod transport;

use reqwest::StatusCode;
use thiserror::Error;

pub use client::UploadClient;
pub use rate_limit::CallLimit;
pub use transport::{MockTransport, ReqwestTransport, Transport, TransportError, TransportResponse};

/// Admin REST resources the uploader can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Orders,
    Customers,
}

impl Endpoint {
    /// Plural path segment, e.g. `orders`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Customers => "customers",
        }
    }

    /// Singular key the request body is wrapped in, e.g. `order`.
    #[must_use]
    pub const fn resource_key(self) -> &'static str {
        match self {
            Self::Orders => "order",
            Self::Customers => "customer",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from uploading a single item.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Shopify rejected the item; retrying will not help.
    #[error("Shopify API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// A 2xx response body was not valid JSON.
    #[error("Failed to parse Shopify response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Every attempt in every retry cycle failed at the transport level.
    #[error("Gave up after {cycles} retry cycles of {attempts} attempts: {source}")]
    RetriesExhausted {
        cycles: u32,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] TransportError),

    /// The endpoint URL could not be built.
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl UploadError {
    /// Whether Shopify itself refused the item (as opposed to never reaching it).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Api { .. })
    }
}
