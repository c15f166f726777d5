//! Request spacing from Shopify's call-limit header.
//!
//! Shopify reports bucket usage as `X-Shopify-Shop-Api-Call-Limit: 32/40`.
//! The fuller the bucket, the longer the uploader waits before its next
//! request.

use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use thiserror::Error;
use tracing::info;

/// Response header carrying `current/max`.
pub const CALL_LIMIT_HEADER: &str = "x-shopify-shop-api-call-limit";

/// Wait used when the header is present but unreadable.
pub const MALFORMED_HEADER_DELAY: Duration = Duration::from_millis(500);

const DEFAULT_MAX_CALLS: u32 = 40;

/// Bucket usage reported by Shopify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallLimit {
    pub current: u32,
    pub max: u32,
}

impl Default for CallLimit {
    fn default() -> Self {
        Self {
            current: 0,
            max: DEFAULT_MAX_CALLS,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed call limit header: {0:?}")]
pub struct CallLimitError(String);

impl FromStr for CallLimit {
    type Err = CallLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CallLimitError(s.to_string());
        let (current, max) = s.trim().split_once('/').ok_or_else(malformed)?;
        let current = current.trim().parse().map_err(|_| malformed())?;
        let max: u32 = max.trim().parse().map_err(|_| malformed())?;
        if max == 0 {
            return Err(malformed());
        }
        Ok(Self { current, max })
    }
}

impl CallLimit {
    /// Read the call limit from response headers; an absent header is an
    /// empty bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is present but not `current/max`.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, CallLimitError> {
        match headers.get(CALL_LIMIT_HEADER) {
            None => Ok(Self::default()),
            Some(value) => value
                .to_str()
                .map_err(|_| CallLimitError(String::from_utf8_lossy(value.as_bytes()).into_owned()))?
                .parse(),
        }
    }

    /// Wait before the next request.
    #[must_use]
    pub const fn delay(self) -> Duration {
        match self.current {
            35.. => Duration::from_secs(2),
            30.. => Duration::from_secs(1),
            20.. => Duration::from_millis(500),
            _ => Duration::from_millis(100),
        }
    }
}

/// Wait to apply after a successful response.
pub fn delay_for(headers: &HeaderMap) -> Duration {
    match CallLimit::from_headers(headers) {
        Ok(limit) => {
            if limit.current >= 35 {
                info!(current = limit.current, max = limit.max, "High API usage, slowing down");
            } else if limit.current >= 30 {
                info!(current = limit.current, max = limit.max, "Moderate API usage");
            }
            limit.delay()
        }
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring call limit header");
            MALFORMED_HEADER_DELAY
        }
    }
}

/// Wait requested by a 429's `Retry-After` header, in whole or fractional
/// seconds.
pub fn retry_after(headers: &HeaderMap, default: Duration) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(default)
}
