//! Retrying single-item upload client.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Map, Value};
use tracing::{debug, error, instrument, warn};
use url::Url;
use woo_migrate_core::Order;

use crate::config::{MigrationConfig, RetryPolicy};
use crate::pause::{Pause, TokioPause};

use super::rate_limit::{delay_for, retry_after};
use super::transport::{ReqwestTransport, Transport, TransportError, TransportResponse};
use super::{Endpoint, UploadError};

/// Posts items to the Admin REST API one at a time.
///
/// Each upload tries up to `max_attempts` times per cycle with exponential
/// backoff (1s, 2s, ...) on transport failures, and up to `max_cycles`
/// cycles separated by `cycle_cooldown`. A 429 waits out `Retry-After` and
/// does not count as an attempt. Any other error status is final.
#[derive(Debug, Clone)]
pub struct UploadClient<T, P = TokioPause> {
    transport: T,
    pause: P,
    base_url: Url,
    policy: RetryPolicy,
}

impl UploadClient<ReqwestTransport, TokioPause> {
    /// Build the production client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or base URL cannot be built.
    pub fn from_config(config: &MigrationConfig) -> Result<Self, UploadError> {
        let transport = ReqwestTransport::new(&config.shopify, config.retry.request_timeout)
            .map_err(UploadError::Client)?;
        Ok(Self::new(
            transport,
            TokioPause,
            config.shopify.admin_api_base()?,
            config.retry,
        ))
    }
}

impl<T: Transport, P: Pause> UploadClient<T, P> {
    /// Create a client posting under `base_url`, which must end in `/`.
    #[must_use]
    pub const fn new(transport: T, pause: P, base_url: Url, policy: RetryPolicy) -> Self {
        Self {
            transport,
            pause,
            base_url,
            policy,
        }
    }

    /// The transport requests go through.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The pause used for rate-limit spacing and retry backoff.
    #[must_use]
    pub const fn pause(&self) -> &P {
        &self.pause
    }

    /// Full URL for an endpoint, e.g. `.../admin/api/2024-01/orders.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be joined.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, url::ParseError> {
        self.base_url.join(&format!("{}.json", endpoint.as_str()))
    }

    /// Create one item and return the parsed response body.
    ///
    /// # Errors
    ///
    /// - `UploadError::Api` if Shopify answers with a non-429 error status
    /// - `UploadError::Parse` if a successful response is not JSON
    /// - `UploadError::RetriesExhausted` if no response arrives after every
    ///   retry cycle
    #[instrument(skip(self, endpoint, item), fields(endpoint = %endpoint, woo_order_id = %item.label()))]
    pub async fn upload(&self, endpoint: Endpoint, item: &Order) -> Result<Value, UploadError> {
        let url = self.endpoint_url(endpoint)?;
        let mut body = Map::new();
        body.insert(endpoint.resource_key().to_string(), Value::from(item.clone()));
        let body = Value::Object(body);

        let max_attempts = self.policy.max_attempts.max(1);
        let max_cycles = self.policy.max_cycles.max(1);
        let mut cycle = 1;
        let mut attempt = 1;

        loop {
            match self.transport.post_json(&url, &body).await {
                Ok(response) if response.status == StatusCode::TOO_MANY_REQUESTS => {
                    let wait = retry_after(&response.headers, self.policy.default_retry_after);
                    warn!(wait_secs = wait.as_secs_f64(), "Rate limited by Shopify");
                    self.pause.pause(wait).await;
                }
                Ok(response) => return self.finish(item, response).await,
                Err(e) => {
                    if attempt < max_attempts {
                        let backoff = Duration::from_secs(2u64.saturating_pow(attempt - 1));
                        warn!(
                            error = %e,
                            attempt,
                            cycle,
                            backoff_secs = backoff.as_secs(),
                            "Request failed, retrying"
                        );
                        self.pause.pause(backoff).await;
                        attempt += 1;
                    } else if cycle < max_cycles {
                        warn!(
                            error = %e,
                            cycle,
                            cooldown_secs = self.policy.cycle_cooldown.as_secs(),
                            "Retry cycle exhausted, cooling down"
                        );
                        self.pause.pause(self.policy.cycle_cooldown).await;
                        cycle += 1;
                        attempt = 1;
                    } else {
                        return Err(exhausted(max_cycles, max_attempts, e));
                    }
                }
            }
        }
    }

    /// Turn a non-429 response into the upload result.
    ///
    /// Any 2xx counts as success and is followed by the call-limit pause:
    /// Shopify answers a created order with 201, not 200. Every other status,
    /// including 1xx and 3xx, becomes `UploadError::Api`.
    async fn finish(&self, item: &Order, response: TransportResponse) -> Result<Value, UploadError> {
        if response.status.is_success() {
            self.pause.pause(delay_for(&response.headers)).await;
            return Ok(serde_json::from_str(&response.body)?);
        }

        let message = api_error_detail(&response.body);
        error!(status = %response.status, error = %message, "Shopify rejected item");
        if message.contains("processed_at") {
            debug!(
                created_at = ?item.created_at(),
                processed_at = ?item.processed_at(),
                financial_status = ?item.financial_status_str(),
                "Rejected item date fields"
            );
        }
        Err(UploadError::Api {
            status: response.status,
            message,
        })
    }
}

fn exhausted(cycles: u32, attempts: u32, source: TransportError) -> UploadError {
    error!(error = %source, cycles, attempts, "Giving up on item");
    UploadError::RetriesExhausted {
        cycles,
        attempts,
        source,
    }
}

/// Human-readable detail from an error body: the `errors` member when the
/// body is JSON, else the raw text.
fn api_error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => match json.get("errors") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "Unknown error".to_string(),
        },
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::pause::RecordingPause;
    use crate::shopify::rate_limit::CALL_LIMIT_HEADER;
    use crate::shopify::transport::MockTransport;

    fn client() -> UploadClient<MockTransport, RecordingPause> {
        UploadClient::new(
            MockTransport::new(),
            RecordingPause::new(),
            Url::parse("https://shop.test/admin/api/2024-01/").unwrap(),
            RetryPolicy::default(),
        )
    }

    fn order() -> Order {
        Order::from_value(json!({
            "woo_order_id": 7,
            "email": "a@b.com",
            "created_at": "2023-01-01T00:00:00",
            "processed_at": "2023-01-01T00:00:00",
            "financial_status": "paid"
        }))
        .unwrap()
    }

    fn timeout() -> TransportError {
        TransportError::Timeout("deadline elapsed".to_string())
    }

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            client().endpoint_url(Endpoint::Orders).unwrap().as_str(),
            "https://shop.test/admin/api/2024-01/orders.json"
        );
    }

    #[tokio::test]
    async fn test_success_wraps_body_and_spaces_requests() {
        let client = client();
        client.transport().push_response(
            TransportResponse::new(201, r#"{"order":{"id":1}}"#)
                .with_header(CALL_LIMIT_HEADER, "10/40"),
        );

        let result = client.upload(Endpoint::Orders, &order()).await.unwrap();
        assert_eq!(result, json!({"order": {"id": 1}}));

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body["order"]["woo_order_id"], json!(7));
        assert_eq!(
            requests[0].url.as_str(),
            "https://shop.test/admin/api/2024-01/orders.json"
        );
        assert_eq!(client.pause().pauses(), vec![Duration::from_millis(100)]);
    }

    #[tokio::test]
    async fn test_high_usage_waits_two_seconds() {
        let client = client();
        client.transport().push_response(
            TransportResponse::new(201, "{}").with_header(CALL_LIMIT_HEADER, "38/40"),
        );
        client.upload(Endpoint::Orders, &order()).await.unwrap();
        assert_eq!(client.pause().pauses(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_rate_limited_then_success() {
        let client = client();
        client
            .transport()
            .push_response(TransportResponse::new(429, "").with_header("retry-after", "2"));
        client.transport().push_response(TransportResponse::new(201, "{}"));

        client.upload(Endpoint::Orders, &order()).await.unwrap();
        assert_eq!(client.transport().requests().len(), 2);
        assert_eq!(
            client.pause().pauses(),
            vec![Duration::from_secs(2), Duration::from_millis(100)]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_does_not_consume_attempts() {
        let client = client();
        for _ in 0..5 {
            client.transport().push_response(TransportResponse::new(429, ""));
        }
        client.transport().push_error(timeout());
        client.transport().push_error(timeout());
        client.transport().push_response(TransportResponse::new(201, "{}"));

        client.upload(Endpoint::Orders, &order()).await.unwrap();
        let pauses = client.pause().pauses();
        assert_eq!(&pauses[..5], &[Duration::from_secs(5); 5]);
        assert_eq!(pauses[5], Duration::from_secs(1));
        assert_eq!(pauses[6], Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_client_error_is_final() {
        let client = client();
        client.transport().push_response(TransportResponse::new(
            422,
            r#"{"errors":{"processed_at":["can't be blank"]}}"#,
        ));

        let err = client.upload(Endpoint::Orders, &order()).await.unwrap_err();
        match err {
            UploadError::Api { status, message } => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                assert!(message.contains("processed_at"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(client.transport().requests().len(), 1);
        assert!(client.pause().pauses().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_final() {
        let client = client();
        client
            .transport()
            .push_response(TransportResponse::new(503, "upstream unavailable"));

        let err = client.upload(Endpoint::Orders, &order()).await.unwrap_err();
        assert!(
            matches!(err, UploadError::Api { ref message, .. } if message == "upstream unavailable")
        );
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_redirect_is_an_api_error_without_spacing() {
        let client = client();
        client
            .transport()
            .push_response(TransportResponse::new(301, "moved"));

        let err = client.upload(Endpoint::Orders, &order()).await.unwrap_err();
        assert!(matches!(
            err,
            UploadError::Api { status, .. } if status == StatusCode::MOVED_PERMANENTLY
        ));
        assert!(client.pause().pauses().is_empty());
    }

    #[tokio::test]
    async fn test_transport_errors_exhaust_all_cycles() {
        let client = client();
        for _ in 0..15 {
            client.transport().push_error(timeout());
        }

        let err = client.upload(Endpoint::Orders, &order()).await.unwrap_err();
        assert!(matches!(
            err,
            UploadError::RetriesExhausted {
                cycles: 5,
                attempts: 3,
                ..
            }
        ));
        assert_eq!(client.transport().requests().len(), 15);

        let one = Duration::from_secs(1);
        let two = Duration::from_secs(2);
        let cool = Duration::from_secs(10);
        let mut expected = Vec::new();
        for cycle in 0..5 {
            expected.extend([one, two]);
            if cycle < 4 {
                expected.push(cool);
            }
        }
        assert_eq!(client.pause().pauses(), expected);
    }

    #[tokio::test]
    async fn test_recovers_in_second_cycle() {
        let client = client();
        for _ in 0..3 {
            client.transport().push_error(timeout());
        }
        client.transport().push_response(TransportResponse::new(201, "{}"));

        client.upload(Endpoint::Orders, &order()).await.unwrap();
        assert_eq!(client.transport().requests().len(), 4);
        assert_eq!(
            client.pause().pauses(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(10),
                Duration::from_millis(100),
            ]
        );
    }

    #[tokio::test]
    async fn test_unparseable_success_body() {
        let client = client();
        client.transport().push_response(TransportResponse::new(201, "<html>"));
        let err = client.upload(Endpoint::Orders, &order()).await.unwrap_err();
        assert!(matches!(err, UploadError::Parse(_)));
    }

    #[test]
    fn test_api_error_detail() {
        assert_eq!(api_error_detail(r#"{"errors":"Not Found"}"#), "Not Found");
        assert_eq!(
            api_error_detail(r#"{"errors":{"email":["is invalid"]}}"#),
            r#"{"email":["is invalid"]}"#
        );
        assert_eq!(api_error_detail("{}"), "Unknown error");
        assert_eq!(api_error_detail("Bad Gateway"), "Bad Gateway");
    }
}
