use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use url::Url;

use super::{Transport, TransportError, TransportResponse};

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: Url,
    pub body: Value,
}

/// Scripted transport for tests.
///
/// Responses are handed out in the order they were pushed. Once the script
/// runs dry the fallback is returned, or `201 {}` if none was set.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<Result<TransportResponse, TransportError>>,
    fallback: Option<TransportResponse>,
    requests: Vec<RecordedRequest>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn push_response(&self, response: TransportResponse) {
        self.with_state(|s| s.script.push_back(Ok(response)));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.with_state(|s| s.script.push_back(Err(error)));
    }

    /// Response to use after the script is exhausted.
    pub fn set_fallback(&self, response: TransportResponse) {
        self.with_state(|s| s.fallback = Some(response));
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.with_state(|s| s.requests.clone())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl Transport for MockTransport {
    async fn post_json(&self, url: &Url, body: &Value) -> Result<TransportResponse, TransportError> {
        self.with_state(|s| {
            s.requests.push(RecordedRequest {
                url: url.clone(),
                body: body.clone(),
            });
            s.script.pop_front().unwrap_or_else(|| {
                Ok(s.fallback
                    .clone()
                    .unwrap_or_else(|| TransportResponse::new(201, "{}")))
            })
        })
    }
}
