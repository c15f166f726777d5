//! End-to-end tests for the WooCommerce migration pipeline.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p woo-migrate-integration-tests
//! ```
//!
//! Everything runs offline: Shopify is replaced by a scripted
//! [`MockTransport`] and sleeps by a [`RecordingPause`], so the tests assert
//! on exactly which requests were sent and how long the uploader would have
//! waited.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use serde_json::Value;
use tempfile::TempDir;
use url::Url;
use woo_migrate_core::Order;
use woo_migrate_uploader::shopify::MockTransport;
use woo_migrate_uploader::{ProgressStore, RecordingPause, RetryPolicy, UploadClient};

/// Admin API base used by every test client.
pub const TEST_API_BASE: &str = "https://test-store.myshopify.com/admin/api/2024-01/";

/// A client, progress store, and scratch directory wired together.
pub struct Pipeline {
    pub dir: TempDir,
    pub client: UploadClient<MockTransport, RecordingPause>,
    pub progress: ProgressStore,
}

impl Pipeline {
    /// Fresh pipeline with an empty progress file location.
    ///
    /// # Panics
    ///
    /// Panics if the scratch directory cannot be created.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create scratch dir");
        let progress = ProgressStore::new(dir.path().join("data").join("upload_progress.json"));
        let client = UploadClient::new(
            MockTransport::new(),
            RecordingPause::new(),
            Url::parse(TEST_API_BASE).expect("valid base url"),
            RetryPolicy::default(),
        );
        Self {
            dir,
            client,
            progress,
        }
    }

    #[must_use]
    pub fn transport(&self) -> &MockTransport {
        self.client.transport()
    }

    #[must_use]
    pub fn pause(&self) -> &RecordingPause {
        self.client.pause()
    }

    /// Bodies of every `order` the mock received, in order.
    #[must_use]
    pub fn posted_orders(&self) -> Vec<Value> {
        self.transport()
            .requests()
            .into_iter()
            .filter_map(|r| r.body.get("order").cloned())
            .collect()
    }

    /// Write `orders` as an export file in the scratch directory.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[allow(clippy::expect_used)]
    pub fn write_export(&self, orders: &Value) -> PathBuf {
        let path = self.dir.path().join("shopify_orders_ready.json");
        std::fs::write(&path, orders.to_string()).expect("write export");
        path
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a JSON array into orders.
///
/// # Panics
///
/// Panics if `value` is not an array of objects.
#[must_use]
#[allow(clippy::expect_used)]
pub fn orders(value: Value) -> Vec<Order> {
    serde_json::from_value(value).expect("array of order objects")
}
