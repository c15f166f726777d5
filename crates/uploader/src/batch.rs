//! Batch upload driver.

use std::collections::BTreeSet;

use tracing::{debug, error, info, warn};
use woo_migrate_core::{Order, WooOrderId};

use crate::pause::Pause;
use crate::progress::ProgressStore;
use crate::shopify::{Endpoint, Transport, UploadClient};

/// Successes between progress summaries.
const PROGRESS_INTERVAL: usize = 100;

/// Outcome of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Items handed to the run.
    pub total: usize,
    /// Items uploaded now plus items skipped as already uploaded.
    pub successes: usize,
    /// Of `successes`, items found in the progress file.
    pub resumed: usize,
    /// Items skipped as unusable for the endpoint.
    pub skipped: usize,
    /// Items that failed to upload or to be recorded.
    pub failed: usize,
}

impl BatchReport {
    /// Every item succeeded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.successes == self.total
    }

    /// Items newly created during this run.
    #[must_use]
    pub const fn uploaded(&self) -> usize {
        self.successes - self.resumed
    }
}

/// Uploads a list of items one at a time, recording each finished order.
#[derive(Debug)]
pub struct BatchUploader<'a, T, P> {
    client: &'a UploadClient<T, P>,
    progress: &'a ProgressStore,
    record_progress: bool,
}

impl<'a, T: Transport, P: Pause> BatchUploader<'a, T, P> {
    #[must_use]
    pub const fn new(client: &'a UploadClient<T, P>, progress: &'a ProgressStore) -> Self {
        Self {
            client,
            progress,
            record_progress: true,
        }
    }

    /// Leave the progress file untouched.
    ///
    /// Used for anonymized test orders: their source ids were never
    /// uploaded as real orders and must not be skipped on resume.
    #[must_use]
    pub const fn without_progress(mut self) -> Self {
        self.record_progress = false;
        self
    }

    /// Upload `items` in batches of `batch_size`.
    ///
    /// With `resume`, orders already in the progress file count as successes
    /// without being sent. Failures are logged and the run moves on to the
    /// next item.
    pub async fn run(
        &self,
        endpoint: Endpoint,
        items: &[Order],
        batch_size: usize,
        resume: bool,
    ) -> BatchReport {
        let batch_size = batch_size.max(1);
        let mut report = BatchReport {
            total: items.len(),
            ..BatchReport::default()
        };

        let completed = if endpoint == Endpoint::Orders && resume && self.record_progress {
            let completed = self.progress.load_completed();
            info!(count = completed.len(), "Found completed orders, will skip these");
            completed
        } else {
            BTreeSet::new()
        };

        info!(%endpoint, total = report.total, batch_size, "Starting upload");

        for (batch_no, batch) in items.chunks(batch_size).enumerate() {
            debug!(batch = batch_no + 1, size = batch.len(), "Processing batch");
            for item in batch {
                self.process(endpoint, item, &completed, &mut report).await;
            }
        }

        info!(
            %endpoint,
            successes = report.successes,
            total = report.total,
            resumed = report.resumed,
            skipped = report.skipped,
            failed = report.failed,
            "Upload finished"
        );
        report
    }

    async fn process(
        &self,
        endpoint: Endpoint,
        item: &Order,
        completed: &BTreeSet<WooOrderId>,
        report: &mut BatchReport,
    ) {
        let source_id = item.source_id();

        if let Some(id) = source_id
            && completed.contains(&id)
        {
            debug!(woo_order_id = %id, "Skipping completed order");
            report.successes += 1;
            report.resumed += 1;
            return;
        }

        if endpoint == Endpoint::Customers && item.email().is_none_or(str::is_empty) {
            warn!(item = %item.label(), "Skipping customer - missing email");
            report.skipped += 1;
            return;
        }

        debug!(
            item = %item.label(),
            position = report.successes + 1,
            total = report.total,
            "Uploading"
        );

        if let Err(e) = self.client.upload(endpoint, item).await {
            error!(item = %item.label(), error = %e, "Failed to upload");
            report.failed += 1;
            return;
        }

        if endpoint == Endpoint::Orders
            && self.record_progress
            && let Some(id) = source_id
        {
            match self.progress.record_completed(id) {
                Ok(_) => debug!(woo_order_id = %id, "Progress saved"),
                Err(e) => {
                    error!(woo_order_id = %id, error = %e, "Uploaded but could not record progress");
                    report.failed += 1;
                    return;
                }
            }
        }

        report.successes += 1;
        if report.successes % PROGRESS_INTERVAL == 0 {
            log_progress(report);
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn log_progress(report: &BatchReport) {
    let percent = report.successes as f64 / report.total.max(1) as f64 * 100.0;
    info!(
        uploaded = report.successes,
        total = report.total,
        remaining = report.total.saturating_sub(report.successes),
        "Progress: {percent:.1}%"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;
    use url::Url;

    use super::*;
    use crate::config::RetryPolicy;
    use crate::pause::RecordingPause;
    use crate::shopify::{MockTransport, TransportResponse};

    struct Harness {
        _dir: TempDir,
        client: UploadClient<MockTransport, RecordingPause>,
        progress: ProgressStore,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let progress = ProgressStore::new(dir.path().join("upload_progress.json"));
        let client = UploadClient::new(
            MockTransport::new(),
            RecordingPause::new(),
            Url::parse("https://shop.test/admin/api/2024-01/").unwrap(),
            RetryPolicy::default(),
        );
        Harness {
            _dir: dir,
            client,
            progress,
        }
    }

    fn orders(ids: &[i64]) -> Vec<Order> {
        ids.iter()
            .map(|id| {
                Order::from_value(json!({"woo_order_id": id, "email": format!("c{id}@shop.test")}))
                    .unwrap()
            })
            .collect()
    }

    fn posted_ids(client: &UploadClient<MockTransport, RecordingPause>) -> Vec<i64> {
        client
            .transport()
            .requests()
            .iter()
            .filter_map(|r| r.body["order"]["woo_order_id"].as_i64())
            .collect()
    }

    #[tokio::test]
    async fn test_uploads_and_records_every_order() {
        let h = harness();
        let report = BatchUploader::new(&h.client, &h.progress)
            .run(Endpoint::Orders, &orders(&[1, 2, 3, 4]), 3, false)
            .await;

        assert_eq!(report.successes, 4);
        assert!(report.is_complete());
        assert_eq!(report.uploaded(), 4);
        assert_eq!(posted_ids(&h.client), vec![1, 2, 3, 4]);
        assert_eq!(h.progress.load_completed().len(), 4);
    }

    #[tokio::test]
    async fn test_resume_skips_completed() {
        let h = harness();
        h.progress.record_completed(WooOrderId::new(1)).unwrap();

        let report = BatchUploader::new(&h.client, &h.progress)
            .run(Endpoint::Orders, &orders(&[1, 2]), 5, true)
            .await;

        assert_eq!(posted_ids(&h.client), vec![2]);
        assert_eq!(report.successes, 2);
        assert_eq!(report.resumed, 1);
        assert_eq!(report.uploaded(), 1);
    }

    #[tokio::test]
    async fn test_without_resume_completed_orders_are_resent() {
        let h = harness();
        h.progress.record_completed(WooOrderId::new(1)).unwrap();

        let report = BatchUploader::new(&h.client, &h.progress)
            .run(Endpoint::Orders, &orders(&[1, 2]), 5, false)
            .await;

        assert_eq!(posted_ids(&h.client), vec![1, 2]);
        assert_eq!(report.resumed, 0);
        assert_eq!(h.progress.load().unwrap().completed_orders.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_item_is_not_recorded_and_run_continues() {
        let h = harness();
        h.client
            .transport()
            .push_response(TransportResponse::new(422, r#"{"errors":"bad"}"#));

        let report = BatchUploader::new(&h.client, &h.progress)
            .run(Endpoint::Orders, &orders(&[1, 2]), 1, false)
            .await;

        assert_eq!(report.successes, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.is_complete());
        let completed: Vec<_> = h.progress.load_completed().into_iter().collect();
        assert_eq!(completed, vec![WooOrderId::new(2)]);
    }

    #[tokio::test]
    async fn test_zero_batch_size() {
        let h = harness();
        let report = BatchUploader::new(&h.client, &h.progress)
            .run(Endpoint::Orders, &orders(&[1, 2]), 0, false)
            .await;
        assert_eq!(report.successes, 2);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let h = harness();
        let report = BatchUploader::new(&h.client, &h.progress)
            .run(Endpoint::Orders, &[], 5, true)
            .await;
        assert_eq!(report, BatchReport::default());
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_customers_without_email_are_skipped() {
        let h = harness();
        let customers = vec![
            Order::from_value(json!({"email": "a@shop.test"})).unwrap(),
            Order::from_value(json!({"first_name": "NoEmail"})).unwrap(),
        ];

        let report = BatchUploader::new(&h.client, &h.progress)
            .run(Endpoint::Customers, &customers, 5, false)
            .await;

        assert_eq!(report.successes, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
        let requests = h.client.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body["customer"]["email"], json!("a@shop.test"));
        assert!(!h.progress.exists());
    }

    #[tokio::test]
    async fn test_without_progress_leaves_no_record() {
        let h = harness();
        let report = BatchUploader::new(&h.client, &h.progress)
            .without_progress()
            .run(Endpoint::Orders, &orders(&[1, 2]), 3, false)
            .await;

        assert!(report.is_complete());
        assert_eq!(posted_ids(&h.client), vec![1, 2]);
        assert!(!h.progress.exists());
    }

    #[tokio::test]
    async fn test_without_progress_ignores_existing_record() {
        let h = harness();
        h.progress.record_completed(WooOrderId::new(1)).unwrap();

        let report = BatchUploader::new(&h.client, &h.progress)
            .without_progress()
            .run(Endpoint::Orders, &orders(&[1, 2]), 3, true)
            .await;

        assert_eq!(report.resumed, 0);
        assert_eq!(posted_ids(&h.client), vec![1, 2]);
        let completed: Vec<_> = h.progress.load_completed().into_iter().collect();
        assert_eq!(completed, vec![WooOrderId::new(1)]);
    }

    #[tokio::test]
    async fn test_progress_write_failure_counts_as_failed() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let progress = ProgressStore::new(blocker.join("upload_progress.json"));
        let client = UploadClient::new(
            MockTransport::new(),
            RecordingPause::new(),
            Url::parse("https://shop.test/admin/api/2024-01/").unwrap(),
            RetryPolicy::default(),
        );

        let report = BatchUploader::new(&client, &progress)
            .run(Endpoint::Orders, &orders(&[1]), 5, false)
            .await;

        assert_eq!(client.transport().requests().len(), 1);
        assert_eq!(report.successes, 0);
        assert_eq!(report.failed, 1);
    }
}
