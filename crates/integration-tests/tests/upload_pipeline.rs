//! Export to Shopify, end to end, against the scripted transport.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;
use woo_migrate_core::WooOrderId;
use woo_migrate_integration_tests::{Pipeline, orders};
use woo_migrate_uploader::BatchUploader;
use woo_migrate_uploader::export::{LoadMode, find_export, load_export, prepare_orders};
use woo_migrate_uploader::shopify::{Endpoint, TransportError, TransportResponse};

#[tokio::test]
async fn paid_order_uploads_and_voided_order_is_dropped() {
    let pipeline = Pipeline::new();
    let export = pipeline.write_export(&json!([
        {
            "woo_order_id": 1,
            "email": "a@x.com",
            "financial_status": "paid",
            "created_at": "2023-01-01T00:00:00"
        },
        {
            "woo_order_id": 2,
            "email": "b@x.com",
            "financial_status": "voided",
            "created_at": "2023-01-02T00:00:00"
        }
    ]));

    let found = find_export(std::slice::from_ref(&export)).unwrap();
    let raw = load_export(found).unwrap();
    let report = prepare_orders(raw, LoadMode::Full, &[]);
    assert_eq!(report.voided, 1);

    let batch = BatchUploader::new(&pipeline.client, &pipeline.progress)
        .run(Endpoint::Orders, &report.orders, 1, false)
        .await;

    assert_eq!(batch.successes, 1);
    assert_eq!(batch.total, 1);

    let posted = pipeline.posted_orders();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0]["woo_order_id"], json!(1));
    assert_eq!(posted[0]["processed_at"], json!("2023-01-01T00:00:00"));

    let completed: Vec<_> = pipeline.progress.load_completed().into_iter().collect();
    assert_eq!(completed, vec![WooOrderId::new(1)]);
}

#[tokio::test]
async fn unpaid_orders_never_send_processed_at() {
    let pipeline = Pipeline::new();
    let raw = orders(json!([
        {"woo_order_id": 10, "email": "p@x.com", "financial_status": "pending",
         "processed_at": "2023-03-01T00:00:00"},
        {"woo_order_id": 11, "email": "r@x.com", "financial_status": "refunded",
         "processed_at": null}
    ]));
    let report = prepare_orders(raw, LoadMode::Full, &[]);

    BatchUploader::new(&pipeline.client, &pipeline.progress)
        .run(Endpoint::Orders, &report.orders, 5, false)
        .await;

    for order in pipeline.posted_orders() {
        assert!(order.get("processed_at").is_none(), "{order}");
    }
}

#[tokio::test]
async fn resume_uploads_only_the_remaining_order() {
    let pipeline = Pipeline::new();
    pipeline.progress.record_completed(WooOrderId::new(1)).unwrap();

    let items = orders(json!([
        {"woo_order_id": 1, "email": "a@x.com"},
        {"woo_order_id": 2, "email": "b@x.com"}
    ]));

    let batch = BatchUploader::new(&pipeline.client, &pipeline.progress)
        .run(Endpoint::Orders, &items, 5, true)
        .await;

    let posted = pipeline.posted_orders();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0]["woo_order_id"], json!(2));
    assert_eq!(batch.successes, 2);
    assert_eq!(batch.resumed, 1);
    assert_eq!(pipeline.progress.load_completed().len(), 2);
}

#[tokio::test]
async fn interrupted_run_resumes_after_last_recorded_order() {
    let pipeline = Pipeline::new();
    let items = orders(json!([
        {"woo_order_id": 1, "email": "a@x.com"},
        {"woo_order_id": 2, "email": "b@x.com"},
        {"woo_order_id": 3, "email": "c@x.com"}
    ]));

    // First run: order 2 is rejected, the others go through.
    pipeline.transport().push_response(TransportResponse::new(201, "{}"));
    pipeline
        .transport()
        .push_response(TransportResponse::new(422, r#"{"errors":{"base":["bad"]}}"#));
    let first = BatchUploader::new(&pipeline.client, &pipeline.progress)
        .run(Endpoint::Orders, &items, 5, false)
        .await;
    assert_eq!(first.successes, 2);
    assert_eq!(first.failed, 1);

    // Second run only retries the rejected order.
    let second = BatchUploader::new(&pipeline.client, &pipeline.progress)
        .run(Endpoint::Orders, &items, 5, true)
        .await;
    assert!(second.is_complete());
    assert_eq!(second.resumed, 2);

    let ids: Vec<_> = pipeline
        .posted_orders()
        .iter()
        .map(|o| o["woo_order_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 2]);
}

#[tokio::test]
async fn busy_store_slows_the_next_request() {
    let pipeline = Pipeline::new();
    pipeline.transport().push_response(
        TransportResponse::new(201, r#"{"order":{"id":900}}"#)
            .with_header("X-Shopify-Shop-Api-Call-Limit", "38/40"),
    );

    let items = orders(json!([{"woo_order_id": 5, "email": "a@x.com"}]));
    let batch = BatchUploader::new(&pipeline.client, &pipeline.progress)
        .run(Endpoint::Orders, &items, 5, false)
        .await;

    assert!(batch.is_complete());
    assert_eq!(pipeline.pause().pauses(), vec![Duration::from_secs(2)]);
}

#[tokio::test]
async fn flaky_network_is_retried_before_moving_on() {
    let pipeline = Pipeline::new();
    pipeline
        .transport()
        .push_error(TransportError::Connect("connection reset".to_string()));
    pipeline
        .transport()
        .push_response(TransportResponse::new(429, "").with_header("Retry-After", "1.5"));

    let items = orders(json!([
        {"woo_order_id": 1, "email": "a@x.com"},
        {"woo_order_id": 2, "email": "b@x.com"}
    ]));
    let batch = BatchUploader::new(&pipeline.client, &pipeline.progress)
        .run(Endpoint::Orders, &items, 1, false)
        .await;

    assert!(batch.is_complete());
    assert_eq!(pipeline.transport().requests().len(), 4);
    assert_eq!(
        pipeline.pause().pauses(),
        vec![
            Duration::from_secs(1),
            Duration::from_millis(1500),
            Duration::from_millis(100),
            Duration::from_millis(100),
        ]
    );
}
