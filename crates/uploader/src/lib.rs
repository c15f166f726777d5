//! WooCommerce migration uploader - Pushes exported orders into Shopify.
//!
//! # Architecture
//!
//! - [`config`] - Environment-driven configuration (credentials, paths, retry policy)
//! - [`export`] - Locating, loading, and preparing the exported order file
//! - [`shopify`] - Admin REST client with rate limiting and retries
//! - [`progress`] - Durable record of uploaded orders for resumable runs
//! - [`batch`] - Batch driver tying the client and progress store together
//! - [`pause`] - Sleeping, behind a trait so tests can observe it
//!
//! # Example
//!
//! ```rust,ignore
//! use woo_migrate_uploader::{BatchUploader, MigrationConfig, ProgressStore, UploadClient};
//! use woo_migrate_uploader::shopify::Endpoint;
//!
//! let config = MigrationConfig::from_env()?;
//! let client = UploadClient::from_config(&config)?;
//! let progress = ProgressStore::new(&config.progress_file);
//! let report = BatchUploader::new(&client, &progress)
//!     .run(Endpoint::Orders, &orders, config.batches.full_batch_size, true)
//!     .await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod batch;
pub mod config;
pub mod export;
pub mod pause;
pub mod progress;
pub mod shopify;

pub use batch::{BatchReport, BatchUploader};
pub use config::{BatchSettings, ConfigError, MigrationConfig, RetryPolicy, ShopifyConfig};
pub use export::{ExportError, LoadMode};
pub use pause::{Pause, RecordingPause, TokioPause};
pub use progress::{ProgressError, ProgressRecord, ProgressStore};
pub use shopify::{Endpoint, UploadClient, UploadError};
