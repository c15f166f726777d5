//! Locating and preparing the WooCommerce export.
//!
//! The exporter writes a JSON array of Shopify-shaped order objects. This
//! module finds it, reads it, and runs it through the sanitizer before the
//! batch uploader sees it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::info;
use woo_migrate_core::{Email, Order, SanitizeReport, make_test_orders, sanitize_orders};

/// Where the exporter leaves its output, in lookup order.
pub const DEFAULT_EXPORT_CANDIDATES: [&str; 2] = [
    "data/shopify_orders_ready.json",
    "scripts/data/shopify_orders_ready.json",
];

/// Observed average wall time per order, including rate-limit spacing.
const SECONDS_PER_ORDER: f64 = 3.5;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to read export {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("export {} is not a JSON array of orders: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// How loaded orders are prepared for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Anonymized copies of the first `count` valid orders.
    Test { count: usize },
    /// Every valid order with phones normalized.
    Full,
}

/// First candidate that exists on disk.
#[must_use]
pub fn find_export(candidates: &[PathBuf]) -> Option<&Path> {
    candidates
        .iter()
        .map(PathBuf::as_path)
        .find(|path| path.is_file())
}

/// Read the export at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON array of
/// objects.
pub fn load_export(path: &Path) -> Result<Vec<Order>, ExportError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let orders: Vec<Order> =
        serde_json::from_str(&contents).map_err(|source| ExportError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), count = orders.len(), "Loaded WooCommerce export");
    Ok(orders)
}

/// Sanitize `orders` and shape them for the chosen mode.
///
/// The report's exclusion counts always describe the full export; in test
/// mode only the sampled orders are returned.
#[must_use]
pub fn prepare_orders(orders: Vec<Order>, mode: LoadMode, test_emails: &[Email]) -> SanitizeReport {
    let mut report = sanitize_orders(orders);
    match mode {
        LoadMode::Test { count } => {
            report.orders = make_test_orders(&report.orders, count, test_emails);
            info!(count = report.orders.len(), "Prepared test orders");
        }
        LoadMode::Full => {
            for order in &mut report.orders {
                order.normalize_phones();
            }
            info!(count = report.orders.len(), "Prepared orders for upload");
        }
    }
    report
}

/// Count of orders per `financial_status`; a missing status is `unknown`.
#[must_use]
pub fn status_breakdown(orders: &[Order]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for order in orders {
        let status = order.financial_status_str().unwrap_or("unknown");
        *counts.entry(status.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Rough wall time to upload `count` orders.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn estimate_duration(count: usize) -> Duration {
    Duration::from_secs_f64(count as f64 * SECONDS_PER_ORDER)
}
