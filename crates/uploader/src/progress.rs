//! Durable record of uploaded orders.
//!
//! The file is a small JSON document:
//!
//! ```json
//! {"completed_orders": [101, 102], "last_updated": 1714000000.25}
//! ```
//!
//! It is rewritten after every successful upload through a temporary file
//! in the same directory, so a crash leaves either the old or the new
//! record on disk, never a truncated one.

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};
use woo_migrate_core::WooOrderId;

/// Contents of the progress file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Orders already created in Shopify, in completion order.
    #[serde(default)]
    pub completed_orders: Vec<WooOrderId>,
    /// Seconds since the Unix epoch of the last write.
    #[serde(default)]
    pub last_updated: f64,
}

impl ProgressRecord {
    #[must_use]
    pub fn contains(&self, id: WooOrderId) -> bool {
        self.completed_orders.contains(&id)
    }
}

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("no progress file at {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("progress file {} is not valid: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("progress file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reads and writes the progress file at a fixed path.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    /// Store backed by the file at `path`. Nothing is read until used.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a progress file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no file, `Corrupt` if it isn't a
    /// progress record, or `Io` for other read failures.
    pub fn load(&self) -> Result<ProgressRecord, ProgressError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ProgressError::NotFound {
                    path: self.path.clone(),
                });
            }
            Err(source) => {
                return Err(ProgressError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&contents).map_err(|source| ProgressError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// IDs already uploaded. An unreadable file counts as no progress.
    #[must_use]
    pub fn load_completed(&self) -> BTreeSet<WooOrderId> {
        match self.load() {
            Ok(record) => record.completed_orders.into_iter().collect(),
            Err(ProgressError::NotFound { .. }) => BTreeSet::new(),
            Err(e) => {
                warn!(error = %e, "Could not read progress, starting from scratch");
                BTreeSet::new()
            }
        }
    }

    /// Append `id` and persist. Returns `false` if it was already recorded.
    ///
    /// An unreadable existing file is replaced by a fresh record.
    ///
    /// # Errors
    ///
    /// Returns an error if the new record cannot be written.
    pub fn record_completed(&self, id: WooOrderId) -> Result<bool, ProgressError> {
        let mut record = match self.load() {
            Ok(record) => record,
            Err(ProgressError::NotFound { .. }) => ProgressRecord::default(),
            Err(e) => {
                warn!(error = %e, "Replacing unreadable progress file");
                ProgressRecord::default()
            }
        };

        if record.contains(id) {
            debug!(woo_order_id = %id, "Order already recorded");
            return Ok(false);
        }

        record.completed_orders.push(id);
        record.last_updated = now_epoch_secs();
        self.write(&record)?;
        Ok(true)
    }

    /// Delete the progress file. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<bool, ProgressError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ProgressError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, record: &ProgressRecord) -> Result<(), ProgressError> {
        let io_err = |source| ProgressError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        serde_json::to_writer(&mut tmp, record).map_err(|e| io_err(e.into()))?;
        tmp.flush().map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn now_epoch_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
