//! Migration commands.
//!
//! - [`menu`] - Interactive menu shown when no subcommand is given
//! - [`upload`] - Test and full upload flows
//! - [`progress`] - Progress file maintenance

pub mod menu;
pub mod progress;
pub mod upload;

use std::path::PathBuf;

use dialoguer::Confirm;
use thiserror::Error;
use woo_migrate_core::{Order, SanitizeReport};
use woo_migrate_uploader::export::{self, ExportError, LoadMode};
use woo_migrate_uploader::{
    BatchReport, ConfigError, MigrationConfig, ProgressError, ProgressStore, UploadClient,
    UploadError, config,
};

/// Errors that end a CLI run with exit code 1.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("No WooCommerce order export found (checked: {})", display_paths(.0))]
    ExportNotFound(Vec<PathBuf>),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error("Could not create Shopify client: {0}")]
    Client(#[from] UploadError),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Only {successes}/{total} orders uploaded - check the log for failures")]
    Incomplete { successes: usize, total: usize },
}

impl CliError {
    /// `Ok` when every order in `report` went through.
    pub const fn check_complete(report: BatchReport) -> Result<(), Self> {
        if report.is_complete() {
            Ok(())
        } else {
            Err(Self::Incomplete {
                successes: report.successes,
                total: report.total,
            })
        }
    }
}

/// How a full upload treats an existing progress file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// Skip orders already recorded.
    Resume,
    /// Clear the record and upload everything.
    Fresh,
}

/// Everything a command needs, resolved once at startup.
pub struct Session {
    pub config: MigrationConfig,
    pub export_path: PathBuf,
    pub client: UploadClient<woo_migrate_uploader::shopify::ReqwestTransport>,
    pub progress: ProgressStore,
    pub assume_yes: bool,
}

impl Session {
    /// Locate the export and load configuration.
    ///
    /// The export is checked first so a missing file is reported even when
    /// credentials are not set up yet.
    ///
    /// # Errors
    ///
    /// Returns an error if no export exists, configuration is invalid, or
    /// the HTTP client cannot be built.
    pub fn start(assume_yes: bool) -> Result<Self, CliError> {
        let candidates = config::export_candidates(&|key: &str| std::env::var(key).ok());
        let export_path = locate_export(&candidates)?;
        tracing::info!(path = %export_path.display(), "Found WooCommerce orders export");

        let config = MigrationConfig::from_env()?;
        let client = UploadClient::from_config(&config)?;
        let progress = ProgressStore::new(config.progress_file.clone());

        Ok(Self {
            config,
            export_path,
            client,
            progress,
            assume_yes,
        })
    }

    /// Load, sanitize, and shape the export.
    ///
    /// # Errors
    ///
    /// Returns an error if the export cannot be read.
    pub fn load_orders(&self, mode: LoadMode) -> Result<Vec<Order>, CliError> {
        let raw = export::load_export(&self.export_path)?;
        let SanitizeReport {
            orders,
            voided,
            missing_email,
        } = export::prepare_orders(raw, mode, &self.config.test_emails);
        if voided + missing_email > 0 {
            tracing::info!(voided, missing_email, "Excluded orders from upload");
        }
        Ok(orders)
    }

    /// Ask a yes/no question; `--yes` answers for the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    pub fn confirm(&self, prompt: &str) -> Result<bool, CliError> {
        if self.assume_yes {
            return Ok(true);
        }
        Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
    }
}

fn locate_export(candidates: &[PathBuf]) -> Result<PathBuf, CliError> {
    export::find_export(candidates)
        .map(PathBuf::from)
        .ok_or_else(|| CliError::ExportNotFound(candidates.to_vec()))
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
