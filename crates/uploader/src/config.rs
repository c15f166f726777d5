//! Migration configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_API_KEY` - Private/custom app API key
//! - `SHOPIFY_ADMIN_API_ACCESS_TOKEN` - Admin API access token (HIGH PRIVILEGE)
//!   - `SHOPIFY_PASSWORD` is accepted instead for legacy private apps
//!
//! ## Optional
//! - `MIGRATION_PROGRESS_FILE` - Resume file (default: data/upload_progress.json)
//! - `MIGRATION_EXPORT_FILE` - Export to try before the default locations
//! - `MIGRATION_TEST_EMAILS` - Comma-separated addresses for test uploads

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;
use woo_migrate_core::{Email, default_test_emails};

use crate::export::DEFAULT_EXPORT_CANDIDATES;

/// Admin REST API version the export was shaped for.
pub const API_VERSION: &str = "2024-01";

/// Default location of the resume file.
pub const DEFAULT_PROGRESS_FILE: &str = "data/upload_progress.json";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Complete migration configuration.
///
/// Built once at startup and handed by reference to the components that
/// need it; nothing reads the environment after this.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Shopify Admin API credentials
    pub shopify: ShopifyConfig,
    /// Where completed order IDs are recorded
    pub progress_file: PathBuf,
    /// Export locations, tried in order
    pub export_candidates: Vec<PathBuf>,
    /// Addresses substituted into test orders
    pub test_emails: Vec<Email>,
    /// Per-item retry behaviour
    pub retry: RetryPolicy,
    /// Batch sizes for the two upload modes
    pub batches: BatchSettings,
}

/// Shopify Admin API configuration.
///
/// Implements `Debug` manually to redact the HIGH PRIVILEGE token.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Admin REST API version (always [`API_VERSION`] when loaded from env)
    pub api_version: String,
    /// App API key, sent as the basic-auth user
    pub api_key: String,
    /// Admin API access token or legacy password, sent as the basic-auth password
    pub access_token: SecretString,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("api_key", &self.api_key)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// How hard the upload client tries before giving up on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per retry cycle.
    pub max_attempts: u32,
    /// Retry cycles before the item fails.
    pub max_cycles: u32,
    /// Pause between two retry cycles.
    pub cycle_cooldown: Duration,
    /// Wait on a 429 that carries no usable `Retry-After`.
    pub default_retry_after: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_cycles: 5,
            cycle_cooldown: Duration::from_secs(10),
            default_retry_after: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Batch sizing for test and full uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    /// Orders sampled for a test upload.
    pub test_order_count: usize,
    /// Batch size during a test upload.
    pub test_batch_size: usize,
    /// Batch size during a full upload.
    pub full_batch_size: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            test_order_count: 10,
            test_batch_size: 3,
            full_batch_size: 5,
        }
    }
}

impl MigrationConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let shopify = ShopifyConfig::from_lookup(&get)?;
        let progress_file = get("MIGRATION_PROGRESS_FILE")
            .map_or_else(|| PathBuf::from(DEFAULT_PROGRESS_FILE), PathBuf::from);
        let test_emails = parse_test_emails(get("MIGRATION_TEST_EMAILS").as_deref())?;

        Ok(Self {
            shopify,
            progress_file,
            export_candidates: export_candidates(&get),
            test_emails,
            retry: RetryPolicy::default(),
            batches: BatchSettings::default(),
        })
    }
}

impl ShopifyConfig {
    fn from_lookup(get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store = required(get, "SHOPIFY_STORE")?;
        let api_key = required(get, "SHOPIFY_API_KEY")?;
        let access_token = get("SHOPIFY_ADMIN_API_ACCESS_TOKEN")
            .filter(|v| !v.is_empty())
            .or_else(|| get("SHOPIFY_PASSWORD").filter(|v| !v.is_empty()))
            .ok_or_else(|| {
                ConfigError::MissingEnvVar(
                    "SHOPIFY_ADMIN_API_ACCESS_TOKEN (or SHOPIFY_PASSWORD)".to_string(),
                )
            })?;

        if let Some(pattern) = placeholder_pattern(&access_token) {
            tracing::warn!("Shopify access token looks like a placeholder (contains '{pattern}')");
        }

        let config = Self {
            store: normalize_store(&store),
            api_version: API_VERSION.to_string(),
            api_key,
            access_token: SecretString::from(access_token),
        };
        config
            .admin_api_base()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPIFY_STORE".to_string(), e.to_string()))?;

        Ok(config)
    }

    /// Base URL of the Admin REST API, ending in a slash so resources can be
    /// joined onto it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store domain does not form a valid URL.
    pub fn admin_api_base(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "https://{}/admin/api/{}/",
            self.store, self.api_version
        ))
    }

    /// Expose the token for building the authorization header.
    pub(crate) fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

/// Export locations: `MIGRATION_EXPORT_FILE` first when set, then the
/// defaults.
pub fn export_candidates(get: &impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    get("MIGRATION_EXPORT_FILE")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .into_iter()
        .chain(DEFAULT_EXPORT_CANDIDATES.iter().map(PathBuf::from))
        .collect()
}

// =============================================================================
// Helper Functions
// =============================================================================

fn required(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    get(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Accept `https://store.myshopify.com/` as well as the bare domain.
fn normalize_store(store: &str) -> String {
    let store = store.trim();
    let store = store
        .strip_prefix("https://")
        .or_else(|| store.strip_prefix("http://"))
        .unwrap_or(store);
    store.trim_end_matches('/').to_string()
}

fn parse_test_emails(raw: Option<&str>) -> Result<Vec<Email>, ConfigError> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(default_test_emails());
    };

    let emails = raw
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            Email::parse(part).map_err(|e| {
                ConfigError::InvalidEnvVar("MIGRATION_TEST_EMAILS".to_string(), format!("{part}: {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if emails.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            "MIGRATION_TEST_EMAILS".to_string(),
            "no addresses listed".to_string(),
        ));
    }
    Ok(emails)
}

fn placeholder_pattern(secret: &str) -> Option<&'static str> {
    let lower = secret.to_lowercase();
    PLACEHOLDER_PATTERNS
        .iter()
        .copied()
        .find(|pattern| lower.contains(pattern))
}
