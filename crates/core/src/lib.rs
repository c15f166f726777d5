//! WooCommerce migration core - Shared order types and data repair.
//!
//! This crate provides the types used across the migration workspace:
//! - `uploader` - Shopify Admin REST client, progress tracking, batch runs
//! - `cli` - Interactive migration tool
//!
//! # Architecture
//!
//! The core crate contains only types and pure transforms - no file access,
//! no HTTP clients. Order repair lives here so it can be tested in isolation
//! from the network.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for order IDs, emails, phones, and statuses
//! - [`order`] - The exported order record
//! - [`sanitize`] - Fixes that keep orders inside Shopify's validation rules
//! - [`test_orders`] - Anonymized copies of real orders for dry runs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod order;
pub mod sanitize;
pub mod test_orders;
pub mod types;

pub use order::{AddressKind, Order};
pub use sanitize::{Exclusion, SanitizeReport, sanitize_order, sanitize_orders};
pub use test_orders::{DEFAULT_TEST_EMAILS, default_test_emails, make_test_orders};
pub use types::*;
