//! Order repair ahead of upload.
//!
//! Shopify's order endpoint rejects a few shapes that WooCommerce exports
//! happily produce:
//! - `processed_at` missing on a paid order
//! - `processed_at` present on an order that is not paid
//! - no customer email
//!
//! [`sanitize_order`] fixes what can be fixed and excludes the rest. Voided
//! orders are excluded up front; cancelled and failed orders are not
//! migrated.

use serde_json::Value;
use tracing::{debug, warn};

use crate::order::Order;
use crate::types::{Email, FinancialStatus};

/// Why an order was left out of the migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Exclusion {
    /// The order was voided (cancelled or failed) in WooCommerce.
    #[error("order is voided")]
    Voided,
    /// The order has no customer email.
    #[error("order has no email")]
    MissingEmail,
}

/// Repair a single order, or explain why it must be skipped.
///
/// # Errors
///
/// Returns [`Exclusion::Voided`] for voided orders (without touching them)
/// and [`Exclusion::MissingEmail`] when the email is missing or blank.
pub fn sanitize_order(mut order: Order) -> Result<Order, Exclusion> {
    let status = order.financial_status();

    if status == Some(FinancialStatus::Voided) {
        debug!(woo_order_id = %order.label(), "Skipping voided order");
        return Err(Exclusion::Voided);
    }

    if status == Some(FinancialStatus::Paid) {
        fill_processed_at(&mut order);
    } else if order.remove("processed_at").is_some() {
        debug!(
            woo_order_id = %order.label(),
            financial_status = order.financial_status_str().unwrap_or("none"),
            "Removed processed_at from unpaid order"
        );
    }

    match order.email() {
        None => {
            warn!(woo_order_id = %order.label(), "Order missing email - skipping");
            return Err(Exclusion::MissingEmail);
        }
        Some(email) if Email::is_blank(email) => {
            warn!(woo_order_id = %order.label(), "Order missing email - skipping");
            return Err(Exclusion::MissingEmail);
        }
        Some(email) => {
            if let Err(e) = Email::parse(email) {
                warn!(
                    woo_order_id = %order.label(),
                    error = %e,
                    "Order email looks malformed, uploading anyway"
                );
            }
        }
    }

    Ok(order)
}

/// Paid orders need `processed_at`; borrow `created_at` when it is unusable.
fn fill_processed_at(order: &mut Order) {
    let usable = match order.processed_at() {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty() && s != "null",
        Some(_) => true,
    };
    if usable {
        return;
    }

    if let Some(created_at) = order.created_at().cloned() {
        debug!(
            woo_order_id = %order.label(),
            processed_at = %created_at,
            "Set processed_at from created_at"
        );
        order.set("processed_at", created_at);
    } else {
        warn!(
            woo_order_id = %order.label(),
            "Paid order has neither processed_at nor created_at"
        );
    }
}

/// Result of sanitizing a whole export.
#[derive(Debug, Clone, Default)]
pub struct SanitizeReport {
    /// Orders that passed, in export order.
    pub orders: Vec<Order>,
    /// Number of voided orders dropped.
    pub voided: usize,
    /// Number of orders dropped for a missing email.
    pub missing_email: usize,
}

impl SanitizeReport {
    /// Total number of excluded orders.
    #[must_use]
    pub const fn excluded(&self) -> usize {
        self.voided + self.missing_email
    }
}

/// Sanitize every order of an export, keeping the survivors in order.
#[must_use]
pub fn sanitize_orders(orders: Vec<Order>) -> SanitizeReport {
    let mut report = SanitizeReport {
        orders: Vec::with_capacity(orders.len()),
        ..SanitizeReport::default()
    };

    for order in orders {
        match sanitize_order(order) {
            Ok(order) => report.orders.push(order),
            Err(Exclusion::Voided) => report.voided += 1,
            Err(Exclusion::MissingEmail) => report.missing_email += 1,
        }
    }

    report
}
