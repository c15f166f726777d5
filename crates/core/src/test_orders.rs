//! Anonymized test orders.
//!
//! A dry run against a live store should not email real customers. These
//! helpers take a sample of real (already sanitized) orders and swap the
//! customer identity for one of a few internal addresses, keeping dates,
//! line items, and fulfillment state so the run still exercises the real
//! data shapes.

use tracing::debug;

use crate::order::{AddressKind, Order, normalize_phone_field};
use crate::types::{Email, FulfillmentStatus};

/// Addresses used when the configuration does not provide its own.
pub const DEFAULT_TEST_EMAILS: [&str; 4] = [
    "migration-test-1@example.com",
    "migration-test-2@example.com",
    "migration-test-3@example.com",
    "migration-test-4@example.com",
];

/// [`DEFAULT_TEST_EMAILS`] as parsed addresses.
#[must_use]
pub fn default_test_emails() -> Vec<Email> {
    DEFAULT_TEST_EMAILS
        .iter()
        .filter_map(|e| Email::parse(e).ok())
        .collect()
}

/// Build up to `count` test orders from the front of `orders`.
///
/// Each copy gets test email `i % emails.len()`, a `Test CustomerN` name on
/// both addresses, normalized billing and customer phones, and a note that
/// points back at the original WooCommerce order. `orders` itself is never
/// modified. An empty `emails` slice falls back to [`DEFAULT_TEST_EMAILS`];
/// a customer address is never carried over.
#[must_use]
pub fn make_test_orders(orders: &[Order], count: usize, emails: &[Email]) -> Vec<Order> {
    let defaults;
    let emails = if emails.is_empty() {
        defaults = default_test_emails();
        defaults.as_slice()
    } else {
        emails
    };

    orders
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, original)| anonymize(original.clone(), i, emails))
        .collect()
}

fn anonymize(mut order: Order, index: usize, emails: &[Email]) -> Order {
    let number = index + 1;

    match emails.get(index % emails.len().max(1)) {
        Some(email) => {
            order.set("email", email.clone());
        }
        None => {
            order.remove("email");
        }
    }

    if order.fulfillment_status() == Some(FulfillmentStatus::Fulfilled) {
        debug!(
            woo_order_id = %order.label(),
            created_at = ?order.created_at(),
            "Test order keeps fulfillment on its creation date"
        );
    }

    if let Some(billing) = order.address_mut(AddressKind::Billing) {
        rename(billing, number);
        normalize_phone_field(billing);
    }
    if let Some(shipping) = order.address_mut(AddressKind::Shipping) {
        rename(shipping, number);
    }
    normalize_phone_field(order.fields_mut());

    let source = order
        .source_id()
        .map_or_else(|| "unknown".to_owned(), |id| id.to_string());
    order.set(
        "note",
        format!("TEST ORDER {number} - Original WooCommerce Order #{source}"),
    );

    order
}

fn rename(address: &mut serde_json::Map<String, serde_json::Value>, number: usize) {
    address.insert("first_name".to_owned(), "Test".into());
    address.insert("last_name".to_owned(), format!("Customer{number}").into());
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn emails() -> Vec<Email> {
        default_test_emails()
    }

    fn sample(n: i64) -> Vec<Order> {
        (1..=n)
            .map(|id| {
                Order::from_value(json!({
                    "woo_order_id": id,
                    "email": format!("real{id}@customer.com"),
                    "created_at": "2023-05-01T10:00:00",
                    "processed_at": "2023-05-01T10:05:00",
                    "fulfillment_status": "fulfilled",
                    "phone": "555 123 4567",
                    "billing_address": {"first_name": "Real", "last_name": "Person", "phone": "(555) 987-6543"},
                    "shipping_address": {"first_name": "Real", "last_name": "Person", "phone": "555-000-1111"}
                }))
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_emails_cycle_through_test_addresses() {
        let test = make_test_orders(&sample(6), 6, &emails());
        let got: Vec<_> = test.iter().map(|o| o.email().unwrap()).collect();
        assert_eq!(
            got,
            vec![
                DEFAULT_TEST_EMAILS[0],
                DEFAULT_TEST_EMAILS[1],
                DEFAULT_TEST_EMAILS[2],
                DEFAULT_TEST_EMAILS[3],
                DEFAULT_TEST_EMAILS[0],
                DEFAULT_TEST_EMAILS[1],
            ]
        );
    }

    #[test]
    fn test_count_is_bounded_by_input() {
        assert_eq!(make_test_orders(&sample(3), 10, &emails()).len(), 3);
        assert_eq!(make_test_orders(&sample(12), 10, &emails()).len(), 10);
        assert!(make_test_orders(&[], 10, &emails()).is_empty());
    }

    #[test]
    fn test_identity_is_replaced_and_dates_kept() {
        let test = make_test_orders(&sample(2), 2, &emails());
        let second = test[1].fields();

        assert_eq!(second["billing_address"]["first_name"], json!("Test"));
        assert_eq!(second["billing_address"]["last_name"], json!("Customer2"));
        assert_eq!(second["billing_address"]["phone"], json!("+15559876543"));
        assert_eq!(second["shipping_address"]["last_name"], json!("Customer2"));
        assert_eq!(second["shipping_address"]["phone"], json!("555-000-1111"));
        assert_eq!(second["phone"], json!("+15551234567"));
        assert_eq!(second["created_at"], json!("2023-05-01T10:00:00"));
        assert_eq!(second["processed_at"], json!("2023-05-01T10:05:00"));
        assert_eq!(second["fulfillment_status"], json!("fulfilled"));
        assert_eq!(
            second["note"],
            json!("TEST ORDER 2 - Original WooCommerce Order #2")
        );
    }

    #[test]
    fn test_input_is_not_mutated() {
        let originals = sample(2);
        let before = originals.clone();
        let _ = make_test_orders(&originals, 2, &emails());
        assert_eq!(originals, before);
    }

    #[test]
    fn test_orders_without_addresses() {
        let bare = vec![Order::from_value(json!({"email": "x@y.com"})).unwrap()];
        let test = make_test_orders(&bare, 1, &emails());
        assert_eq!(test[0].get("billing_address"), None);
        assert_eq!(test[0].get("phone"), None);
        assert_eq!(
            test[0].get("note").and_then(Value::as_str),
            Some("TEST ORDER 1 - Original WooCommerce Order #unknown")
        );
    }

    #[test]
    fn test_no_test_addresses_falls_back_to_defaults() {
        let test = make_test_orders(&sample(2), 2, &[]);
        let got: Vec<_> = test.iter().map(|o| o.email().unwrap()).collect();
        assert_eq!(got, vec![DEFAULT_TEST_EMAILS[0], DEFAULT_TEST_EMAILS[1]]);
    }

    #[test]
    fn test_default_test_emails_all_parse() {
        assert_eq!(default_test_emails().len(), DEFAULT_TEST_EMAILS.len());
    }
}
