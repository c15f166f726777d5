//! Exported order record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{FinancialStatus, FulfillmentStatus, WooOrderId, normalize_phone_value};

/// Which of the two nested addresses on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Billing,
    Shipping,
}

impl AddressKind {
    /// JSON key of the address object.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Billing => "billing_address",
            Self::Shipping => "shipping_address",
        }
    }
}

/// One order from the WooCommerce export, already shaped for Shopify's REST
/// `order` resource.
///
/// The record is kept as a JSON object so fields this tool never looks at
/// (line items, totals, tax lines, ...) pass through to Shopify byte for
/// byte. Accessors cover the handful of fields the migration repairs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Order(Map<String, Value>);

impl Order {
    /// Wrap an existing JSON object.
    #[must_use]
    pub const fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build an order from a JSON value; `None` unless it is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Borrow the raw fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub(crate) const fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Consume the order and return the raw fields.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Get a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a top-level field, returning the previous value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.to_owned(), value.into())
    }

    /// Remove a top-level field entirely.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// WooCommerce order number, falling back to `id` when the exporter did
    /// not write `woo_order_id`.
    #[must_use]
    pub fn source_id(&self) -> Option<WooOrderId> {
        self.get("woo_order_id")
            .and_then(WooOrderId::from_json)
            .or_else(|| self.get("id").and_then(WooOrderId::from_json))
    }

    /// Human-readable reference for log lines.
    #[must_use]
    pub fn label(&self) -> String {
        self.source_id()
            .map_or_else(|| "unknown".to_owned(), |id| format!("#{id}"))
    }

    /// The customer email, if it is a string.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.get("email").and_then(Value::as_str)
    }

    /// The raw `financial_status` string.
    #[must_use]
    pub fn financial_status_str(&self) -> Option<&str> {
        self.get("financial_status").and_then(Value::as_str)
    }

    /// The financial status, when it is one Shopify knows.
    #[must_use]
    pub fn financial_status(&self) -> Option<FinancialStatus> {
        self.financial_status_str().and_then(|s| s.parse().ok())
    }

    /// The fulfillment status; a missing or `null` field is unfulfilled.
    #[must_use]
    pub fn fulfillment_status(&self) -> Option<FulfillmentStatus> {
        match self.get("fulfillment_status") {
            None | Some(Value::Null) => Some(FulfillmentStatus::Unfulfilled),
            Some(Value::String(s)) => s.parse().ok(),
            Some(_) => None,
        }
    }

    /// Order creation timestamp as exported.
    #[must_use]
    pub fn created_at(&self) -> Option<&Value> {
        self.get("created_at").filter(|v| !v.is_null())
    }

    /// Payment timestamp as exported (may be `null` or junk).
    #[must_use]
    pub fn processed_at(&self) -> Option<&Value> {
        self.get("processed_at")
    }

    /// Mutable access to the billing or shipping address object.
    pub fn address_mut(&mut self, kind: AddressKind) -> Option<&mut Map<String, Value>> {
        self.0.get_mut(kind.key()).and_then(Value::as_object_mut)
    }

    /// Rewrite the customer-level and address phone fields into E.164.
    ///
    /// Only fields that are present and non-null are touched; a value that
    /// can't be normalized becomes `null` so Shopify treats it as absent.
    pub fn normalize_phones(&mut self) {
        normalize_phone_field(&mut self.0);
        for kind in [AddressKind::Billing, AddressKind::Shipping] {
            if let Some(address) = self.address_mut(kind) {
                normalize_phone_field(address);
            }
        }
    }
}

impl From<Map<String, Value>> for Order {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<Order> for Value {
    fn from(order: Order) -> Self {
        Self::Object(order.0)
    }
}

/// Normalize the `phone` key of `fields` in place.
pub(crate) fn normalize_phone_field(fields: &mut Map<String, Value>) {
    if let Some(phone) = fields.get_mut("phone")
        && !phone.is_null()
    {
        *phone = normalize_phone_value(phone).map_or(Value::Null, Value::from);
    }
}
