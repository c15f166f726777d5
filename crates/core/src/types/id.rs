//! Source order identifier.
//!
//! WooCommerce order numbers are carried through the export as
//! `woo_order_id` and are the key of the resume file, so they get their own
//! type instead of travelling around as bare integers.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// WooCommerce order number of an exported order.
///
/// Serialized transparently as an integer, matching the progress file format.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use woo_migrate_core::WooOrderId;
///
/// assert_eq!(WooOrderId::from_json(&json!(1042)), Some(WooOrderId::new(1042)));
/// assert_eq!(WooOrderId::from_json(&json!("1042")), Some(WooOrderId::new(1042)));
/// assert_eq!(WooOrderId::from_json(&json!(null)), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WooOrderId(i64);

impl WooOrderId {
    /// Create a new ID from an i64 value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the underlying i64 value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Read an ID out of a JSON value.
    ///
    /// Accepts integers and integer-valued strings, since exports produced by
    /// different WooCommerce plugins disagree on which one they write.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self),
            Value::String(s) => s.trim().parse().ok().map(Self),
            _ => None,
        }
    }
}

impl fmt::Display for WooOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for WooOrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<WooOrderId> for i64 {
    fn from(id: WooOrderId) -> Self {
        id.0
    }
}
