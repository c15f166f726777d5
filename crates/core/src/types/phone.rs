//! E.164 phone numbers.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A phone number in E.164 form (`+` followed by digits).
///
/// Shopify validates phone fields on orders and customers; WooCommerce stores
/// whatever the customer typed. The only way to build one is
/// [`PhoneNumber::normalize`], which applies North American defaults.
///
/// ```
/// use woo_migrate_core::PhoneNumber;
///
/// assert_eq!(PhoneNumber::normalize("(555) 123-4567").unwrap().as_str(), "+15551234567");
/// assert_eq!(PhoneNumber::normalize("1-555-123-4567").unwrap().as_str(), "+15551234567");
/// assert_eq!(PhoneNumber::normalize("+44 20 7946 0958").unwrap().as_str(), "+442079460958");
/// assert!(PhoneNumber::normalize("555-1234").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum digit count accepted as a dialable number.
    pub const MIN_DIGITS: usize = 10;

    /// Normalize free-form input into E.164.
    ///
    /// All non-digit characters are dropped, then:
    /// - 10 digits get a `+1` prefix (US/Canada without country code)
    /// - 11 digits starting with `1` get a `+` prefix
    /// - any other count of at least 10 digits is assumed to carry its own
    ///   country code and gets a `+` prefix
    ///
    /// Anything shorter yields `None`, which callers treat as "no phone".
    #[must_use]
    pub fn normalize(input: &str) -> Option<Self> {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();

        match digits.len() {
            n if n < Self::MIN_DIGITS => None,
            10 => Some(Self(format!("+1{digits}"))),
            _ => Some(Self(format!("+{digits}"))),
        }
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PhoneNumber> for Value {
    fn from(phone: PhoneNumber) -> Self {
        Self::String(phone.0)
    }
}

/// Normalize a phone field taken straight from an export.
///
/// Strings and bare numbers are accepted; `null`, empty strings, and
/// anything else produce `None`.
#[must_use]
pub fn normalize_phone_value(value: &Value) -> Option<PhoneNumber> {
    match value {
        Value::String(s) => PhoneNumber::normalize(s),
        Value::Number(n) => PhoneNumber::normalize(&n.to_string()),
        _ => None,
    }
}
