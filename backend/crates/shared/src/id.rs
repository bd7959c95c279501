//! Common ID Types
//!
//! Type-safe wrappers for the opaque, server-issued identifiers the
//! captcha flow is keyed by.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Generic typed ID wrapper
///
/// Usage:
/// ```
/// use kernel::id::{Id, markers};
/// type CaptchaId = Id<markers::Captcha>;
/// let id = CaptchaId::new("cap456");
/// assert_eq!(id.as_str(), "cap456");
/// ```
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Id<T> {
    value: String,
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// Wrap an identifier issued by the server
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

// Manual impls so the marker type needs no bounds.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Marker types for different identifiers
pub mod markers {
    /// Marker for captcha instance IDs
    pub struct Captcha;

    /// Marker for payment (wallet session) IDs
    pub struct Payment;
}

/// Type aliases for common IDs
pub type CaptchaId = Id<markers::Captcha>;
pub type PaymentId = Id<markers::Payment>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_type_safety() {
        let captcha_id: CaptchaId = Id::new("cap456");
        let payment_id: PaymentId = Id::new("pay123");

        // These are different types, cannot be mixed
        let _c: String = captcha_id.into_string();
        let _p: String = payment_id.into_string();
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = PaymentId::new("pay123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"pay123\"");

        let back: PaymentId = serde_json::from_str("\"pay123\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_empty_id() {
        assert!(CaptchaId::new("").is_empty());
        assert!(!CaptchaId::new("x").is_empty());
    }
}
