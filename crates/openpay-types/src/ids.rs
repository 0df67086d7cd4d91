//! Globally unique identifiers used throughout OpenPay.
//!
//! Payment ids are public-facing opaque strings (`pay_` + 12 hex chars)
//! drawn from the random bits of a UUIDv7, leaking nothing about creation
//! time, the card, or the tenant.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{PAYMENT_ID_HEX_LEN, PAYMENT_ID_PREFIX};

/// Public-facing payment identifier, unique across all tenants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    /// Generate a fresh payment id.
    ///
    /// Takes the trailing hex characters of a UUIDv7, which sit entirely
    /// inside its random field. The leading characters encode the
    /// millisecond timestamp and would collide for ids minted in the same
    /// instant.
    #[must_use]
    pub fn new() -> Self {
        let hex = Uuid::now_v7().simple().to_string();
        Self(format!(
            "{PAYMENT_ID_PREFIX}{}",
            &hex[hex.len() - PAYMENT_ID_HEX_LEN..]
        ))
    }

    /// Wrap an existing identifier, e.g. one read back from storage.
    #[must_use]
    pub fn from_string(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_id_shape() {
        let id = PaymentId::new();
        let s = id.as_str();
        assert!(s.starts_with(PAYMENT_ID_PREFIX), "got: {s}");
        assert_eq!(s.len(), PAYMENT_ID_PREFIX.len() + PAYMENT_ID_HEX_LEN);
        assert!(
            s[PAYMENT_ID_PREFIX.len()..]
                .chars()
                .all(|c| c.is_ascii_hexdigit()),
            "got: {s}"
        );
    }

    #[test]
    fn payment_id_uniqueness() {
        let a = PaymentId::new();
        let b = PaymentId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_minted_in_the_same_instant_stay_distinct() {
        // A tight loop mints many ids inside one millisecond; every one
        // must differ, so the id cannot be timestamp-derived.
        let ids: std::collections::HashSet<PaymentId> =
            (0..512).map(|_| PaymentId::new()).collect();
        assert_eq!(ids.len(), 512);
    }

    #[test]
    fn serde_roundtrip_is_transparent() {
        let id = PaymentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: PaymentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
