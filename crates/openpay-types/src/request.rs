//! Incoming payment request and its canonical fingerprint.
//!
//! The fingerprint ties an idempotency key to one exact payload: a retry
//! with the same key and the same fields hashes identically, while reusing
//! the key for different payment details is detectable as a conflict.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::FINGERPRINT_LEN;

/// SHA-256 digest of the normalized request payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; FINGERPRINT_LEN]);

impl Fingerprint {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// First 8 hex chars, for log correlation.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({}…)", self.short())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A request to charge a card against one or more invoices.
///
/// The CVV participates in validation and in the fingerprint but is never
/// persisted or forwarded. The whole struct must stay out of logs — it
/// carries the plaintext PAN.
#[derive(Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub first_name: String,
    pub last_name: String,
    /// Plaintext PAN, digits only.
    pub card_number: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub cvv: String,
    /// Amount in the smallest currency unit.
    pub amount_minor: i64,
    /// ISO 4217 three-letter code.
    pub currency: String,
    /// Invoices this payment settles. Must be non-empty.
    pub invoice_ids: Vec<String>,
    pub client_reference_id: Option<String>,
}

impl PaymentRequest {
    /// Compute the canonical fingerprint of this request.
    ///
    /// Fields are joined with `|` in a fixed order; invoice ids are sorted
    /// first so their order does not affect the digest. The normalized
    /// string contains the PAN and CVV and must never be logged — only the
    /// one-way digest leaves this function.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut invoices = self.invoice_ids.clone();
        invoices.sort_unstable();

        let normalized = format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.first_name,
            self.last_name,
            self.card_number,
            self.expiry_month,
            self.expiry_year,
            self.cvv,
            self.amount_minor,
            self.currency,
            invoices.join(","),
        );

        let mut hasher = Sha256::new();
        hasher.update(b"openpay:fingerprint:v1:");
        hasher.update(normalized.as_bytes());
        let digest = hasher.finalize();
        let bytes: [u8; FINGERPRINT_LEN] =
            digest.into();
        Fingerprint(bytes)
    }
}

// Manual Debug: never render the PAN or CVV, even at trace level.
impl fmt::Debug for PaymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentRequest")
            .field("amount_minor", &self.amount_minor)
            .field("currency", &self.currency)
            .field("invoice_ids", &self.invoice_ids)
            .field("client_reference_id", &self.client_reference_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> PaymentRequest {
        PaymentRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            card_number: "4111111111111111".into(),
            expiry_month: 12,
            expiry_year: 2031,
            cvv: "123".into(),
            amount_minor: 2599,
            currency: "AUD".into(),
            invoice_ids: vec!["INV-1".into(), "INV-2".into()],
            client_reference_id: None,
        }
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let req = base_request();
        assert_eq!(req.fingerprint(), base_request().fingerprint());
    }

    #[test]
    fn fingerprint_ignores_invoice_order() {
        let mut reordered = base_request();
        reordered.invoice_ids = vec!["INV-2".into(), "INV-1".into()];
        assert_eq!(base_request().fingerprint(), reordered.fingerprint());
    }

    #[test]
    fn fingerprint_sensitive_to_every_hashed_field() {
        let base = base_request().fingerprint();

        let mutations: Vec<PaymentRequest> = vec![
            {
                let mut r = base_request();
                r.first_name = "Eva".into();
                r
            },
            {
                let mut r = base_request();
                r.last_name = "Byron".into();
                r
            },
            {
                let mut r = base_request();
                r.card_number = "5555555555554444".into();
                r
            },
            {
                let mut r = base_request();
                r.expiry_month = 1;
                r
            },
            {
                let mut r = base_request();
                r.expiry_year = 2032;
                r
            },
            {
                let mut r = base_request();
                r.cvv = "999".into();
                r
            },
            {
                let mut r = base_request();
                r.amount_minor = 2600;
                r
            },
            {
                let mut r = base_request();
                r.currency = "USD".into();
                r
            },
            {
                let mut r = base_request();
                r.invoice_ids = vec!["INV-1".into()];
                r
            },
        ];

        for (i, m) in mutations.iter().enumerate() {
            assert_ne!(base, m.fingerprint(), "mutation {i} did not change the fingerprint");
        }
    }

    #[test]
    fn fingerprint_excludes_client_reference() {
        let mut with_ref = base_request();
        with_ref.client_reference_id = Some("ref-42".into());
        assert_eq!(base_request().fingerprint(), with_ref.fingerprint());
    }

    #[test]
    fn debug_never_renders_pan_or_cvv() {
        let req = base_request();
        let dbg = format!("{req:?}");
        assert!(!dbg.contains("4111111111111111"), "got: {dbg}");
        assert!(!dbg.contains("123"), "got: {dbg}");
        assert!(dbg.contains("AUD"));
    }

    #[test]
    fn fingerprint_short_is_stable_hex() {
        let fp = base_request().fingerprint();
        assert_eq!(fp.short().len(), 8);
        assert_eq!(fp.to_string().len(), 64);
    }
}
