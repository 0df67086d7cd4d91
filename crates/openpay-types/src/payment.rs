//! Payment model: the persisted record, its encryption envelope, and the
//! client-safe response view.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{IV_LEN, TAG_LEN};
use crate::ids::PaymentId;
use crate::request::Fingerprint;

/// Lifecycle status of a payment.
///
/// With no gateway in scope, creation records `Succeeded` directly; the
/// other states exist for callers that settle asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

/// Card brand, classified from the leading PAN digits.
///
/// Best-effort classification against well-known ranges, not authoritative
/// BIN data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardBrand {
    Visa,
    Amex,
    Mastercard,
    Discover,
    Unknown,
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Visa => "VISA",
            Self::Amex => "AMEX",
            Self::Mastercard => "MASTERCARD",
            Self::Discover => "DISCOVER",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// AES-256-GCM envelope for the encrypted PAN.
///
/// The four artifacts travel together: a payment row either carries a
/// complete envelope or none at all. `key_id` names the data-encryption
/// key that produced the ciphertext, so keys can rotate without
/// re-encrypting existing rows.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPan {
    /// Ciphertext, same length as the plaintext PAN (GCM adds no padding).
    pub ciphertext: Vec<u8>,
    /// Random 96-bit IV, fresh per encryption.
    pub iv: [u8; IV_LEN],
    /// 128-bit authentication tag.
    pub tag: [u8; TAG_LEN],
    /// Identifier of the data-encryption key.
    pub key_id: String,
}

// Manual Debug: ciphertext bytes stay out of logs and panic messages.
impl fmt::Debug for EncryptedPan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedPan")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("iv", &hex::encode(self.iv))
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

/// A persisted payment.
///
/// `(tenant_id, idempotency_key)` is unique: for any key, at most one of
/// these rows ever exists. Plaintext PAN and CVV are never stored — only
/// the masked display form and the [`EncryptedPan`] envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: PaymentId,
    pub tenant_id: String,
    pub idempotency_key: String,
    pub status: PaymentStatus,
    /// Amount in the smallest currency unit (e.g. cents).
    pub amount_minor: i64,
    /// ISO 4217 three-letter code.
    pub currency: String,
    /// Masked display form, e.g. `************1111`.
    pub masked_card: String,
    pub brand: CardBrand,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub encrypted_pan: EncryptedPan,
    /// Lineage copy of the request fingerprint that created this row.
    pub fingerprint: Fingerprint,
    pub client_reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-safe response view of a [`PaymentRecord`].
///
/// This is the only shape the (out-of-scope) transport layer ever sees; it
/// carries no encryption artifacts and no fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentView {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub amount_minor: i64,
    pub currency: String,
    pub masked_card: String,
    pub brand: CardBrand,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub tenant_id: String,
    pub idempotency_key: String,
}

impl From<&PaymentRecord> for PaymentView {
    fn from(p: &PaymentRecord) -> Self {
        Self {
            payment_id: p.payment_id.clone(),
            status: p.status,
            amount_minor: p.amount_minor,
            currency: p.currency.clone(),
            masked_card: p.masked_card.clone(),
            brand: p.brand,
            expiry_month: p.expiry_month,
            expiry_year: p.expiry_year,
            tenant_id: p.tenant_id.clone(),
            idempotency_key: p.idempotency_key.clone(),
        }
    }
}
