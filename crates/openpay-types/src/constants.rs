//! System-wide constants and defaults.

/// AES-GCM initialization vector length in bytes (96-bit, the recommended
/// size for GCM).
pub const IV_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes (128-bit).
pub const TAG_LEN: usize = 16;

/// Data-encryption key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Request fingerprint length in bytes (SHA-256).
pub const FINGERPRINT_LEN: usize = 32;

/// Fixed mask prefix for displayed card numbers. The masked form is this
/// prefix plus the last four digits, independent of the input length.
pub const PAN_MASK_PREFIX: &str = "************";

/// Number of trailing PAN digits kept visible after masking.
pub const PAN_VISIBLE_SUFFIX: usize = 4;

/// Prefix for public payment identifiers (e.g. `pay_1f3a9c0b42de`).
pub const PAYMENT_ID_PREFIX: &str = "pay_";

/// Number of hex characters following the payment id prefix.
pub const PAYMENT_ID_HEX_LEN: usize = 12;

/// Default advisory TTL for durable ledger records, in hours. Expired
/// PENDING records become reclaimable at the next occupy attempt.
pub const DEFAULT_LEDGER_TTL_HOURS: i64 = 24;
