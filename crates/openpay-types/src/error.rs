//! Error types for the OpenPay payment core.
//!
//! All errors use the `OP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Validation errors
//! - 2xx: Idempotency errors
//! - 3xx: Invoice-linking errors
//! - 4xx: Storage errors
//! - 9xx: General / internal errors
//!
//! Expected business outcomes like "still processing" and "key reused with a
//! different payload" are ordinary variants here, not panics — every caller
//! must handle each branch. The transport layer (out of scope) maps
//! [`ErrorKind`] to status codes.

use thiserror::Error;

/// Central error enum for all OpenPay operations.
#[derive(Debug, Error)]
pub enum PayError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// A required header value (tenant id, idempotency key) was empty.
    #[error("OP_ERR_100: Missing required header value: {0}")]
    MissingHeader(&'static str),

    /// The card number failed a structural check (Luhn, digits, expiry range).
    #[error("OP_ERR_101: Invalid card: {reason}")]
    InvalidCard { reason: String },

    /// The card expiry is strictly before the current calendar month.
    #[error("OP_ERR_102: Card expired: {month:02}/{year}")]
    CardExpired { month: u32, year: i32 },

    /// The amount is zero or negative.
    #[error("OP_ERR_103: amount_minor must be positive, got {amount_minor}")]
    InvalidAmount { amount_minor: i64 },

    /// The request carried no invoice ids.
    #[error("OP_ERR_104: At least one invoice id is required")]
    NoInvoices,

    // =================================================================
    // Idempotency Errors (2xx)
    // =================================================================
    /// Another attempt for the same key is in flight (local or durable).
    /// Retry later with the unchanged request.
    #[error("OP_ERR_200: Processing, please retry later")]
    Processing,

    /// The same idempotency key was reused for a materially different
    /// request (fingerprint mismatch). Client programming error.
    #[error("OP_ERR_201: Idempotency key reused with a different request")]
    IdempotencyConflict,

    /// The ledger says COMPLETED but the payment row is missing — the two
    /// stores diverged in a way the core cannot repair.
    #[error("OP_ERR_202: Idempotency key completed but payment record is missing")]
    CompletedRecordMissing,

    // =================================================================
    // Invoice-Linking Errors (3xx)
    // =================================================================
    /// One or more invoices are already linked to a payment for this
    /// tenant. Carries the colliding subset of the requested ids.
    #[error("OP_ERR_300: Invoices already paid: {}", invoice_ids.join(","))]
    DuplicateInvoice { invoice_ids: Vec<String> },

    // =================================================================
    // Storage Errors (4xx)
    // =================================================================
    /// A uniqueness constraint other than the invoice link fired where the
    /// ledger should have serialized access.
    #[error("OP_ERR_400: Storage uniqueness conflict on {constraint}")]
    StorageConflict { constraint: String },

    /// Underlying storage failure (I/O, poisoned lock, backend-specific).
    #[error("OP_ERR_401: Storage failure: {0}")]
    Storage(String),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error. Detail is for logs, never for clients.
    #[error("OP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Cipher initialization or AEAD operation failed.
    #[error("OP_ERR_901: Crypto failure: {reason}")]
    Crypto { reason: String },
}

/// Coarse classification surfaced to the (out-of-scope) transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fix the request before retrying.
    Validation,
    /// Retry later with the unchanged request.
    Processing,
    /// Same key, different payload — do not retry with this key.
    IdempotencyConflict,
    /// Inspect the offending invoice ids — do not retry blindly.
    DuplicateInvoice,
    /// Safe to retry; internal detail is never exposed to the caller.
    Internal,
}

impl PayError {
    /// Classify this error per the taxonomy above.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingHeader(_)
            | Self::InvalidCard { .. }
            | Self::CardExpired { .. }
            | Self::InvalidAmount { .. }
            | Self::NoInvoices => ErrorKind::Validation,
            Self::Processing => ErrorKind::Processing,
            Self::IdempotencyConflict => ErrorKind::IdempotencyConflict,
            Self::DuplicateInvoice { .. } => ErrorKind::DuplicateInvoice,
            Self::CompletedRecordMissing
            | Self::StorageConflict { .. }
            | Self::Storage(_)
            | Self::Internal(_)
            | Self::Crypto { .. } => ErrorKind::Internal,
        }
    }

    /// Whether the caller may retry the identical request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Processing | ErrorKind::Internal)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PayError>;
