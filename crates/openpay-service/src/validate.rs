//! Stateless business-rule validation.
//!
//! Runs before any persistence: a request that fails here leaves no trace
//! anywhere — no guard entry, no ledger row.

use chrono::{DateTime, Datelike, Utc};
use openpay_types::{PayError, PaymentRequest, Result};
use openpay_vault::card;

/// Check the identity headers: both must be non-empty.
pub fn validate_headers(tenant_id: &str, idempotency_key: &str) -> Result<()> {
    if tenant_id.trim().is_empty() {
        return Err(PayError::MissingHeader("tenant id"));
    }
    if idempotency_key.trim().is_empty() {
        return Err(PayError::MissingHeader("idempotency key"));
    }
    Ok(())
}

/// Apply the business rules: Luhn, expiry, amount, invoice presence.
///
/// `now` is injected so expiry boundaries are testable.
pub fn validate_request(req: &PaymentRequest, now: DateTime<Utc>) -> Result<()> {
    if !card::luhn(&req.card_number) {
        return Err(PayError::InvalidCard {
            reason: "Luhn checksum failed".into(),
        });
    }

    if req.expiry_month == 0 || req.expiry_month > 12 {
        return Err(PayError::InvalidCard {
            reason: format!("expiry month {} out of range", req.expiry_month),
        });
    }

    // Expired iff (year, month) is strictly before the current calendar
    // month; a card expiring this month is still valid.
    let current = (now.year(), now.month());
    if (req.expiry_year, req.expiry_month) < current {
        return Err(PayError::CardExpired {
            month: req.expiry_month,
            year: req.expiry_year,
        });
    }

    if req.amount_minor <= 0 {
        return Err(PayError::InvalidAmount {
            amount_minor: req.amount_minor,
        });
    }

    if req.invoice_ids.is_empty() {
        return Err(PayError::NoInvoices);
    }

    Ok(())
}
