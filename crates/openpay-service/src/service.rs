//! The payment orchestrator: sequences guard, validation, ledger, cipher,
//! and persistence into the single exactly-once `create` operation.

use std::sync::Arc;

use chrono::Utc;
use openpay_store::{LedgerStore, PaymentStore};
use openpay_types::{
    LedgerConfig, PayError, PaymentRecord, PaymentRequest, PaymentStatus, PaymentView, Result,
    VaultConfig,
};
use openpay_types::ids::PaymentId;
use openpay_vault::{binding_aad, card, PanCipher};

use crate::ledger::{DurableLedger, Occupancy};
use crate::local_guard::{composite_key, LocalGuard, ReleaseOnDrop};
use crate::validate::{validate_headers, validate_request};

/// Orchestrates payment creation with dual idempotency guards.
///
/// One instance per process; safe to share across threads (`&self` methods,
/// all interior state synchronized). Both stores may be the same object
/// implementing both traits.
pub struct PaymentService {
    guard: LocalGuard,
    ledger: DurableLedger,
    payments: Arc<dyn PaymentStore>,
    cipher: PanCipher,
}

impl PaymentService {
    /// Wire up the orchestrator.
    ///
    /// # Errors
    /// Returns [`PayError::Crypto`] if the vault key is rejected.
    pub fn new(
        ledger_store: Arc<dyn LedgerStore>,
        payment_store: Arc<dyn PaymentStore>,
        vault: &VaultConfig,
        ledger_config: LedgerConfig,
    ) -> Result<Self> {
        Ok(Self {
            guard: LocalGuard::new(),
            ledger: DurableLedger::new(ledger_store, ledger_config),
            payments: payment_store,
            cipher: PanCipher::new(vault)?,
        })
    }

    /// Create a payment, exactly once per `(tenant, idempotency key)`.
    ///
    /// Retries and concurrent duplicates of the same logical request yield
    /// the same payment id; a reused key with a different payload fails
    /// with [`PayError::IdempotencyConflict`]; an attempt that races a
    /// still-running one fails with the retryable [`PayError::Processing`].
    pub fn create(
        &self,
        tenant_id: &str,
        idempotency_key: &str,
        req: &PaymentRequest,
    ) -> Result<PaymentView> {
        // ---------- (0) Header checks ----------
        validate_headers(tenant_id, idempotency_key)?;

        tracing::info!(
            tenant = %tenant_id,
            idempotency_key = %idempotency_key,
            invoices = ?req.invoice_ids,
            "Payment create started"
        );

        let mem_key = composite_key(tenant_id, idempotency_key);

        // ---------- (1) Local fast paths ----------
        if self.guard.is_completed(&mem_key) {
            if let Some(prior) = self.payments.find_by_key(tenant_id, idempotency_key)? {
                // Same conflict rule as the ledger path: a replay must
                // carry the payload that created the payment.
                if prior.fingerprint != req.fingerprint() {
                    tracing::warn!(
                        tenant = %tenant_id,
                        existing_fp = %prior.fingerprint.short(),
                        "Idempotency key reused with a different request"
                    );
                    return Err(PayError::IdempotencyConflict);
                }
                tracing::debug!(payment_id = %prior.payment_id, "Local replay hit");
                return Ok(PaymentView::from(&prior));
            }
            // Completed flag without a row: restart or crash artifact.
            // Drop the stale marker and re-derive truth from the ledger.
            self.guard.clear(&mem_key);
        }

        if self.guard.is_pending(&mem_key) {
            return Err(PayError::Processing);
        }
        if !self.guard.try_acquire(&mem_key) {
            return Err(PayError::Processing);
        }

        // From here on the guard is held; release on every exit path.
        // `release` never un-sets a completed marker.
        let _release = ReleaseOnDrop::new(&self.guard, &mem_key);

        // ---------- (2) Business validation, no persistence yet ----------
        validate_request(req, Utc::now())?;

        // ---------- (3) Durable ledger occupy ----------
        let fingerprint = req.fingerprint();
        match self.ledger.occupy(tenant_id, idempotency_key, fingerprint)? {
            Occupancy::Owned => {}
            Occupancy::Replay => {
                let prior = self
                    .payments
                    .find_by_key(tenant_id, idempotency_key)?
                    .ok_or(PayError::CompletedRecordMissing)?;
                tracing::info!(
                    payment_id = %prior.payment_id,
                    tenant = %tenant_id,
                    "Replayed completed payment"
                );
                self.guard.mark_completed(&mem_key);
                return Ok(PaymentView::from(&prior));
            }
        }

        // Local guard mirrors the durable occupancy only once it is real.
        self.guard.mark_pending(&mem_key);

        // ---------- (4) Encrypt and persist ----------
        let persisted = self
            .build_record(tenant_id, idempotency_key, req)
            .and_then(|payment| {
                self.payments
                    .insert_with_links(&payment, &req.invoice_ids)
                    .map(|()| payment)
            });
        let payment = match persisted {
            Ok(payment) => payment,
            Err(err @ PayError::StorageConflict { .. }) => {
                // A payment row already exists under this key: a prior
                // attempt persisted but its ledger record never reached
                // COMPLETED, and we reclaimed it after TTL. Adopt that
                // payment instead of failing the key forever.
                let prior = self
                    .payments
                    .find_by_key(tenant_id, idempotency_key)
                    .ok()
                    .flatten();
                match prior {
                    Some(prior) if prior.fingerprint == fingerprint => {
                        tracing::warn!(
                            payment_id = %prior.payment_id,
                            tenant = %tenant_id,
                            "Adopted durable payment whose ledger record never completed"
                        );
                        prior
                    }
                    _ => {
                        self.fail_ledger(tenant_id, idempotency_key);
                        return Err(err);
                    }
                }
            }
            Err(err) => {
                self.fail_ledger(tenant_id, idempotency_key);
                return Err(err);
            }
        };

        // ---------- (5) Completion ----------
        // The payment is durable; failing to flip the ledger record must
        // not fail the call. The record stays PENDING until its TTL frees
        // it for reclaim, at which point a client retry adopts the
        // existing payment and re-attempts completion here.
        if let Err(err) = self.ledger.complete(tenant_id, idempotency_key) {
            tracing::error!(
                payment_id = %payment.payment_id,
                tenant = %tenant_id,
                error = %err,
                "Ledger completion failed after durable persist"
            );
        }
        self.guard.mark_completed(&mem_key);

        tracing::info!(
            payment_id = %payment.payment_id,
            tenant = %tenant_id,
            masked_card = %payment.masked_card,
            brand = %payment.brand,
            "Payment completed"
        );
        Ok(PaymentView::from(&payment))
    }

    /// Mark the occupied ledger record FAILED so the next attempt can
    /// reclaim instead of waiting out the TTL. Best-effort.
    fn fail_ledger(&self, tenant_id: &str, idempotency_key: &str) {
        if let Err(err) = self.ledger.fail(tenant_id, idempotency_key) {
            tracing::error!(
                tenant = %tenant_id,
                error = %err,
                "Could not mark ledger record FAILED after persist error"
            );
        }
    }

    /// Assemble the record: mask, classify, generate the id, and encrypt
    /// the PAN bound to `(tenant, payment_id)`.
    fn build_record(
        &self,
        tenant_id: &str,
        idempotency_key: &str,
        req: &PaymentRequest,
    ) -> Result<PaymentRecord> {
        let masked_card = card::masked(&req.card_number);
        let brand = card::brand(&req.card_number);
        let payment_id = PaymentId::new();

        let aad = binding_aad(tenant_id, &payment_id);
        let encrypted_pan = self.cipher.encrypt(&req.card_number, &aad)?;

        let now = Utc::now();
        Ok(PaymentRecord {
            payment_id,
            tenant_id: tenant_id.to_string(),
            idempotency_key: idempotency_key.to_string(),
            // No gateway in scope: creation records the terminal state.
            status: PaymentStatus::Succeeded,
            amount_minor: req.amount_minor,
            currency: req.currency.clone(),
            masked_card,
            brand,
            expiry_month: req.expiry_month,
            expiry_year: req.expiry_year,
            encrypted_pan,
            fingerprint: req.fingerprint(),
            client_reference_id: req.client_reference_id.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}
