//! In-memory reference backend.
//!
//! One mutex over all tables makes every trait operation atomic, which is
//! exactly the contract a transactional engine provides: `try_insert` is
//! insert-if-absent, and `insert_with_links` either writes the payment row
//! plus all links or writes nothing.
//!
//! Suitable for tests and single-process deployments; a real deployment
//! points the same traits at an engine with durable uniqueness constraints.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use openpay_types::{
    IdempotencyRecord, IdempotencyStatus, PayError, PaymentId, PaymentRecord, Result,
};

use crate::{LedgerInsert, LedgerStore, PaymentStore};

type TenantKey = (String, String);

#[derive(Default)]
struct Inner {
    /// `(tenant_id, idempotency_key)` -> ledger record. Map identity is the
    /// uniqueness constraint.
    ledger: HashMap<TenantKey, IdempotencyRecord>,
    /// `(tenant_id, idempotency_key)` -> payment row.
    payments: HashMap<TenantKey, PaymentRecord>,
    /// Public payment id -> owning `(tenant_id, idempotency_key)`.
    by_id: HashMap<PaymentId, TenantKey>,
    /// `(tenant_id, invoice_id)` -> linked payment.
    invoices: HashMap<TenantKey, PaymentId>,
}

/// In-memory implementation of both storage traits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| PayError::Storage("memory store mutex poisoned".into()))
    }

    /// Number of ledger records (test/inspection helper).
    pub fn ledger_len(&self) -> Result<usize> {
        Ok(self.lock()?.ledger.len())
    }

    /// Number of payment rows (test/inspection helper).
    pub fn payment_len(&self) -> Result<usize> {
        Ok(self.lock()?.payments.len())
    }

    /// Number of invoice links (test/inspection helper).
    pub fn link_len(&self) -> Result<usize> {
        Ok(self.lock()?.invoices.len())
    }
}

impl LedgerStore for MemoryStore {
    fn try_insert(&self, record: IdempotencyRecord) -> Result<LedgerInsert> {
        let mut inner = self.lock()?;
        let key = (record.tenant_id.clone(), record.idempotency_key.clone());
        if let Some(existing) = inner.ledger.get(&key) {
            return Ok(LedgerInsert::Conflict(existing.clone()));
        }
        inner.ledger.insert(key, record);
        Ok(LedgerInsert::Inserted)
    }

    fn find(&self, tenant_id: &str, idempotency_key: &str) -> Result<Option<IdempotencyRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .ledger
            .get(&(tenant_id.to_string(), idempotency_key.to_string()))
            .cloned())
    }

    fn mark_completed(&self, tenant_id: &str, idempotency_key: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let record = inner
            .ledger
            .get_mut(&(tenant_id.to_string(), idempotency_key.to_string()))
            .ok_or_else(|| {
                PayError::Storage(format!(
                    "no ledger record to complete for tenant {tenant_id}"
                ))
            })?;
        record.status = IdempotencyStatus::Completed;
        Ok(())
    }

    fn mark_failed(&self, tenant_id: &str, idempotency_key: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let record = inner
            .ledger
            .get_mut(&(tenant_id.to_string(), idempotency_key.to_string()))
            .ok_or_else(|| {
                PayError::Storage(format!("no ledger record to fail for tenant {tenant_id}"))
            })?;
        record.status = IdempotencyStatus::Failed;
        Ok(())
    }

    fn reclaim(&self, record: IdempotencyRecord, now: DateTime<Utc>) -> Result<bool> {
        let mut inner = self.lock()?;
        let key = (record.tenant_id.clone(), record.idempotency_key.clone());
        match inner.ledger.get(&key) {
            Some(existing) if existing.is_reclaimable(now) => {
                tracing::warn!(
                    tenant = %record.tenant_id,
                    status = ?existing.status,
                    "Reclaiming abandoned ledger record"
                );
                inner.ledger.insert(key, record);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl PaymentStore for MemoryStore {
    fn insert_with_links(&self, payment: &PaymentRecord, invoice_ids: &[String]) -> Result<()> {
        let mut inner = self.lock()?;
        let key = (payment.tenant_id.clone(), payment.idempotency_key.clone());

        if inner.payments.contains_key(&key) {
            return Err(PayError::StorageConflict {
                constraint: "uq_pay_tenant_ik".into(),
            });
        }
        if inner.by_id.contains_key(&payment.payment_id) {
            return Err(PayError::StorageConflict {
                constraint: "uq_pay_payment_id".into(),
            });
        }

        // Detect every colliding invoice before writing anything, so a
        // failure leaves no partial state and the error names the actual
        // offenders.
        let mut colliding: Vec<String> = invoice_ids
            .iter()
            .filter(|inv| {
                inner
                    .invoices
                    .contains_key(&(payment.tenant_id.clone(), (*inv).clone()))
            })
            .cloned()
            .collect();
        if !colliding.is_empty() {
            colliding.sort_unstable();
            colliding.dedup();
            return Err(PayError::DuplicateInvoice {
                invoice_ids: colliding,
            });
        }

        for inv in invoice_ids {
            inner.invoices.insert(
                (payment.tenant_id.clone(), inv.clone()),
                payment.payment_id.clone(),
            );
        }
        inner.by_id.insert(payment.payment_id.clone(), key.clone());
        inner.payments.insert(key, payment.clone());

        tracing::debug!(
            payment_id = %payment.payment_id,
            tenant = %payment.tenant_id,
            links = invoice_ids.len(),
            "Payment persisted with invoice links"
        );
        Ok(())
    }

    fn find_by_key(
        &self,
        tenant_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<PaymentRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .payments
            .get(&(tenant_id.to_string(), idempotency_key.to_string()))
            .cloned())
    }

    fn find_by_id(&self, payment_id: &PaymentId) -> Result<Option<PaymentRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .by_id
            .get(payment_id)
            .and_then(|key| inner.payments.get(key))
            .cloned())
    }

    fn invoice_link(&self, tenant_id: &str, invoice_id: &str) -> Result<Option<PaymentId>> {
        let inner = self.lock()?;
        Ok(inner
            .invoices
            .get(&(tenant_id.to_string(), invoice_id.to_string()))
            .cloned())
    }
}
