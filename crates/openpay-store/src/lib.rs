//! # openpay-store
//!
//! Storage collaborator traits for the payment core, plus an in-memory
//! reference backend.
//!
//! The core never sees an engine; it sees two capabilities:
//!
//! - [`LedgerStore`]: keyed lookup and **insert-with-uniqueness-detection**
//!   for idempotency records. The uniqueness constraint on
//!   `(tenant_id, idempotency_key)` is the system's real mutual-exclusion
//!   primitive — concurrent inserts resolve into exactly one
//!   [`LedgerInsert::Inserted`] and the rest observe
//!   [`LedgerInsert::Conflict`] with the existing record.
//! - [`PaymentStore`]: atomic payment + invoice-link persistence under the
//!   `(tenant_id, invoice_id)` uniqueness constraint, plus keyed lookups.
//!
//! Any engine with atomic "insert, detect conflict" semantics can implement
//! these. An application-level lock is **not** an acceptable substitute for
//! the ledger constraint in a multi-process deployment.

pub mod memory;

use openpay_types::{IdempotencyRecord, PaymentId, PaymentRecord, Result};

pub use memory::MemoryStore;

/// Outcome of a conditional ledger insert.
#[derive(Debug)]
pub enum LedgerInsert {
    /// The caller now owns processing for this key.
    Inserted,
    /// A record already existed; here it is, unmodified.
    Conflict(IdempotencyRecord),
}

/// Durable idempotency ledger: one record per `(tenant, key)`, ever.
pub trait LedgerStore: Send + Sync {
    /// Insert `record` iff no record exists for its `(tenant, key)`.
    /// Must be atomic: exactly one concurrent caller wins a fresh key.
    fn try_insert(&self, record: IdempotencyRecord) -> Result<LedgerInsert>;

    /// Look up the record for `(tenant, key)`.
    fn find(&self, tenant_id: &str, idempotency_key: &str) -> Result<Option<IdempotencyRecord>>;

    /// Transition the record for `(tenant, key)` to `Completed`.
    ///
    /// A missing record is a storage error: completion is only ever called
    /// by the occupant that inserted it.
    fn mark_completed(&self, tenant_id: &str, idempotency_key: &str) -> Result<()>;

    /// Transition the record for `(tenant, key)` to `Failed`, making the
    /// key immediately reclaimable. Called by the occupant when the work
    /// between occupy and completion fails terminally.
    fn mark_failed(&self, tenant_id: &str, idempotency_key: &str) -> Result<()>;

    /// Atomically replace a reclaimable record (expired `Pending` at
    /// `record.created_at`, or `Failed`) with the fresh `record`.
    ///
    /// Returns `true` if the swap happened and the caller now owns the key;
    /// `false` if the existing record was not reclaimable (or vanished).
    fn reclaim(
        &self,
        record: IdempotencyRecord,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool>;
}

/// Payment persistence with invoice linking in one logical transaction.
pub trait PaymentStore: Send + Sync {
    /// Persist `payment` and one invoice link per id, atomically.
    ///
    /// If any `(tenant, invoice)` link already exists, nothing is written
    /// and the error carries the colliding subset of `invoice_ids`. A
    /// successful return guarantees every requested invoice is now
    /// exclusively associated with this payment.
    ///
    /// # Errors
    /// - [`openpay_types::PayError::DuplicateInvoice`] on link collision
    /// - [`openpay_types::PayError::StorageConflict`] if the payment row
    ///   itself violates `(tenant, idempotency_key)` or payment-id
    ///   uniqueness (the ledger should have made this impossible)
    fn insert_with_links(&self, payment: &PaymentRecord, invoice_ids: &[String]) -> Result<()>;

    /// Look up a payment by its `(tenant, idempotency_key)` identity.
    fn find_by_key(&self, tenant_id: &str, idempotency_key: &str)
        -> Result<Option<PaymentRecord>>;

    /// Look up a payment by its public id.
    fn find_by_id(&self, payment_id: &PaymentId) -> Result<Option<PaymentRecord>>;

    /// Which payment, if any, an invoice is linked to for this tenant.
    fn invoice_link(&self, tenant_id: &str, invoice_id: &str) -> Result<Option<PaymentId>>;
}
