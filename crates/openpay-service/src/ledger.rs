//! Durable ledger conflict resolution.
//!
//! The [`openpay_store::LedgerStore`] uniqueness constraint turns
//! concurrent inserts for one `(tenant, key)` into a natural mutual
//! exclusion primitive; this module owns the branching that happens when an
//! insert loses that race.

use std::sync::Arc;

use chrono::Utc;
use openpay_store::{LedgerInsert, LedgerStore};
use openpay_types::{
    Fingerprint, IdempotencyRecord, IdempotencyStatus, LedgerConfig, PayError, Result,
};

/// Outcome of a successful occupy attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    /// The caller owns processing for this key and must see it through.
    Owned,
    /// A prior attempt completed; the caller should return the payment that
    /// already exists for this key.
    Replay,
}

/// Cross-instance source of truth for exactly-once creation.
pub struct DurableLedger {
    store: Arc<dyn LedgerStore>,
    config: LedgerConfig,
}

impl DurableLedger {
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Attempt to occupy `(tenant, key)` for processing.
    ///
    /// Inserts a `Pending` record carrying the request fingerprint. On a
    /// uniqueness conflict the existing record decides, in this order:
    ///
    /// 1. reclaimable (`Failed`, or `Pending` past its TTL) → reclaim,
    ///    caller owns — an abandoned attempt no longer pins its payload,
    ///    so this happens before the fingerprint comparison; a lost
    ///    reclaim race re-reads the record and falls through
    /// 2. fingerprint mismatch → [`PayError::IdempotencyConflict`]
    /// 3. `Completed` → [`Occupancy::Replay`]
    /// 4. `Pending` and live → [`PayError::Processing`]
    ///
    /// # Errors
    /// [`PayError::IdempotencyConflict`], [`PayError::Processing`], or a
    /// storage error.
    pub fn occupy(
        &self,
        tenant_id: &str,
        idempotency_key: &str,
        fingerprint: Fingerprint,
    ) -> Result<Occupancy> {
        let now = Utc::now();
        let record =
            IdempotencyRecord::pending(tenant_id, idempotency_key, fingerprint, now + self.config.ttl());

        let mut existing = match self.store.try_insert(record.clone())? {
            LedgerInsert::Inserted => return Ok(Occupancy::Owned),
            LedgerInsert::Conflict(existing) => existing,
        };

        if existing.is_reclaimable(now) {
            if self.store.reclaim(record, now)? {
                return Ok(Occupancy::Owned);
            }
            // Lost the reclaim race: someone replaced the record between
            // the snapshot and the swap. Branch on what is there now, not
            // on the stale snapshot.
            existing = self
                .store
                .find(tenant_id, idempotency_key)?
                .ok_or(PayError::Processing)?;
        }

        if existing.fingerprint != fingerprint {
            tracing::warn!(
                tenant = %tenant_id,
                existing_fp = %existing.fingerprint.short(),
                request_fp = %fingerprint.short(),
                "Idempotency key reused with a different request"
            );
            return Err(PayError::IdempotencyConflict);
        }

        match existing.status {
            IdempotencyStatus::Completed => Ok(Occupancy::Replay),
            // A lost reclaim race lands here too: someone else owns it now.
            IdempotencyStatus::Pending | IdempotencyStatus::Failed => Err(PayError::Processing),
        }
    }

    /// Transition the occupied record to `Completed` so later replays
    /// short-circuit to the stored payment.
    pub fn complete(&self, tenant_id: &str, idempotency_key: &str) -> Result<()> {
        self.store.mark_completed(tenant_id, idempotency_key)
    }

    /// Transition the occupied record to `Failed` after a terminal error
    /// between occupy and completion, freeing the key for the next attempt.
    pub fn fail(&self, tenant_id: &str, idempotency_key: &str) -> Result<()> {
        self.store.mark_failed(tenant_id, idempotency_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use openpay_store::MemoryStore;

    fn ledger_with_store() -> (DurableLedger, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let ledger = DurableLedger::new(store.clone(), LedgerConfig::default());
        (ledger, store)
    }

    fn fp(b: u8) -> Fingerprint {
        Fingerprint([b; 32])
    }

    #[test]
    fn first_occupy_owns() {
        let (ledger, store) = ledger_with_store();
        assert_eq!(ledger.occupy("t", "k", fp(1)).unwrap(), Occupancy::Owned);
        let rec = LedgerStore::find(store.as_ref(), "t", "k").unwrap().unwrap();
        assert_eq!(rec.status, IdempotencyStatus::Pending);
    }

    #[test]
    fn second_occupy_while_pending_is_processing() {
        let (ledger, _store) = ledger_with_store();
        ledger.occupy("t", "k", fp(1)).unwrap();
        let err = ledger.occupy("t", "k", fp(1)).unwrap_err();
        assert!(matches!(err, PayError::Processing));
    }

    #[test]
    fn fingerprint_mismatch_is_conflict_regardless_of_status() {
        let (ledger, _store) = ledger_with_store();
        ledger.occupy("t", "k", fp(1)).unwrap();

        let err = ledger.occupy("t", "k", fp(2)).unwrap_err();
        assert!(matches!(err, PayError::IdempotencyConflict));

        ledger.complete("t", "k").unwrap();
        let err = ledger.occupy("t", "k", fp(2)).unwrap_err();
        assert!(matches!(err, PayError::IdempotencyConflict));
    }

    #[test]
    fn completed_with_same_fingerprint_replays() {
        let (ledger, _store) = ledger_with_store();
        ledger.occupy("t", "k", fp(1)).unwrap();
        ledger.complete("t", "k").unwrap();
        assert_eq!(ledger.occupy("t", "k", fp(1)).unwrap(), Occupancy::Replay);
    }

    #[test]
    fn expired_pending_is_reclaimed() {
        let store = Arc::new(MemoryStore::new());
        // Zero TTL: the first occupant's record expires immediately.
        let ledger = DurableLedger::new(store.clone(), LedgerConfig { ttl_hours: 0 });
        ledger.occupy("t", "k", fp(1)).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(ledger.occupy("t", "k", fp(1)).unwrap(), Occupancy::Owned);
    }

    #[test]
    fn live_pending_is_not_reclaimed() {
        let (ledger, store) = ledger_with_store();
        ledger.occupy("t", "k", fp(1)).unwrap();
        let before = LedgerStore::find(store.as_ref(), "t", "k").unwrap().unwrap();

        assert!(matches!(
            ledger.occupy("t", "k", fp(1)).unwrap_err(),
            PayError::Processing
        ));
        let after = LedgerStore::find(store.as_ref(), "t", "k").unwrap().unwrap();
        assert_eq!(before.created_at, after.created_at, "record must be untouched");
    }

    #[test]
    fn failed_record_is_reoccupied() {
        let (ledger, _store) = ledger_with_store();
        ledger.occupy("t", "k", fp(1)).unwrap();
        ledger.fail("t", "k").unwrap();

        // Same payload reclaims.
        assert_eq!(ledger.occupy("t", "k", fp(1)).unwrap(), Occupancy::Owned);
        // A corrected payload reclaims too: a failed attempt no longer
        // pins its fingerprint.
        ledger.fail("t", "k").unwrap();
        assert_eq!(ledger.occupy("t", "k", fp(2)).unwrap(), Occupancy::Owned);
    }

    /// Wraps [`MemoryStore`] so that every reclaim attempt loses: a rival
    /// occupant swaps in its own live `Pending` record first.
    struct ContendedStore {
        inner: MemoryStore,
        rival_fingerprint: Fingerprint,
    }

    impl LedgerStore for ContendedStore {
        fn try_insert(&self, record: IdempotencyRecord) -> openpay_types::Result<LedgerInsert> {
            self.inner.try_insert(record)
        }

        fn find(
            &self,
            tenant_id: &str,
            idempotency_key: &str,
        ) -> openpay_types::Result<Option<IdempotencyRecord>> {
            self.inner.find(tenant_id, idempotency_key)
        }

        fn mark_completed(
            &self,
            tenant_id: &str,
            idempotency_key: &str,
        ) -> openpay_types::Result<()> {
            self.inner.mark_completed(tenant_id, idempotency_key)
        }

        fn mark_failed(
            &self,
            tenant_id: &str,
            idempotency_key: &str,
        ) -> openpay_types::Result<()> {
            self.inner.mark_failed(tenant_id, idempotency_key)
        }

        fn reclaim(
            &self,
            record: IdempotencyRecord,
            now: chrono::DateTime<Utc>,
        ) -> openpay_types::Result<bool> {
            let rival = IdempotencyRecord::pending(
                record.tenant_id.clone(),
                record.idempotency_key.clone(),
                self.rival_fingerprint,
                now + Duration::hours(24),
            );
            assert!(self.inner.reclaim(rival, now)?, "rival must win first");
            self.inner.reclaim(record, now)
        }
    }

    #[test]
    fn lost_reclaim_race_reports_processing_not_conflict() {
        let store = Arc::new(ContendedStore {
            inner: MemoryStore::new(),
            rival_fingerprint: fp(2),
        });
        let ledger = DurableLedger::new(store.clone(), LedgerConfig::default());

        // A Failed record with a different fingerprint sits on the key.
        ledger.occupy("t", "k", fp(1)).unwrap();
        ledger.fail("t", "k").unwrap();

        // Our reclaim loses to a rival carrying our payload. The stale
        // Failed snapshot must not turn this into a conflict.
        let err = ledger.occupy("t", "k", fp(2)).unwrap_err();
        assert!(matches!(err, PayError::Processing));

        let rec = store.find("t", "k").unwrap().unwrap();
        assert_eq!(rec.fingerprint, fp(2), "rival record must be in place");
    }

    #[test]
    fn complete_sets_status() {
        let (ledger, store) = ledger_with_store();
        ledger.occupy("t", "k", fp(1)).unwrap();
        ledger.complete("t", "k").unwrap();
        let rec = LedgerStore::find(store.as_ref(), "t", "k").unwrap().unwrap();
        assert_eq!(rec.status, IdempotencyStatus::Completed);
        assert!(rec.expires_at > Utc::now() - Duration::seconds(1));
    }
}
