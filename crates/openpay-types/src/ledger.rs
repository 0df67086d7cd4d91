//! Durable ledger model: the cross-instance idempotency record.
//!
//! One record per `(tenant_id, idempotency_key)`, ever. The uniqueness
//! constraint on that pair is the true concurrency primitive: concurrent
//! inserts resolve into exactly one owner, and everyone else reads the
//! existing record back and branches on its status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::Fingerprint;

/// Processing status of an idempotency record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdempotencyStatus {
    /// A caller is (or was, before crashing) working on this key.
    Pending,
    /// The payment exists; replays short-circuit to it.
    Completed,
    /// A prior attempt ended in terminal failure; the key is reclaimable.
    Failed,
}

/// Durable record of one idempotency key's lifecycle.
///
/// Once `Completed`, the fingerprint never changes. `expires_at` is
/// advisory: no sweeper runs in this core, but an expired `Pending` record
/// may be reclaimed by the next occupy attempt (crash recovery).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub tenant_id: String,
    pub idempotency_key: String,
    pub fingerprint: Fingerprint,
    pub status: IdempotencyStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    /// Build a fresh `Pending` record for an occupy attempt.
    #[must_use]
    pub fn pending(
        tenant_id: impl Into<String>,
        idempotency_key: impl Into<String>,
        fingerprint: Fingerprint,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            idempotency_key: idempotency_key.into(),
            fingerprint,
            status: IdempotencyStatus::Pending,
            expires_at,
            created_at: Utc::now(),
        }
    }

    /// Whether the advisory TTL has elapsed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether a new occupy attempt may take this record over: either the
    /// prior attempt failed terminally, or it is `Pending` past its TTL
    /// (crashed mid-flight and never completed).
    #[must_use]
    pub fn is_reclaimable(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            IdempotencyStatus::Failed => true,
            IdempotencyStatus::Pending => self.is_expired(now),
            IdempotencyStatus::Completed => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(status: IdempotencyStatus, expires_at: DateTime<Utc>) -> IdempotencyRecord {
        IdempotencyRecord {
            tenant_id: "tenantA".into(),
            idempotency_key: "idem-1".into(),
            fingerprint: Fingerprint([3u8; 32]),
            status,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn pending_constructor_sets_status() {
        let exp = Utc::now() + Duration::hours(24);
        let rec = IdempotencyRecord::pending("t", "k", Fingerprint([0u8; 32]), exp);
        assert_eq!(rec.status, IdempotencyStatus::Pending);
        assert_eq!(rec.expires_at, exp);
    }

    #[test]
    fn fresh_pending_is_not_reclaimable() {
        let now = Utc::now();
        let rec = record(IdempotencyStatus::Pending, now + Duration::hours(1));
        assert!(!rec.is_reclaimable(now));
    }

    #[test]
    fn expired_pending_is_reclaimable() {
        let now = Utc::now();
        let rec = record(IdempotencyStatus::Pending, now - Duration::seconds(1));
        assert!(rec.is_expired(now));
        assert!(rec.is_reclaimable(now));
    }

    #[test]
    fn failed_is_always_reclaimable() {
        let now = Utc::now();
        let rec = record(IdempotencyStatus::Failed, now + Duration::hours(24));
        assert!(rec.is_reclaimable(now));
    }

    #[test]
    fn completed_is_never_reclaimable() {
        let now = Utc::now();
        let rec = record(IdempotencyStatus::Completed, now - Duration::hours(1));
        assert!(!rec.is_reclaimable(now));
    }

    #[test]
    fn status_serde_uppercase() {
        let json = serde_json::to_string(&IdempotencyStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
    }
}
