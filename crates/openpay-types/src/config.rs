//! Configuration for the vault and the durable ledger.

use std::fmt;

use chrono::Duration;

use crate::constants::{DEFAULT_LEDGER_TTL_HOURS, KEY_LEN};

/// Data-encryption key material and its identifier.
///
/// The key id is stored alongside every ciphertext so that keys can rotate
/// without re-encrypting existing rows; rotation itself is out of scope.
#[derive(Clone)]
pub struct VaultConfig {
    /// Identifier persisted next to each ciphertext.
    pub key_id: String,
    /// Raw AES-256 key.
    pub key: [u8; KEY_LEN],
}

impl VaultConfig {
    #[must_use]
    pub fn new(key_id: impl Into<String>, key: [u8; KEY_LEN]) -> Self {
        Self {
            key_id: key_id.into(),
            key,
        }
    }

    /// Hardcoded demo key for local development and tests.
    ///
    /// Never deploy this key: any reader of the source can decrypt.
    #[must_use]
    pub fn demo() -> Self {
        let mut key = [0u8; KEY_LEN];
        for (i, b) in key.iter_mut().enumerate() {
            *b = u8::try_from(i + 1).unwrap_or(0);
        }
        Self::new("demo-v1", key)
    }
}

// Manual Debug: key material must never reach logs.
impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("key_id", &self.key_id)
            .field("key", &"[redacted]")
            .finish()
    }
}

/// Durable ledger tuning.
#[derive(Debug, Clone, Copy)]
pub struct LedgerConfig {
    /// Advisory TTL for ledger records, in hours. A `Pending` record past
    /// this age is treated as abandoned and may be reclaimed.
    pub ttl_hours: i64,
}

impl LedgerConfig {
    /// TTL as a [`chrono::Duration`].
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::hours(self.ttl_hours)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            ttl_hours: DEFAULT_LEDGER_TTL_HOURS,
        }
    }
}
