//! AES-256-GCM envelope encryption for PANs.
//!
//! Every encryption uses a fresh random 96-bit IV and binds the ciphertext
//! to its owning context via AAD (`tenant_id|payment_id`), so a ciphertext
//! lifted from one row cannot be replayed against another tenant or
//! payment. The tag is stored separately from the ciphertext, which keeps
//! ciphertext length equal to plaintext length.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

use openpay_types::constants::{IV_LEN, TAG_LEN};
use openpay_types::{EncryptedPan, PayError, PaymentId, Result, VaultConfig};

/// Build the associated data that binds a ciphertext to its owning
/// `(tenant, payment)` context.
#[must_use]
pub fn binding_aad(tenant_id: &str, payment_id: &PaymentId) -> Vec<u8> {
    format!("{tenant_id}|{payment_id}").into_bytes()
}

/// Authenticated-encryption boundary for card numbers.
///
/// Holds one data-encryption key; the key id travels with every envelope
/// so future keys can coexist with rows encrypted under this one.
pub struct PanCipher {
    cipher: Aes256Gcm,
    key_id: String,
}

impl PanCipher {
    /// Initialize the cipher from key material.
    ///
    /// # Errors
    /// Returns [`PayError::Crypto`] if the key length is rejected by the
    /// underlying implementation.
    pub fn new(config: &VaultConfig) -> Result<Self> {
        let cipher = Aes256Gcm::new_from_slice(&config.key).map_err(|_| PayError::Crypto {
            reason: "AES-256-GCM key initialization failed".into(),
        })?;
        Ok(Self {
            cipher,
            key_id: config.key_id.clone(),
        })
    }

    /// Encrypt a plaintext PAN bound to `aad`.
    ///
    /// Generates a fresh random IV per call. The returned envelope carries
    /// ciphertext (same length as the plaintext), the IV, the 16-byte tag,
    /// and the key id.
    ///
    /// # Errors
    /// Returns [`PayError::Crypto`] if the AEAD operation fails. This is an
    /// internal error, never a validation outcome.
    pub fn encrypt(&self, pan: &str, aad: &[u8]) -> Result<EncryptedPan> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let sealed = self
            .cipher
            .encrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: pan.as_bytes(),
                    aad,
                },
            )
            .map_err(|_| PayError::Crypto {
                reason: "AES-GCM encrypt failed".into(),
            })?;

        // The AEAD output is ciphertext || tag; store them separately.
        if sealed.len() < TAG_LEN {
            return Err(PayError::Crypto {
                reason: "AES-GCM output shorter than tag".into(),
            });
        }
        let split = sealed.len() - TAG_LEN;
        let tag: [u8; TAG_LEN] = sealed[split..].try_into().map_err(|_| PayError::Crypto {
            reason: "AES-GCM tag extraction failed".into(),
        })?;

        Ok(EncryptedPan {
            ciphertext: sealed[..split].to_vec(),
            iv,
            tag,
            key_id: self.key_id.clone(),
        })
    }

    /// Decrypt an envelope back to the plaintext PAN.
    ///
    /// Operational/debug tooling only. The production creation path never
    /// calls this, and no request-handling code may reach it — card numbers
    /// leave the system encrypted or masked, nothing else.
    ///
    /// # Errors
    /// Returns [`PayError::Crypto`] if the tag does not verify (wrong key,
    /// wrong AAD, or tampered ciphertext) or the plaintext is not UTF-8.
    pub fn decrypt(&self, envelope: &EncryptedPan, aad: &[u8]) -> Result<String> {
        let mut combined = Vec::with_capacity(envelope.ciphertext.len() + TAG_LEN);
        combined.extend_from_slice(&envelope.ciphertext);
        combined.extend_from_slice(&envelope.tag);

        let plain = self
            .cipher
            .decrypt(
                Nonce::from_slice(&envelope.iv),
                Payload {
                    msg: &combined,
                    aad,
                },
            )
            .map_err(|_| PayError::Crypto {
                reason: "AES-GCM decrypt failed (tag mismatch)".into(),
            })?;

        String::from_utf8(plain).map_err(|_| PayError::Crypto {
            reason: "decrypted PAN is not valid UTF-8".into(),
        })
    }

    /// The key id stamped onto envelopes produced by this cipher.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}
