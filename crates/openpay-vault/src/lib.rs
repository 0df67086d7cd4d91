//! # openpay-vault
//!
//! **PAN boundary**: everything that touches a plaintext card number lives
//! here, and nothing in this crate ever logs or persists one.
//!
//! - [`card`]: Luhn checksum, brand classification, masking
//! - [`cipher`]: AES-256-GCM envelope encryption with context-binding AAD
//!
//! ## Flow
//!
//! ```text
//! Orchestrator → card::luhn() → card::masked() / card::brand()
//!              → PanCipher::encrypt(pan, binding_aad(tenant, payment_id))
//!              → EncryptedPan { ciphertext, iv, tag, key_id }
//! ```
//!
//! Only the masked form and the [`openpay_types::EncryptedPan`] envelope
//! leave this crate.

pub mod card;
pub mod cipher;

pub use cipher::{binding_aad, PanCipher};
