//! # openpay-types
//!
//! Shared types, errors, and configuration for the **OpenPay** payment core.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`PaymentId`]
//! - **Payment model**: [`PaymentRecord`], [`PaymentStatus`], [`CardBrand`], [`EncryptedPan`], [`PaymentView`]
//! - **Ledger model**: [`IdempotencyRecord`], [`IdempotencyStatus`]
//! - **Request model**: [`PaymentRequest`] with its canonical [`Fingerprint`]
//! - **Configuration**: [`VaultConfig`], [`LedgerConfig`]
//! - **Errors**: [`PayError`] with `OP_ERR_` prefix codes and [`ErrorKind`] classification
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod payment;
pub mod request;

// Re-export all primary types at crate root for ergonomic imports:
//   use openpay_types::{PaymentRecord, PayError, PaymentRequest, ...};

pub use config::*;
pub use error::*;
pub use ids::*;
pub use ledger::*;
pub use payment::*;
pub use request::*;

// Constants are accessed via `openpay_types::constants::FOO`
// (not re-exported to avoid name collisions).
