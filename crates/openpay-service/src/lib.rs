//! # openpay-service
//!
//! **Orchestration plane**: the exactly-once `create` operation and the
//! components it sequences.
//!
//! ## Architecture
//!
//! 1. **validate**: stateless business rules (Luhn, expiry, amount)
//! 2. **LocalGuard**: in-process insert-if-absent over `tenant:key` —
//!    sheds duplicate work during bursts, advisory only
//! 3. **DurableLedger**: conflict resolution over the [`openpay_store::LedgerStore`]
//!    uniqueness constraint — the actual exactly-once mechanism
//! 4. **PaymentService**: the orchestrator state machine
//!
//! ## Create flow
//!
//! ```text
//! create → LocalGuard fast paths → validate → DurableLedger.occupy()
//!        → PanCipher.encrypt() → PaymentStore.insert_with_links()
//!        → DurableLedger.complete() → LocalGuard completed/release
//! ```
//!
//! The local guard is released on **every** exit path after acquisition
//! (Drop-based); a completed marker is never un-set.

pub mod ledger;
pub mod local_guard;
pub mod service;
pub mod validate;

pub use ledger::{DurableLedger, Occupancy};
pub use local_guard::LocalGuard;
pub use service::PaymentService;
