//! Commitment ledger: open order demand waiting for stock.
//!
//! Each commitment records the SKU as ordered plus its universal SKU, frozen
//! at creation time. The ledger is pure bookkeeping; matching stock against
//! it lives in `denim-allocation`.

pub mod commitment;
pub mod ledger;
pub mod store;

pub use commitment::{Commitment, NewCommitment};
pub use ledger::{CommitmentLedger, LedgerError};
pub use store::{CommitmentStore, Consumed, InMemoryCommitmentStore, StoreError};
