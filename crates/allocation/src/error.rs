use thiserror::Error;

use denim_commitments::LedgerError;
use denim_core::DomainError;
use denim_sku::InvalidSkuError;

use crate::assignment::AssignmentStoreError;

#[derive(Debug, Error)]
pub enum AllocationError {
    /// An order line named a SKU that does not parse.
    #[error(transparent)]
    InvalidSku(#[from] InvalidSkuError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("assignment store: {0}")]
    Store(#[from] AssignmentStoreError),

    /// A previous allocation panicked while holding a group lock.
    #[error("allocation lock poisoned")]
    LockPoisoned,
}
