//! Ledger operations over a [`CommitmentStore`].

use chrono::{DateTime, Utc};
use thiserror::Error;

use denim_core::{CommitmentId, DomainError, OrderId};
use denim_sku::{InvalidSkuError, parse_sku, universal_sku};

use crate::commitment::{Commitment, NewCommitment};
use crate::store::{CommitmentStore, Consumed, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    InvalidSku(#[from] InvalidSkuError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("commitment store: {0}")]
    Store(#[from] StoreError),
}

/// Open demand, queryable by order and by (exact or universal) SKU.
///
/// The store is injected so each application (or test) owns its own ledger.
#[derive(Debug)]
pub struct CommitmentLedger<S> {
    store: S,
}

impl<S> CommitmentLedger<S>
where
    S: CommitmentStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record demand for `quantity` units of `sku`.
    ///
    /// The universal SKU is computed once, here. Later changes to the wash
    /// grouping do not rewrite commitments that were already recorded.
    pub fn add_commitment(&self, new: NewCommitment) -> Result<Commitment, LedgerError> {
        let components = parse_sku(&new.sku).ok_or_else(|| InvalidSkuError::new(&new.sku))?;

        if new.quantity == 0 {
            return Err(DomainError::validation("commitment quantity must be at least 1").into());
        }

        let commitment = Commitment {
            id: CommitmentId::new(),
            sku: components.to_string(),
            universal_sku: universal_sku(&components).to_string(),
            order_id: new.order_id,
            order_number: new.order_number,
            quantity: new.quantity,
            created_at: new.occurred_at,
            updated_at: new.occurred_at,
            sequence: 0,
        };

        let stored = self.store.insert(commitment)?;
        tracing::info!(
            commitment_id = %stored.id,
            order_number = stored.order_number,
            sku = %stored.sku,
            universal_sku = %stored.universal_sku,
            quantity = stored.quantity,
            "commitment recorded"
        );
        Ok(stored)
    }

    /// Delete a commitment outright. Removing an unknown id is a no-op.
    pub fn remove_commitment(&self, id: CommitmentId) -> Result<(), LedgerError> {
        if self.store.remove(id)?.is_some() {
            tracing::debug!(commitment_id = %id, "commitment removed");
        }
        Ok(())
    }

    pub fn get(&self, id: CommitmentId) -> Result<Option<Commitment>, LedgerError> {
        Ok(self.store.get(id)?)
    }

    /// Every open commitment, oldest first.
    pub fn open_commitments(&self) -> Result<Vec<Commitment>, LedgerError> {
        self.chronological(|_| true)
    }

    /// Commitments of one order, oldest first.
    pub fn commitments_by_order(&self, order_id: OrderId) -> Result<Vec<Commitment>, LedgerError> {
        self.chronological(|c| c.order_id == order_id)
    }

    /// Commitments whose ordered SKU or universal SKU equals `sku`, oldest first.
    pub fn commitments_by_sku(&self, sku: &str) -> Result<Vec<Commitment>, LedgerError> {
        self.chronological(|c| c.matches_sku(sku))
    }

    /// Units still owed under the same matching rule as [`Self::commitments_by_sku`].
    pub fn total_commitments(&self, sku: &str) -> Result<u64, LedgerError> {
        Ok(self
            .store
            .list()?
            .iter()
            .filter(|c| c.matches_sku(sku))
            .map(|c| u64::from(c.quantity))
            .sum())
    }

    /// Take one unit off a commitment (remove at 1, decrement above 1).
    pub fn consume_one(
        &self,
        id: CommitmentId,
        at: DateTime<Utc>,
    ) -> Result<Consumed, LedgerError> {
        Ok(self.store.consume_one(id, at)?)
    }

    /// Undo a [`Self::consume_one`] whose surrounding unit of work failed.
    pub fn restore(&self, previous: Commitment) -> Result<(), LedgerError> {
        let id = previous.id;
        if self.store.restore(previous)? {
            tracing::warn!(commitment_id = %id, "restored commitment after failed allocation");
        } else {
            tracing::warn!(
                commitment_id = %id,
                "commitment removed during failed allocation; not restored"
            );
        }
        Ok(())
    }

    fn chronological(
        &self,
        keep: impl Fn(&Commitment) -> bool,
    ) -> Result<Vec<Commitment>, LedgerError> {
        let mut found: Vec<Commitment> =
            self.store.list()?.into_iter().filter(|c| keep(c)).collect();
        found.sort_by_key(Commitment::chronological_key);
        Ok(found)
    }
}
