use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use denim_core::{CommitmentId, Entity};

use crate::commitment::Commitment;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,

    #[error("commitment {0} not found")]
    NotFound(CommitmentId),

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Outcome of taking one unit off a commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consumed {
    /// Quantity was 1; the commitment (as it was) is gone.
    Removed(Commitment),
    /// Quantity was > 1; the commitment after decrementing.
    Decremented(Commitment),
}

impl Consumed {
    pub fn commitment(&self) -> &Commitment {
        match self {
            Consumed::Removed(c) | Consumed::Decremented(c) => c,
        }
    }

    pub fn remaining(&self) -> u32 {
        match self {
            Consumed::Removed(_) => 0,
            Consumed::Decremented(c) => c.quantity,
        }
    }
}

/// Storage for open commitments.
///
/// Implementations must make `consume_one` atomic: a concurrent reader sees the
/// commitment either before or after the decrement, never in between.
pub trait CommitmentStore: Send + Sync {
    /// Insert a new commitment, assigning its insertion `sequence`.
    fn insert(&self, commitment: Commitment) -> Result<Commitment, StoreError>;

    fn get(&self, id: CommitmentId) -> Result<Option<Commitment>, StoreError>;

    /// Delete a commitment. `Ok(None)` if it did not exist.
    fn remove(&self, id: CommitmentId) -> Result<Option<Commitment>, StoreError>;

    /// All open commitments, in no particular order.
    fn list(&self) -> Result<Vec<Commitment>, StoreError>;

    /// Remove the commitment if its quantity is 1, otherwise decrement it and
    /// stamp `updated_at`.
    fn consume_one(&self, id: CommitmentId, at: DateTime<Utc>) -> Result<Consumed, StoreError>;

    /// Undo one `consume_one`, given the snapshot taken before it.
    ///
    /// A commitment that is still open gets its unit back. One that is gone is
    /// re-inserted only if that consume was what removed it (`previous.quantity
    /// == 1`); otherwise it was cancelled in the meantime and stays gone.
    /// Returns whether anything was put back.
    fn restore(&self, previous: Commitment) -> Result<bool, StoreError>;
}

impl<S> CommitmentStore for Arc<S>
where
    S: CommitmentStore + ?Sized,
{
    fn insert(&self, commitment: Commitment) -> Result<Commitment, StoreError> {
        (**self).insert(commitment)
    }

    fn get(&self, id: CommitmentId) -> Result<Option<Commitment>, StoreError> {
        (**self).get(id)
    }

    fn remove(&self, id: CommitmentId) -> Result<Option<Commitment>, StoreError> {
        (**self).remove(id)
    }

    fn list(&self) -> Result<Vec<Commitment>, StoreError> {
        (**self).list()
    }

    fn consume_one(&self, id: CommitmentId, at: DateTime<Utc>) -> Result<Consumed, StoreError> {
        (**self).consume_one(id, at)
    }

    fn restore(&self, previous: Commitment) -> Result<bool, StoreError> {
        (**self).restore(previous)
    }
}

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<CommitmentId, Commitment>,
    next_sequence: u64,
}

/// In-memory commitment store for tests/dev and the single-process binary.
#[derive(Debug, Default)]
pub struct InMemoryCommitmentStore {
    inner: RwLock<Records>,
}

impl InMemoryCommitmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommitmentStore for InMemoryCommitmentStore {
    fn insert(&self, mut commitment: Commitment) -> Result<Commitment, StoreError> {
        let mut records = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        if records.by_id.contains_key(commitment.id()) {
            return Err(StoreError::Conflict(format!(
                "commitment {} already exists",
                commitment.id
            )));
        }

        records.next_sequence += 1;
        commitment.sequence = records.next_sequence;
        records.by_id.insert(commitment.id, commitment.clone());
        Ok(commitment)
    }

    fn get(&self, id: CommitmentId) -> Result<Option<Commitment>, StoreError> {
        let records = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.by_id.get(&id).cloned())
    }

    fn remove(&self, id: CommitmentId) -> Result<Option<Commitment>, StoreError> {
        let mut records = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(records.by_id.remove(&id))
    }

    fn list(&self) -> Result<Vec<Commitment>, StoreError> {
        let records = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.by_id.values().cloned().collect())
    }

    fn consume_one(&self, id: CommitmentId, at: DateTime<Utc>) -> Result<Consumed, StoreError> {
        let mut records = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        let current = records.by_id.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if current.quantity > 1 {
            current.quantity -= 1;
            current.updated_at = at;
            return Ok(Consumed::Decremented(current.clone()));
        }

        let removed = records.by_id.remove(&id).ok_or(StoreError::NotFound(id))?;
        Ok(Consumed::Removed(removed))
    }

    fn restore(&self, previous: Commitment) -> Result<bool, StoreError> {
        let mut records = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        if let Some(current) = records.by_id.get_mut(&previous.id) {
            current.quantity += 1;
            current.updated_at = previous.updated_at;
            return Ok(true);
        }
        if previous.quantity == 1 {
            records.by_id.insert(previous.id, previous);
            return Ok(true);
        }
        Ok(false)
    }
}
