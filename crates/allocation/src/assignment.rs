use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use denim_core::{AssignmentId, Entity, InventoryItemId, OrderId};

/// A physical unit matched to an order's demand. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub inventory_item_id: InventoryItemId,
    pub order_id: OrderId,
    pub order_number: u64,
    /// The unit's own SKU, not the SKU that was ordered.
    pub sku: String,
    pub assigned_at: DateTime<Utc>,
}

impl Entity for Assignment {
    type Id = AssignmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssignmentStoreError {
    #[error("assignment store lock poisoned")]
    Poisoned,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Storage for assignments. At most one assignment per inventory unit.
pub trait AssignmentStore: Send + Sync {
    /// Insert, rejecting a second assignment for the same unit.
    fn insert(&self, assignment: Assignment) -> Result<(), AssignmentStoreError>;

    fn remove(&self, id: AssignmentId) -> Result<Option<Assignment>, AssignmentStoreError>;

    fn by_item(&self, item_id: InventoryItemId) -> Result<Option<Assignment>, AssignmentStoreError>;

    /// Assignments of one order, in assignment order.
    fn by_order(&self, order_id: OrderId) -> Result<Vec<Assignment>, AssignmentStoreError>;

    fn list(&self) -> Result<Vec<Assignment>, AssignmentStoreError>;
}

impl<S> AssignmentStore for Arc<S>
where
    S: AssignmentStore + ?Sized,
{
    fn insert(&self, assignment: Assignment) -> Result<(), AssignmentStoreError> {
        (**self).insert(assignment)
    }

    fn remove(&self, id: AssignmentId) -> Result<Option<Assignment>, AssignmentStoreError> {
        (**self).remove(id)
    }

    fn by_item(
        &self,
        item_id: InventoryItemId,
    ) -> Result<Option<Assignment>, AssignmentStoreError> {
        (**self).by_item(item_id)
    }

    fn by_order(&self, order_id: OrderId) -> Result<Vec<Assignment>, AssignmentStoreError> {
        (**self).by_order(order_id)
    }

    fn list(&self) -> Result<Vec<Assignment>, AssignmentStoreError> {
        (**self).list()
    }
}

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<AssignmentId, (u64, Assignment)>,
    by_item: HashMap<InventoryItemId, AssignmentId>,
    next_sequence: u64,
}

/// In-memory assignment store, indexed by id and by inventory unit.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentStore {
    inner: RwLock<Records>,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssignmentStore for InMemoryAssignmentStore {
    fn insert(&self, assignment: Assignment) -> Result<(), AssignmentStoreError> {
        let mut records = self.inner.write().map_err(|_| AssignmentStoreError::Poisoned)?;

        if let Some(existing) = records.by_item.get(&assignment.inventory_item_id) {
            return Err(AssignmentStoreError::Conflict(format!(
                "inventory item {} already has assignment {existing}",
                assignment.inventory_item_id
            )));
        }
        if records.by_id.contains_key(assignment.id()) {
            return Err(AssignmentStoreError::Conflict(format!(
                "assignment {} already exists",
                assignment.id
            )));
        }

        records.next_sequence += 1;
        let sequence = records.next_sequence;
        records.by_item.insert(assignment.inventory_item_id, assignment.id);
        records.by_id.insert(assignment.id, (sequence, assignment));
        Ok(())
    }

    fn remove(&self, id: AssignmentId) -> Result<Option<Assignment>, AssignmentStoreError> {
        let mut records = self.inner.write().map_err(|_| AssignmentStoreError::Poisoned)?;

        let removed = records.by_id.remove(&id).map(|(_, a)| a);
        if let Some(assignment) = &removed {
            records.by_item.remove(&assignment.inventory_item_id);
        }
        Ok(removed)
    }

    fn by_item(
        &self,
        item_id: InventoryItemId,
    ) -> Result<Option<Assignment>, AssignmentStoreError> {
        let records = self.inner.read().map_err(|_| AssignmentStoreError::Poisoned)?;

        Ok(records
            .by_item
            .get(&item_id)
            .and_then(|id| records.by_id.get(id))
            .map(|(_, a)| a.clone()))
    }

    fn by_order(&self, order_id: OrderId) -> Result<Vec<Assignment>, AssignmentStoreError> {
        let records = self.inner.read().map_err(|_| AssignmentStoreError::Poisoned)?;

        let mut found: Vec<&(u64, Assignment)> = records
            .by_id
            .values()
            .filter(|(_, a)| a.order_id == order_id)
            .collect();
        found.sort_by_key(|(sequence, _)| *sequence);
        Ok(found.into_iter().map(|(_, a)| a.clone()).collect())
    }

    fn list(&self) -> Result<Vec<Assignment>, AssignmentStoreError> {
        let records = self.inner.read().map_err(|_| AssignmentStoreError::Poisoned)?;

        let mut all: Vec<&(u64, Assignment)> = records.by_id.values().collect();
        all.sort_by_key(|(sequence, _)| *sequence);
        Ok(all.into_iter().map(|(_, a)| a.clone()).collect())
    }
}
