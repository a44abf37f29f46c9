use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use denim_core::{AssignmentId, CommitmentId, InventoryItemId, OrderId};
use denim_events::Event;

/// Event: demand was recorded because stock could not cover it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentOpened {
    pub commitment_id: CommitmentId,
    pub order_id: OrderId,
    pub order_number: u64,
    pub sku: String,
    pub universal_sku: String,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: an inventory unit was assigned to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryAssigned {
    pub assignment_id: AssignmentId,
    pub inventory_item_id: InventoryItemId,
    pub order_id: OrderId,
    pub order_number: u64,
    pub sku: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a commitment lost one unit of demand to an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentResolved {
    pub commitment_id: CommitmentId,
    pub order_id: OrderId,
    /// Units still owed; 0 means the commitment was removed.
    pub remaining: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocationEvent {
    CommitmentOpened(CommitmentOpened),
    InventoryAssigned(InventoryAssigned),
    CommitmentResolved(CommitmentResolved),
}

impl Event for AllocationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AllocationEvent::CommitmentOpened(_) => "allocation.commitment.opened",
            AllocationEvent::InventoryAssigned(_) => "allocation.inventory.assigned",
            AllocationEvent::CommitmentResolved(_) => "allocation.commitment.resolved",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AllocationEvent::CommitmentOpened(e) => e.occurred_at,
            AllocationEvent::InventoryAssigned(e) => e.occurred_at,
            AllocationEvent::CommitmentResolved(e) => e.occurred_at,
        }
    }
}
