//! Inputs consumed from the inventory and order pipelines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use denim_core::{InventoryItemId, OrderId};

/// Where a unit is in production (`status1`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Production,
    Stock,
    Shipped,
    #[serde(other)]
    Other,
}

/// Whether a unit is spoken for (`status2`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    Uncommitted,
    Committed,
    Assigned,
    #[serde(other)]
    Other,
}

/// Only finished, unclaimed stock can be allocated.
pub fn is_allocatable(status1: StockStatus, status2: AllocationStatus) -> bool {
    status1 == StockStatus::Stock && status2 == AllocationStatus::Uncommitted
}

/// "Inventory status changed" event from the inventory pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStatusChanged {
    pub inventory_item_id: InventoryItemId,
    pub sku: String,
    pub status1: StockStatus,
    pub status2: AllocationStatus,
    pub occurred_at: DateTime<Utc>,
}

impl InventoryStatusChanged {
    pub fn is_allocation_trigger(&self) -> bool {
        is_allocatable(self.status1, self.status2)
    }
}

/// A unit in the inventory catalog, as seen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryUnit {
    pub inventory_item_id: InventoryItemId,
    pub sku: String,
    pub status1: StockStatus,
    pub status2: AllocationStatus,
}

impl InventoryUnit {
    pub fn is_allocatable(&self) -> bool {
        is_allocatable(self.status1, self.status2)
    }
}

/// "Order created" event: one line of demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub order_number: u64,
    pub sku: String,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}
