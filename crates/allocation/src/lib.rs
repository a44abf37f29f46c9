//! Inventory-to-order allocation.
//!
//! [`AllocationService`] owns the assignment matcher: when a unit becomes
//! uncommitted stock it is attached to the oldest open commitment it can be
//! finished into. The same service handles order intake (stock first, then a
//! commitment for the remainder) and answers production-planning queries.

pub mod assignment;
pub mod error;
pub mod events;
pub mod inventory;
pub mod locks;
pub mod planning;
pub mod service;

pub use assignment::{Assignment, AssignmentStore, AssignmentStoreError, InMemoryAssignmentStore};
pub use error::AllocationError;
pub use events::{AllocationEvent, CommitmentOpened, CommitmentResolved, InventoryAssigned};
pub use inventory::{
    AllocationStatus, InventoryStatusChanged, InventoryUnit, OrderPlaced, StockStatus,
};
pub use locks::GroupLocks;
pub use planning::ProductionDecision;
pub use service::{AllocationService, OrderPlacement};
