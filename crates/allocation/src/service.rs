//! Assignment matcher and order intake.
//!
//! ## Allocation unit of work
//!
//! ```text
//! status change (STOCK / UNCOMMITTED)
//!   ↓
//! 1. parse unit SKU, derive its universal SKU group
//!   ↓  ── group lock held from here ──
//! 2. read open commitments, oldest first
//!   ↓
//! 3. first commitment the unit can be finished into
//!   ↓
//! 4. consume one unit of that commitment, write the assignment
//!   ↓
//! 5. publish events
//!      ── group lock released ──
//! ```
//!
//! If the assignment write fails after the commitment was consumed, the
//! commitment is restored before the error is returned. Cancellations go
//! through [`AllocationService::remove_commitment`], which takes the same lock,
//! so a restore never races a removal. Events of one group reach subscribers
//! in the order the work happened.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use denim_commitments::{
    Commitment, CommitmentLedger, CommitmentStore, Consumed, LedgerError, NewCommitment, StoreError,
};
use denim_core::{AssignmentId, CommitmentId, DomainError, InventoryItemId, OrderId};
use denim_events::{Event, EventBus};
use denim_sku::{InvalidSkuError, SkuComponents, can_convert_to_sku, parse_sku, universal_sku};

use crate::assignment::{Assignment, AssignmentStore};
use crate::error::AllocationError;
use crate::events::{AllocationEvent, CommitmentOpened, CommitmentResolved, InventoryAssigned};
use crate::inventory::{InventoryStatusChanged, InventoryUnit, OrderPlaced};
use crate::locks::GroupLocks;

/// Result of taking an order line in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlacement {
    /// Units taken straight from stock.
    pub assignments: Vec<Assignment>,
    /// Demand recorded for whatever stock could not cover.
    pub commitment: Option<Commitment>,
}

/// Matches inventory units to open demand.
///
/// Stores and bus are injected; the application entry point owns one service
/// for the life of the process.
#[derive(Debug)]
pub struct AllocationService<C, A, B> {
    ledger: CommitmentLedger<C>,
    assignments: A,
    bus: B,
    locks: GroupLocks,
}

impl<C, A, B> AllocationService<C, A, B>
where
    C: CommitmentStore,
    A: AssignmentStore,
    B: EventBus<AllocationEvent>,
{
    pub fn new(ledger: CommitmentLedger<C>, assignments: A, bus: B) -> Self {
        Self {
            ledger,
            assignments,
            bus,
            locks: GroupLocks::new(),
        }
    }

    pub fn ledger(&self) -> &CommitmentLedger<C> {
        &self.ledger
    }

    pub fn assignments(&self) -> &A {
        &self.assignments
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Try to allocate a unit whose status just changed.
    ///
    /// `Ok(None)` covers every "nothing to do" outcome: the change is not
    /// STOCK/UNCOMMITTED, the unit SKU is malformed, the unit is already
    /// assigned, or no open commitment is compatible. None of these has side
    /// effects.
    pub fn assign_inventory_item(
        &self,
        change: &InventoryStatusChanged,
    ) -> Result<Option<Assignment>, AllocationError> {
        if !change.is_allocation_trigger() {
            tracing::debug!(
                inventory_item_id = %change.inventory_item_id,
                status1 = ?change.status1,
                status2 = ?change.status2,
                "status change is not an allocation trigger"
            );
            return Ok(None);
        }

        let Some(item) = parse_sku(&change.sku) else {
            tracing::warn!(
                inventory_item_id = %change.inventory_item_id,
                sku = %change.sku,
                "ignoring inventory unit with malformed SKU"
            );
            return Ok(None);
        };
        let group = universal_sku(&item).to_string();

        self.locks.with_group(&group, || {
            if let Some(existing) = self.assignments.by_item(change.inventory_item_id)? {
                tracing::debug!(
                    inventory_item_id = %change.inventory_item_id,
                    assignment_id = %existing.id,
                    "unit already assigned"
                );
                return Ok(None);
            }

            let outcome =
                self.match_oldest(change.inventory_item_id, &item, change.occurred_at)?;
            let Some((assignment, consumed)) = outcome else {
                tracing::debug!(
                    inventory_item_id = %change.inventory_item_id,
                    universal_sku = %group,
                    "no compatible commitment; unit stays uncommitted"
                );
                return Ok(None);
            };

            self.publish_assignment(&assignment);
            self.publish(AllocationEvent::CommitmentResolved(CommitmentResolved {
                commitment_id: consumed.commitment().id,
                order_id: consumed.commitment().order_id,
                remaining: consumed.remaining(),
                occurred_at: assignment.assigned_at,
            }));
            Ok(Some(assignment))
        })
    }

    pub fn assignments_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<Assignment>, AllocationError> {
        Ok(self.assignments.by_order(order_id)?)
    }

    pub fn assignment_by_item(
        &self,
        item_id: InventoryItemId,
    ) -> Result<Option<Assignment>, AllocationError> {
        Ok(self.assignments.by_item(item_id)?)
    }

    /// Record demand directly, serialized with allocation in the same group.
    pub fn record_commitment(&self, new: NewCommitment) -> Result<Commitment, AllocationError> {
        let components = parse_sku(&new.sku).ok_or_else(|| InvalidSkuError::new(&new.sku))?;
        let group = universal_sku(&components).to_string();

        self.locks.with_group(&group, || {
            let commitment = self.ledger.add_commitment(new)?;
            self.publish_commitment(&commitment);
            Ok(commitment)
        })
    }

    /// Cancel demand. Unknown ids are a no-op.
    ///
    /// Runs under the commitment's group lock so it cannot interleave with an
    /// allocation that is consuming or restoring the same commitment.
    pub fn remove_commitment(&self, id: CommitmentId) -> Result<(), AllocationError> {
        let Some(commitment) = self.ledger.get(id)? else {
            return Ok(());
        };
        // Allocation locks by the current classification, not the frozen one.
        let group = parse_sku(&commitment.sku)
            .map(|c| universal_sku(&c).to_string())
            .unwrap_or(commitment.universal_sku);

        self.locks
            .with_group(&group, || Ok(self.ledger.remove_commitment(id)?))
    }

    /// Take an order line in: stock first, a commitment for the rest.
    ///
    /// For each requested unit, an allocatable catalog unit with the exact SKU
    /// is preferred, then the first convertible one in catalog order. Units
    /// that already carry an assignment are skipped.
    pub fn place_order(
        &self,
        order: &OrderPlaced,
        catalog: &[InventoryUnit],
    ) -> Result<OrderPlacement, AllocationError> {
        let wanted = parse_sku(&order.sku).ok_or_else(|| InvalidSkuError::new(&order.sku))?;
        if order.quantity == 0 {
            return Err(DomainError::validation("order quantity must be at least 1").into());
        }
        let group = universal_sku(&wanted).to_string();

        self.locks.with_group(&group, || {
            let mut assignments: Vec<Assignment> = Vec::new();
            let mut taken: HashSet<InventoryItemId> = HashSet::new();

            while assignments.len() < order.quantity as usize {
                let Some((unit, components)) = self.pick_unit(&wanted, catalog, &taken)? else {
                    break;
                };
                taken.insert(unit.inventory_item_id);

                let assignment = Assignment {
                    id: AssignmentId::new(),
                    inventory_item_id: unit.inventory_item_id,
                    order_id: order.order_id,
                    order_number: order.order_number,
                    sku: components.to_string(),
                    assigned_at: order.occurred_at,
                };
                if let Err(err) = self.assignments.insert(assignment.clone()) {
                    self.rollback(&assignments);
                    return Err(err.into());
                }
                assignments.push(assignment);
            }

            let remaining = order.quantity - assignments.len() as u32;
            let commitment = if remaining > 0 {
                let new = NewCommitment {
                    sku: order.sku.clone(),
                    order_id: order.order_id,
                    order_number: order.order_number,
                    quantity: remaining,
                    occurred_at: order.occurred_at,
                };
                match self.ledger.add_commitment(new) {
                    Ok(commitment) => Some(commitment),
                    Err(err) => {
                        self.rollback(&assignments);
                        return Err(err.into());
                    }
                }
            } else {
                None
            };

            tracing::info!(
                order_number = order.order_number,
                sku = %order.sku,
                requested = order.quantity,
                from_stock = assignments.len(),
                "order line placed"
            );
            for assignment in &assignments {
                self.publish_assignment(assignment);
            }
            if let Some(commitment) = &commitment {
                self.publish_commitment(commitment);
            }

            Ok(OrderPlacement {
                assignments,
                commitment,
            })
        })
    }

    /// Oldest-first scan. Caller holds the group lock.
    fn match_oldest(
        &self,
        item_id: InventoryItemId,
        item: &SkuComponents,
        at: DateTime<Utc>,
    ) -> Result<Option<(Assignment, Consumed)>, AllocationError> {
        for commitment in self.ledger.open_commitments()? {
            let Some(target) = parse_sku(&commitment.sku) else {
                tracing::warn!(
                    commitment_id = %commitment.id,
                    sku = %commitment.sku,
                    "skipping commitment with malformed SKU"
                );
                continue;
            };
            if !can_convert_to_sku(item, &target) {
                continue;
            }

            match self.commit_assignment(item_id, item, &commitment, at) {
                Ok(committed) => return Ok(Some(committed)),
                // Removed by its order between the scan and the write.
                Err(AllocationError::Ledger(LedgerError::Store(StoreError::NotFound(_)))) => {
                    tracing::debug!(
                        commitment_id = %commitment.id,
                        "commitment vanished during allocation"
                    );
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    fn commit_assignment(
        &self,
        item_id: InventoryItemId,
        item: &SkuComponents,
        commitment: &Commitment,
        at: DateTime<Utc>,
    ) -> Result<(Assignment, Consumed), AllocationError> {
        let consumed = self.ledger.consume_one(commitment.id, at)?;

        let assignment = Assignment {
            id: AssignmentId::new(),
            inventory_item_id: item_id,
            order_id: commitment.order_id,
            order_number: commitment.order_number,
            sku: item.to_string(),
            assigned_at: at,
        };
        if let Err(err) = self.assignments.insert(assignment.clone()) {
            self.ledger.restore(commitment.clone())?;
            return Err(err.into());
        }

        tracing::info!(
            assignment_id = %assignment.id,
            inventory_item_id = %item_id,
            commitment_id = %commitment.id,
            order_number = assignment.order_number,
            sku = %assignment.sku,
            ordered_sku = %commitment.sku,
            remaining = consumed.remaining(),
            "inventory unit assigned"
        );
        Ok((assignment, consumed))
    }

    fn pick_unit<'a>(
        &self,
        wanted: &SkuComponents,
        catalog: &'a [InventoryUnit],
        taken: &HashSet<InventoryItemId>,
    ) -> Result<Option<(&'a InventoryUnit, SkuComponents)>, AllocationError> {
        let mut convertible = None;

        for unit in catalog {
            if !unit.is_allocatable() || taken.contains(&unit.inventory_item_id) {
                continue;
            }
            let Some(components) = parse_sku(&unit.sku) else {
                continue;
            };
            if !can_convert_to_sku(&components, wanted) {
                continue;
            }
            if self.assignments.by_item(unit.inventory_item_id)?.is_some() {
                continue;
            }
            if components == *wanted {
                return Ok(Some((unit, components)));
            }
            if convertible.is_none() {
                convertible = Some((unit, components));
            }
        }

        Ok(convertible)
    }

    fn rollback(&self, assignments: &[Assignment]) {
        for assignment in assignments {
            if let Err(err) = self.assignments.remove(assignment.id) {
                tracing::warn!(
                    assignment_id = %assignment.id,
                    error = %err,
                    "failed to roll back assignment"
                );
            }
        }
    }

    fn publish_assignment(&self, assignment: &Assignment) {
        self.publish(AllocationEvent::InventoryAssigned(InventoryAssigned {
            assignment_id: assignment.id,
            inventory_item_id: assignment.inventory_item_id,
            order_id: assignment.order_id,
            order_number: assignment.order_number,
            sku: assignment.sku.clone(),
            occurred_at: assignment.assigned_at,
        }));
    }

    fn publish_commitment(&self, commitment: &Commitment) {
        self.publish(AllocationEvent::CommitmentOpened(CommitmentOpened {
            commitment_id: commitment.id,
            order_id: commitment.order_id,
            order_number: commitment.order_number,
            sku: commitment.sku.clone(),
            universal_sku: commitment.universal_sku.clone(),
            quantity: commitment.quantity,
            occurred_at: commitment.created_at,
        }));
    }

    /// Stores are the source of truth, so a failed publish is logged, not fatal.
    fn publish(&self, event: AllocationEvent) {
        let event_type = event.event_type();
        if let Err(err) = self.bus.publish(event) {
            tracing::warn!(event_type, error = ?err, "failed to publish allocation event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use chrono::TimeZone;
    use denim_commitments::InMemoryCommitmentStore;
    use denim_events::InMemoryEventBus;

    use crate::assignment::{AssignmentStoreError, InMemoryAssignmentStore};
    use crate::inventory::{AllocationStatus, StockStatus};

    type TestService = AllocationService<
        InMemoryCommitmentStore,
        InMemoryAssignmentStore,
        InMemoryEventBus<AllocationEvent>,
    >;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, minute, 0).unwrap()
    }

    fn service() -> TestService {
        AllocationService::new(
            CommitmentLedger::new(InMemoryCommitmentStore::new()),
            InMemoryAssignmentStore::new(),
            InMemoryEventBus::new(),
        )
    }

    fn demand(sku: &str, order_number: u64, quantity: u32, minute: u32) -> NewCommitment {
        NewCommitment {
            sku: sku.to_string(),
            order_id: OrderId::new(),
            order_number,
            quantity,
            occurred_at: at(minute),
        }
    }

    fn stocked(item: InventoryItemId, sku: &str, minute: u32) -> InventoryStatusChanged {
        InventoryStatusChanged {
            inventory_item_id: item,
            sku: sku.to_string(),
            status1: StockStatus::Stock,
            status2: AllocationStatus::Uncommitted,
            occurred_at: at(minute),
        }
    }

    fn unit(sku: &str) -> InventoryUnit {
        InventoryUnit {
            inventory_item_id: InventoryItemId::new(),
            sku: sku.to_string(),
            status1: StockStatus::Stock,
            status2: AllocationStatus::Uncommitted,
        }
    }

    #[test]
    fn unit_is_finished_into_a_shorter_commitment() {
        let svc = service();
        let commitment = svc.record_commitment(demand("ST-32-S-30-RAW", 1001, 1, 0)).unwrap();
        let item = InventoryItemId::new();

        let assignment = svc
            .assign_inventory_item(&stocked(item, "ST-32-S-32-STA", 5))
            .unwrap()
            .expect("compatible commitment");

        assert_eq!(assignment.order_number, 1001);
        assert_eq!(assignment.order_id, commitment.order_id);
        assert_eq!(assignment.sku, "ST-32-S-32-STA");
        assert_eq!(assignment.inventory_item_id, item);
        assert_eq!(assignment.assigned_at, at(5));
        assert!(svc.ledger().get(commitment.id).unwrap().is_none());
        assert_eq!(svc.assignment_by_item(item).unwrap(), Some(assignment.clone()));
        assert_eq!(svc.assignments_by_order(commitment.order_id).unwrap(), vec![assignment]);
    }

    #[test]
    fn multi_unit_commitment_is_decremented() {
        let svc = service();
        let commitment = svc.record_commitment(demand("ST-32-S-30-RAW", 1002, 3, 0)).unwrap();

        svc.assign_inventory_item(&stocked(InventoryItemId::new(), "ST-32-S-30-STA", 7))
            .unwrap()
            .expect("assigned");

        let left = svc.ledger().get(commitment.id).unwrap().expect("still open");
        assert_eq!(left.quantity, 2);
        assert_eq!(left.created_at, at(0));
        assert_eq!(left.updated_at, at(7));
    }

    #[test]
    fn short_unit_cannot_fill_longer_demand() {
        let svc = service();
        let commitment = svc.record_commitment(demand("ST-32-S-36-RAW", 1003, 1, 0)).unwrap();
        let item = InventoryItemId::new();

        let outcome = svc.assign_inventory_item(&stocked(item, "ST-32-S-28-RAW", 1)).unwrap();

        assert!(outcome.is_none());
        assert_eq!(svc.ledger().get(commitment.id).unwrap(), Some(commitment));
        assert!(svc.assignment_by_item(item).unwrap().is_none());
    }

    #[test]
    fn oldest_compatible_commitment_wins() {
        let svc = service();
        // Inserted first but created later.
        let newer = svc.record_commitment(demand("ST-32-S-30-RAW", 2, 1, 10)).unwrap();
        let older = svc.record_commitment(demand("ST-32-S-32-IND", 1, 1, 3)).unwrap();

        let assignment = svc
            .assign_inventory_item(&stocked(InventoryItemId::new(), "ST-32-S-36-RAW", 20))
            .unwrap()
            .expect("assigned");

        assert_eq!(assignment.order_id, older.order_id);
        assert!(svc.ledger().get(newer.id).unwrap().is_some());
    }

    #[test]
    fn equal_timestamps_fall_back_to_insertion_order() {
        let svc = service();
        let first = svc.record_commitment(demand("ST-32-S-30-RAW", 1, 1, 0)).unwrap();
        svc.record_commitment(demand("ST-32-S-30-RAW", 2, 1, 0)).unwrap();

        let assignment = svc
            .assign_inventory_item(&stocked(InventoryItemId::new(), "ST-32-S-30-RAW", 1))
            .unwrap()
            .expect("assigned");
        assert_eq!(assignment.order_id, first.order_id);
    }

    #[test]
    fn incompatible_commitments_are_passed_over() {
        let svc = service();
        svc.record_commitment(demand("ST-32-S-30-ONX", 1, 1, 0)).unwrap();
        svc.record_commitment(demand("ST-34-S-30-RAW", 2, 1, 1)).unwrap();
        let target = svc.record_commitment(demand("ST-32-S-30-STA", 3, 1, 2)).unwrap();

        let assignment = svc
            .assign_inventory_item(&stocked(InventoryItemId::new(), "ST-32-S-31-RAW", 5))
            .unwrap()
            .expect("assigned");
        assert_eq!(assignment.order_id, target.order_id);
    }

    #[test]
    fn only_uncommitted_stock_triggers_allocation() {
        let svc = service();
        let commitment = svc.record_commitment(demand("ST-32-S-30-RAW", 1, 1, 0)).unwrap();
        let events = svc.bus().subscribe();

        for (status1, status2) in [
            (StockStatus::Production, AllocationStatus::Uncommitted),
            (StockStatus::Stock, AllocationStatus::Committed),
            (StockStatus::Shipped, AllocationStatus::Assigned),
            (StockStatus::Other, AllocationStatus::Other),
        ] {
            let change = InventoryStatusChanged {
                status1,
                status2,
                ..stocked(InventoryItemId::new(), "ST-32-S-30-RAW", 1)
            };
            assert!(svc.assign_inventory_item(&change).unwrap().is_none());
        }

        assert_eq!(svc.ledger().get(commitment.id).unwrap(), Some(commitment));
        assert!(svc.assignments().list().unwrap().is_empty());
        assert!(events.drain().is_empty());
    }

    #[test]
    fn malformed_unit_sku_is_a_no_op() {
        let svc = service();
        let commitment = svc.record_commitment(demand("ST-32-S-30-RAW", 1, 1, 0)).unwrap();

        for sku in ["", "ST-32-S-30", "st-32-s-30-raw", "ST-32-S-30-RAW-X"] {
            let outcome = svc.assign_inventory_item(&stocked(InventoryItemId::new(), sku, 1));
            assert!(outcome.unwrap().is_none(), "{sku:?}");
        }
        assert_eq!(svc.ledger().get(commitment.id).unwrap(), Some(commitment));
    }

    #[test]
    fn corrupted_commitment_is_skipped() {
        let svc = service();
        let corrupted = Commitment {
            id: denim_core::CommitmentId::new(),
            sku: "garbage".to_string(),
            universal_sku: "garbage".to_string(),
            order_id: OrderId::new(),
            order_number: 1,
            quantity: 1,
            created_at: at(0),
            updated_at: at(0),
            sequence: 0,
        };
        svc.ledger().store().insert(corrupted.clone()).unwrap();
        let valid = svc.record_commitment(demand("ST-32-S-30-RAW", 2, 1, 5)).unwrap();

        let assignment = svc
            .assign_inventory_item(&stocked(InventoryItemId::new(), "ST-32-S-30-RAW", 9))
            .unwrap()
            .expect("assigned");

        assert_eq!(assignment.order_id, valid.order_id);
        assert!(svc.ledger().get(corrupted.id).unwrap().is_some());
    }

    #[test]
    fn assigned_unit_is_not_allocated_twice() {
        let svc = service();
        svc.record_commitment(demand("ST-32-S-30-RAW", 1, 2, 0)).unwrap();
        let change = stocked(InventoryItemId::new(), "ST-32-S-30-RAW", 1);

        assert!(svc.assign_inventory_item(&change).unwrap().is_some());
        assert!(svc.assign_inventory_item(&change).unwrap().is_none());

        let open = svc.ledger().open_commitments().unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].quantity, 1);
    }

    #[test]
    fn allocation_publishes_assignment_and_resolution() {
        let svc = service();
        let events = svc.bus().subscribe();
        let commitment = svc.record_commitment(demand("ST-32-S-30-RAW", 1, 2, 0)).unwrap();

        svc.assign_inventory_item(&stocked(InventoryItemId::new(), "ST-32-S-30-RAW", 4))
            .unwrap()
            .expect("assigned");

        let published = events.drain();
        let types: Vec<_> = published.iter().map(Event::event_type).collect();
        assert_eq!(
            types,
            vec![
                "allocation.commitment.opened",
                "allocation.inventory.assigned",
                "allocation.commitment.resolved",
            ]
        );
        match &published[2] {
            AllocationEvent::CommitmentResolved(resolved) => {
                assert_eq!(resolved.commitment_id, commitment.id);
                assert_eq!(resolved.remaining, 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    /// Accepts reads, refuses every write.
    #[derive(Debug, Default)]
    struct ReadOnlyAssignments;

    impl AssignmentStore for ReadOnlyAssignments {
        fn insert(&self, _: Assignment) -> Result<(), AssignmentStoreError> {
            Err(AssignmentStoreError::Conflict("read-only".into()))
        }

        fn remove(&self, _: AssignmentId) -> Result<Option<Assignment>, AssignmentStoreError> {
            Ok(None)
        }

        fn by_item(&self, _: InventoryItemId) -> Result<Option<Assignment>, AssignmentStoreError> {
            Ok(None)
        }

        fn by_order(&self, _: OrderId) -> Result<Vec<Assignment>, AssignmentStoreError> {
            Ok(Vec::new())
        }

        fn list(&self) -> Result<Vec<Assignment>, AssignmentStoreError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn failed_assignment_write_restores_the_commitment() {
        let svc = AllocationService::new(
            CommitmentLedger::new(InMemoryCommitmentStore::new()),
            ReadOnlyAssignments,
            InMemoryEventBus::<AllocationEvent>::new(),
        );
        let events = svc.bus().subscribe();
        let single = svc.record_commitment(demand("ST-32-S-30-RAW", 1, 1, 0)).unwrap();
        let multi = svc.record_commitment(demand("ST-32-S-30-RAW", 2, 3, 1)).unwrap();
        events.drain();

        let err = svc
            .assign_inventory_item(&stocked(InventoryItemId::new(), "ST-32-S-30-RAW", 5))
            .unwrap_err();
        assert!(matches!(err, AllocationError::Store(AssignmentStoreError::Conflict(_))));

        assert_eq!(svc.ledger().get(single.id).unwrap(), Some(single));
        assert_eq!(svc.ledger().get(multi.id).unwrap(), Some(multi));
        assert!(events.drain().is_empty());
    }

    /// Cancels one commitment from the shared store, then refuses the write.
    #[derive(Debug)]
    struct CancelThenRefuse {
        commitments: Arc<InMemoryCommitmentStore>,
        cancel: Mutex<Option<CommitmentId>>,
    }

    impl AssignmentStore for CancelThenRefuse {
        fn insert(&self, _: Assignment) -> Result<(), AssignmentStoreError> {
            if let Some(id) = *self.cancel.lock().unwrap() {
                self.commitments.remove(id).unwrap();
            }
            Err(AssignmentStoreError::Conflict("write failed".into()))
        }

        fn remove(&self, _: AssignmentId) -> Result<Option<Assignment>, AssignmentStoreError> {
            Ok(None)
        }

        fn by_item(&self, _: InventoryItemId) -> Result<Option<Assignment>, AssignmentStoreError> {
            Ok(None)
        }

        fn by_order(&self, _: OrderId) -> Result<Vec<Assignment>, AssignmentStoreError> {
            Ok(Vec::new())
        }

        fn list(&self) -> Result<Vec<Assignment>, AssignmentStoreError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn commitment_cancelled_during_a_failed_write_stays_cancelled() {
        let commitments = Arc::new(InMemoryCommitmentStore::new());
        let svc = AllocationService::new(
            CommitmentLedger::new(commitments.clone()),
            CancelThenRefuse {
                commitments,
                cancel: Mutex::new(None),
            },
            InMemoryEventBus::<AllocationEvent>::new(),
        );
        let cancelled = svc.record_commitment(demand("ST-32-S-30-RAW", 1, 3, 0)).unwrap();
        *svc.assignments().cancel.lock().unwrap() = Some(cancelled.id);

        let err = svc
            .assign_inventory_item(&stocked(InventoryItemId::new(), "ST-32-S-30-RAW", 5))
            .unwrap_err();

        assert!(matches!(err, AllocationError::Store(AssignmentStoreError::Conflict(_))));
        assert_eq!(svc.ledger().get(cancelled.id).unwrap(), None);
        assert!(svc.ledger().open_commitments().unwrap().is_empty());
    }

    #[test]
    fn remove_commitment_is_idempotent() {
        let svc = service();
        let c = svc.record_commitment(demand("ST-32-S-30-RAW", 1, 2, 0)).unwrap();

        svc.remove_commitment(c.id).unwrap();
        svc.remove_commitment(c.id).unwrap();

        assert_eq!(svc.ledger().get(c.id).unwrap(), None);
        let outcome = svc
            .assign_inventory_item(&stocked(InventoryItemId::new(), "ST-32-S-30-RAW", 1))
            .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn cancellation_waits_for_the_group_lock() {
        let svc = service();
        let c = svc.record_commitment(demand("ST-32-S-30-STA", 1, 1, 0)).unwrap();

        thread::scope(|scope| {
            let cancel = svc
                .locks
                .with_group("ST-32-S-36-RAW", || {
                    let cancel = scope.spawn(|| svc.remove_commitment(c.id));
                    thread::sleep(Duration::from_millis(50));
                    assert!(svc.ledger().get(c.id).unwrap().is_some());
                    Ok(cancel)
                })
                .unwrap();
            cancel.join().unwrap().unwrap();
        });

        assert_eq!(svc.ledger().get(c.id).unwrap(), None);
    }

    #[test]
    fn record_commitment_rejects_bad_input() {
        let svc = service();
        assert!(matches!(
            svc.record_commitment(demand("ST-32", 1, 1, 0)),
            Err(AllocationError::InvalidSku(_))
        ));
        assert!(matches!(
            svc.record_commitment(demand("ST-32-S-30-RAW", 1, 0, 0)),
            Err(AllocationError::Ledger(LedgerError::Domain(_)))
        ));
        assert_eq!(svc.ledger().open_commitments().unwrap().len(), 0);
    }

    fn order(sku: &str, quantity: u32) -> OrderPlaced {
        OrderPlaced {
            order_id: OrderId::new(),
            order_number: 5000,
            sku: sku.to_string(),
            quantity,
            occurred_at: at(30),
        }
    }

    #[test]
    fn place_order_prefers_exact_stock_then_convertible() {
        let svc = service();
        let longer = unit("ST-32-S-36-RAW");
        let exact = unit("ST-32-S-30-STA");
        let catalog = vec![longer.clone(), exact.clone()];

        let placement = svc.place_order(&order("ST-32-S-30-STA", 2), &catalog).unwrap();

        let items: Vec<_> = placement.assignments.iter().map(|a| a.inventory_item_id).collect();
        assert_eq!(items, vec![exact.inventory_item_id, longer.inventory_item_id]);
        assert_eq!(placement.assignments[1].sku, "ST-32-S-36-RAW");
        assert!(placement.commitment.is_none());
    }

    #[test]
    fn place_order_commits_the_shortfall() {
        let svc = service();
        let events = svc.bus().subscribe();
        let mut reserved = unit("ST-32-S-30-RAW");
        reserved.status2 = AllocationStatus::Committed;
        let catalog = vec![
            unit("ST-32-S-28-RAW"),
            reserved,
            unit("ST-32-S-30-RAW"),
            unit("garbage"),
        ];
        let line = order("ST-32-S-30-RAW", 3);

        let placement = svc.place_order(&line, &catalog).unwrap();

        assert_eq!(placement.assignments.len(), 1);
        assert_eq!(placement.assignments[0].inventory_item_id, catalog[2].inventory_item_id);
        let commitment = placement.commitment.expect("shortfall committed");
        assert_eq!(commitment.quantity, 2);
        assert_eq!(commitment.order_id, line.order_id);
        assert_eq!(commitment.created_at, at(30));

        let types: Vec<_> = events.drain().iter().map(Event::event_type).collect();
        assert_eq!(types, vec!["allocation.inventory.assigned", "allocation.commitment.opened"]);
    }

    #[test]
    fn place_order_skips_units_already_assigned() {
        let svc = service();
        let catalog = vec![unit("ST-32-S-30-RAW")];

        let first = svc.place_order(&order("ST-32-S-30-RAW", 1), &catalog).unwrap();
        let second = svc.place_order(&order("ST-32-S-30-RAW", 1), &catalog).unwrap();

        assert_eq!(first.assignments.len(), 1);
        assert!(second.assignments.is_empty());
        assert_eq!(second.commitment.map(|c| c.quantity), Some(1));
    }

    #[test]
    fn place_order_validates_the_line() {
        let svc = service();
        assert!(matches!(
            svc.place_order(&order("nope", 1), &[]),
            Err(AllocationError::InvalidSku(_))
        ));
        assert!(matches!(
            svc.place_order(&order("ST-32-S-30-RAW", 0), &[]),
            Err(AllocationError::Domain(_))
        ));
    }

    #[test]
    fn place_order_rolls_back_when_stock_cannot_be_written() {
        let svc = AllocationService::new(
            CommitmentLedger::new(InMemoryCommitmentStore::new()),
            ReadOnlyAssignments,
            InMemoryEventBus::<AllocationEvent>::new(),
        );
        let err = svc
            .place_order(&order("ST-32-S-30-RAW", 2), &[unit("ST-32-S-30-RAW")])
            .unwrap_err();

        assert!(matches!(err, AllocationError::Store(_)));
        assert!(svc.ledger().open_commitments().unwrap().is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        const WASHES: [&str; 4] = ["RAW", "STA", "IND", "BLK"];

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 64,
                ..ProptestConfig::default()
            })]

            /// Every unit either resolves exactly one unit of demand or
            /// leaves the ledger untouched.
            #[test]
            fn demand_plus_assignments_is_conserved(
                demands in prop::collection::vec((0usize..4, 26u8..=36, 1u32..4), 1..6),
                units in prop::collection::vec((0usize..4, 26u8..=36), 1..12),
            ) {
                let svc = service();
                for (minute, (wash, inseam, quantity)) in demands.iter().enumerate() {
                    let sku = format!("ST-32-S-{inseam}-{}", WASHES[*wash]);
                    svc.record_commitment(demand(&sku, minute as u64, *quantity, minute as u32))
                        .unwrap();
                }
                let total = |svc: &TestService| -> u64 {
                    svc.ledger()
                        .open_commitments()
                        .unwrap()
                        .iter()
                        .map(|c| u64::from(c.quantity))
                        .sum()
                };
                let initial = total(&svc);

                for (wash, inseam) in units {
                    let sku = format!("ST-32-S-{inseam}-{}", WASHES[wash]);
                    let before = total(&svc);
                    let change = stocked(InventoryItemId::new(), &sku, 59);
                    let outcome = svc.assign_inventory_item(&change).unwrap();
                    let after = total(&svc);
                    match outcome {
                        Some(assignment) => {
                            prop_assert_eq!(after + 1, before);
                            let unit = parse_sku(&assignment.sku).unwrap();
                            prop_assert!(unit.inseam == inseam);
                        }
                        None => prop_assert_eq!(after, before),
                    }
                }

                let assigned = svc.assignments().list().unwrap().len() as u64;
                prop_assert_eq!(total(&svc) + assigned, initial);
            }
        }
    }
}
