//! Production planning: how much of a universal SKU the workshop still has
//! to make.

use serde::{Deserialize, Serialize};

use denim_commitments::CommitmentStore;
use denim_events::EventBus;
use denim_sku::{parse_sku, same_class, universal_sku};

use crate::assignment::AssignmentStore;
use crate::error::AllocationError;
use crate::events::AllocationEvent;
use crate::inventory::InventoryUnit;
use crate::service::AllocationService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionDecision {
    pub universal_sku: String,
    /// Units owed across every commitment in the class.
    pub open_demand: u64,
    /// Unassigned, allocatable units in the class.
    pub available: u64,
    pub shortfall: u64,
}

impl ProductionDecision {
    pub fn new(universal_sku: impl Into<String>, open_demand: u64, available: u64) -> Self {
        Self {
            universal_sku: universal_sku.into(),
            open_demand,
            available,
            shortfall: open_demand.saturating_sub(available),
        }
    }

    pub fn needs_production(&self) -> bool {
        self.shortfall > 0
    }
}

impl<C, A, B> AllocationService<C, A, B>
where
    C: CommitmentStore,
    A: AssignmentStore,
    B: EventBus<AllocationEvent>,
{
    /// Compare open demand for the class of `sku` against free stock.
    ///
    /// Any member SKU of the class may be given; the answer is always stated
    /// in terms of its universal SKU. `Ok(None)` for a malformed SKU.
    pub fn production_decision(
        &self,
        sku: &str,
        catalog: &[InventoryUnit],
    ) -> Result<Option<ProductionDecision>, AllocationError> {
        let Some(components) = parse_sku(sku) else {
            return Ok(None);
        };
        let universal = universal_sku(&components);
        let key = universal.to_string();

        let open_demand = self.ledger().total_commitments(&key)?;

        let mut available = 0u64;
        for unit in catalog.iter().filter(|u| u.is_allocatable()) {
            let Some(candidate) = parse_sku(&unit.sku) else {
                continue;
            };
            if !same_class(&candidate, &universal) {
                continue;
            }
            if self.assignments().by_item(unit.inventory_item_id)?.is_some() {
                continue;
            }
            available += 1;
        }

        let decision = ProductionDecision::new(key, open_demand, available);
        tracing::debug!(
            universal_sku = %decision.universal_sku,
            open_demand,
            available,
            shortfall = decision.shortfall,
            "production decision"
        );
        Ok(Some(decision))
    }
}
