//! JSON-lines feed replay.
//!
//! Each input line is one tagged event:
//!
//! ```text
//! {"type":"order_placed","order_id":"…","order_number":1001,"sku":"ST-32-S-30-RAW","quantity":2,"occurred_at":"…"}
//! {"type":"inventory_status_changed","inventory_item_id":"…","sku":"ST-32-S-32-STA","status1":"STOCK","status2":"UNCOMMITTED","occurred_at":"…"}
//! ```
//!
//! Every assignment or commitment the feed produces is written as one JSON
//! line, tagged with `outcome`. Bad lines are logged and skipped.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use denim_allocation::{
    AllocationEvent, AllocationService, Assignment, InMemoryAssignmentStore, InventoryStatusChanged,
    InventoryUnit, OrderPlaced,
};
use denim_commitments::{Commitment, CommitmentLedger, InMemoryCommitmentStore};
use denim_core::InventoryItemId;
use denim_events::InMemoryEventBus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    OrderPlaced(OrderPlaced),
    InventoryStatusChanged(InventoryStatusChanged),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FeedOutcome {
    Assigned(Assignment),
    Committed(Commitment),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub lines: u64,
    pub assignments: u64,
    pub commitments: u64,
    pub rejected: u64,
}

type Service = AllocationService<
    InMemoryCommitmentStore,
    InMemoryAssignmentStore,
    InMemoryEventBus<AllocationEvent>,
>;

/// In-process replay state: the services plus the inventory seen so far.
#[derive(Debug)]
pub struct Replay {
    service: Service,
    catalog: Vec<InventoryUnit>,
    positions: HashMap<InventoryItemId, usize>,
}

impl Default for Replay {
    fn default() -> Self {
        Self::new()
    }
}

impl Replay {
    pub fn new() -> Self {
        Self {
            service: AllocationService::new(
                CommitmentLedger::new(InMemoryCommitmentStore::new()),
                InMemoryAssignmentStore::new(),
                InMemoryEventBus::new(),
            ),
            catalog: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Replay every line of `input`, writing outcomes to `out`.
    ///
    /// Only I/O failures abort the replay.
    pub fn run(
        &mut self,
        input: impl BufRead,
        out: &mut impl Write,
    ) -> anyhow::Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();

        for (index, line) in input.lines().enumerate() {
            let line = line.with_context(|| format!("reading feed line {}", index + 1))?;
            if line.trim().is_empty() {
                continue;
            }
            summary.lines += 1;

            let event: FeedEvent = match serde_json::from_str(&line) {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(line = index + 1, error = %err, "skipping unreadable feed line");
                    summary.rejected += 1;
                    continue;
                }
            };

            match self.apply(event) {
                Ok(outcomes) => {
                    for outcome in outcomes {
                        match &outcome {
                            FeedOutcome::Assigned(_) => summary.assignments += 1,
                            FeedOutcome::Committed(_) => summary.commitments += 1,
                        }
                        serde_json::to_writer(&mut *out, &outcome).context("writing outcome")?;
                        writeln!(out).context("writing outcome")?;
                    }
                }
                Err(err) => {
                    tracing::warn!(line = index + 1, error = %err, "feed event rejected");
                    summary.rejected += 1;
                }
            }
        }

        out.flush().context("flushing output")?;
        Ok(summary)
    }

    /// Apply one event.
    pub fn apply(&mut self, event: FeedEvent) -> anyhow::Result<Vec<FeedOutcome>> {
        match event {
            FeedEvent::OrderPlaced(order) => {
                let placement = self
                    .service
                    .place_order(&order, &self.catalog)
                    .with_context(|| format!("placing order {}", order.order_number))?;
                let mut outcomes: Vec<FeedOutcome> =
                    placement.assignments.into_iter().map(FeedOutcome::Assigned).collect();
                outcomes.extend(placement.commitment.map(FeedOutcome::Committed));
                Ok(outcomes)
            }
            FeedEvent::InventoryStatusChanged(change) => {
                self.track(&change);
                let assignment = self
                    .service
                    .assign_inventory_item(&change)
                    .with_context(|| format!("allocating unit {}", change.inventory_item_id))?;
                Ok(assignment.map(FeedOutcome::Assigned).into_iter().collect())
            }
        }
    }

    /// Keep the latest known status of each unit, in first-seen order.
    fn track(&mut self, change: &InventoryStatusChanged) {
        let unit = InventoryUnit {
            inventory_item_id: change.inventory_item_id,
            sku: change.sku.clone(),
            status1: change.status1,
            status2: change.status2,
        };
        match self.positions.get(&change.inventory_item_id) {
            Some(&position) => self.catalog[position] = unit,
            None => {
                self.positions.insert(change.inventory_item_id, self.catalog.len());
                self.catalog.push(unit);
            }
        }
    }
}
