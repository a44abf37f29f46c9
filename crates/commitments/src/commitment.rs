use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use denim_core::{CommitmentId, Entity, OrderId};

/// One line of unfulfilled order demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub id: CommitmentId,
    /// SKU exactly as ordered.
    pub sku: String,
    /// Universal SKU computed when the commitment was recorded.
    pub universal_sku: String,
    pub order_id: OrderId,
    pub order_number: u64,
    /// Units still owed; always >= 1 while the commitment exists.
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Insertion order, assigned by the store. Breaks `created_at` ties.
    pub sequence: u64,
}

impl Entity for Commitment {
    type Id = CommitmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Commitment {
    /// Whether `sku` names this commitment, either as ordered or universally.
    pub fn matches_sku(&self, sku: &str) -> bool {
        self.sku == sku || self.universal_sku == sku
    }

    /// Sort key for oldest-first processing.
    pub fn chronological_key(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.sequence)
    }
}

/// Request to record demand (`addCommitment`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCommitment {
    pub sku: String,
    pub order_id: OrderId,
    pub order_number: u64,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}
