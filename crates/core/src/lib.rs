//! `denim-core` — shared building blocks for the workshop allocation crates.
//!
//! Identifiers, marker traits and the domain error. No storage, no IO.

pub mod error;
pub mod id;
pub mod model;

pub use error::DomainError;
pub use id::{AssignmentId, CommitmentId, InventoryItemId, OrderId};
pub use model::{Entity, ValueObject};
