//! Event publication mechanics shared by the allocation crates.
//!
//! Domain crates define their own event enums and implement [`Event`]; this
//! crate only knows how to fan them out to subscribers.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
