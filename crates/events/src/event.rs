use chrono::{DateTime, Utc};

/// A fact published after the unit of work that produced it has committed.
///
/// Subscribers route on [`Event::event_type`], a dotted name such as
/// `allocation.inventory.assigned` that never changes once released. A
/// breaking payload change bumps [`Event::version`] instead.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32 {
        1
    }

    /// Business time, taken from the command that caused the event.
    fn occurred_at(&self) -> DateTime<Utc>;
}
