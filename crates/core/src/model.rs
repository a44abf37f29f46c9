//! Marker traits for the two kinds of domain object.

/// Something with identity that outlives changes to its state.
///
/// A commitment whose quantity drops from 3 to 2 is still the same
/// commitment; stores key records by [`Entity::id`].
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}

/// Something defined entirely by its values.
///
/// Two parsed SKUs with equal components are the same SKU. Changes produce a
/// new value (a hem change returns new components).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
