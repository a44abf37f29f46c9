//! Universal SKU classification.
//!
//! The universal SKU of a unit is its style/waist/shape at the longest
//! producible inseam in its wash group's representative wash. Two SKUs are
//! interchangeable stock iff their universal SKUs are equal.

use crate::codec::SkuComponents;
use crate::wash::wash_group;

/// Inseam every universal SKU is normalized to.
pub const UNIVERSAL_INSEAM: u8 = 36;

/// Equivalence-class representative of `components`.
pub fn universal_sku(components: &SkuComponents) -> SkuComponents {
    SkuComponents {
        inseam: UNIVERSAL_INSEAM,
        wash: wash_group(components.wash).representative(),
        ..*components
    }
}

/// Whether two SKUs fall in the same equivalence class.
pub fn same_class(a: &SkuComponents, b: &SkuComponents) -> bool {
    universal_sku(a) == universal_sku(b)
}

/// Whether a unit with `candidate` components can be finished into `target`.
///
/// Style, waist and shape must match exactly. Inseam can only be cut shorter.
/// Washes must share a wash group; treating a group as interchangeable is a
/// business rule and lives only here.
pub fn can_convert_to_sku(candidate: &SkuComponents, target: &SkuComponents) -> bool {
    candidate.style == target.style
        && candidate.waist == target.waist
        && candidate.shape == target.shape
        && candidate.inseam >= target.inseam
        && wash_group(candidate.wash) == wash_group(target.wash)
}
