//! SKU domain model for the denim workshop.
//!
//! A SKU is written `STYLE-WAIST-SHAPE-INSEAM-WASH` (e.g. `ST-32-S-30-STA`).
//! Everything in this crate is a pure function over parsed [`SkuComponents`];
//! the text form only exists at the boundary.

pub mod code;
pub mod codec;
pub mod hem;
pub mod universal;
pub mod wash;

pub use code::{LetterCode, ShapeCode, StyleCode, WashCode};
pub use codec::{
    INSEAM_RANGE, InvalidSkuError, SkuComponents, SkuError, WAIST_RANGE, build_sku, parse_sku,
};
pub use hem::{HemCode, UnknownHemCode, change_hem, hem_adjustment};
pub use universal::{UNIVERSAL_INSEAM, can_convert_to_sku, same_class, universal_sku};
pub use wash::{KnownWash, WashGroup, wash_group};
