//! Lossless conversion between SKU text and [`SkuComponents`].

use core::ops::RangeInclusive;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use denim_core::ValueObject;

use crate::code::{ShapeCode, StyleCode, WashCode};

/// Producible waist sizes, in inches.
pub const WAIST_RANGE: RangeInclusive<u8> = 20..=50;

/// Producible inseam lengths, in inches.
pub const INSEAM_RANGE: RangeInclusive<u8> = 26..=36;

/// Structured SKU. Immutable value: derive a new one instead of editing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkuComponents {
    pub style: StyleCode,
    pub waist: u8,
    pub shape: ShapeCode,
    pub inseam: u8,
    pub wash: WashCode,
}

impl ValueObject for SkuComponents {}

/// Component-level validation failure (building or constructing a SKU).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SkuError {
    #[error("waist {0} outside 20..=50")]
    WaistOutOfRange(u8),

    #[error("inseam {0} outside 26..=36")]
    InseamOutOfRange(u8),
}

/// A SKU string handed to a write operation did not parse.
///
/// Read paths report malformed text as `None`; this error is for callers that
/// were expected to validate first.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid SKU: {sku:?}")]
pub struct InvalidSkuError {
    pub sku: String,
}

impl InvalidSkuError {
    pub fn new(sku: impl Into<String>) -> Self {
        Self { sku: sku.into() }
    }
}

impl SkuComponents {
    /// Build validated components.
    pub fn new(
        style: StyleCode,
        waist: u8,
        shape: ShapeCode,
        inseam: u8,
        wash: WashCode,
    ) -> Result<Self, SkuError> {
        let components = Self {
            style,
            waist,
            shape,
            inseam,
            wash,
        };
        components.validate()?;
        Ok(components)
    }

    /// Check the numeric domains. Letter codes are valid by construction.
    pub fn validate(&self) -> Result<(), SkuError> {
        if !WAIST_RANGE.contains(&self.waist) {
            return Err(SkuError::WaistOutOfRange(self.waist));
        }
        if !INSEAM_RANGE.contains(&self.inseam) {
            return Err(SkuError::InseamOutOfRange(self.inseam));
        }
        Ok(())
    }

    /// Same SKU with a different inseam, if that inseam is producible.
    pub fn with_inseam(&self, inseam: u8) -> Option<Self> {
        INSEAM_RANGE.contains(&inseam).then_some(Self { inseam, ..*self })
    }
}

/// Canonical text. Does not validate; use [`build_sku`] for untrusted values.
impl core::fmt::Display for SkuComponents {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}-{:02}-{}-{:02}-{}",
            self.style, self.waist, self.shape, self.inseam, self.wash
        )
    }
}

impl FromStr for SkuComponents {
    type Err = InvalidSkuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_sku(s).ok_or_else(|| InvalidSkuError::new(s))
    }
}

/// Parse `STYLE-WAIST-SHAPE-INSEAM-WASH`.
///
/// Returns `None` for anything that is not exactly
/// `^[A-Z]{2}-\d{2}-[A-Z]-\d{2}-[A-Z]{3}$` with waist and inseam in range.
/// Half-typed input is routine, so this is a query and never an error.
pub fn parse_sku(text: &str) -> Option<SkuComponents> {
    let mut fields = text.split('-');

    let style = StyleCode::parse(fields.next()?)?;
    let waist = parse_measure(fields.next()?, &WAIST_RANGE)?;
    let shape = ShapeCode::parse(fields.next()?)?;
    let inseam = parse_measure(fields.next()?, &INSEAM_RANGE)?;
    let wash = WashCode::parse(fields.next()?)?;

    if fields.next().is_some() {
        return None;
    }

    Some(SkuComponents {
        style,
        waist,
        shape,
        inseam,
        wash,
    })
}

/// Format components as canonical SKU text, rejecting out-of-range values.
pub fn build_sku(components: &SkuComponents) -> Result<String, SkuError> {
    components.validate()?;
    Ok(components.to_string())
}

fn parse_measure(field: &str, range: &RangeInclusive<u8>) -> Option<u8> {
    if field.len() != 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<u8>().ok().filter(|value| range.contains(value))
}
