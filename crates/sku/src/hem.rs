//! Hem styles and the inseam allowance each one consumes.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::SkuComponents;

/// Hem finish chosen for a line item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HemCode {
    /// Raw hem, no fold.
    Rwh,
    /// Standard stitched hem.
    Sth,
    /// Original roll.
    Orl,
    /// Half roll.
    Hrl,
}

impl HemCode {
    pub const ALL: [HemCode; 4] = [HemCode::Rwh, HemCode::Sth, HemCode::Orl, HemCode::Hrl];

    /// Signed inseam delta, in inches, applied when this hem is selected.
    pub const fn delta(self) -> i8 {
        match self {
            HemCode::Rwh => 0,
            HemCode::Sth => 1,
            HemCode::Orl => 2,
            HemCode::Hrl => 1,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            HemCode::Rwh => "RWH",
            HemCode::Sth => "STH",
            HemCode::Orl => "ORL",
            HemCode::Hrl => "HRL",
        }
    }
}

impl core::fmt::Display for HemCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown hem code: {0:?}")]
pub struct UnknownHemCode(pub String);

impl FromStr for HemCode {
    type Err = UnknownHemCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HemCode::ALL
            .into_iter()
            .find(|hem| hem.code() == s)
            .ok_or_else(|| UnknownHemCode(s.to_string()))
    }
}

/// Inseam delta for `hem`. Total over the enum.
pub fn hem_adjustment(hem: HemCode) -> i8 {
    hem.delta()
}

/// Re-express `components` for a new hem while keeping the finished length.
///
/// The base inseam is recovered by removing the old hem's delta, then the new
/// delta is applied. `None` if the result is not a producible inseam.
pub fn change_hem(components: &SkuComponents, from: HemCode, to: HemCode) -> Option<SkuComponents> {
    let base = i16::from(components.inseam) - i16::from(from.delta());
    let adjusted = base + i16::from(to.delta());
    let inseam = u8::try_from(adjusted).ok()?;
    components.with_inseam(inseam)
}
