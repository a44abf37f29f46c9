//! Fixed-width uppercase letter codes (style, shape, wash).

use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An `N`-letter code made only of ASCII uppercase letters.
///
/// Stored inline so SKU components stay `Copy`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LetterCode<const N: usize>(pub(crate) [u8; N]);

/// Two-letter style code (e.g. `ST`, `SL`, `RL`).
pub type StyleCode = LetterCode<2>;

/// One-letter shape code (e.g. `S`, `R`, `X`).
pub type ShapeCode = LetterCode<1>;

/// Three-letter wash code (e.g. `RAW`, `STA`, `ONX`).
pub type WashCode = LetterCode<3>;

impl<const N: usize> LetterCode<N> {
    /// Parse exactly `N` ASCII uppercase letters; anything else is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        if bytes.len() != N || !bytes.iter().all(u8::is_ascii_uppercase) {
            return None;
        }
        let mut letters = [0u8; N];
        letters.copy_from_slice(bytes);
        Some(Self(letters))
    }

    pub fn as_str(&self) -> &str {
        // Construction only admits ASCII, so this never falls back.
        core::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl<const N: usize> core::fmt::Display for LetterCode<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> core::fmt::Debug for LetterCode<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// Error returned when text is not an `N`-letter uppercase code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} uppercase letters, got {found:?}")]
pub struct InvalidLetterCode {
    pub expected: usize,
    pub found: String,
}

impl<const N: usize> FromStr for LetterCode<N> {
    type Err = InvalidLetterCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidLetterCode {
            expected: N,
            found: s.to_string(),
        })
    }
}

impl<const N: usize> Serialize for LetterCode<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de, const N: usize> Deserialize<'de> for LetterCode<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
