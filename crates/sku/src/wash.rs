//! Wash vocabulary and wash groups.
//!
//! Units whose washes share a group are treated as the same physical
//! treatment. Adding a wash is one variant here plus one arm in
//! [`KnownWash::group`]; the match keeps the table exhaustive.

use serde::{Deserialize, Serialize};

use crate::code::{LetterCode, WashCode};

/// Washes the workshop produces today.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KnownWash {
    Raw,
    Sta,
    Ind,
    Onx,
    Jag,
    Blk,
    Brw,
}

/// Equivalence group of a wash code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WashGroup {
    /// RAW and the light washes (STA, IND).
    Light,
    /// Dark washes (ONX, JAG).
    Dark,
    /// A wash that is only equivalent to itself.
    Single(WashCode),
}

impl KnownWash {
    pub const ALL: [KnownWash; 7] = [
        KnownWash::Raw,
        KnownWash::Sta,
        KnownWash::Ind,
        KnownWash::Onx,
        KnownWash::Jag,
        KnownWash::Blk,
        KnownWash::Brw,
    ];

    pub const fn code(self) -> WashCode {
        let letters = match self {
            KnownWash::Raw => *b"RAW",
            KnownWash::Sta => *b"STA",
            KnownWash::Ind => *b"IND",
            KnownWash::Onx => *b"ONX",
            KnownWash::Jag => *b"JAG",
            KnownWash::Blk => *b"BLK",
            KnownWash::Brw => *b"BRW",
        };
        LetterCode(letters)
    }

    pub fn from_code(code: WashCode) -> Option<Self> {
        Self::ALL.into_iter().find(|wash| wash.code() == code)
    }

    pub const fn group(self) -> WashGroup {
        match self {
            KnownWash::Raw | KnownWash::Sta | KnownWash::Ind => WashGroup::Light,
            KnownWash::Onx | KnownWash::Jag => WashGroup::Dark,
            KnownWash::Blk | KnownWash::Brw => WashGroup::Single(self.code()),
        }
    }
}

impl WashGroup {
    /// Wash code that stands for the whole group in universal SKUs.
    pub const fn representative(self) -> WashCode {
        match self {
            WashGroup::Light => KnownWash::Raw.code(),
            // TODO: confirm ONX over JAG as the dark representative with production.
            WashGroup::Dark => KnownWash::Onx.code(),
            WashGroup::Single(code) => code,
        }
    }
}

/// Group of any well-formed wash code. Unknown codes form their own group.
pub fn wash_group(wash: WashCode) -> WashGroup {
    match KnownWash::from_code(wash) {
        Some(known) => known.group(),
        None => WashGroup::Single(wash),
    }
}
