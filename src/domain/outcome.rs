//! Outcome Normalization - Oracle Labels to Settlement Values
//!
//! Maps the outcome labels reported by the oracle providers onto the
//! binary settlement values the hub accepts. Unrecognized or
//! ambiguous labels are never guessed; the market stays pending and
//! is retried on a later cycle.

use serde::{Deserialize, Serialize};

/// Binary market outcome. Settles as 1 (Yes) or 0 (No) on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    No,
    Yes,
}

impl Outcome {
    /// Numeric settlement value: Yes → 1, No → 0.
    pub fn settlement_value(self) -> u8 {
        match self {
            Self::Yes => 1,
            Self::No => 0,
        }
    }

    /// Reconstruct from a persisted settlement value.
    pub fn from_settlement_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::No),
            1 => Some(Self::Yes),
            _ => None,
        }
    }

    /// Normalize a provider outcome label.
    ///
    /// Accepts the label spellings both known providers use. Anything
    /// else returns `None` — the caller must treat the market as not
    /// yet resolvable rather than guess.
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim() {
            l if l.eq_ignore_ascii_case("yes") => Some(Self::Yes),
            l if l.eq_ignore_ascii_case("no") => Some(Self::No),
            "1" => Some(Self::Yes),
            "0" => Some(Self::No),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}
