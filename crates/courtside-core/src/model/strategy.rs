// Rotation strategy selector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How lineups are chosen for slots that have not been played yet.
///
/// Always passed explicitly to the scheduling entry points; nothing reads a
/// global "current strategy".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Lowest normalized play time first.
    Simple,
    /// Multi-factor priority score.
    Weighted,
    /// Five-level comparator favoring current-game minutes.
    Preferred,
    /// Hand-picked lineups, seeded from `Preferred` where missing.
    Manual,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Simple,
        Strategy::Weighted,
        Strategy::Preferred,
        Strategy::Manual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Simple => "simple",
            Strategy::Weighted => "weighted",
            Strategy::Preferred => "preferred",
            Strategy::Manual => "manual",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown strategy `{s}` (expected simple, weighted, preferred or manual)")
            })
    }
}
