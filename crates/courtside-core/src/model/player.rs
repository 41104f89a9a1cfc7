// Player identity and the id newtypes shared across the workspace.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque player identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

/// Opaque game identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Generate a fresh random (UUID v4) identifier.
            pub fn generate() -> Self {
                $name(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(PlayerId);
string_id!(GameId);

/// A rostered player. Identity is immutable once created; the rotation
/// engine only ever reads players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub jersey_number: u16,
    /// Only consulted as a last-resort tie-break when ranking.
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// Create a new player with a generated id, stamped with the current time.
    pub fn new(name: &str, jersey_number: u16) -> Self {
        Player {
            id: PlayerId::generate(),
            name: name.trim().to_string(),
            jersey_number,
            created_at: Utc::now(),
        }
    }
}
