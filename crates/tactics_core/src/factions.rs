//! Faction identifiers.

use serde::{Deserialize, Serialize};

/// The two sides of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// The human-controlled side (Zhou coalition).
    Player,
    /// The AI-controlled side (Shang army).
    Enemy,
}

impl Faction {
    /// Both factions in turn order.
    pub const ALL: [Self; 2] = [Self::Player, Self::Enemy];

    /// The opposing faction.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }

    /// Get the display name for this faction.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Player => "Zhou Coalition",
            Self::Enemy => "Shang Army",
        }
    }

    /// Get the short name for this faction.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_is_involution() {
        for faction in Faction::ALL {
            assert_ne!(faction.opponent(), faction);
            assert_eq!(faction.opponent().opponent(), faction);
        }
    }
}
