//! Unit templates for data-driven unit definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// Broad class of a unit; traits key their conditions off it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UnitClass {
    /// Foot soldiers - the basic class.
    Infantry,
    /// Mounted units.
    Cavalry,
    /// Ranged units.
    Archer,
    /// A class this engine has no rules for.
    Other(String),
}

impl UnitClass {
    /// Catalog key for this class.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Infantry => "infantry",
            Self::Cavalry => "cavalry",
            Self::Archer => "archer",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for UnitClass {
    fn from(value: String) -> Self {
        match value.as_str() {
            "infantry" => Self::Infantry,
            "cavalry" => Self::Cavalry,
            "archer" => Self::Archer,
            _ => Self::Other(value),
        }
    }
}

impl From<UnitClass> for String {
    fn from(value: UnitClass) -> Self {
        value.key().to_string()
    }
}

impl fmt::Display for UnitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Always-on conditional combat modifier attached to a unit.
///
/// Unrecognised catalog keys load as [`Trait::Unknown`] and have no effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Trait {
    /// Long charges sharpen critical strikes, especially against archers.
    DeepStrike,
    /// Bonus attack against infantry.
    Precision,
    /// Blunts incoming cavalry attacks.
    Steadfast,
    /// Melee attackers crit more easily against this unit.
    Fragile,
    /// A trait this engine has no rules for.
    Unknown(String),
}

impl Trait {
    /// Catalog key for this trait.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::DeepStrike => "deep_strike",
            Self::Precision => "precision",
            Self::Steadfast => "steadfast",
            Self::Fragile => "fragile",
            Self::Unknown(name) => name,
        }
    }
}

impl From<String> for Trait {
    fn from(value: String) -> Self {
        match value.as_str() {
            "deep_strike" => Self::DeepStrike,
            "precision" => Self::Precision,
            "steadfast" => Self::Steadfast,
            "fragile" => Self::Fragile,
            _ => Self::Unknown(value),
        }
    }
}

impl From<Trait> for String {
    fn from(value: Trait) -> Self {
        value.key().to_string()
    }
}

/// Data-driven unit definition.
///
/// # Example RON
///
/// ```ron
/// UnitTemplate(
///     id: "cavalry",
///     name: "Chariot Rider",
///     class: "cavalry",
///     health: 24,
///     attack: 7,
///     attack_range: 1,
///     move_range: 4,
///     critical_chance: 0.1,
///     traits: ["deep_strike"],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTemplate {
    /// Unique string identifier for this unit type.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Flavour text.
    #[serde(default)]
    pub description: String,

    /// Unit class.
    pub class: UnitClass,

    /// Maximum health points.
    pub health: u32,

    /// Base damage per attack.
    pub attack: u32,

    /// Attack range in cells (Manhattan).
    pub attack_range: u32,

    /// Movement range in cells (Manhattan).
    pub move_range: u32,

    /// Attacks per turn rating; scaled by team buffs.
    #[serde(with = "fixed_serde", default = "default_attack_speed")]
    pub attack_speed: Fixed,

    /// Probability of a critical strike in `[0, 1]`.
    #[serde(with = "fixed_serde", default)]
    pub critical_chance: Fixed,

    /// Conditional combat traits.
    #[serde(default)]
    pub traits: Vec<Trait>,
}

fn default_attack_speed() -> Fixed {
    Fixed::ONE
}

impl UnitTemplate {
    /// Check if this template carries a trait.
    #[must_use]
    pub fn has_trait(&self, t: &Trait) -> bool {
        self.traits.contains(t)
    }

    /// Traits this engine does not recognise.
    pub fn unknown_traits(&self) -> impl Iterator<Item = &str> {
        self.traits.iter().filter_map(|t| match t {
            Trait::Unknown(name) => Some(name.as_str()),
            _ => None,
        })
    }
}
