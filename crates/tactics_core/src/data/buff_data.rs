//! Buff templates.
//!
//! Catalog entries name their effect with a string key plus a bag of
//! optional parameters. [`BuffTemplate::effect`] turns that into the closed
//! [`BuffEffect`] enum the engine matches on.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, option_fixed_serde, Fixed};

/// Effect parameters as authored in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectDetails {
    /// Fractional attack speed increase per stack (team buff).
    #[serde(with = "option_fixed_serde", default)]
    pub attack_speed_bonus: Option<Fixed>,

    /// Fraction of incoming damage removed per stack (damage reduction).
    #[serde(with = "option_fixed_serde", default)]
    pub damage_reduction: Option<Fixed>,

    /// Damage multiplier of the next first attack (first-attack boost).
    #[serde(with = "option_fixed_serde", default)]
    pub first_attack_multiplier: Option<Fixed>,
}

/// Typed buff effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffEffect {
    /// Scales attack speed.
    TeamBuff {
        /// Fractional bonus per stack.
        #[serde(with = "fixed_serde")]
        attack_speed_bonus: Fixed,
    },
    /// Adds to the unit's damage reduction.
    DamageReduction {
        /// Fraction removed per stack.
        #[serde(with = "fixed_serde")]
        reduction: Fixed,
    },
    /// Multiplies the damage of the unit's first attack of the battle.
    FirstAttackBoost {
        /// Damage multiplier.
        #[serde(with = "fixed_serde")]
        multiplier: Fixed,
    },
    /// An effect type this engine has no rules for; applies as a no-op.
    Unknown(String),
}

/// Data-driven buff definition.
///
/// # Example RON
///
/// ```ron
/// BuffTemplate(
///     id: "shield_wall",
///     name: "Shield Wall",
///     effect_type: "damage_reduction",
///     effect: (damage_reduction: 0.25),
///     duration: 2,
///     max_stacks: 2,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffTemplate {
    /// Unique string identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Flavour text.
    #[serde(default)]
    pub description: String,

    /// Effect key: `team_buff`, `damage_reduction` or `first_attack_boost`.
    pub effect_type: String,

    /// Effect parameters.
    #[serde(default)]
    pub effect: EffectDetails,

    /// Lifetime in owner turns.
    #[serde(default = "default_duration")]
    pub duration: u32,

    /// Maximum stack count.
    #[serde(default = "default_max_stacks")]
    pub max_stacks: u32,
}

/// Default buff lifetime in owner turns.
const fn default_duration() -> u32 {
    3
}

/// Default maximum stack count.
const fn default_max_stacks() -> u32 {
    1
}

impl BuffTemplate {
    /// Resolve the typed effect.
    ///
    /// Returns `None` when a recognised effect type lacks its parameter.
    #[must_use]
    pub fn effect(&self) -> Option<BuffEffect> {
        let details = &self.effect;
        match self.effect_type.as_str() {
            "team_buff" => details
                .attack_speed_bonus
                .map(|attack_speed_bonus| BuffEffect::TeamBuff { attack_speed_bonus }),
            "damage_reduction" => details
                .damage_reduction
                .map(|reduction| BuffEffect::DamageReduction { reduction }),
            "first_attack_boost" => details
                .first_attack_multiplier
                .map(|multiplier| BuffEffect::FirstAttackBoost { multiplier }),
            other => Some(BuffEffect::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_resolution() {
        let ron = r#"BuffTemplate(
            id: "shield_wall",
            name: "Shield Wall",
            effect_type: "damage_reduction",
            effect: (damage_reduction: 0.25),
        )"#;
        let template: BuffTemplate = crate::data::ron_options().from_str(ron).unwrap();
        assert_eq!(template.duration, 3);
        assert_eq!(template.max_stacks, 1);
        assert_eq!(
            template.effect(),
            Some(BuffEffect::DamageReduction {
                reduction: Fixed::from_num(0.25)
            })
        );
    }

    #[test]
    fn test_missing_parameter_is_none() {
        let template = BuffTemplate {
            id: "broken".to_string(),
            name: "Broken".to_string(),
            description: String::new(),
            effect_type: "team_buff".to_string(),
            effect: EffectDetails::default(),
            duration: 1,
            max_stacks: 1,
        };
        assert_eq!(template.effect(), None);
    }

    #[test]
    fn test_unknown_effect_type_is_tolerated() {
        let template = BuffTemplate {
            id: "omen".to_string(),
            name: "Omen".to_string(),
            description: String::new(),
            effect_type: "divination".to_string(),
            effect: EffectDetails::default(),
            duration: 1,
            max_stacks: 1,
        };
        assert_eq!(
            template.effect(),
            Some(BuffEffect::Unknown("divination".to_string()))
        );
    }
}
