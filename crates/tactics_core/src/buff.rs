//! Timed, stacking modifiers attached to a single unit.
//!
//! A buff records exactly what it changed when it was applied
//! ([`AppliedEffect`]) and reverting subtracts that record. Other buffs
//! touching the same stat in between do not disturb the round trip because
//! all bookkeeping is additive on [`Fixed`] values.

use serde::{Deserialize, Serialize};

use crate::data::{BuffEffect, BuffTemplate};
use crate::math::Fixed;
use crate::unit::Unit;

/// Ceiling on a unit's accumulated damage reduction.
pub const DAMAGE_REDUCTION_CAP: Fixed = Fixed::from_bits(0xE666_6666);

/// What applying a buff changed on its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppliedEffect {
    /// Attack speed was raised by `delta`.
    AttackSpeed {
        /// Amount added.
        #[serde(with = "crate::math::fixed_serde")]
        delta: Fixed,
    },
    /// Damage reduction was raised by `delta` (after the cap).
    DamageReduction {
        /// Amount added.
        #[serde(with = "crate::math::fixed_serde")]
        delta: Fixed,
    },
    /// A first-attack multiplier was installed and is still pending.
    FirstStrike {
        /// Multiplier installed.
        #[serde(with = "crate::math::fixed_serde")]
        multiplier: Fixed,
    },
    /// Nothing changed (unrecognised kind).
    None,
}

/// A buff instance living on a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveBuff {
    /// Catalog template id; also the stacking key.
    pub template_id: String,
    /// Typed effect.
    pub effect: BuffEffect,
    /// Owner turns left before expiry.
    pub remaining: u32,
    /// Full duration restored on stacking.
    pub duration: u32,
    /// Current stack count.
    pub stacks: u32,
    /// Stack ceiling.
    pub max_stacks: u32,
    /// Record used for exact reversal.
    pub applied: AppliedEffect,
}

impl ActiveBuff {
    /// Create an unapplied instance from a template.
    #[must_use]
    pub fn from_template(template: &BuffTemplate) -> Self {
        let effect = template
            .effect()
            .unwrap_or_else(|| BuffEffect::Unknown(template.effect_type.clone()));
        Self {
            template_id: template.id.clone(),
            effect,
            remaining: template.duration,
            duration: template.duration,
            stacks: 1,
            max_stacks: template.max_stacks.max(1),
            applied: AppliedEffect::None,
        }
    }

    /// Mutate `unit`, remembering the change.
    ///
    /// Strength scales with the stack count at the moment of application.
    pub fn apply(&mut self, unit: &mut Unit) {
        let stacks = Fixed::from_num(self.stacks);
        self.applied = match &self.effect {
            BuffEffect::TeamBuff { attack_speed_bonus } => {
                let delta = unit.attack_speed * *attack_speed_bonus * stacks;
                unit.attack_speed += delta;
                AppliedEffect::AttackSpeed { delta }
            }
            BuffEffect::DamageReduction { reduction } => {
                let target = (unit.damage_reduction + *reduction * stacks).min(DAMAGE_REDUCTION_CAP);
                let delta = (target - unit.damage_reduction).max(Fixed::ZERO);
                unit.damage_reduction += delta;
                AppliedEffect::DamageReduction { delta }
            }
            BuffEffect::FirstAttackBoost { multiplier } => {
                unit.first_strike = Some(*multiplier);
                AppliedEffect::FirstStrike {
                    multiplier: *multiplier,
                }
            }
            BuffEffect::Unknown(kind) => {
                tracing::warn!(buff = %self.template_id, kind = %kind, "Buff kind has no effect");
                AppliedEffect::None
            }
        };
    }

    /// Undo exactly what [`ActiveBuff::apply`] did.
    ///
    /// A first-strike boost only clears its own pending multiplier; the
    /// owning unit re-derives the pending value from its remaining boosts.
    pub fn revert(&mut self, unit: &mut Unit) {
        match self.applied {
            AppliedEffect::AttackSpeed { delta } => unit.attack_speed -= delta,
            AppliedEffect::DamageReduction { delta } => unit.damage_reduction -= delta,
            AppliedEffect::FirstStrike { multiplier } => {
                if unit.first_strike == Some(multiplier) {
                    unit.first_strike = None;
                }
            }
            AppliedEffect::None => {}
        }
        self.applied = AppliedEffect::None;
    }

    /// Multiplier this buff still holds pending, if any.
    #[must_use]
    pub fn pending_first_strike(&self) -> Option<Fixed> {
        match self.applied {
            AppliedEffect::FirstStrike { multiplier } => Some(multiplier),
            _ => None,
        }
    }

    /// Mark a pending first-strike boost as spent.
    pub fn spend_first_strike(&mut self) {
        if matches!(self.applied, AppliedEffect::FirstStrike { .. }) {
            self.applied = AppliedEffect::None;
        }
    }

    /// Add a stack (up to the ceiling) and restore full duration.
    ///
    /// The effect is not re-applied.
    pub fn stack(&mut self) {
        self.stacks = (self.stacks + 1).min(self.max_stacks);
        self.remaining = self.duration;
    }

    /// Count down one owner turn. Returns `true` once expired.
    pub fn tick_down(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EffectDetails;
    use crate::factions::Faction;
    use crate::math::{percent, GridPos};
    use crate::unit::UnitId;

    fn template(effect_type: &str, details: EffectDetails, max_stacks: u32) -> BuffTemplate {
        BuffTemplate {
            id: effect_type.to_string(),
            name: effect_type.to_string(),
            description: String::new(),
            effect_type: effect_type.to_string(),
            effect: details,
            duration: 2,
            max_stacks,
        }
    }

    fn unit() -> Unit {
        Unit::for_tests(UnitId(1), Faction::Player, GridPos::new(0, 0))
    }

    #[test]
    fn test_cap_matches_ninety_percent() {
        assert!((DAMAGE_REDUCTION_CAP - percent(90)).abs() < Fixed::from_bits(4));
    }

    #[test]
    fn test_damage_reduction_round_trip_under_cap() {
        let mut u = unit();
        u.damage_reduction = Fixed::from_num(0.75);
        let mut buff = ActiveBuff::from_template(&template(
            "damage_reduction",
            EffectDetails {
                damage_reduction: Some(Fixed::from_num(0.5)),
                ..EffectDetails::default()
            },
            1,
        ));
        buff.apply(&mut u);
        assert_eq!(u.damage_reduction, DAMAGE_REDUCTION_CAP);
        buff.revert(&mut u);
        assert_eq!(u.damage_reduction, Fixed::from_num(0.75));
    }

    #[test]
    fn test_team_buff_round_trip_is_exact() {
        let mut u = unit();
        u.attack_speed = Fixed::from_num(1.3);
        let before = u.attack_speed;
        let mut buff = ActiveBuff::from_template(&template(
            "team_buff",
            EffectDetails {
                attack_speed_bonus: Some(Fixed::from_num(0.15)),
                ..EffectDetails::default()
            },
            3,
        ));
        buff.apply(&mut u);
        assert!(u.attack_speed > before);
        u.attack_speed += Fixed::from_num(0.2);
        buff.revert(&mut u);
        assert_eq!(u.attack_speed, before + Fixed::from_num(0.2));
    }

    #[test]
    fn test_first_strike_revert_respects_consumption() {
        let mut u = unit();
        let mut buff = ActiveBuff::from_template(&template(
            "first_attack_boost",
            EffectDetails {
                first_attack_multiplier: Some(Fixed::from_num(2)),
                ..EffectDetails::default()
            },
            1,
        ));
        buff.apply(&mut u);
        assert_eq!(u.first_strike, Some(Fixed::from_num(2)));
        assert_eq!(buff.pending_first_strike(), Some(Fixed::from_num(2)));
        u.first_strike = None;
        buff.spend_first_strike();
        assert_eq!(buff.pending_first_strike(), None);
        buff.revert(&mut u);
        assert_eq!(u.first_strike, None);
    }

    #[test]
    fn test_stack_caps_and_resets_duration() {
        let mut buff = ActiveBuff::from_template(&template("team_buff", EffectDetails::default(), 2));
        assert!(!buff.tick_down());
        buff.stack();
        buff.stack();
        assert_eq!(buff.stacks, 2);
        assert_eq!(buff.remaining, 2);
        assert!(!buff.tick_down());
        assert!(buff.tick_down());
    }
}
