//! Attack resolution with trait-conditional modifiers.
//!
//! Resolution is a pure function of attacker, defender and one random draw:
//! - Traits produce a transient [`Modifiers`] set that never touches the units
//! - A pending first-attack boost multiplies the first attack of the battle
//! - A draw below the critical chance multiplies damage by 1.5
//! - Damage reduction removes a fraction, but at least [`MIN_DAMAGE`] lands
//!
//! Every multiplication rounds to the nearest integer before the next step.

use serde::{Deserialize, Serialize};

use crate::data::{Trait, UnitClass};
use crate::math::{percent, scale_round, Fixed};
use crate::unit::Unit;

/// Minimum damage (attacks always do at least 1 damage).
pub const MIN_DAMAGE: u32 = 1;

/// Damage multiplier of a critical hit.
pub const CRIT_MULTIPLIER: Fixed = Fixed::from_bits(0x1_8000_0000);

/// Deep strike needs a move longer than this many cells.
pub const DEEP_STRIKE_MIN_DISTANCE: u32 = 3;

/// Crit chance gained by deep strike.
pub const DEEP_STRIKE_CRIT_PERCENT: i32 = 30;

/// Extra deep strike crit chance against archers.
pub const DEEP_STRIKE_ARCHER_PERCENT: i32 = 15;

/// Attack bonus of precision against infantry.
pub const PRECISION_BONUS_PERCENT: i32 = 20;

/// Share of cavalry attack that gets through steadfast.
pub const STEADFAST_RETAINED_PERCENT: i32 = 70;

/// Crit chance melee attackers gain against fragile units.
pub const FRAGILE_CRIT_PERCENT: i32 = 30;

/// Transient attack values for one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    /// Effective attack.
    pub attack: u32,
    /// Effective critical chance, clamped to `[0, 1]`.
    pub critical_chance: Fixed,
}

impl Modifiers {
    /// Evaluate attacker traits, then defender traits.
    #[must_use]
    pub fn evaluate(attacker: &Unit, defender: &Unit) -> Self {
        let mut attack = attacker.attack;
        let mut crit = attacker.critical_chance;

        for t in &attacker.traits {
            match t {
                Trait::DeepStrike if attacker.move_distance > DEEP_STRIKE_MIN_DISTANCE => {
                    crit += percent(DEEP_STRIKE_CRIT_PERCENT);
                    if defender.class == UnitClass::Archer {
                        crit += percent(DEEP_STRIKE_ARCHER_PERCENT);
                    }
                }
                Trait::Precision if defender.class == UnitClass::Infantry => {
                    attack += scale_round(attack, percent(PRECISION_BONUS_PERCENT));
                }
                _ => {}
            }
        }

        for t in &defender.traits {
            match t {
                Trait::Steadfast if attacker.class == UnitClass::Cavalry => {
                    attack = scale_round(attack, percent(STEADFAST_RETAINED_PERCENT));
                }
                Trait::Fragile if attacker.attack_range <= 1 => {
                    crit += percent(FRAGILE_CRIT_PERCENT);
                }
                _ => {}
            }
        }

        Self {
            attack,
            critical_chance: crit.clamp(Fixed::ZERO, Fixed::ONE),
        }
    }
}

/// Result of one resolved attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Damage dealt.
    pub damage: u32,
    /// Whether the draw scored a critical hit.
    pub is_critical: bool,
    /// Whether a first-attack boost was spent.
    pub used_first_strike: bool,
}

/// Resolve `attacker` hitting `defender` with the draw `roll` in `[0, 1)`.
///
/// Neither unit is modified; the caller applies the outcome.
#[must_use]
pub fn resolve_attack(attacker: &Unit, defender: &Unit, roll: Fixed) -> AttackOutcome {
    let mods = Modifiers::evaluate(attacker, defender);
    let mut damage = mods.attack;

    let first_strike = attacker
        .first_strike
        .filter(|_| attacker.attacks_made == 0);
    if let Some(multiplier) = first_strike {
        damage = scale_round(damage, multiplier);
    }

    let is_critical = roll < mods.critical_chance;
    if is_critical {
        damage = scale_round(damage, CRIT_MULTIPLIER);
    }

    if defender.damage_reduction > Fixed::ZERO {
        damage = scale_round(damage, Fixed::ONE - defender.damage_reduction);
    }

    AttackOutcome {
        damage: damage.max(MIN_DAMAGE),
        is_critical,
        used_first_strike: first_strike.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factions::Faction;
    use crate::math::GridPos;
    use crate::unit::UnitId;

    const NO_CRIT: Fixed = Fixed::from_bits(0xFFFF_FFFF);

    fn unit(class: UnitClass, attack: u32) -> Unit {
        let mut u = Unit::for_tests(UnitId(1), Faction::Player, GridPos::new(0, 0));
        u.class = class;
        u.attack = attack;
        u
    }

    #[test]
    fn test_plain_attack() {
        let attacker = unit(UnitClass::Infantry, 100);
        let defender = unit(UnitClass::Infantry, 1);
        let outcome = resolve_attack(&attacker, &defender, NO_CRIT);
        assert_eq!(outcome.damage, 100);
        assert!(!outcome.is_critical);
    }

    #[test]
    fn test_damage_reduction_half() {
        let attacker = unit(UnitClass::Infantry, 100);
        let mut defender = unit(UnitClass::Infantry, 1);
        defender.damage_reduction = Fixed::from_num(0.5);
        assert_eq!(resolve_attack(&attacker, &defender, NO_CRIT).damage, 50);
    }

    #[test]
    fn test_minimum_damage() {
        let attacker = unit(UnitClass::Infantry, 1);
        let mut defender = unit(UnitClass::Infantry, 1);
        defender.damage_reduction = Fixed::from_num(0.9);
        assert_eq!(resolve_attack(&attacker, &defender, NO_CRIT).damage, MIN_DAMAGE);
    }

    #[test]
    fn test_critical_hit() {
        let mut attacker = unit(UnitClass::Infantry, 7);
        attacker.critical_chance = Fixed::from_num(0.5);
        let defender = unit(UnitClass::Infantry, 1);
        let hit = resolve_attack(&attacker, &defender, Fixed::from_num(0.25));
        assert!(hit.is_critical);
        assert_eq!(hit.damage, 11);
        assert!(!resolve_attack(&attacker, &defender, Fixed::from_num(0.5)).is_critical);
    }

    #[test]
    fn test_precision_is_transient() {
        let mut attacker = unit(UnitClass::Archer, 10);
        attacker.traits.push(Trait::Precision);
        let infantry = unit(UnitClass::Infantry, 1);
        let cavalry = unit(UnitClass::Cavalry, 1);
        assert_eq!(resolve_attack(&attacker, &infantry, NO_CRIT).damage, 12);
        assert_eq!(resolve_attack(&attacker, &infantry, NO_CRIT).damage, 12);
        assert_eq!(resolve_attack(&attacker, &cavalry, NO_CRIT).damage, 10);
        assert_eq!(attacker.attack, 10);
    }

    #[test]
    fn test_steadfast_blunts_cavalry() {
        let attacker = unit(UnitClass::Cavalry, 10);
        let mut defender = unit(UnitClass::Infantry, 1);
        defender.traits.push(Trait::Steadfast);
        assert_eq!(resolve_attack(&attacker, &defender, NO_CRIT).damage, 7);
    }

    #[test]
    fn test_deep_strike_needs_long_move() {
        let mut attacker = unit(UnitClass::Cavalry, 10);
        attacker.traits.push(Trait::DeepStrike);
        let archer = unit(UnitClass::Archer, 1);

        attacker.move_distance = 3;
        let mods = Modifiers::evaluate(&attacker, &archer);
        assert_eq!(mods.critical_chance, Fixed::ZERO);

        attacker.move_distance = 4;
        let mods = Modifiers::evaluate(&attacker, &archer);
        assert_eq!(mods.critical_chance, percent(30) + percent(15));
    }

    #[test]
    fn test_fragile_raises_melee_crit() {
        let attacker = unit(UnitClass::Infantry, 10);
        let mut defender = unit(UnitClass::Archer, 1);
        defender.traits.push(Trait::Fragile);
        assert_eq!(
            Modifiers::evaluate(&attacker, &defender).critical_chance,
            percent(30)
        );
    }

    #[test]
    fn test_first_strike_only_on_first_attack() {
        let mut attacker = unit(UnitClass::Infantry, 10);
        attacker.first_strike = Some(Fixed::from_num(2));
        let defender = unit(UnitClass::Infantry, 1);
        let outcome = resolve_attack(&attacker, &defender, NO_CRIT);
        assert_eq!(outcome.damage, 20);
        assert!(outcome.used_first_strike);

        attacker.attacks_made = 1;
        let outcome = resolve_attack(&attacker, &defender, NO_CRIT);
        assert_eq!(outcome.damage, 10);
        assert!(!outcome.used_first_strike);
    }

    #[test]
    fn test_crit_chance_clamped() {
        let mut attacker = unit(UnitClass::Cavalry, 10);
        attacker.critical_chance = Fixed::from_num(0.9);
        attacker.traits.push(Trait::DeepStrike);
        attacker.move_distance = 5;
        let defender = unit(UnitClass::Archer, 1);
        assert_eq!(
            Modifiers::evaluate(&attacker, &defender).critical_chance,
            Fixed::ONE
        );
    }
}
