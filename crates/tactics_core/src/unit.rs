//! Combatants on the battle grid.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buff::ActiveBuff;
use crate::data::{BuffTemplate, Trait, UnitClass, UnitTemplate};
use crate::factions::Faction;
use crate::math::{Fixed, GridPos};

/// Stable identity of a unit for the whole battle.
///
/// Ids are allocated in spawn order and never reused, so iteration over a
/// `BTreeMap<UnitId, _>` is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of adding a buff to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuffChange {
    /// A new instance was applied.
    Applied,
    /// An existing instance gained a stack and a fresh duration.
    Stacked {
        /// Stack count after stacking.
        stacks: u32,
    },
}

/// A mutable combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Identity.
    pub id: UnitId,
    /// Catalog template this unit was created from.
    pub template_id: String,
    /// Display name (changes on promotion).
    pub name: String,
    /// Unit class.
    pub class: UnitClass,
    /// Current health, within `[0, max_health]`.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Base damage per attack.
    pub attack: u32,
    /// Attack range (Manhattan).
    pub attack_range: u32,
    /// Move range (Manhattan).
    pub move_range: u32,
    /// Attack speed rating.
    #[serde(with = "crate::math::fixed_serde")]
    pub attack_speed: Fixed,
    /// Critical chance in `[0, 1]`.
    #[serde(with = "crate::math::fixed_serde")]
    pub critical_chance: Fixed,
    /// Conditional combat traits.
    pub traits: Vec<Trait>,
    /// Owning faction.
    pub faction: Faction,
    /// Current cell.
    pub position: GridPos,
    /// Moved this turn.
    pub has_moved: bool,
    /// Attacked this turn.
    pub has_attacked: bool,
    /// Distance covered by the last move this turn.
    pub move_distance: u32,
    /// Attacks made this battle.
    pub attacks_made: u32,
    /// Active buffs in application order.
    pub buffs: Vec<ActiveBuff>,
    /// Accumulated fraction of incoming damage removed.
    #[serde(with = "crate::math::fixed_serde")]
    pub damage_reduction: Fixed,
    /// Pending first-attack damage multiplier.
    #[serde(with = "crate::math::option_fixed_serde")]
    pub first_strike: Option<Fixed>,
    /// May move again after its next kill.
    pub pursuit_ready: bool,
    /// Already promoted by a mobility formation.
    pub promoted: bool,
}

impl Unit {
    /// Instantiate a template.
    #[must_use]
    pub fn from_template(
        id: UnitId,
        template: &UnitTemplate,
        faction: Faction,
        position: GridPos,
    ) -> Self {
        Self {
            id,
            template_id: template.id.clone(),
            name: template.name.clone(),
            class: template.class.clone(),
            health: template.health,
            max_health: template.health,
            attack: template.attack,
            attack_range: template.attack_range,
            move_range: template.move_range,
            attack_speed: template.attack_speed,
            critical_chance: template.critical_chance,
            traits: template.traits.clone(),
            faction,
            position,
            has_moved: false,
            has_attacked: false,
            move_distance: 0,
            attacks_made: 0,
            buffs: Vec::new(),
            damage_reduction: Fixed::ZERO,
            first_strike: None,
            pursuit_ready: false,
            promoted: false,
        }
    }

    /// Whether the unit still stands.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Whether the unit carries a trait.
    #[must_use]
    pub fn has_trait(&self, t: &Trait) -> bool {
        self.traits.contains(t)
    }

    /// Lose health, saturating at zero. Returns the health left.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.health = self.health.saturating_sub(amount);
        self.health
    }

    /// Raise both current and maximum health.
    pub fn grant_health(&mut self, amount: u32) {
        self.max_health = self.max_health.saturating_add(amount);
        self.health = self.health.saturating_add(amount);
    }

    /// Clear per-turn action flags.
    pub fn reset_turn_flags(&mut self) {
        self.has_moved = false;
        self.has_attacked = false;
        self.move_distance = 0;
    }

    /// Add a buff, stacking onto an existing instance of the same template.
    pub fn add_buff(&mut self, template: &BuffTemplate) -> BuffChange {
        if let Some(existing) = self.buffs.iter_mut().find(|b| b.template_id == template.id) {
            existing.stack();
            return BuffChange::Stacked {
                stacks: existing.stacks,
            };
        }
        let mut buff = ActiveBuff::from_template(template);
        buff.apply(self);
        self.buffs.push(buff);
        BuffChange::Applied
    }

    /// Remove a buff by template id, reverting its effect.
    /// Returns `false` if no such buff was active.
    pub fn remove_buff(&mut self, template_id: &str) -> bool {
        let Some(index) = self.buffs.iter().position(|b| b.template_id == template_id) else {
            return false;
        };
        let mut buff = self.buffs.remove(index);
        buff.revert(self);
        self.refresh_first_strike();
        true
    }

    /// Count every buff down one turn and revert the expired ones.
    /// Returns the template ids that expired, in application order.
    pub fn expire_buffs(&mut self) -> Vec<String> {
        let (expired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.buffs)
            .into_iter()
            .map(|mut b| {
                let done = b.tick_down();
                (b, done)
            })
            .partition(|(_, done)| *done);
        self.buffs = kept.into_iter().map(|(b, _)| b).collect();

        let mut ids = Vec::with_capacity(expired.len());
        for (mut buff, _) in expired {
            buff.revert(self);
            ids.push(buff.template_id);
        }
        if !ids.is_empty() {
            self.refresh_first_strike();
        }
        ids
    }

    /// Spend the pending first-attack boost and every buff that backs it.
    pub fn consume_first_strike(&mut self) {
        self.first_strike = None;
        for buff in &mut self.buffs {
            buff.spend_first_strike();
        }
    }

    /// Pending first strike comes from the newest boost still unspent.
    fn refresh_first_strike(&mut self) {
        self.first_strike = self
            .buffs
            .iter()
            .rev()
            .find_map(ActiveBuff::pending_first_strike);
    }

    #[cfg(test)]
    pub(crate) fn for_tests(id: UnitId, faction: Faction, position: GridPos) -> Self {
        let template = UnitTemplate {
            id: "test".to_string(),
            name: "Test".to_string(),
            description: String::new(),
            class: UnitClass::Infantry,
            health: 10,
            attack: 4,
            attack_range: 1,
            move_range: 2,
            attack_speed: Fixed::ONE,
            critical_chance: Fixed::ZERO,
            traits: Vec::new(),
        };
        Self::from_template(id, &template, faction, position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EffectDetails;

    fn shield_wall(duration: u32) -> BuffTemplate {
        BuffTemplate {
            id: "shield_wall".to_string(),
            name: "Shield Wall".to_string(),
            description: String::new(),
            effect_type: "damage_reduction".to_string(),
            effect: EffectDetails {
                damage_reduction: Some(Fixed::from_num(0.25)),
                ..EffectDetails::default()
            },
            duration,
            max_stacks: 3,
        }
    }

    #[test]
    fn test_take_damage_saturates() {
        let mut unit = Unit::for_tests(UnitId(1), Faction::Enemy, GridPos::new(0, 0));
        assert_eq!(unit.take_damage(4), 6);
        assert_eq!(unit.take_damage(100), 0);
        assert!(!unit.is_alive());
    }

    #[test]
    fn test_same_template_stacks_instead_of_duplicating() {
        let mut unit = Unit::for_tests(UnitId(1), Faction::Player, GridPos::new(0, 0));
        assert_eq!(unit.add_buff(&shield_wall(2)), BuffChange::Applied);
        assert_eq!(
            unit.add_buff(&shield_wall(2)),
            BuffChange::Stacked { stacks: 2 }
        );
        assert_eq!(unit.buffs.len(), 1);
        // Stacking does not re-apply.
        assert_eq!(unit.damage_reduction, Fixed::from_num(0.25));
    }

    #[test]
    fn test_expiry_restores_stats() {
        let mut unit = Unit::for_tests(UnitId(1), Faction::Player, GridPos::new(0, 0));
        unit.add_buff(&shield_wall(2));
        assert!(unit.expire_buffs().is_empty());
        assert_eq!(unit.expire_buffs(), vec!["shield_wall".to_string()]);
        assert_eq!(unit.damage_reduction, Fixed::ZERO);
        assert!(unit.buffs.is_empty());
    }

    #[test]
    fn test_remove_buff() {
        let mut unit = Unit::for_tests(UnitId(1), Faction::Player, GridPos::new(0, 0));
        unit.add_buff(&shield_wall(5));
        assert!(unit.remove_buff("shield_wall"));
        assert!(!unit.remove_buff("shield_wall"));
        assert_eq!(unit.damage_reduction, Fixed::ZERO);
    }

    fn first_attack_boost(id: &str, multiplier: i32, duration: u32) -> BuffTemplate {
        BuffTemplate {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            effect_type: "first_attack_boost".to_string(),
            effect: EffectDetails {
                first_attack_multiplier: Some(Fixed::from_num(multiplier)),
                ..EffectDetails::default()
            },
            duration,
            max_stacks: 1,
        }
    }

    #[test]
    fn test_expired_boost_is_not_restored_by_a_later_expiry() {
        let mut unit = Unit::for_tests(UnitId(1), Faction::Player, GridPos::new(0, 0));
        unit.add_buff(&first_attack_boost("ambush", 2, 1));
        unit.add_buff(&first_attack_boost("charge", 3, 3));
        assert_eq!(unit.first_strike, Some(Fixed::from_num(3)));

        assert_eq!(unit.expire_buffs(), vec!["ambush".to_string()]);
        assert_eq!(unit.first_strike, Some(Fixed::from_num(3)));
        unit.expire_buffs();
        assert_eq!(unit.expire_buffs(), vec!["charge".to_string()]);
        assert!(unit.buffs.is_empty());
        assert_eq!(unit.first_strike, None);
    }

    #[test]
    fn test_removing_newest_boost_falls_back_to_older_live_one() {
        let mut unit = Unit::for_tests(UnitId(1), Faction::Player, GridPos::new(0, 0));
        unit.add_buff(&first_attack_boost("ambush", 2, 4));
        unit.add_buff(&first_attack_boost("charge", 3, 4));
        assert!(unit.remove_buff("charge"));
        assert_eq!(unit.first_strike, Some(Fixed::from_num(2)));
        assert!(unit.remove_buff("ambush"));
        assert_eq!(unit.first_strike, None);
    }

    #[test]
    fn test_consumed_boost_stays_spent() {
        let mut unit = Unit::for_tests(UnitId(1), Faction::Player, GridPos::new(0, 0));
        unit.add_buff(&first_attack_boost("ambush", 2, 4));
        unit.add_buff(&shield_wall(1));
        unit.consume_first_strike();
        assert_eq!(unit.expire_buffs(), vec!["shield_wall".to_string()]);
        assert_eq!(unit.first_strike, None);
        assert!(unit.remove_buff("ambush"));
        assert_eq!(unit.first_strike, None);
    }

    #[test]
    fn test_grant_health_raises_both() {
        let mut unit = Unit::for_tests(UnitId(1), Faction::Player, GridPos::new(0, 0));
        unit.take_damage(2);
        unit.grant_health(3);
        assert_eq!((unit.health, unit.max_health), (11, 13));
    }
}
