//! The battlefield aggregate: grid, units and the two rosters.
//!
//! All mutation of units and tiles goes through here so that a unit's
//! position, its tile's occupant and its roster membership never drift
//! apart. Validation of player intent happens in the turn controller;
//! methods here assume their arguments were already checked.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::combat::{resolve_attack, AttackOutcome};
use crate::data::Catalog;
use crate::error::{InvariantViolation, Rejection, Result, SetupError, TargetIssue};
use crate::events::BattleEvent;
use crate::factions::Faction;
use crate::map::{Grid, Terrain};
use crate::math::{Fixed, GridPos};
use crate::scenario::Scenario;
use crate::turn::BattleOutcome;
use crate::unit::{BuffChange, Unit, UnitId};

/// Grid, units and rosters of one battle.
#[derive(Debug, Clone)]
pub struct Battlefield {
    grid: Grid,
    units: BTreeMap<UnitId, Unit>,
    player_roster: Vec<UnitId>,
    enemy_roster: Vec<UnitId>,
    player_rear: GridPos,
    enemy_rear: GridPos,
    catalog: Arc<Catalog>,
    next_id: u32,
}

impl Battlefield {
    /// Create an empty battlefield.
    #[must_use]
    pub fn new(grid: Grid, catalog: Arc<Catalog>, player_rear: GridPos, enemy_rear: GridPos) -> Self {
        Self {
            grid,
            units: BTreeMap::new(),
            player_roster: Vec::new(),
            enemy_roster: Vec::new(),
            player_rear,
            enemy_rear,
            catalog,
            next_id: 1,
        }
    }

    /// Build the opening position of a scenario.
    ///
    /// # Errors
    ///
    /// Fails fast on bad dimensions, unknown templates or bad placements.
    pub fn from_scenario(scenario: &Scenario, catalog: Arc<Catalog>) -> Result<Self> {
        let mut grid = Grid::new(scenario.rows, scenario.cols)?;
        for patch in &scenario.terrain {
            for row in patch.row..patch.row + patch.rows {
                for col in patch.col..patch.col + patch.cols {
                    grid.set_terrain(GridPos::new(row, col), patch.terrain);
                }
            }
        }

        let mut bf = Self::new(grid, catalog, scenario.player_rear, scenario.enemy_rear);
        let placements = scenario
            .player_units
            .iter()
            .map(|p| (p, Faction::Player))
            .chain(scenario.enemy_units.iter().map(|p| (p, Faction::Enemy)));
        for (placement, faction) in placements {
            let pos = GridPos::new(placement.row, placement.col);
            match bf.grid.check_enterable(pos) {
                Ok(()) => {}
                Err(TargetIssue::OutOfBounds) => {
                    return Err(SetupError::PlacementOutOfBounds {
                        unit: placement.unit.clone(),
                        row: pos.row,
                        col: pos.col,
                    })
                }
                Err(_) => {
                    return Err(SetupError::PlacementBlocked {
                        unit: placement.unit.clone(),
                        row: pos.row,
                        col: pos.col,
                    })
                }
            }
            bf.spawn_unit(&placement.unit, faction, pos)?;
        }
        for faction in [Faction::Player, Faction::Enemy] {
            if bf.roster(faction).is_empty() {
                return Err(SetupError::EmptyRoster(faction));
            }
        }

        tracing::debug!(
            rows = scenario.rows,
            cols = scenario.cols,
            player = bf.player_roster.len(),
            enemy = bf.enemy_roster.len(),
            "Battlefield built"
        );
        Ok(bf)
    }

    /// The grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Change the terrain of a cell. Occupants are kept.
    pub fn set_terrain(&mut self, pos: GridPos, terrain: Terrain) {
        self.grid.set_terrain(pos, terrain);
    }

    /// The catalog this battle draws templates from.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Shared handle to the catalog.
    #[must_use]
    pub fn catalog_handle(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    /// Rear anchor used by summon formations.
    #[must_use]
    pub const fn rear(&self, faction: Faction) -> GridPos {
        match faction {
            Faction::Player => self.player_rear,
            Faction::Enemy => self.enemy_rear,
        }
    }

    /// Live unit ids of a faction in roster order.
    #[must_use]
    pub fn roster(&self, faction: Faction) -> &[UnitId] {
        match faction {
            Faction::Player => &self.player_roster,
            Faction::Enemy => &self.enemy_roster,
        }
    }

    fn roster_mut(&mut self, faction: Faction) -> &mut Vec<UnitId> {
        match faction {
            Faction::Player => &mut self.player_roster,
            Faction::Enemy => &mut self.enemy_roster,
        }
    }

    /// Units of a faction in roster order.
    pub fn units_of(&self, faction: Faction) -> impl Iterator<Item = &Unit> {
        self.roster(faction)
            .iter()
            .filter_map(move |id| self.units.get(id))
    }

    /// All live units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Look up a live unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Mutable access to a live unit.
    ///
    /// Position and faction must only change through [`Battlefield`] methods.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// The unit standing on `pos`.
    #[must_use]
    pub fn unit_at(&self, pos: GridPos) -> Option<&Unit> {
        self.grid.occupant(pos).and_then(|id| self.units.get(&id))
    }

    /// Create a unit from a catalog template on an open cell.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::UnknownUnitTemplate`] for a missing template and
    /// [`SetupError::PlacementBlocked`] if the cell cannot be entered.
    pub fn spawn_unit(&mut self, template_id: &str, faction: Faction, pos: GridPos) -> Result<UnitId> {
        let template = self
            .catalog
            .unit(template_id)
            .ok_or_else(|| SetupError::UnknownUnitTemplate(template_id.to_string()))?;
        if self.grid.check_enterable(pos).is_err() {
            return Err(SetupError::PlacementBlocked {
                unit: template_id.to_string(),
                row: pos.row,
                col: pos.col,
            });
        }

        let id = UnitId(self.next_id);
        self.next_id += 1;
        let unit = Unit::from_template(id, template, faction, pos);
        self.grid.place(pos, id);
        self.units.insert(id, unit);
        self.roster_mut(faction).push(id);
        Ok(id)
    }

    /// Move a unit to an enterable cell. Returns the distance covered.
    pub(crate) fn move_unit(&mut self, id: UnitId, to: GridPos) -> u32 {
        let Some(unit) = self.units.get_mut(&id) else {
            return 0;
        };
        let from = unit.position;
        let distance = from.manhattan(to);
        unit.position = to;
        unit.has_moved = true;
        unit.move_distance = distance;
        self.grid.clear(from);
        self.grid.place(to, id);
        distance
    }

    /// Remove a unit from its tile and roster.
    pub fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.units.remove(&id)?;
        self.grid.clear(unit.position);
        self.roster_mut(unit.faction).retain(|u| *u != id);
        Some(unit)
    }

    /// Re-own a unit without moving it. Returns `false` if it was already
    /// on that side or does not exist.
    pub(crate) fn transfer_unit(&mut self, id: UnitId, to: Faction) -> bool {
        let Some(unit) = self.units.get_mut(&id) else {
            return false;
        };
        let from = unit.faction;
        if from == to {
            return false;
        }
        unit.faction = to;
        self.roster_mut(from).retain(|u| *u != id);
        self.roster_mut(to).push(id);
        true
    }

    /// Resolve an attack and apply its result.
    ///
    /// The defender is removed at zero health. A pursuit-ready attacker that
    /// kills regains its move.
    pub(crate) fn apply_attack(
        &mut self,
        attacker_id: UnitId,
        defender_id: UnitId,
        roll: Fixed,
        events: &mut Vec<BattleEvent>,
    ) -> Option<AttackOutcome> {
        let outcome = {
            let attacker = self.units.get(&attacker_id)?;
            let defender = self.units.get(&defender_id)?;
            resolve_attack(attacker, defender, roll)
        };

        let defender = self.units.get_mut(&defender_id)?;
        let defender_health = defender.take_damage(outcome.damage);
        let defender_faction = defender.faction;

        if let Some(attacker) = self.units.get_mut(&attacker_id) {
            attacker.has_attacked = true;
            attacker.attacks_made += 1;
            if outcome.used_first_strike {
                attacker.consume_first_strike();
            }
        }

        tracing::debug!(
            attacker = %attacker_id,
            defender = %defender_id,
            damage = outcome.damage,
            critical = outcome.is_critical,
            defender_health,
            "Attack resolved"
        );
        events.push(BattleEvent::AttackResolved {
            attacker: attacker_id,
            defender: defender_id,
            damage: outcome.damage,
            critical: outcome.is_critical,
            defender_health,
        });

        if defender_health == 0 {
            self.remove_unit(defender_id);
            events.push(BattleEvent::UnitDefeated {
                unit: defender_id,
                faction: defender_faction,
            });
            if let Some(attacker) = self.units.get_mut(&attacker_id) {
                if attacker.pursuit_ready {
                    attacker.pursuit_ready = false;
                    attacker.has_moved = false;
                    events.push(BattleEvent::PursuitTriggered { unit: attacker_id });
                }
            }
        }

        Some(outcome)
    }

    /// Apply a catalog buff to a unit.
    ///
    /// # Errors
    ///
    /// Rejects unknown units and unknown buff ids.
    pub fn apply_buff(
        &mut self,
        id: UnitId,
        buff_id: &str,
        events: &mut Vec<BattleEvent>,
    ) -> std::result::Result<(), Rejection> {
        let template = self
            .catalog
            .buff(buff_id)
            .ok_or(Rejection::target(TargetIssue::UnknownBuff))?;
        let unit = self
            .units
            .get_mut(&id)
            .ok_or(Rejection::target(TargetIssue::UnknownUnit))?;
        match unit.add_buff(template) {
            BuffChange::Applied => events.push(BattleEvent::BuffApplied {
                unit: id,
                buff: buff_id.to_string(),
            }),
            BuffChange::Stacked { stacks } => events.push(BattleEvent::BuffStacked {
                unit: id,
                buff: buff_id.to_string(),
                stacks,
            }),
        }
        Ok(())
    }

    /// Count down the buffs of every unit of `faction`, reverting expired ones.
    pub(crate) fn expire_buffs(&mut self, faction: Faction, events: &mut Vec<BattleEvent>) {
        let ids = self.roster(faction).to_vec();
        for id in ids {
            let Some(unit) = self.units.get_mut(&id) else {
                continue;
            };
            for buff in unit.expire_buffs() {
                tracing::debug!(unit = %id, buff = %buff, "Buff expired");
                events.push(BattleEvent::BuffExpired { unit: id, buff });
            }
        }
    }

    /// Clear action flags of every unit of `faction`.
    pub(crate) fn reset_turn_flags(&mut self, faction: Faction) {
        for id in self.roster(faction).to_vec() {
            if let Some(unit) = self.units.get_mut(&id) {
                unit.reset_turn_flags();
            }
        }
    }

    /// Spend both actions of a unit for the rest of the turn.
    pub(crate) fn exhaust(&mut self, id: UnitId) {
        if let Some(unit) = self.units.get_mut(&id) {
            unit.has_moved = true;
            unit.has_attacked = true;
        }
    }

    /// Whether an opposing unit stands within the unit's attack range.
    #[must_use]
    pub fn has_target_in_range(&self, id: UnitId) -> bool {
        let Some(unit) = self.units.get(&id) else {
            return false;
        };
        self.units_of(unit.faction.opponent())
            .any(|other| unit.position.manhattan(other.position) <= unit.attack_range)
    }

    /// Whether any open cell lies within the unit's move range.
    #[must_use]
    pub fn has_destination(&self, id: UnitId) -> bool {
        let Some(unit) = self.units.get(&id) else {
            return false;
        };
        // Bounded by the grid, not by the range.
        let origin = unit.position;
        self.grid.iter().any(|(pos, tile)| {
            pos != origin && tile.is_open() && origin.manhattan(pos) <= unit.move_range
        })
    }

    /// A unit cannot act further when its move is spent (or impossible) and
    /// its attack is spent (or has no target).
    #[must_use]
    pub fn is_exhausted(&self, id: UnitId) -> bool {
        let Some(unit) = self.units.get(&id) else {
            return true;
        };
        let move_done = unit.has_moved || !self.has_destination(id);
        let attack_done = unit.has_attacked || !self.has_target_in_range(id);
        move_done && attack_done
    }

    /// Terminal result, if any. An empty enemy roster wins even if the
    /// player roster is empty too.
    #[must_use]
    pub fn outcome(&self) -> Option<BattleOutcome> {
        if self.enemy_roster.is_empty() {
            Some(BattleOutcome::Win)
        } else if self.player_roster.is_empty() {
            Some(BattleOutcome::Loss)
        } else {
            None
        }
    }

    /// Verify tile, roster and health invariants.
    ///
    /// # Errors
    ///
    /// Describes the first violation found.
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantViolation> {
        let violation = |msg: String| Err(InvariantViolation(msg));

        for faction in Faction::ALL {
            for id in self.roster(faction) {
                match self.units.get(id) {
                    None => return violation(format!("roster entry {id} has no unit")),
                    Some(unit) if unit.faction != faction => {
                        return violation(format!("unit {id} is in the wrong roster"))
                    }
                    Some(_) => {}
                }
            }
        }
        if self.player_roster.len() + self.enemy_roster.len() != self.units.len() {
            return violation("unit count does not match rosters".to_string());
        }

        for unit in self.units.values() {
            if unit.health == 0 || unit.health > unit.max_health {
                return violation(format!(
                    "unit {} health {}/{} out of bounds",
                    unit.id, unit.health, unit.max_health
                ));
            }
            if self.grid.occupant(unit.position) != Some(unit.id) {
                return violation(format!(
                    "unit {} at {} is not its tile's occupant",
                    unit.id, unit.position
                ));
            }
        }

        let occupied = self.grid.iter().filter(|(_, t)| t.occupant.is_some()).count();
        if occupied != self.units.len() {
            return violation(format!(
                "{occupied} occupied tiles for {} units",
                self.units.len()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{UnitClass, UnitTemplate};

    fn catalog() -> Arc<Catalog> {
        let template = |id: &str, health: u32, attack: u32| UnitTemplate {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            class: UnitClass::Infantry,
            health,
            attack,
            attack_range: 1,
            move_range: 2,
            attack_speed: Fixed::ONE,
            critical_chance: Fixed::ZERO,
            traits: Vec::new(),
        };
        Arc::new(Catalog {
            units: vec![template("soldier", 10, 4), template("giant", 50, 100)],
            ..Catalog::default()
        })
    }

    fn battlefield() -> Battlefield {
        let grid = Grid::new(6, 6).unwrap();
        Battlefield::new(grid, catalog(), GridPos::new(4, 4), GridPos::new(0, 0))
    }

    #[test]
    fn test_spawn_and_move_keep_tiles_in_sync() {
        let mut bf = battlefield();
        let id = bf.spawn_unit("soldier", Faction::Player, GridPos::new(2, 2)).unwrap();
        assert_eq!(bf.move_unit(id, GridPos::new(3, 3)), 2);
        assert_eq!(bf.grid().occupant(GridPos::new(2, 2)), None);
        assert_eq!(bf.unit_at(GridPos::new(3, 3)).map(|u| u.id), Some(id));
        assert!(bf.check_invariants().is_ok());
    }

    #[test]
    fn test_spawn_rejects_unknown_template_and_blocked_cell() {
        let mut bf = battlefield();
        assert!(matches!(
            bf.spawn_unit("dragon", Faction::Player, GridPos::new(0, 0)),
            Err(SetupError::UnknownUnitTemplate(_))
        ));
        bf.spawn_unit("soldier", Faction::Player, GridPos::new(0, 0)).unwrap();
        assert!(matches!(
            bf.spawn_unit("soldier", Faction::Enemy, GridPos::new(0, 0)),
            Err(SetupError::PlacementBlocked { .. })
        ));
    }

    #[test]
    fn test_lethal_attack_removes_defender() {
        let mut bf = battlefield();
        let attacker = bf.spawn_unit("giant", Faction::Player, GridPos::new(2, 2)).unwrap();
        let defender = bf.spawn_unit("giant", Faction::Enemy, GridPos::new(2, 3)).unwrap();
        let mut events = Vec::new();
        let outcome = bf
            .apply_attack(attacker, defender, Fixed::from_num(0.99), &mut events)
            .unwrap();
        assert_eq!(outcome.damage, 100);
        assert!(bf.unit(defender).is_none());
        assert!(bf.roster(Faction::Enemy).is_empty());
        assert_eq!(bf.grid().occupant(GridPos::new(2, 3)), None);
        assert_eq!(bf.outcome(), Some(BattleOutcome::Win));
        assert!(events.contains(&BattleEvent::UnitDefeated {
            unit: defender,
            faction: Faction::Enemy
        }));
        assert!(bf.check_invariants().is_ok());
    }

    #[test]
    fn test_pursuit_restores_move_once() {
        let mut bf = battlefield();
        let attacker = bf.spawn_unit("giant", Faction::Player, GridPos::new(2, 2)).unwrap();
        let first = bf.spawn_unit("soldier", Faction::Enemy, GridPos::new(2, 3)).unwrap();
        bf.spawn_unit("soldier", Faction::Enemy, GridPos::new(5, 5)).unwrap();
        {
            let unit = bf.unit_mut(attacker).unwrap();
            unit.pursuit_ready = true;
            unit.has_moved = true;
        }
        let mut events = Vec::new();
        bf.apply_attack(attacker, first, Fixed::from_num(0.99), &mut events);
        let unit = bf.unit(attacker).unwrap();
        assert!(!unit.has_moved);
        assert!(!unit.pursuit_ready);
        assert!(events.contains(&BattleEvent::PursuitTriggered { unit: attacker }));
    }

    #[test]
    fn test_transfer_keeps_position() {
        let mut bf = battlefield();
        let id = bf.spawn_unit("soldier", Faction::Enemy, GridPos::new(1, 1)).unwrap();
        assert!(bf.transfer_unit(id, Faction::Player));
        assert!(!bf.transfer_unit(id, Faction::Player));
        assert_eq!(bf.roster(Faction::Player), &[id]);
        assert!(bf.roster(Faction::Enemy).is_empty());
        assert_eq!(bf.unit(id).unwrap().position, GridPos::new(1, 1));
        assert!(bf.check_invariants().is_ok());
    }

    #[test]
    fn test_exhaustion_rule() {
        let mut bf = battlefield();
        let id = bf.spawn_unit("soldier", Faction::Player, GridPos::new(0, 0)).unwrap();
        bf.spawn_unit("soldier", Faction::Enemy, GridPos::new(5, 5)).unwrap();
        assert!(!bf.is_exhausted(id));
        bf.unit_mut(id).unwrap().has_moved = true;
        // Nothing in reach, so the unattempted attack does not keep it active.
        assert!(bf.is_exhausted(id));
    }

    #[test]
    fn test_simultaneous_empty_rosters_is_a_win() {
        let bf = battlefield();
        assert_eq!(bf.outcome(), Some(BattleOutcome::Win));
    }
}
