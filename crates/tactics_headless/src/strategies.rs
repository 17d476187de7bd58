//! Scripted player strategies for headless playtesting.
//!
//! A strategy plays the player side through the same commands a human
//! would issue, so every move it makes passes the controller's validation.
//! The enemy side is driven by the engine's own AI via `tick`.

use serde::{Deserialize, Serialize};
use tactics_core::events::BattleEvent;
use tactics_core::factions::Faction;
use tactics_core::math::GridPos;
use tactics_core::rng::RandomSource;
use tactics_core::turn::{BattleOutcome, TurnController, TurnState};
use tactics_core::unit::{Unit, UnitId};

/// How the scripted player behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Fire every ready formation, close in and attack.
    #[default]
    Aggressive,
    /// Fire formations and attack what is in range, but hold position.
    Defensive,
    /// End every turn without acting.
    Passive,
}

/// Summary of an autoplayed battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoplayReport {
    /// Result, or `None` if the turn limit was reached first.
    pub outcome: Option<BattleOutcome>,
    /// Turn number when play stopped.
    pub turns: u32,
    /// Events emitted over the whole battle.
    pub events: usize,
    /// Player units left standing.
    pub player_units: usize,
    /// Enemy units left standing.
    pub enemy_units: usize,
}

/// Play one player turn with `strategy`, ending it if units are left idle.
///
/// Returns every event emitted, including any the turn hand-off caused.
pub fn play_turn<R: RandomSource>(tc: &mut TurnController<R>, strategy: Strategy) -> Vec<BattleEvent> {
    let mut events = Vec::new();
    if tc.state() != TurnState::PlayerTurn {
        return events;
    }

    if strategy != Strategy::Passive {
        let ready: Vec<String> = tc
            .formations()
            .iter()
            .filter(|f| f.is_ready())
            .map(|f| f.id().to_string())
            .collect();
        for id in ready {
            // Arm, then confirm.
            for _ in 0..2 {
                if tc.state() != TurnState::PlayerTurn {
                    return events;
                }
                match tc.activate_formation(&id) {
                    Ok(emitted) => events.extend(emitted),
                    Err(rejection) => {
                        tracing::debug!(formation = %id, %rejection, "Formation skipped");
                        break;
                    }
                }
            }
        }

        let roster = tc.battlefield().roster(Faction::Player).to_vec();
        for id in roster {
            if tc.state() != TurnState::PlayerTurn {
                return events;
            }
            command_unit(tc, id, strategy, &mut events);
        }
    }

    if tc.state() == TurnState::PlayerTurn {
        if let Ok(emitted) = tc.end_turn() {
            events.extend(emitted);
        }
    }
    events
}

fn command_unit<R: RandomSource>(
    tc: &mut TurnController<R>,
    id: UnitId,
    strategy: Strategy,
    events: &mut Vec<BattleEvent>,
) {
    let Some(unit) = tc.battlefield().unit(id).cloned() else {
        return;
    };
    if tc.battlefield().is_exhausted(id) {
        return;
    }
    match tc.select_unit(unit.position) {
        Ok(emitted) => events.extend(emitted),
        Err(_) => return,
    }

    if weakest_in_range(tc, &unit).is_none() && strategy == Strategy::Aggressive && !unit.has_moved {
        if let Some(dest) = advance_cell(tc, &unit) {
            match tc.request_move(dest) {
                Ok(emitted) => events.extend(emitted),
                Err(rejection) => tracing::debug!(unit = %id, %rejection, "Move refused"),
            }
        }
    }

    if tc.state() != TurnState::PlayerTurn {
        return;
    }
    let Some(unit) = tc.battlefield().unit(id).cloned() else {
        return;
    };
    if unit.has_attacked {
        return;
    }
    if let Some(target) = weakest_in_range(tc, &unit) {
        match tc.request_attack(target) {
            Ok(emitted) => events.extend(emitted),
            Err(rejection) => tracing::debug!(unit = %id, %rejection, "Attack refused"),
        }
    }
}

/// Lowest-health enemy within the unit's attack range.
fn weakest_in_range<R: RandomSource>(tc: &TurnController<R>, unit: &Unit) -> Option<GridPos> {
    tc.battlefield()
        .units_of(Faction::Enemy)
        .filter(|enemy| unit.position.manhattan(enemy.position) <= unit.attack_range)
        .min_by_key(|enemy| enemy.health)
        .map(|enemy| enemy.position)
}

/// Open cell within move range that gets closest to the nearest enemy.
fn advance_cell<R: RandomSource>(tc: &TurnController<R>, unit: &Unit) -> Option<GridPos> {
    let bf = tc.battlefield();
    let nearest = |pos: GridPos| {
        bf.units_of(Faction::Enemy)
            .map(|enemy| pos.manhattan(enemy.position))
            .min()
    };
    let current = nearest(unit.position)?;

    let mut best: Option<(GridPos, u32)> = None;
    for (cell, tile) in bf.grid().iter() {
        if cell == unit.position
            || !tile.is_open()
            || unit.position.manhattan(cell) > unit.move_range
        {
            continue;
        }
        let Some(d) = nearest(cell) else {
            continue;
        };
        if d < best.map_or(current, |(_, d)| d) {
            best = Some((cell, d));
        }
    }
    best.map(|(cell, _)| cell)
}

/// Run the enemy turn to completion at the scenario's pacing.
///
/// Stops once the round advances, even if a player side that cannot act
/// has already handed the turn back to the enemy.
pub fn finish_enemy_turn<R: RandomSource>(tc: &mut TurnController<R>) -> Vec<BattleEvent> {
    let step = u64::from(tc.scenario().ai_step_ms);
    let round = tc.turn();
    let mut events = Vec::new();
    while tc.state() == TurnState::EnemyTurn && tc.turn() == round {
        events.extend(tc.tick(step));
    }
    events
}

/// Play a whole battle: `strategy` for the player, the engine AI for the enemy.
///
/// `on_round` is called after each full round with the controller.
pub fn autoplay<R: RandomSource>(
    tc: &mut TurnController<R>,
    strategy: Strategy,
    max_turns: u32,
    mut on_round: impl FnMut(&TurnController<R>),
) -> AutoplayReport {
    let mut events = 0;
    while tc.outcome().is_none() && tc.turn() <= max_turns {
        events += play_turn(tc, strategy).len();
        events += finish_enemy_turn(tc).len();
        on_round(tc);
    }

    let report = AutoplayReport {
        outcome: tc.outcome(),
        turns: tc.turn(),
        events,
        player_units: tc.battlefield().roster(Faction::Player).len(),
        enemy_units: tc.battlefield().roster(Faction::Enemy).len(),
    };
    tracing::info!(outcome = ?report.outcome, turns = report.turns, ?strategy, "Autoplay finished");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_core::scenario::{Placement, Scenario};
    use tactics_test_utils::fixtures::{
        controller, duel_catalog, oracle_war_catalog, skirmish, unit_template, CatalogBuilder,
    };

    #[test]
    fn test_aggressive_attacks_weakest() {
        let mut tc = controller(
            duel_catalog(),
            skirmish(
                6,
                6,
                vec![Placement::new("brute", 3, 3)],
                vec![
                    Placement::new("brute", 3, 4),
                    Placement::new("soldier", 2, 3),
                ],
            ),
        );
        let soldier = tc.battlefield().unit_at(GridPos::new(2, 3)).map(|u| u.id).unwrap();
        let events = play_turn(&mut tc, Strategy::Aggressive);
        assert!(events.contains(&BattleEvent::UnitDefeated {
            unit: soldier,
            faction: Faction::Enemy
        }));
    }

    #[test]
    fn test_passive_only_ends_turn() {
        let mut tc = controller(
            duel_catalog(),
            skirmish(
                6,
                6,
                vec![Placement::new("soldier", 5, 5)],
                vec![Placement::new("soldier", 0, 0)],
            ),
        );
        let events = play_turn(&mut tc, Strategy::Passive);
        assert!(events.contains(&BattleEvent::TurnStarted {
            faction: Faction::Enemy,
            turn: 1
        }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, BattleEvent::UnitMoved { .. })));
    }

    #[test]
    fn test_advance_closes_distance() {
        let mut tc = controller(
            duel_catalog(),
            skirmish(
                8,
                8,
                vec![Placement::new("soldier", 7, 7), Placement::new("soldier", 7, 0)],
                vec![Placement::new("soldier", 0, 0)],
            ),
        );
        let id = tc.battlefield().unit_at(GridPos::new(7, 7)).map(|u| u.id).unwrap();
        play_turn(&mut tc, Strategy::Aggressive);
        let unit = tc.battlefield().unit(id).unwrap();
        assert_eq!(unit.position.manhattan(GridPos::new(0, 0)), 12);
    }

    #[test]
    fn test_advance_with_unbounded_move_range() {
        let mut rider = unit_template("rider", 10, 3);
        rider.move_range = 1_000_000;
        let catalog = CatalogBuilder::new()
            .unit(rider)
            .unit(unit_template("soldier", 10, 3))
            .build();
        let mut tc = controller(
            catalog,
            skirmish(
                8,
                8,
                vec![Placement::new("rider", 7, 7)],
                vec![Placement::new("soldier", 0, 0)],
            ),
        );
        let id = tc.battlefield().unit_at(GridPos::new(7, 7)).map(|u| u.id).unwrap();
        play_turn(&mut tc, Strategy::Aggressive);
        let unit = tc.battlefield().unit(id).unwrap();
        assert_eq!(unit.position, GridPos::new(0, 1));
        assert!(unit.has_attacked);
    }

    #[test]
    fn test_autoplay_reaches_an_outcome() {
        let mut scenario = Scenario::oracle_war();
        scenario.ai_step_ms = 0;
        let mut tc = controller(oracle_war_catalog(), scenario);
        let mut rounds = 0;
        let report = autoplay(&mut tc, Strategy::Aggressive, 100, |_| rounds += 1);
        assert!(report.outcome.is_some());
        assert!(rounds >= 1);
        assert_eq!(report.turns, tc.turn());
    }
}
