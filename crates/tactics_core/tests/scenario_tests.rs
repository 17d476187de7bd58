//! Battle scenario tests.
//!
//! End-to-end checks driving the turn controller the way a host would.

use tactics_core::prelude::*;
use tactics_core::error::ActionKind;
use tactics_test_utils::fixtures::{
    controller, damage_reduction_buff, duel_catalog, fixed_f, oracle_war_catalog,
    reinforcement_formation, skirmish, unit_template, CatalogBuilder,
};

fn damage_dealt(events: &[BattleEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            BattleEvent::AttackResolved { damage, .. } => Some(*damage),
            _ => None,
        })
        .collect()
}

#[test]
fn move_beyond_range_is_rejected() {
    let mut tc = controller(
        duel_catalog(),
        skirmish(
            10,
            10,
            vec![Placement::new("soldier", 5, 5), Placement::new("soldier", 9, 9)],
            vec![Placement::new("soldier", 0, 0)],
        ),
    );
    tc.select_unit(GridPos::new(5, 5)).unwrap();

    let before = tc.snapshot();
    assert_eq!(
        tc.request_move(GridPos::new(7, 7)),
        Err(Rejection::OutOfRange {
            distance: 4,
            range: 2
        })
    );
    assert_eq!(tc.snapshot(), before);

    let events = tc.request_move(GridPos::new(6, 6)).unwrap();
    assert!(events.contains(&BattleEvent::UnitMoved {
        unit: UnitId(1),
        from: GridPos::new(5, 5),
        to: GridPos::new(6, 6),
        distance: 2,
    }));
    assert!(tc.battlefield().unit_at(GridPos::new(5, 5)).is_none());
    assert_eq!(
        tc.request_move(GridPos::new(6, 5)),
        Err(Rejection::AlreadyActed {
            action: ActionKind::Move
        })
    );
}

#[test]
fn lethal_attack_removes_defender() {
    let mut tc = controller(
        duel_catalog(),
        skirmish(
            10,
            10,
            vec![Placement::new("brute", 5, 5)],
            vec![Placement::new("brute", 5, 6), Placement::new("soldier", 0, 0)],
        ),
    );
    let defender = tc.battlefield().unit_at(GridPos::new(5, 6)).unwrap().id;

    let events = tc.attack_from(GridPos::new(5, 5), GridPos::new(5, 6)).unwrap();

    assert_eq!(damage_dealt(&events), vec![100]);
    assert!(events.contains(&BattleEvent::UnitDefeated {
        unit: defender,
        faction: Faction::Enemy
    }));
    assert!(tc.battlefield().unit(defender).is_none());
    assert!(tc.battlefield().unit_at(GridPos::new(5, 6)).is_none());
    assert!(!tc.battlefield().roster(Faction::Enemy).contains(&defender));
    assert_eq!(tc.state(), TurnState::PlayerTurn);
    assert!(tc.battlefield().check_invariants().is_ok());
}

#[test]
fn damage_reduction_halves_then_expires() {
    let catalog = CatalogBuilder::new()
        .unit(unit_template("brute", 50, 100))
        .unit(unit_template("wall", 300, 1))
        .buff(damage_reduction_buff("guard", fixed_f(0.5), 1))
        .build();
    let mut tc = controller(
        catalog,
        skirmish(
            10,
            10,
            vec![Placement::new("brute", 5, 5)],
            vec![Placement::new("wall", 5, 6)],
        ),
    );
    let wall = tc.battlefield().unit_at(GridPos::new(5, 6)).unwrap().id;

    tc.apply_buff(GridPos::new(5, 6), "guard").unwrap();
    let events = tc.attack_from(GridPos::new(5, 5), GridPos::new(5, 6)).unwrap();
    assert_eq!(damage_dealt(&events), vec![50]);

    tc.end_turn().unwrap();
    let events = tc.tick(0);
    assert!(events.contains(&BattleEvent::BuffExpired {
        unit: wall,
        buff: "guard".to_string()
    }));
    assert_eq!(tc.state(), TurnState::PlayerTurn);
    assert_eq!(tc.battlefield().unit(wall).unwrap().damage_reduction, Fixed::ZERO);

    let events = tc.attack_from(GridPos::new(5, 5), GridPos::new(5, 6)).unwrap();
    assert_eq!(damage_dealt(&events), vec![100]);
    assert_eq!(tc.battlefield().unit(wall).unwrap().health, 150);
}

#[test]
fn emptying_enemy_roster_mid_enemy_turn_wins() {
    let mut scenario = skirmish(
        10,
        10,
        vec![Placement::new("soldier", 9, 9)],
        vec![Placement::new("soldier", 0, 0), Placement::new("soldier", 0, 4)],
    );
    scenario.ai_step_ms = 500;
    let mut tc = controller(duel_catalog(), scenario);

    tc.end_turn().unwrap();
    let events = tc.tick(500);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, BattleEvent::UnitMoved { .. }))
            .count(),
        1
    );
    assert_eq!(tc.state(), TurnState::EnemyTurn);

    for id in tc.battlefield().roster(Faction::Enemy).to_vec() {
        tc.remove_unit(id).unwrap();
    }
    assert_eq!(tc.state(), TurnState::BattleEnded(BattleOutcome::Win));
    assert_eq!(tc.outcome(), Some(BattleOutcome::Win));
    assert!(tc.tick(5000).is_empty());
    assert_eq!(tc.select_unit(GridPos::new(9, 9)), Err(Rejection::BattleOver));
}

#[test]
fn enemy_can_win_the_battle() {
    let mut tc = controller(
        duel_catalog(),
        skirmish(
            6,
            6,
            vec![Placement::new("soldier", 3, 3)],
            vec![Placement::new("brute", 3, 4)],
        ),
    );
    tc.end_turn().unwrap();
    let events = tc.tick(0);
    assert!(events.contains(&BattleEvent::BattleEnded {
        outcome: BattleOutcome::Loss
    }));
    assert_eq!(tc.state(), TurnState::BattleEnded(BattleOutcome::Loss));
}

#[test]
fn formation_cannot_fire_while_cooling_down() {
    let catalog = CatalogBuilder::new()
        .unit(unit_template("soldier", 10, 3))
        .formation(reinforcement_formation("levy", "soldier", 1, 2))
        .build();
    let mut tc = controller(
        catalog,
        skirmish(
            10,
            10,
            vec![Placement::new("soldier", 5, 5)],
            vec![Placement::new("soldier", 0, 0)],
        ),
    );

    tc.activate_formation("levy").unwrap();
    let events = tc.activate_formation("levy").unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, BattleEvent::UnitSummoned { .. })));
    assert_eq!(tc.battlefield().roster(Faction::Player).len(), 2);

    let before = tc.snapshot();
    assert_eq!(
        tc.activate_formation("levy"),
        Err(Rejection::OnCooldown { remaining: 2 })
    );
    assert_eq!(tc.snapshot(), before);

    // One transition in each direction brings it back.
    tc.end_turn().unwrap();
    assert_eq!(tc.formations()[0].cooldown_remaining, 1);
    tc.tick(0);
    assert_eq!(tc.formations()[0].cooldown_remaining, 0);
    assert!(tc.activate_formation("levy").is_ok());
}

#[test]
fn commands_outside_player_turn_are_rejected() {
    let mut scenario = skirmish(
        10,
        10,
        vec![Placement::new("soldier", 9, 9)],
        vec![Placement::new("soldier", 0, 0)],
    );
    scenario.ai_step_ms = 500;
    let mut tc = controller(duel_catalog(), scenario);
    tc.end_turn().unwrap();

    assert_eq!(tc.select_unit(GridPos::new(9, 9)), Err(Rejection::NotYourTurn));
    assert_eq!(tc.end_turn(), Err(Rejection::NotYourTurn));
    assert_eq!(tc.activate_formation("levy"), Err(Rejection::NotYourTurn));
}

#[test]
fn oracle_war_plays_a_full_round() {
    let mut scenario = Scenario::oracle_war();
    scenario.ai_step_ms = 0;
    let mut tc = controller(oracle_war_catalog(), scenario);

    assert_eq!(tc.battlefield().roster(Faction::Player).len(), 3);
    assert_eq!(tc.battlefield().roster(Faction::Enemy).len(), 3);

    tc.end_turn().unwrap();
    let events = tc.tick(0);
    assert!(events.contains(&BattleEvent::TurnStarted {
        faction: Faction::Player,
        turn: 2
    }));
    assert!(tc.battlefield().check_invariants().is_ok());
}

#[test]
fn restart_restores_the_opening() {
    let mut tc = controller(
        duel_catalog(),
        skirmish(
            10,
            10,
            vec![Placement::new("brute", 5, 5)],
            vec![Placement::new("soldier", 5, 6)],
        ),
    );
    let opening = tc.snapshot();
    tc.attack_from(GridPos::new(5, 5), GridPos::new(5, 6)).unwrap();
    assert_eq!(tc.outcome(), Some(BattleOutcome::Win));

    tc.restart().unwrap();
    assert_eq!(tc.snapshot(), opening);
}
