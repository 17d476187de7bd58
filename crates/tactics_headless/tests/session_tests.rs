//! JSON-lines session tests.
//!
//! Drive a full runner through in-memory stdin/stdout buffers.

use tactics_core::events::BattleEvent;
use tactics_core::factions::Faction;
use tactics_core::scenario::Scenario;
use tactics_core::turn::BattleOutcome;
use tactics_headless::protocol::Response;
use tactics_headless::runner::{HeadlessConfig, HeadlessRunner};
use tactics_test_utils::fixtures::oracle_war_catalog;

fn run_session(scenario: Scenario, config: HeadlessConfig, input: &str) -> Vec<Response> {
    let mut runner = HeadlessRunner::new(oracle_war_catalog(), scenario, config).unwrap();
    let mut output = Vec::new();
    runner.run(input.as_bytes(), &mut output).unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn interactive_session_round_trip() {
    let input = r#"{"cmd":"select","row":7,"col":7}
{"cmd":"move","row":9,"col":9}
this is not json

{"cmd":"query"}
{"cmd":"end_turn"}
{"cmd":"tick","elapsed_ms":1500}
{"cmd":"quit"}
{"cmd":"end_turn"}
"#;
    let responses = run_session(Scenario::oracle_war(), HeadlessConfig::default(), input);

    assert_eq!(responses.len(), 8);
    assert_eq!(
        responses[0],
        Response::Ready {
            version: "1.0".to_string(),
            scenario: "Oracle War".to_string(),
            turn: 1,
        }
    );
    assert!(matches!(
        &responses[1],
        Response::Events { events } if events.len() == 1
            && matches!(events[0], BattleEvent::UnitSelected { .. })
    ));
    assert!(matches!(
        &responses[2],
        Response::Rejected { reason, .. } if reason == "out_of_range"
    ));
    assert!(matches!(&responses[3], Response::Error { .. }));
    match &responses[4] {
        Response::State { snapshot } => {
            assert_eq!(snapshot.player_roster.len(), 3);
            assert_eq!(snapshot.enemy_roster.len(), 3);
            assert_eq!((snapshot.rows, snapshot.cols), (10, 12));
        }
        other => panic!("expected state, got {other:?}"),
    }
    assert!(matches!(
        &responses[5],
        Response::Events { events } if events.contains(&BattleEvent::TurnStarted {
            faction: Faction::Enemy,
            turn: 1,
        })
    ));
    assert!(matches!(
        &responses[6],
        Response::Events { events } if events.contains(&BattleEvent::TurnStarted {
            faction: Faction::Player,
            turn: 2,
        })
    ));
    assert_eq!(responses[7], Response::Bye);
}

#[test]
fn session_ends_at_end_of_input() {
    let responses = run_session(
        Scenario::oracle_war(),
        HeadlessConfig::default(),
        "{\"cmd\":\"query\"}\n",
    );
    assert_eq!(responses.len(), 2);
    assert!(matches!(responses[1], Response::State { .. }));
}

#[test]
fn passing_every_turn_reports_loss() {
    let scenario = Scenario {
        ai_step_ms: 0,
        ..Scenario::oracle_war()
    };
    let mut input = String::new();
    for _ in 0..150 {
        input.push_str("{\"cmd\":\"end_turn\"}\n{\"cmd\":\"tick\",\"elapsed_ms\":0}\n");
    }
    let responses = run_session(scenario, HeadlessConfig::default(), &input);

    let game_overs: Vec<&Response> = responses
        .iter()
        .filter(|r| matches!(r, Response::GameOver { .. }))
        .collect();
    assert_eq!(game_overs.len(), 1);
    assert!(matches!(
        game_overs[0],
        Response::GameOver {
            outcome: BattleOutcome::Loss,
            ..
        }
    ));
    assert!(responses
        .iter()
        .any(|r| matches!(r, Response::Rejected { reason, .. } if reason == "battle_over")));
}

#[test]
fn restart_rearms_game_over() {
    let scenario = Scenario {
        ai_step_ms: 0,
        ..Scenario::oracle_war()
    };
    let mut input = String::new();
    for _ in 0..150 {
        input.push_str("{\"cmd\":\"end_turn\"}\n{\"cmd\":\"tick\",\"elapsed_ms\":0}\n");
    }
    input.push_str("{\"cmd\":\"restart\"}\n");
    for _ in 0..150 {
        input.push_str("{\"cmd\":\"end_turn\"}\n{\"cmd\":\"tick\",\"elapsed_ms\":0}\n");
    }
    let responses = run_session(scenario, HeadlessConfig::default(), &input);

    let game_overs = responses
        .iter()
        .filter(|r| matches!(r, Response::GameOver { .. }))
        .count();
    assert_eq!(game_overs, 2);
}

#[test]
fn auto_state_follows_every_applied_command() {
    let input = "{\"cmd\":\"select\",\"row\":7,\"col\":7}\n{\"cmd\":\"select\",\"row\":0,\"col\":0}\n";
    let responses = run_session(
        Scenario::oracle_war(),
        HeadlessConfig {
            auto_state_output: true,
        },
        input,
    );
    assert_eq!(responses.len(), 4);
    assert!(matches!(responses[1], Response::Events { .. }));
    assert!(matches!(responses[2], Response::State { .. }));
    assert!(matches!(
        &responses[3],
        Response::Rejected { reason, .. } if reason == "invalid_target"
    ));
}

#[test]
fn scripted_kill_and_buff_commands() {
    let input = r#"{"cmd":"buff","row":7,"col":7,"buff":"shield_wall"}
{"cmd":"buff","row":7,"col":7,"buff":"no_such_buff"}
{"cmd":"kill","unit":4}
{"cmd":"kill","unit":4}
"#;
    let responses = run_session(Scenario::oracle_war(), HeadlessConfig::default(), input);
    assert!(matches!(
        &responses[1],
        Response::Events { events } if matches!(events[0], BattleEvent::BuffApplied { .. })
    ));
    assert!(matches!(&responses[2], Response::Rejected { .. }));
    assert!(matches!(
        &responses[3],
        Response::Events { events } if matches!(events[0], BattleEvent::UnitDefeated { .. })
    ));
    assert!(matches!(&responses[4], Response::Rejected { reason, .. } if reason == "invalid_target"));
}
