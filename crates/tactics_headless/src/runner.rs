//! Headless battle runner implementation.

use std::io::{BufRead, Write};
use std::sync::Arc;

use tactics_core::data::Catalog;
use tactics_core::error::{CommandResult, Result as SetupResult};
use tactics_core::math::GridPos;
use tactics_core::rng::{RandomSource, SeededRandom};
use tactics_core::scenario::Scenario;
use tactics_core::turn::TurnController;

use crate::protocol::{Command, ProtocolError, Response};

/// Headless runner configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessConfig {
    /// Output state after every applied command (vs only on query).
    pub auto_state_output: bool,
}

/// Drives a [`TurnController`] from protocol commands.
pub struct HeadlessRunner<R = SeededRandom> {
    controller: TurnController<R>,
    config: HeadlessConfig,
    outcome_reported: bool,
    quit: bool,
}

impl HeadlessRunner<SeededRandom> {
    /// Start a runner on a fresh battle.
    ///
    /// # Errors
    ///
    /// Propagates catalog and scenario setup errors.
    pub fn new(catalog: Arc<Catalog>, scenario: Scenario, config: HeadlessConfig) -> SetupResult<Self> {
        let controller = TurnController::new(catalog, scenario)?;
        Ok(Self::with_controller(controller, config))
    }
}

impl<R: RandomSource> HeadlessRunner<R> {
    /// Wrap an existing controller.
    pub fn with_controller(controller: TurnController<R>, config: HeadlessConfig) -> Self {
        Self {
            controller,
            config,
            outcome_reported: false,
            quit: false,
        }
    }

    /// The driven controller.
    pub fn controller(&self) -> &TurnController<R> {
        &self.controller
    }

    /// Whether a `quit` command was handled.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// The greeting sent before any command is read.
    pub fn ready(&self) -> Response {
        Response::ready(&self.controller.scenario().name, self.controller.turn())
    }

    /// Apply one command and collect the responses it produces.
    pub fn handle(&mut self, command: Command) -> Vec<Response> {
        tracing::debug!(cmd = command.name(), "Handling command");
        let result = match command {
            Command::Select { row, col } => self.controller.select_unit(GridPos::new(row, col)),
            Command::Move { row, col } => self.controller.request_move(GridPos::new(row, col)),
            Command::Attack { row, col } => {
                self.controller.request_attack(GridPos::new(row, col))
            }
            Command::AttackFrom {
                from_row,
                from_col,
                row,
                col,
            } => self
                .controller
                .attack_from(GridPos::new(from_row, from_col), GridPos::new(row, col)),
            Command::Formation { id } => self.controller.activate_formation(&id),
            Command::EndTurn => self.controller.end_turn(),
            Command::Tick { elapsed_ms } => Ok(self.controller.tick(elapsed_ms)),
            Command::Buff { row, col, buff } => {
                self.controller.apply_buff(GridPos::new(row, col), &buff)
            }
            Command::Kill { unit } => self.controller.remove_unit(unit),
            Command::Query => {
                return vec![self.state()];
            }
            Command::Restart => match self.controller.restart() {
                Ok(events) => {
                    self.outcome_reported = false;
                    Ok(events)
                }
                Err(e) => return vec![Response::error(e.to_string())],
            },
            Command::Quit => {
                self.quit = true;
                return vec![Response::Bye];
            }
        };
        self.respond(result)
    }

    fn respond(&mut self, result: CommandResult) -> Vec<Response> {
        let mut responses = match result {
            Ok(events) => vec![Response::Events { events }],
            Err(rejection) => return vec![Response::rejected(&rejection)],
        };
        if self.config.auto_state_output {
            responses.push(self.state());
        }
        if let Some(outcome) = self.controller.outcome() {
            if !self.outcome_reported {
                self.outcome_reported = true;
                responses.push(Response::GameOver {
                    outcome,
                    turns: self.controller.turn(),
                });
            }
        }
        responses
    }

    fn state(&self) -> Response {
        Response::State {
            snapshot: Box::new(self.controller.snapshot()),
        }
    }

    /// Run the session loop.
    ///
    /// Writes `ready`, then answers each input line until `quit` or end of
    /// input. Malformed lines produce an `error` response and the loop
    /// continues.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Io`] when reading or writing fails.
    pub fn run<I: BufRead, O: Write>(&mut self, input: I, mut output: O) -> Result<(), ProtocolError> {
        write_response(&mut output, &self.ready())?;
        tracing::info!(
            scenario = %self.controller.scenario().name,
            "Headless session started"
        );

        for line in input.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match Command::from_json(trimmed) {
                Ok(command) => {
                    for response in self.handle(command) {
                        write_response(&mut output, &response)?;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse command");
                    write_response(&mut output, &Response::error(e.to_string()))?;
                }
            }

            if self.quit {
                break;
            }
        }

        tracing::info!(turn = self.controller.turn(), "Headless session finished");
        Ok(())
    }
}

fn write_response<O: Write>(output: &mut O, response: &Response) -> Result<(), ProtocolError> {
    output.write_all(response.to_json_line().as_bytes())?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_core::scenario::Placement;
    use tactics_test_utils::fixtures::{controller, duel_catalog, skirmish};

    fn runner(auto_state: bool) -> HeadlessRunner<tactics_core::rng::FixedRoll> {
        let tc = controller(
            duel_catalog(),
            skirmish(
                6,
                6,
                vec![Placement::new("brute", 3, 3)],
                vec![Placement::new("soldier", 3, 4)],
            ),
        );
        HeadlessRunner::with_controller(
            tc,
            HeadlessConfig {
                auto_state_output: auto_state,
            },
        )
    }

    #[test]
    fn test_rejection_is_reported() {
        let mut runner = runner(false);
        let responses = runner.handle(Command::Move { row: 0, col: 0 });
        assert_eq!(responses.len(), 1);
        assert!(
            matches!(&responses[0], Response::Rejected { reason, .. } if reason == "no_selection")
        );
    }

    #[test]
    fn test_game_over_reported_once() {
        let mut runner = runner(false);
        let responses = runner.handle(Command::AttackFrom {
            from_row: 3,
            from_col: 3,
            row: 3,
            col: 4,
        });
        assert!(responses
            .iter()
            .any(|r| matches!(r, Response::GameOver { .. })));

        let responses = runner.handle(Command::EndTurn);
        assert!(responses
            .iter()
            .all(|r| !matches!(r, Response::GameOver { .. })));
    }

    #[test]
    fn test_auto_state_follows_events() {
        let mut runner = runner(true);
        let responses = runner.handle(Command::Select { row: 3, col: 3 });
        assert!(matches!(responses[0], Response::Events { .. }));
        assert!(matches!(responses[1], Response::State { .. }));
    }

    #[test]
    fn test_quit_says_bye() {
        let mut runner = runner(false);
        assert_eq!(runner.handle(Command::Quit), vec![Response::Bye]);
        assert!(runner.should_quit());
    }
}
