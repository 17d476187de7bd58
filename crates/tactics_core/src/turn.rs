//! The turn controller: the battle's state machine.
//!
//! # States
//!
//! ```text
//!   PlayerTurn ──(all player units exhausted / end_turn)──▶ EnemyTurn
//!       ▲                                                      │
//!       └───────────(AI processed every enemy unit)────────────┘
//!
//!   any ──(a roster is empty)──▶ BattleEnded(Win | Loss)
//! ```
//!
//! Every command validates before it mutates. A rejected command returns a
//! [`Rejection`] and leaves the battle exactly as it was.
//!
//! # Determinism
//!
//! Given the same catalog, scenario and [`RandomSource`] stream, the same
//! command sequence produces the same events and the same final state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::AiDirector;
use crate::battlefield::Battlefield;
use crate::data::{Catalog, CatalogSource};
use crate::error::{ActionKind, CommandResult, Rejection, Result, SetupError, TargetIssue};
use crate::events::BattleEvent;
use crate::factions::Faction;
use crate::formation::{self, FormationState};
use crate::math::GridPos;
use crate::rng::{RandomSource, SeededRandom};
use crate::scenario::Scenario;
use crate::snapshot::BattleSnapshot;
use crate::unit::UnitId;

/// Terminal result of a battle, from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    /// The enemy roster is empty.
    Win,
    /// The player roster is empty.
    Loss,
}

impl fmt::Display for BattleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Win => f.write_str("win"),
            Self::Loss => f.write_str("loss"),
        }
    }
}

/// Top-level state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "outcome", rename_all = "snake_case")]
pub enum TurnState {
    /// The player issues commands.
    PlayerTurn,
    /// The AI works through the enemy roster.
    EnemyTurn,
    /// One roster is empty.
    BattleEnded(BattleOutcome),
}

impl TurnState {
    /// The faction allowed to act, if any.
    #[must_use]
    pub const fn acting_faction(self) -> Option<Faction> {
        match self {
            Self::PlayerTurn => Some(Faction::Player),
            Self::EnemyTurn => Some(Faction::Enemy),
            Self::BattleEnded(_) => None,
        }
    }
}

/// Informational sub-phase of a turn; legality is decided by unit flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Choosing where to move.
    #[default]
    Move,
    /// Choosing what to attack.
    Attack,
    /// A formation is armed.
    Special,
}

/// Owns the battlefield and drives it through turns.
#[derive(Debug, Clone)]
pub struct TurnController<R = SeededRandom> {
    scenario: Scenario,
    battlefield: Battlefield,
    state: TurnState,
    phase: Phase,
    selected: Option<UnitId>,
    armed_formation: Option<String>,
    formations: Vec<FormationState>,
    ai: AiDirector,
    rng: R,
    turn: u32,
}

impl TurnController<SeededRandom> {
    /// Start a battle with the scenario's seeded random stream.
    ///
    /// # Errors
    ///
    /// Fails fast on any catalog or scenario problem.
    pub fn new(catalog: Arc<Catalog>, scenario: Scenario) -> Result<Self> {
        let rng = SeededRandom::new(scenario.seed);
        Self::with_rng(catalog, scenario, rng)
    }

    /// Load the catalog from a source and start a battle.
    ///
    /// # Errors
    ///
    /// Propagates load errors and setup errors.
    pub fn from_source(source: &dyn CatalogSource, scenario: Scenario) -> Result<Self> {
        let catalog = source.load()?;
        Self::new(Arc::new(catalog), scenario)
    }
}

impl<R: RandomSource> TurnController<R> {
    /// Start a battle with an explicit random source.
    ///
    /// # Errors
    ///
    /// Fails fast on any catalog or scenario problem.
    pub fn with_rng(catalog: Arc<Catalog>, scenario: Scenario, rng: R) -> Result<Self> {
        catalog.validate()?;
        let formations = Self::formation_table(&catalog, &scenario)?;
        let battlefield = Battlefield::from_scenario(&scenario, catalog)?;
        let ai = AiDirector::new(scenario.ai_step_ms);

        tracing::info!(
            scenario = %scenario.name,
            player_units = battlefield.roster(Faction::Player).len(),
            enemy_units = battlefield.roster(Faction::Enemy).len(),
            formations = formations.len(),
            "Battle started"
        );

        let controller = Self {
            scenario,
            battlefield,
            state: TurnState::PlayerTurn,
            phase: Phase::Move,
            selected: None,
            armed_formation: None,
            formations,
            ai,
            rng,
            turn: 1,
        };
        Ok(controller)
    }

    fn formation_table(catalog: &Catalog, scenario: &Scenario) -> Result<Vec<FormationState>> {
        if scenario.formations.is_empty() {
            return Ok(catalog
                .formations
                .iter()
                .cloned()
                .map(FormationState::new)
                .collect());
        }
        scenario
            .formations
            .iter()
            .map(|id| {
                catalog
                    .formation(id)
                    .cloned()
                    .map(FormationState::new)
                    .ok_or_else(|| SetupError::UnknownFormation(id.clone()))
            })
            .collect()
    }

    // ========================================
    // Queries
    // ========================================

    /// Current top-level state.
    #[must_use]
    pub const fn state(&self) -> TurnState {
        self.state
    }

    /// Current sub-phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Terminal result, once reached.
    #[must_use]
    pub const fn outcome(&self) -> Option<BattleOutcome> {
        match self.state {
            TurnState::BattleEnded(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Faction currently acting, if the battle is still running.
    #[must_use]
    pub const fn current_faction(&self) -> Option<Faction> {
        self.state.acting_faction()
    }

    /// Selected unit.
    #[must_use]
    pub const fn selected(&self) -> Option<UnitId> {
        self.selected
    }

    /// Formation awaiting confirmation.
    #[must_use]
    pub fn armed_formation(&self) -> Option<&str> {
        self.armed_formation.as_deref()
    }

    /// Formation cooldown table in catalog order.
    #[must_use]
    pub fn formations(&self) -> &[FormationState] {
        &self.formations
    }

    /// Turn number; a player turn and the following enemy turn share it.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Read-only battlefield.
    #[must_use]
    pub const fn battlefield(&self) -> &Battlefield {
        &self.battlefield
    }

    /// Scenario this battle was built from.
    #[must_use]
    pub const fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Serializable view of the whole battle.
    #[must_use]
    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot::capture(self)
    }

    // ========================================
    // Commands
    // ========================================

    /// Select the player unit standing on `pos`.
    ///
    /// # Errors
    ///
    /// Rejects outside the player turn and on cells without a player unit.
    pub fn select_unit(&mut self, pos: GridPos) -> CommandResult {
        self.ensure_player_turn()?;
        let id = self.own_unit_at(pos)?;
        let mut events = Vec::new();
        self.select(id, &mut events);
        self.finish(events)
    }

    /// Move the selected unit to `pos`.
    ///
    /// # Errors
    ///
    /// See [`Rejection`]; checks run in the order battle over, turn,
    /// selection, spent move, target cell, range.
    pub fn request_move(&mut self, pos: GridPos) -> CommandResult {
        self.ensure_player_turn()?;
        let id = self.selected.ok_or(Rejection::NoSelection).map_err(log_rejection)?;
        let unit = self
            .battlefield
            .unit(id)
            .ok_or(Rejection::NoSelection)
            .map_err(log_rejection)?;
        if unit.has_moved {
            return reject(Rejection::AlreadyActed {
                action: ActionKind::Move,
            });
        }
        if let Err(issue) = self.battlefield.grid().check_enterable(pos) {
            return reject(Rejection::target(issue));
        }
        let from = unit.position;
        let distance = from.manhattan(pos);
        if distance > unit.move_range {
            return reject(Rejection::OutOfRange {
                distance,
                range: unit.move_range,
            });
        }

        self.battlefield.move_unit(id, pos);
        tracing::debug!(unit = %id, %from, to = %pos, distance, "Unit moved");
        self.phase = Phase::Attack;
        let mut events = vec![BattleEvent::UnitMoved {
            unit: id,
            from,
            to: pos,
            distance,
        }];
        self.after_player_action(&mut events);
        self.finish(events)
    }

    /// Attack the enemy unit on `pos` with the selected unit.
    ///
    /// # Errors
    ///
    /// See [`Rejection`]; checks run in the order battle over, turn,
    /// selection, spent attack, target cell, range.
    pub fn request_attack(&mut self, pos: GridPos) -> CommandResult {
        self.ensure_player_turn()?;
        let id = self.selected.ok_or(Rejection::NoSelection).map_err(log_rejection)?;
        let unit = self
            .battlefield
            .unit(id)
            .ok_or(Rejection::NoSelection)
            .map_err(log_rejection)?;
        if unit.has_attacked {
            return reject(Rejection::AlreadyActed {
                action: ActionKind::Attack,
            });
        }
        if !self.battlefield.grid().in_bounds(pos) {
            return reject(Rejection::target(TargetIssue::OutOfBounds));
        }
        let Some(target) = self.battlefield.unit_at(pos) else {
            return reject(Rejection::target(TargetIssue::Empty));
        };
        if target.faction == unit.faction {
            return reject(Rejection::target(TargetIssue::WrongFaction));
        }
        let distance = unit.position.manhattan(pos);
        if distance > unit.attack_range {
            return reject(Rejection::OutOfRange {
                distance,
                range: unit.attack_range,
            });
        }

        let target_id = target.id;
        let roll = self.rng.next_fraction();
        let mut events = Vec::new();
        self.battlefield
            .apply_attack(id, target_id, roll, &mut events);
        self.phase = if self.battlefield.unit(id).is_some_and(|u| !u.has_moved) {
            Phase::Move
        } else {
            Phase::Attack
        };
        self.after_player_action(&mut events);
        self.finish(events)
    }

    /// Select the unit on `from` and attack `target` with it.
    ///
    /// # Errors
    ///
    /// Either step's rejection; on failure the previous selection is kept.
    pub fn attack_from(&mut self, from: GridPos, target: GridPos) -> CommandResult {
        let previous = (self.selected, self.phase, self.armed_formation.clone());
        let mut events = self.select_unit(from)?;
        match self.request_attack(target) {
            Ok(more) => {
                events.extend(more);
                Ok(events)
            }
            Err(rejection) => {
                (self.selected, self.phase, self.armed_formation) = previous;
                Err(rejection)
            }
        }
    }

    /// Arm a formation, or fire it if it is already armed.
    ///
    /// # Errors
    ///
    /// Rejects outside the player turn, for unknown ids and while the
    /// formation is cooling down.
    pub fn activate_formation(&mut self, id: &str) -> CommandResult {
        self.ensure_player_turn()?;
        let Some(index) = self.formations.iter().position(|f| f.id() == id) else {
            return reject(Rejection::target(TargetIssue::UnknownFormation));
        };
        let remaining = self.formations[index].cooldown_remaining;
        if remaining > 0 {
            return reject(Rejection::OnCooldown { remaining });
        }

        if self.armed_formation.as_deref() != Some(id) {
            self.armed_formation = Some(id.to_string());
            self.phase = Phase::Special;
            tracing::debug!(formation = id, "Formation armed");
            return self.finish(vec![BattleEvent::FormationArmed {
                formation: id.to_string(),
            }]);
        }

        self.formations[index].trigger();
        let template = self.formations[index].template.clone();
        let mut events = Vec::new();
        let outcome = formation::execute(&mut self.battlefield, &template, Faction::Player, &mut events);
        let cooldown = self.formations[index].cooldown_remaining;
        tracing::info!(formation = id, ?outcome, cooldown, "Formation activated");
        events.push(BattleEvent::FormationActivated {
            formation: id.to_string(),
            outcome,
            cooldown,
        });
        self.armed_formation = None;
        self.phase = Phase::Move;
        self.after_player_action(&mut events);
        self.finish(events)
    }

    /// Pass the rest of the player turn.
    ///
    /// # Errors
    ///
    /// Rejects outside the player turn.
    pub fn end_turn(&mut self) -> CommandResult {
        self.ensure_player_turn()?;
        let mut events = Vec::new();
        self.begin_enemy_turn(&mut events);
        self.finish(events)
    }

    /// Apply a catalog buff to the unit on `pos` (scripted event).
    ///
    /// # Errors
    ///
    /// Rejects after the battle, on empty cells and for unknown buffs.
    pub fn apply_buff(&mut self, pos: GridPos, buff_id: &str) -> CommandResult {
        self.ensure_running()?;
        if !self.battlefield.grid().in_bounds(pos) {
            return reject(Rejection::target(TargetIssue::OutOfBounds));
        }
        let Some(id) = self.battlefield.grid().occupant(pos) else {
            return reject(Rejection::target(TargetIssue::Empty));
        };
        let mut events = Vec::new();
        self.battlefield
            .apply_buff(id, buff_id, &mut events)
            .map_err(log_rejection)?;
        self.finish(events)
    }

    /// Remove a unit outright (scripted event). The terminal check runs
    /// immediately, even in the middle of an enemy turn.
    ///
    /// # Errors
    ///
    /// Rejects after the battle and for unknown ids.
    pub fn remove_unit(&mut self, id: UnitId) -> CommandResult {
        self.ensure_running()?;
        let Some(unit) = self.battlefield.remove_unit(id) else {
            return reject(Rejection::target(TargetIssue::UnknownUnit));
        };
        if self.selected == Some(id) {
            self.selected = None;
        }
        let mut events = vec![BattleEvent::UnitDefeated {
            unit: id,
            faction: unit.faction,
        }];
        if self.state == TurnState::PlayerTurn {
            self.after_player_action(&mut events);
        } else {
            self.check_outcome(&mut events);
        }
        self.finish(events)
    }

    /// Advance AI pacing by `elapsed_ms`. Does nothing outside the enemy turn.
    pub fn tick(&mut self, elapsed_ms: u64) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        if self.state != TurnState::EnemyTurn {
            return events;
        }

        let due = self.ai.advance(elapsed_ms);
        for _ in 0..due {
            if !self
                .ai
                .act_next(&mut self.battlefield, &mut self.rng, &mut events)
            {
                break;
            }
            if self.check_outcome(&mut events) {
                self.validate();
                return events;
            }
        }
        if self.ai.is_done() {
            self.begin_player_turn(&mut events);
        }
        self.validate();
        events
    }

    /// Rebuild the opening position. Cooldowns reset; the random stream
    /// continues.
    ///
    /// # Errors
    ///
    /// Propagates setup errors (cannot happen for a scenario that built once).
    pub fn restart(&mut self) -> Result<Vec<BattleEvent>> {
        let catalog = self.battlefield.catalog_handle();
        self.battlefield = Battlefield::from_scenario(&self.scenario, Arc::clone(&catalog))?;
        self.formations = Self::formation_table(&catalog, &self.scenario)?;
        self.state = TurnState::PlayerTurn;
        self.phase = Phase::Move;
        self.selected = None;
        self.armed_formation = None;
        self.ai.cancel();
        self.turn = 1;
        tracing::info!(scenario = %self.scenario.name, "Battle restarted");
        let events = vec![BattleEvent::TurnStarted {
            faction: Faction::Player,
            turn: self.turn,
        }];
        self.validate();
        Ok(events)
    }

    // ========================================
    // Internals
    // ========================================

    fn ensure_running(&self) -> std::result::Result<(), Rejection> {
        if matches!(self.state, TurnState::BattleEnded(_)) {
            return Err(log_rejection(Rejection::BattleOver));
        }
        Ok(())
    }

    fn ensure_player_turn(&self) -> std::result::Result<(), Rejection> {
        self.ensure_running()?;
        if self.state != TurnState::PlayerTurn {
            return Err(log_rejection(Rejection::NotYourTurn));
        }
        Ok(())
    }

    fn own_unit_at(&self, pos: GridPos) -> std::result::Result<UnitId, Rejection> {
        if !self.battlefield.grid().in_bounds(pos) {
            return Err(log_rejection(Rejection::target(TargetIssue::OutOfBounds)));
        }
        match self.battlefield.unit_at(pos) {
            None => Err(log_rejection(Rejection::target(TargetIssue::Empty))),
            Some(unit) if unit.faction != Faction::Player => {
                Err(log_rejection(Rejection::target(TargetIssue::WrongFaction)))
            }
            Some(unit) => Ok(unit.id),
        }
    }

    fn select(&mut self, id: UnitId, events: &mut Vec<BattleEvent>) {
        self.selected = Some(id);
        self.armed_formation = None;
        self.phase = if self.battlefield.unit(id).is_some_and(|u| u.has_moved) {
            Phase::Attack
        } else {
            Phase::Move
        };
        events.push(BattleEvent::UnitSelected { unit: id });
    }

    /// End the battle if a roster is empty. Returns `true` if it ended.
    fn check_outcome(&mut self, events: &mut Vec<BattleEvent>) -> bool {
        let Some(outcome) = self.battlefield.outcome() else {
            return false;
        };
        self.state = TurnState::BattleEnded(outcome);
        self.selected = None;
        self.armed_formation = None;
        self.ai.cancel();
        tracing::info!(%outcome, turn = self.turn, "Battle ended");
        events.push(BattleEvent::BattleEnded { outcome });
        true
    }

    fn after_player_action(&mut self, events: &mut Vec<BattleEvent>) {
        if self.check_outcome(events) {
            return;
        }
        if self.player_side_exhausted() {
            self.begin_enemy_turn(events);
        }
    }

    fn player_side_exhausted(&self) -> bool {
        self.battlefield
            .roster(Faction::Player)
            .iter()
            .all(|id| self.battlefield.is_exhausted(*id))
    }

    fn begin_enemy_turn(&mut self, events: &mut Vec<BattleEvent>) {
        self.selected = None;
        self.armed_formation = None;
        self.phase = Phase::Move;
        for formation in &mut self.formations {
            formation.tick_cooldown();
        }
        self.battlefield.expire_buffs(Faction::Player, events);
        self.battlefield.reset_turn_flags(Faction::Enemy);
        self.state = TurnState::EnemyTurn;
        self.ai.begin_turn(self.battlefield.roster(Faction::Enemy));
        tracing::info!(turn = self.turn, "Enemy turn");
        events.push(BattleEvent::TurnStarted {
            faction: Faction::Enemy,
            turn: self.turn,
        });
    }

    fn begin_player_turn(&mut self, events: &mut Vec<BattleEvent>) {
        self.battlefield.expire_buffs(Faction::Enemy, events);
        for formation in &mut self.formations {
            formation.tick_cooldown();
        }
        self.battlefield.reset_turn_flags(Faction::Player);
        self.turn += 1;
        self.state = TurnState::PlayerTurn;
        self.phase = Phase::Move;
        tracing::info!(turn = self.turn, "Player turn");
        events.push(BattleEvent::TurnStarted {
            faction: Faction::Player,
            turn: self.turn,
        });
        // Nobody can move or strike: the turn passes straight back.
        if self.player_side_exhausted() {
            tracing::debug!(turn = self.turn, "Player side cannot act");
            self.begin_enemy_turn(events);
        }
    }

    fn finish(&self, events: Vec<BattleEvent>) -> CommandResult {
        self.validate();
        Ok(events)
    }

    #[cfg(feature = "debug-validation")]
    fn validate(&self) {
        if let Err(violation) = self.battlefield.check_invariants() {
            panic!("{violation}");
        }
        if let Some(id) = self.selected {
            let owner = self.battlefield.unit(id).map(|u| u.faction);
            assert_eq!(
                owner,
                self.current_faction(),
                "selected unit {id} does not belong to the acting faction"
            );
        }
    }

    #[cfg(not(feature = "debug-validation"))]
    #[allow(clippy::unused_self)]
    fn validate(&self) {}
}

fn log_rejection(rejection: Rejection) -> Rejection {
    tracing::debug!(reason = rejection.code(), %rejection, "Command rejected");
    rejection
}

fn reject(rejection: Rejection) -> CommandResult {
    Err(log_rejection(rejection))
}
