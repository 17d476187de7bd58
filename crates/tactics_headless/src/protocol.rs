//! JSON protocol for headless battle sessions.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controlling process
//! **Output (stdout):** Battle events and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready",...}`
//! 2. Controller sends commands as JSON lines
//! 3. Runner answers every command with `events`, `rejected`, `state` or `error`
//! 4. When the battle ends, outputs `{"type":"game_over","outcome":"win"|"loss",...}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","scenario":"Oracle War","turn":1}
//! -> {"cmd":"select","row":7,"col":7}
//! <- {"type":"events","events":[{"event":"unit_selected","unit":1}]}
//! -> {"cmd":"move","row":9,"col":9}
//! <- {"type":"rejected","reason":"out_of_range","message":"Out of range: distance 4, range 2"}
//! -> {"cmd":"end_turn"}
//! <- {"type":"events","events":[{"event":"turn_started","faction":"enemy","turn":1}]}
//! -> {"cmd":"tick","elapsed_ms":1500}
//! <- {"type":"events","events":[...]}
//! ```

use serde::{Deserialize, Serialize};
use tactics_core::error::Rejection;
use tactics_core::events::BattleEvent;
use tactics_core::snapshot::BattleSnapshot;
use tactics_core::turn::BattleOutcome;
use tactics_core::unit::UnitId;
use thiserror::Error;

/// Protocol version reported in `ready`.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Protocol-level failures.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Input line was not a valid command.
    #[error("Invalid command: {0}")]
    Parse(#[from] serde_json::Error),
    /// Reading input or writing output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Select the player unit on a cell.
    Select { row: i32, col: i32 },

    /// Move the selected unit.
    Move { row: i32, col: i32 },

    /// Attack a cell with the selected unit.
    Attack { row: i32, col: i32 },

    /// Select a unit and attack with it in one step.
    AttackFrom {
        from_row: i32,
        from_col: i32,
        row: i32,
        col: i32,
    },

    /// Arm a formation, or fire it when already armed.
    Formation { id: String },

    /// Pass the rest of the player turn.
    EndTurn,

    /// Advance AI pacing.
    Tick {
        #[serde(default = "default_elapsed_ms")]
        elapsed_ms: u64,
    },

    /// Apply a catalog buff to the unit on a cell.
    Buff { row: i32, col: i32, buff: String },

    /// Remove a unit outright.
    Kill { unit: UnitId },

    /// Report the full battle state.
    Query,

    /// Rebuild the opening position.
    Restart,

    /// End the session.
    Quit,
}

fn default_elapsed_ms() -> u64 {
    u64::from(tactics_core::ai::DEFAULT_STEP_MS)
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        version: String,
        scenario: String,
        turn: u32,
    },

    /// A command was applied.
    Events { events: Vec<BattleEvent> },

    /// A command was refused; nothing changed.
    Rejected { reason: String, message: String },

    /// Full battle state.
    State { snapshot: Box<BattleSnapshot> },

    /// Error processing input.
    Error { message: String },

    /// The battle has an outcome.
    GameOver { outcome: BattleOutcome, turns: u32 },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(scenario: &str, turn: u32) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            scenario: scenario.to_string(),
            turn,
        }
    }

    /// Create a rejection response.
    pub fn rejected(rejection: &Rejection) -> Self {
        Self::Rejected {
            reason: rejection.code().to_string(),
            message: rejection.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Parse`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Get command name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select { .. } => "select",
            Self::Move { .. } => "move",
            Self::Attack { .. } => "attack",
            Self::AttackFrom { .. } => "attack_from",
            Self::Formation { .. } => "formation",
            Self::EndTurn => "end_turn",
            Self::Tick { .. } => "tick",
            Self::Buff { .. } => "buff",
            Self::Kill { .. } => "kill",
            Self::Query => "query",
            Self::Restart => "restart",
            Self::Quit => "quit",
        }
    }
}
