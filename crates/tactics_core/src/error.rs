//! Error types for battle setup and command rejection.
//!
//! Two distinct families live here:
//!
//! - [`SetupError`] is fatal and only produced while loading a catalog or
//!   building a battlefield from a scenario.
//! - [`Rejection`] is the recoverable outcome of an illegal command. A
//!   rejected command never mutates battle state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::BattleEvent;
use crate::factions::Faction;

/// Result type alias using [`SetupError`].
pub type Result<T> = std::result::Result<T, SetupError>;

/// Outcome of a command issued to the turn controller.
pub type CommandResult = std::result::Result<Vec<BattleEvent>, Rejection>;

/// Fatal errors raised while preparing a battle.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Grid dimensions must both be positive.
    #[error("Invalid grid dimensions: {rows}x{cols}")]
    InvalidDimensions {
        /// Requested row count.
        rows: i32,
        /// Requested column count.
        cols: i32,
    },

    /// A scenario or formation references a unit template that does not exist.
    #[error("Unknown unit template: {0}")]
    UnknownUnitTemplate(String),

    /// A formation references a buff template that does not exist.
    #[error("Unknown buff template: {0}")]
    UnknownBuff(String),

    /// A scenario references a formation that does not exist.
    #[error("Unknown formation: {0}")]
    UnknownFormation(String),

    /// Two catalog entries of the same family share an id.
    #[error("Duplicate {family} id: {id}")]
    DuplicateId {
        /// Entry family ("unit", "buff" or "formation").
        family: &'static str,
        /// The duplicated id.
        id: String,
    },

    /// A catalog entry carries values outside their legal range.
    #[error("Invalid template '{id}': {message}")]
    InvalidTemplate {
        /// Template id.
        id: String,
        /// What is wrong with it.
        message: String,
    },

    /// A scenario places a unit outside the grid.
    #[error("Placement of '{unit}' at ({row}, {col}) is out of bounds")]
    PlacementOutOfBounds {
        /// Unit template id.
        unit: String,
        /// Row of the placement.
        row: i32,
        /// Column of the placement.
        col: i32,
    },

    /// A scenario places a unit on an occupied or impassable tile.
    #[error("Placement of '{unit}' at ({row}, {col}) is blocked")]
    PlacementBlocked {
        /// Unit template id.
        unit: String,
        /// Row of the placement.
        row: i32,
        /// Column of the placement.
        col: i32,
    },

    /// A scenario starts one side with no units.
    #[error("Scenario has no {} units", .0.display_name())]
    EmptyRoster(Faction),

    /// Catalog text could not be parsed.
    #[error("Failed to parse catalog '{origin}': {message}")]
    CatalogParse {
        /// Where the text came from (path or "<memory>").
        origin: String,
        /// Parser message.
        message: String,
    },

    /// Catalog data could not be read.
    #[error("Failed to read catalog '{origin}': {message}")]
    CatalogIo {
        /// Path that failed.
        origin: String,
        /// IO error message.
        message: String,
    },
}

/// A broken battlefield invariant, reported by
/// [`Battlefield::check_invariants`](crate::battlefield::Battlefield::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invariant violated: {0}")]
pub struct InvariantViolation(pub String);

/// Why a target was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetIssue {
    /// Position lies outside the grid.
    OutOfBounds,
    /// Tile cannot be entered.
    Impassable,
    /// Tile already holds a unit.
    Occupied,
    /// Tile holds no unit.
    Empty,
    /// Unit belongs to the wrong faction for this action.
    WrongFaction,
    /// No formation with that id is available.
    UnknownFormation,
    /// No buff with that id is in the catalog.
    UnknownBuff,
    /// No live unit with that id.
    UnknownUnit,
}

/// Which per-turn action was already spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// The unit already moved this turn.
    Move,
    /// The unit already attacked this turn.
    Attack,
}

/// Recoverable refusal of an illegal command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// Target position or id is not acceptable.
    #[error("Invalid target: {issue:?}")]
    InvalidTarget {
        /// Specific problem with the target.
        issue: TargetIssue,
    },

    /// Movement or attack distance exceeds the unit's range.
    #[error("Out of range: distance {distance}, range {range}")]
    OutOfRange {
        /// Manhattan distance to the target.
        distance: u32,
        /// Range the unit is allowed.
        range: u32,
    },

    /// The selected unit has already spent this action.
    #[error("Unit already acted: {action:?}")]
    AlreadyActed {
        /// The spent action.
        action: ActionKind,
    },

    /// Formation is still cooling down.
    #[error("Formation on cooldown: {remaining} turn(s) remaining")]
    OnCooldown {
        /// Remaining cooldown.
        remaining: u32,
    },

    /// The action needs a selected unit.
    #[error("No unit selected")]
    NoSelection,

    /// The action is not allowed for the faction currently acting.
    #[error("Not your turn")]
    NotYourTurn,

    /// The battle already has an outcome.
    #[error("Battle is over")]
    BattleOver,
}

impl Rejection {
    /// Shorthand for [`Rejection::InvalidTarget`].
    #[must_use]
    pub const fn target(issue: TargetIssue) -> Self {
        Self::InvalidTarget { issue }
    }

    /// Stable snake_case reason code for hosts.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidTarget { .. } => "invalid_target",
            Self::OutOfRange { .. } => "out_of_range",
            Self::AlreadyActed { .. } => "already_acted",
            Self::OnCooldown { .. } => "on_cooldown",
            Self::NoSelection => "no_selection",
            Self::NotYourTurn => "not_your_turn",
            Self::BattleOver => "battle_over",
        }
    }
}
