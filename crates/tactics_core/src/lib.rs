//! # Tactics Core
//!
//! Deterministic turn-based combat engine for Oracle War.
//!
//! This crate contains **only** battle logic:
//! - No rendering
//! - No IO (catalogs arrive through an injected [`data::CatalogSource`])
//! - No ambient randomness (critical rolls come from an injected [`rng::RandomSource`])
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless play over a line protocol
//! - Scripted battles for balance testing
//! - Reproducible tests
//!
//! ## Crate Structure
//!
//! - [`turn`] - The turn controller state machine
//! - [`battlefield`] - Grid, units and rosters
//! - [`combat`] - Pure attack resolution
//! - [`buff`] - Timed, stacking unit modifiers
//! - [`formation`] - Cooldown-gated roster abilities
//! - [`ai`] - Enemy turn logic
//! - [`data`] - Catalog templates
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use tactics_core::data::Catalog;
//! use tactics_core::math::GridPos;
//! use tactics_core::scenario::{Placement, Scenario};
//! use tactics_core::turn::TurnController;
//!
//! let catalog = Catalog::from_ron_str(
//!     r#"Catalog(units: [UnitTemplate(
//!         id: "militia", name: "Militia", class: "infantry",
//!         health: 10, attack: 3, attack_range: 1, move_range: 2,
//!     )])"#,
//!     "<doc>",
//! )
//! .unwrap();
//!
//! let scenario = Scenario {
//!     name: "Skirmish".to_string(),
//!     rows: 6,
//!     cols: 6,
//!     terrain: Vec::new(),
//!     player_units: vec![Placement::new("militia", 5, 5)],
//!     enemy_units: vec![Placement::new("militia", 0, 0)],
//!     formations: Vec::new(),
//!     player_rear: GridPos::new(4, 3),
//!     enemy_rear: GridPos::new(0, 0),
//!     ai_step_ms: 0,
//!     seed: 7,
//! };
//!
//! let mut battle = TurnController::new(Arc::new(catalog), scenario).unwrap();
//! battle.select_unit(GridPos::new(5, 5)).unwrap();
//! battle.request_move(GridPos::new(4, 4)).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod battlefield;
pub mod buff;
pub mod combat;
pub mod data;
pub mod error;
pub mod events;
pub mod factions;
pub mod formation;
pub mod map;
pub mod math;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod turn;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::battlefield::Battlefield;
    pub use crate::data::{Catalog, CatalogSource, RonCatalogSource};
    pub use crate::error::{CommandResult, Rejection, Result, SetupError, TargetIssue};
    pub use crate::events::BattleEvent;
    pub use crate::factions::Faction;
    pub use crate::math::{Fixed, GridPos};
    pub use crate::rng::{FixedRoll, RandomSource, SeededRandom};
    pub use crate::scenario::{Placement, Scenario};
    pub use crate::snapshot::BattleSnapshot;
    pub use crate::turn::{BattleOutcome, Phase, TurnController, TurnState};
    pub use crate::unit::{Unit, UnitId};
}
