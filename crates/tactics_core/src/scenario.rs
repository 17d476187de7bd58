//! Battle setup descriptions.

use serde::{Deserialize, Serialize};

use crate::ai::DEFAULT_STEP_MS;
use crate::error::{Result, SetupError};
use crate::map::Terrain;
use crate::math::GridPos;

/// A unit placed at battle start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Unit template id.
    pub unit: String,
    /// Row.
    pub row: i32,
    /// Column.
    pub col: i32,
}

impl Placement {
    /// Create a placement.
    pub fn new(unit: impl Into<String>, row: i32, col: i32) -> Self {
        Self {
            unit: unit.into(),
            row,
            col,
        }
    }
}

/// A rectangle of non-plain terrain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainPatch {
    /// Terrain kind.
    pub terrain: Terrain,
    /// Top row.
    pub row: i32,
    /// Left column.
    pub col: i32,
    /// Height in rows.
    #[serde(default = "one")]
    pub rows: i32,
    /// Width in columns.
    #[serde(default = "one")]
    pub cols: i32,
}

const fn one() -> i32 {
    1
}

/// Everything needed to build the opening position of a battle.
///
/// # Example RON
///
/// ```ron
/// Scenario(
///     name: "Skirmish",
///     rows: 6,
///     cols: 6,
///     player_units: [(unit: "militia", row: 5, col: 5)],
///     enemy_units: [(unit: "infantry", row: 0, col: 0)],
///     player_rear: (row: 4, col: 3),
///     enemy_rear: (row: 0, col: 0),
///     ai_step_ms: 0,
///     seed: 7,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Grid rows.
    pub rows: i32,
    /// Grid columns.
    pub cols: i32,
    /// Terrain patches applied over plain ground, in order.
    #[serde(default)]
    pub terrain: Vec<TerrainPatch>,
    /// Player units in roster order.
    #[serde(default)]
    pub player_units: Vec<Placement>,
    /// Enemy units in roster order.
    #[serde(default)]
    pub enemy_units: Vec<Placement>,
    /// Formations available to the player; empty means every catalog formation.
    #[serde(default)]
    pub formations: Vec<String>,
    /// Anchor of the player's summon window.
    pub player_rear: GridPos,
    /// Anchor of the enemy's summon window.
    pub enemy_rear: GridPos,
    /// Milliseconds between enemy unit actions (0 = whole turn per tick).
    #[serde(default = "default_ai_step_ms")]
    pub ai_step_ms: u32,
    /// Seed of the critical-hit stream.
    #[serde(default)]
    pub seed: u64,
}

const fn default_ai_step_ms() -> u32 {
    DEFAULT_STEP_MS
}

impl Scenario {
    /// Parse a scenario from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::CatalogParse`] on malformed text.
    pub fn from_ron_str(text: &str, origin: &str) -> Result<Self> {
        crate::data::ron_options()
            .from_str(text)
            .map_err(|e| SetupError::CatalogParse {
                origin: origin.to_string(),
                message: e.to_string(),
            })
    }

    /// The built-in Oracle War skirmish on a 10x12 field.
    ///
    /// Three Zhou units hold the south-east, three Shang units the
    /// north-west, with a river ford and a ridge between them.
    #[must_use]
    pub fn oracle_war() -> Self {
        let rows = 10;
        let cols = 12;
        Self {
            name: "Oracle War".to_string(),
            rows,
            cols,
            terrain: vec![
                TerrainPatch {
                    terrain: Terrain::Water,
                    row: 4,
                    col: 0,
                    rows: 1,
                    cols: 3,
                },
                TerrainPatch {
                    terrain: Terrain::Mountain,
                    row: 5,
                    col: 9,
                    rows: 1,
                    cols: 2,
                },
            ],
            player_units: vec![
                Placement::new("militia", rows - 3, cols - 5),
                Placement::new("infantry", rows - 4, cols - 5),
                Placement::new("archer", rows - 3, cols - 4),
            ],
            enemy_units: vec![
                Placement::new("cavalry", 3, 5),
                Placement::new("infantry", 3, 6),
                Placement::new("elite_fa", 4, 5),
            ],
            formations: Vec::new(),
            player_rear: GridPos::new(rows - 4, cols - 6),
            enemy_rear: GridPos::new(0, 0),
            ai_step_ms: DEFAULT_STEP_MS,
            seed: 0,
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::oracle_war()
    }
}
