//! Read-only, serializable view of a battle for render layers.

use serde::{Deserialize, Serialize};

use crate::factions::Faction;
use crate::map::Terrain;
use crate::math::GridPos;
use crate::rng::RandomSource;
use crate::turn::{BattleOutcome, Phase, TurnController, TurnState};
use crate::unit::{Unit, UnitId};

/// One grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileView {
    /// Cell position.
    pub position: GridPos,
    /// Terrain kind.
    pub terrain: Terrain,
    /// Whether units may enter.
    pub passable: bool,
    /// Movement cost.
    pub movement_cost: u32,
    /// Occupant, if any.
    pub occupant: Option<UnitId>,
}

/// Formation button state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationView {
    /// Formation id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Glyph.
    pub glyph: String,
    /// Effect description.
    pub description: String,
    /// Configured cooldown.
    pub cooldown: u32,
    /// Cooldown left.
    pub cooldown_remaining: u32,
}

/// Everything a renderer needs, captured at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    /// Grid rows.
    pub rows: i32,
    /// Grid columns.
    pub cols: i32,
    /// Tiles in row-major order.
    pub tiles: Vec<TileView>,
    /// Live units in id order.
    pub units: Vec<Unit>,
    /// Player roster order.
    pub player_roster: Vec<UnitId>,
    /// Enemy roster order.
    pub enemy_roster: Vec<UnitId>,
    /// Controller state.
    pub state: TurnState,
    /// Acting faction.
    pub current_faction: Option<Faction>,
    /// Sub-phase.
    pub phase: Phase,
    /// Selected unit.
    pub selected: Option<UnitId>,
    /// Armed formation.
    pub armed_formation: Option<String>,
    /// Formation cooldown table.
    pub formations: Vec<FormationView>,
    /// Terminal result.
    pub outcome: Option<BattleOutcome>,
    /// Turn number.
    pub turn: u32,
}

impl BattleSnapshot {
    /// Capture the controller's current state.
    #[must_use]
    pub fn capture<R: RandomSource>(tc: &TurnController<R>) -> Self {
        let bf = tc.battlefield();
        let tiles = bf
            .grid()
            .iter()
            .map(|(position, tile)| TileView {
                position,
                terrain: tile.terrain,
                passable: tile.passable,
                movement_cost: tile.movement_cost,
                occupant: tile.occupant,
            })
            .collect();
        let formations = tc
            .formations()
            .iter()
            .map(|f| FormationView {
                id: f.template.id.clone(),
                name: f.template.name.clone(),
                glyph: f.template.glyph.clone(),
                description: f.template.description.clone(),
                cooldown: f.template.cooldown,
                cooldown_remaining: f.cooldown_remaining,
            })
            .collect();

        Self {
            rows: bf.grid().rows(),
            cols: bf.grid().cols(),
            tiles,
            units: bf.units().cloned().collect(),
            player_roster: bf.roster(Faction::Player).to_vec(),
            enemy_roster: bf.roster(Faction::Enemy).to_vec(),
            state: tc.state(),
            current_faction: tc.current_faction(),
            phase: tc.phase(),
            selected: tc.selected(),
            armed_formation: tc.armed_formation().map(str::to_string),
            formations,
            outcome: tc.outcome(),
            turn: tc.turn(),
        }
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// The unit standing on `pos`.
    #[must_use]
    pub fn unit_at(&self, pos: GridPos) -> Option<&Unit> {
        self.units.iter().find(|u| u.position == pos)
    }

    /// Tile at `pos`.
    #[must_use]
    pub fn tile(&self, pos: GridPos) -> Option<&TileView> {
        if pos.row < 0 || pos.col < 0 || pos.row >= self.rows || pos.col >= self.cols {
            return None;
        }
        let index = usize::try_from(pos.row * self.cols + pos.col).ok()?;
        self.tiles.get(index)
    }
}
