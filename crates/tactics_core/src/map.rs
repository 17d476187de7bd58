//! Battle grid: terrain, passability and tile occupancy.
//!
//! Tiles hold a weak reference ([`UnitId`]) to their occupant. The
//! battlefield keeps that reference and each unit's position in lockstep.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SetupError, TargetIssue};
use crate::math::GridPos;
use crate::unit::UnitId;

/// Terrain kind of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    /// Open ground.
    #[default]
    Plain,
    /// Rough ground - passable but costly.
    Mountain,
    /// Rivers and marsh - cannot be entered.
    Water,
}

impl Terrain {
    /// Whether units may stand on this terrain.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Water)
    }

    /// Movement cost reported to the render layer.
    #[must_use]
    pub const fn movement_cost(self) -> u32 {
        match self {
            Self::Plain => 1,
            Self::Mountain => 2,
            Self::Water => 0,
        }
    }
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Terrain kind.
    pub terrain: Terrain,
    /// Whether a unit may enter.
    pub passable: bool,
    /// Movement cost of entering.
    pub movement_cost: u32,
    /// Unit standing here, if any.
    pub occupant: Option<UnitId>,
}

impl Tile {
    /// Create an empty tile of the given terrain.
    #[must_use]
    pub const fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            passable: terrain.is_passable(),
            movement_cost: terrain.movement_cost(),
            occupant: None,
        }
    }

    /// True when passable and unoccupied.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.passable && self.occupant.is_none()
    }
}

/// Fixed-size row-major matrix of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: i32,
    cols: i32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Create a grid of plain tiles.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::InvalidDimensions`] if either dimension is not positive.
    pub fn new(rows: i32, cols: i32) -> Result<Self> {
        if rows <= 0 || cols <= 0 {
            return Err(SetupError::InvalidDimensions { rows, cols });
        }
        let len = rows as usize * cols as usize;
        Ok(Self {
            rows,
            cols,
            tiles: vec![Tile::new(Terrain::Plain); len],
        })
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> i32 {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> i32 {
        self.cols
    }

    /// Whether a position lies on the grid.
    #[must_use]
    pub const fn in_bounds(&self, pos: GridPos) -> bool {
        pos.row >= 0 && pos.row < self.rows && pos.col >= 0 && pos.col < self.cols
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.row as usize * self.cols as usize + pos.col as usize)
    }

    /// Tile at a position.
    #[must_use]
    pub fn tile(&self, pos: GridPos) -> Option<&Tile> {
        self.index(pos).map(|i| &self.tiles[i])
    }

    fn tile_mut(&mut self, pos: GridPos) -> Option<&mut Tile> {
        self.index(pos).map(|i| &mut self.tiles[i])
    }

    /// Occupant of a position.
    #[must_use]
    pub fn occupant(&self, pos: GridPos) -> Option<UnitId> {
        self.tile(pos).and_then(|t| t.occupant)
    }

    /// Change the terrain of a tile. Out-of-bounds positions are ignored.
    pub fn set_terrain(&mut self, pos: GridPos, terrain: Terrain) {
        if let Some(tile) = self.tile_mut(pos) {
            let occupant = tile.occupant;
            *tile = Tile::new(terrain);
            tile.occupant = occupant;
        }
    }

    /// Check that a unit could stand on `pos`.
    ///
    /// # Errors
    ///
    /// Returns the [`TargetIssue`] explaining why the tile cannot be entered.
    pub fn check_enterable(&self, pos: GridPos) -> std::result::Result<(), TargetIssue> {
        let tile = self.tile(pos).ok_or(TargetIssue::OutOfBounds)?;
        if !tile.passable {
            return Err(TargetIssue::Impassable);
        }
        if tile.occupant.is_some() {
            return Err(TargetIssue::Occupied);
        }
        Ok(())
    }

    /// Whether `pos` is in bounds, passable and empty.
    #[must_use]
    pub fn is_open(&self, pos: GridPos) -> bool {
        self.tile(pos).is_some_and(Tile::is_open)
    }

    /// Record `unit` as the occupant of `pos`.
    pub(crate) fn place(&mut self, pos: GridPos, unit: UnitId) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.occupant = Some(unit);
        }
    }

    /// Clear the occupant of `pos`.
    pub(crate) fn clear(&mut self, pos: GridPos) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.occupant = None;
        }
    }

    /// Iterate tiles in row-major order with their positions.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, &Tile)> {
        let cols = self.cols;
        self.tiles.iter().enumerate().map(move |(i, tile)| {
            let i = i as i32;
            (GridPos::new(i / cols, i % cols), tile)
        })
    }

    /// Open cells inside a rectangular window, scanned row-major.
    pub fn open_cells_in(
        &self,
        origin: GridPos,
        rows: i32,
        cols: i32,
    ) -> impl Iterator<Item = GridPos> + '_ {
        (origin.row..origin.row + rows)
            .flat_map(move |row| (origin.col..origin.col + cols).map(move |col| GridPos::new(row, col)))
            .filter(move |pos| self.is_open(*pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_dimensions() {
        assert!(matches!(
            Grid::new(0, 5),
            Err(SetupError::InvalidDimensions { rows: 0, cols: 5 })
        ));
        assert!(Grid::new(5, -1).is_err());
    }

    #[test]
    fn test_bounds_and_occupancy() {
        let mut grid = Grid::new(3, 4).unwrap();
        assert!(grid.in_bounds(GridPos::new(2, 3)));
        assert!(!grid.in_bounds(GridPos::new(3, 0)));
        assert!(!grid.in_bounds(GridPos::new(0, -1)));

        grid.place(GridPos::new(1, 1), UnitId(7));
        assert_eq!(grid.occupant(GridPos::new(1, 1)), Some(UnitId(7)));
        assert_eq!(
            grid.check_enterable(GridPos::new(1, 1)),
            Err(TargetIssue::Occupied)
        );

        grid.clear(GridPos::new(1, 1));
        assert!(grid.is_open(GridPos::new(1, 1)));
    }

    #[test]
    fn test_water_is_impassable() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.set_terrain(GridPos::new(0, 1), Terrain::Water);
        assert_eq!(
            grid.check_enterable(GridPos::new(0, 1)),
            Err(TargetIssue::Impassable)
        );
        assert_eq!(
            grid.check_enterable(GridPos::new(5, 5)),
            Err(TargetIssue::OutOfBounds)
        );
    }

    #[test]
    fn test_open_cells_scan_row_major() {
        let mut grid = Grid::new(4, 4).unwrap();
        grid.place(GridPos::new(1, 1), UnitId(1));
        let cells: Vec<_> = grid.open_cells_in(GridPos::new(1, 1), 2, 2).collect();
        assert_eq!(
            cells,
            vec![GridPos::new(1, 2), GridPos::new(2, 1), GridPos::new(2, 2)]
        );
    }

    #[test]
    fn test_iter_positions() {
        let grid = Grid::new(2, 3).unwrap();
        let positions: Vec<_> = grid.iter().map(|(p, _)| p).collect();
        assert_eq!(positions[4], GridPos::new(1, 1));
        assert_eq!(positions.len(), 6);
    }
}
