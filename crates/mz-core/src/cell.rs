//! A single map-grid location and its graph-search scratch fields.

use crate::consts::{CELL_DEFAULT_WEIGHT, CELL_WEIGHT_RANGE};
use crate::geometry::{Direction, Location};

/// What a cell is: impassable, passable, or not yet carved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellType {
    #[default]
    Unknown,
    Path,
    Wall,
}

/// BFS/DFS tri-colour marker used by the search routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    White,
    Gray,
    Black,
}

/// A power-up instance sitting on a cell, with the tick it was placed at
/// (used by the decay rule: a cell older than `now - timeout` is emptied).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerupSlot {
    pub template_id: usize,
    pub placed_at: f32,
}

/// One location in a [`crate::map::Map`]'s grid.
///
/// Adjacency is stored as indices into the owning map's dense cell array
/// (§9's "cyclic references... represented as cell indices... borrowed
/// from the map"), never as an owned reference.
#[derive(Debug, Clone)]
pub struct Cell {
    pub cell_type: CellType,
    pub location: Location,

    north: Option<usize>,
    east: Option<usize>,
    south: Option<usize>,
    west: Option<usize>,

    pub parent: Option<usize>,
    pub color: Color,
    pub distance: i64,
    weight: u8,

    pub powerup: Option<PowerupSlot>,
}

impl Cell {
    pub fn new(location: Location, cell_type: CellType) -> Self {
        Self {
            cell_type,
            location,
            north: None,
            east: None,
            south: None,
            west: None,
            parent: None,
            color: Color::White,
            distance: i64::MAX,
            weight: CELL_DEFAULT_WEIGHT,
            powerup: None,
        }
    }

    pub fn is_path(&self) -> bool {
        self.cell_type == CellType::Path
    }

    pub fn is_wall(&self) -> bool {
        self.cell_type == CellType::Wall
    }

    pub fn weight(&self) -> u8 {
        self.weight
    }

    /// Stamp a new weight, clamped to the valid `[1, 9]` range.
    pub fn set_weight(&mut self, weight: u8) {
        self.weight = weight.clamp(*CELL_WEIGHT_RANGE.start(), *CELL_WEIGHT_RANGE.end());
    }

    pub fn adjacency(&self, direction: Direction) -> Option<usize> {
        match direction {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
            Direction::None => None,
        }
    }

    pub fn set_adjacency(&mut self, direction: Direction, index: Option<usize>) {
        match direction {
            Direction::North => self.north = index,
            Direction::East => self.east = index,
            Direction::South => self.south = index,
            Direction::West => self.west = index,
            Direction::None => {}
        }
    }

    /// Every non-`None` adjacency, paired with the direction it's reached
    /// by, in the engine's canonical N/E/S/W tie-break order.
    pub fn neighbours(&self) -> impl Iterator<Item = (Direction, usize)> + '_ {
        Direction::cardinals()
            .into_iter()
            .filter_map(move |d| self.adjacency(d).map(|idx| (d, idx)))
    }

    /// Drop every adjacency (non-path cells have none, per the invariant).
    pub fn clear_adjacency(&mut self) {
        self.north = None;
        self.east = None;
        self.south = None;
        self.west = None;
    }
}
