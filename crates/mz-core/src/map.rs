//! The grid-of-cells graph: construction, adjacency, and toroidal wrap.

use hashbrown::HashSet;

use crate::cell::{Cell, CellType};
use crate::error::MapLayoutError;
use crate::geometry::{Direction, Location, Point};

/// A grid of cells with a start/end border pair and power-up placement
/// bookkeeping. The map owns every cell; adjacency is stored as indices
/// into `cells`, never as a reference out of the map (§9).
#[derive(Debug, Clone)]
pub struct Map {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    start: usize,
    end: usize,

    pub screen_offset: Point,

    /// Cell indices eligible for power-up placement.
    eligible: HashSet<usize>,

    /// AI spawn locations read off a text layout's `V` markers, consumed
    /// in registration order by the caller as AI characters are created.
    pub spawn_slots: Vec<Location>,

    pub min_placement_interval: f32,
    pub simultaneous_limit: usize,
    pub last_placement: f32,
}

impl Map {
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn start_index(&self) -> usize {
        self.start
    }

    pub fn end_index(&self) -> usize {
        self.end
    }

    pub fn start(&self) -> &Cell {
        &self.cells[self.start]
    }

    pub fn end(&self) -> &Cell {
        &self.cells[self.end]
    }

    /// Bounds-checked lookup; `None` stands in for "no such cell" and
    /// callers treat that as a wall (§7, category c).
    pub fn cell(&self, loc: Location) -> Option<&Cell> {
        self.index(loc.x, loc.y).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, loc: Location) -> Option<&mut Cell> {
        self.index(loc.x, loc.y).map(|i| &mut self.cells[i])
    }

    pub fn cell_at_index(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn cell_at_index_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    pub fn index_of(&self, loc: Location) -> Option<usize> {
        self.index(loc.x, loc.y)
    }

    pub fn is_on_border(&self, loc: Location) -> bool {
        loc.x == 0 || loc.y == 0 || loc.x as usize == self.width - 1 || loc.y as usize == self.height - 1
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn path_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_path()).count()
    }

    pub fn eligible_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.eligible.iter().copied()
    }

    pub fn mark_eligible(&mut self, index: usize) {
        self.eligible.insert(index);
    }

    /// An all-wall grid of the given size, with no start/end chosen yet.
    /// Used internally by the maze generator before carving and
    /// entrance/exit selection.
    pub(crate) fn blank(width: usize, height: usize) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::new(Location::new(x as i32, y as i32), CellType::Wall));
            }
        }
        Self {
            width,
            height,
            cells,
            start: 0,
            end: 0,
            screen_offset: Point::new(0.0, 0.0),
            eligible: HashSet::new(),
            spawn_slots: Vec::new(),
            min_placement_interval: 5.0,
            simultaneous_limit: 3,
            last_placement: f32::NEG_INFINITY,
        }
    }

    pub(crate) fn carve(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.cells[i].cell_type = CellType::Path;
        }
    }

    pub(crate) fn set_start_end(&mut self, start: Location, end: Location) {
        self.start = self.index(start.x, start.y).expect("start within bounds");
        self.end = self.index(end.x, end.y).expect("end within bounds");
        self.cells[self.start].cell_type = CellType::Path;
        self.cells[self.end].cell_type = CellType::Path;
    }

    /// Build a map directly from a text layout (§6's "maze config map
    /// body" — in scope, unlike the surrounding declarative file format).
    /// `#` = wall, ` ` = path, `1`-`9` = weighted path, `S` = start,
    /// `E` = exit, `V` = an AI spawn slot, `P` = forced power-up-eligible
    /// cell; unrecognised characters are ignored (left as the wall
    /// default). Rows shorter than the first are padded with wall;
    /// a row longer than the first is an error.
    pub fn from_layout(layout: &str) -> Result<Map, MapLayoutError> {
        let rows: Vec<&str> = layout.lines().filter(|l| !l.is_empty()).collect();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let height = rows.len();
        let mut map = Map::blank(width.max(1), height.max(1));

        let mut start = None;
        let mut end = None;

        for (y, row) in rows.iter().enumerate() {
            let chars: Vec<char> = row.chars().collect();
            if chars.len() > width {
                return Err(MapLayoutError::RowTooLong {
                    row: y,
                    width: chars.len(),
                    max_width: width,
                });
            }
            for (x, ch) in chars.iter().enumerate() {
                let idx = y * width + x;
                match ch {
                    '#' => map.cells[idx].cell_type = CellType::Wall,
                    ' ' => map.cells[idx].cell_type = CellType::Path,
                    '1'..='9' => {
                        map.cells[idx].cell_type = CellType::Path;
                        map.cells[idx].set_weight(ch.to_digit(10).unwrap() as u8);
                    }
                    'S' => {
                        map.cells[idx].cell_type = CellType::Path;
                        start = Some(Location::new(x as i32, y as i32));
                    }
                    'E' => {
                        map.cells[idx].cell_type = CellType::Path;
                        end = Some(Location::new(x as i32, y as i32));
                    }
                    'V' => {
                        map.cells[idx].cell_type = CellType::Path;
                        map.spawn_slots.push(Location::new(x as i32, y as i32));
                    }
                    'P' => {
                        map.cells[idx].cell_type = CellType::Path;
                        map.eligible.insert(idx);
                    }
                    _ => {}
                }
            }
        }

        let start = start.ok_or(MapLayoutError::MissingStart)?;
        let end = end.ok_or(MapLayoutError::MissingEnd)?;
        map.start = map.index(start.x, start.y).expect("start within bounds");
        map.end = map.index(end.x, end.y).expect("end within bounds");
        Ok(map)
    }

    /// Reset every cell's search scratch fields. Callers MUST invoke this
    /// before each new BFS/Dijkstra/A* run.
    pub fn clear_graph(&mut self) {
        for cell in &mut self.cells {
            cell.parent = None;
            cell.color = crate::cell::Color::White;
            cell.distance = i64::MAX;
        }
    }

    /// Link `index`'s adjacency to its neighbours. `all_directions` is
    /// true for the incremental wall-break case (checks all four
    /// neighbours); false for the initial full-grid pass (checks only
    /// north/west — the remaining two directions are completed when a
    /// south/east neighbour processes *its* north/west link, or, for
    /// wrap edges, by `connect`'s dedicated wrap pass).
    pub fn connect_cell(&mut self, index: usize, all_directions: bool) {
        if !self.cells[index].is_path() {
            self.cells[index].clear_adjacency();
            return;
        }
        let loc = self.cells[index].location;
        let dirs: &[Direction] = if all_directions {
            &[Direction::North, Direction::East, Direction::South, Direction::West]
        } else {
            &[Direction::North, Direction::West]
        };
        for &dir in dirs {
            let (dx, dy) = dir.delta_i();
            let Some(n_idx) = self.index(loc.x + dx, loc.y + dy) else {
                continue;
            };
            if self.cells[n_idx].is_path() {
                self.cells[index].set_adjacency(dir, Some(n_idx));
                self.cells[n_idx].set_adjacency(dir.opposite(), Some(index));
            }
        }
    }

    /// Connect every path cell to its neighbours, then install wrap
    /// edges on non-start/end border cells whose mirror is also a path.
    pub fn connect(&mut self) {
        for idx in 0..self.cells.len() {
            self.connect_cell(idx, false);
        }
        self.connect_wrap_edges();
    }

    fn connect_wrap_edges(&mut self) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let last_x = self.width - 1;
        let last_y = self.height - 1;

        for x in 0..self.width {
            let top = x;
            let bottom = last_y * self.width + x;
            self.try_wrap(top, bottom, Direction::North);
        }
        for y in 0..self.height {
            let left = y * self.width;
            let right = y * self.width + last_x;
            self.try_wrap(left, right, Direction::West);
        }
    }

    /// Install a wrap adjacency between `a` and `b` (where `a` is the
    /// top/left cell, linked via `dir_from_b_to_a`), provided both are
    /// path cells and neither is the start or end cell.
    fn try_wrap(&mut self, a: usize, b: usize, dir_from_b_to_a: Direction) {
        if a == b {
            return;
        }
        if a == self.start || a == self.end || b == self.start || b == self.end {
            return;
        }
        if self.cells[a].is_path() && self.cells[b].is_path() {
            self.cells[a].set_adjacency(dir_from_b_to_a.opposite(), Some(b));
            self.cells[b].set_adjacency(dir_from_b_to_a, Some(a));
        }
    }
}
