//! Procedural maze generation: perfect (DFS carve) and braided variants,
//! plus post-carve weight randomisation.

use crate::consts::DEFAULT_BRAID_PROBABILITY;
use crate::geometry::Direction;
use crate::map::Map;
use crate::rng::GameRng;

/// Which entrance/exit edge pair the generator uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntranceAxis {
    /// Entrance on the bottom edge, exit on the top edge.
    Vertical,
    /// Entrance on the left edge, exit on the right edge.
    Horizontal,
}

/// A freshly generated, not-yet-`connect`ed maze plus the dead-end cells
/// the DFS carve recorded (used by the braided variant, and exposed for
/// callers that want to reason about corridor topology).
pub struct Generated {
    pub map: Map,
    pub dead_ends: Vec<(i32, i32)>,
}

/// Carve a perfect (single-spanning-tree) maze of `w` x `h` cells. The
/// underlying grid is `(2w+1) x (2h+1)` so corridors land on odd
/// coordinates and walls-between-corridors on even ones.
pub fn generate_perfect(rng: &mut GameRng, w: usize, h: usize, axis: EntranceAxis) -> Generated {
    let (gw, gh) = (2 * w + 1, 2 * h + 1);
    let mut map = Map::blank(gw, gh);

    let mut stack = vec![(1i32, 1i32)];
    map.carve(1, 1);
    let mut dead_ends = Vec::new();

    while let Some(&(cx, cy)) = stack.last() {
        let mut candidates = Vec::new();
        for dir in Direction::cardinals() {
            let (dx, dy) = dir.delta_i();
            let (nx, ny) = (cx + 2 * dx, cy + 2 * dy);
            if nx >= 1 && ny >= 1 && (nx as usize) <= gw - 2 && (ny as usize) <= gh - 2 {
                // still an uncarved wall cell
                if map
                    .cell(crate::geometry::Location::new(nx, ny))
                    .map(|c| c.is_wall())
                    .unwrap_or(false)
                {
                    candidates.push((nx, ny));
                }
            }
        }

        if let Some(&(nx, ny)) = rng.choose(&candidates) {
            map.carve((cx + nx) / 2, (cy + ny) / 2);
            map.carve(nx, ny);
            stack.push((nx, ny));
        } else {
            dead_ends.push((cx, cy));
            stack.pop();
        }
    }

    place_entrance_exit(rng, &mut map, axis, w, h);
    Generated { map, dead_ends }
}

/// Run the perfect carve, then knock out one wall adjacent to each
/// dead-end with probability `p` (selecting uniformly among walls not on
/// the outer border), loosening the maze into a braided one.
pub fn generate_braided(
    rng: &mut GameRng,
    w: usize,
    h: usize,
    axis: EntranceAxis,
    p: f32,
) -> Generated {
    let mut generated = generate_perfect(rng, w, h, axis);
    let (gw, gh) = (generated.map.width(), generated.map.height());

    for &(dx, dy) in &generated.dead_ends {
        if !rng.percent(p) {
            continue;
        }
        let mut wall_candidates = Vec::new();
        for dir in Direction::cardinals() {
            let (ox, oy) = dir.delta_i();
            let (nx, ny) = (dx + ox, dy + oy);
            let on_border = nx <= 0 || ny <= 0 || nx as usize >= gw - 1 || ny as usize >= gh - 1;
            if on_border {
                continue;
            }
            if generated
                .map
                .cell(crate::geometry::Location::new(nx, ny))
                .map(|c| c.is_wall())
                .unwrap_or(false)
            {
                wall_candidates.push((nx, ny));
            }
        }
        if let Some(&(nx, ny)) = rng.choose(&wall_candidates) {
            generated.map.carve(nx, ny);
        }
    }

    generated
}

/// Default-probability braided generation (§4.2's stated default, 0.2).
pub fn generate_braided_default(rng: &mut GameRng, w: usize, h: usize, axis: EntranceAxis) -> Generated {
    generate_braided(rng, w, h, axis, DEFAULT_BRAID_PROBABILITY)
}

fn place_entrance_exit(rng: &mut GameRng, map: &mut Map, axis: EntranceAxis, w: usize, h: usize) {
    use crate::geometry::Location;

    let (entrance, exit) = match axis {
        EntranceAxis::Vertical => {
            let bottom_y = (2 * h) as i32;
            let top_y = 0;
            let ex = 2 * (rng.rn2(w as u32) as i32) + 1;
            let xx = 2 * (rng.rn2(w as u32) as i32) + 1;
            (Location::new(ex, bottom_y), Location::new(xx, top_y))
        }
        EntranceAxis::Horizontal => {
            let left_x = 0;
            let right_x = (2 * w) as i32;
            let ey = 2 * (rng.rn2(h as u32) as i32) + 1;
            let xy = 2 * (rng.rn2(h as u32) as i32) + 1;
            (Location::new(left_x, ey), Location::new(right_x, xy))
        }
    };

    map.carve(entrance.x, entrance.y);
    map.carve(exit.x, exit.y);
    map.set_start_end(entrance, exit);
}

/// Pick up to `floor(10 * complexity)` random path cells and, along a
/// random cardinal direction for a random length in `[1, 5]`, stamp a
/// weight drawn uniformly from a range of size `ceil(complexity * 9 / 2)`
/// centred on the default weight (5). Weights bias Dijkstra/A* and
/// character speed.
pub fn randomize_weights(rng: &mut GameRng, map: &mut Map, complexity: f32) {
    let complexity = complexity.clamp(0.0, 1.0);
    let path_indices: Vec<usize> = map
        .cells()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_path())
        .map(|(i, _)| i)
        .collect();
    if path_indices.is_empty() {
        return;
    }

    let range_size = (complexity * 9.0 / 2.0).ceil() as i64;
    let half = range_size / 2;
    let low = (5 - half).max(1);
    let high = (5 + half).min(9);

    let picks = (10.0 * complexity).floor() as usize;
    for _ in 0..picks {
        let Some(&start_idx) = rng.choose(&path_indices) else {
            continue;
        };
        let Some(&dir) = rng.choose(&Direction::cardinals()) else {
            continue;
        };
        let length = rng.rn_range(1, 5);
        let mut cur = start_idx;
        for _ in 0..length {
            let weight = rng.rn_range(low, high) as u8;
            map.cell_at_index_mut(cur).set_weight(weight);
            match map.cell_at_index(cur).adjacency(dir) {
                Some(next) => cur = next,
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfind::bfs;
    use proptest::prelude::*;

    #[test]
    fn perfect_maze_has_no_all_path_2x2_block() {
        let mut rng = GameRng::new(42);
        let mut g = generate_perfect(&mut rng, 5, 5, EntranceAxis::Vertical);
        g.map.connect();
        for y in 0..g.map.height() - 1 {
            for x in 0..g.map.width() - 1 {
                let all_path = [(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)]
                    .iter()
                    .all(|&(cx, cy)| {
                        g.map
                            .cell(crate::geometry::Location::new(cx as i32, cy as i32))
                            .map(|c| c.is_path())
                            .unwrap_or(false)
                    });
                assert!(!all_path, "found a 2x2 all-path block at ({x},{y})");
            }
        }
    }

    #[test]
    fn every_path_cell_reachable_from_start() {
        let mut rng = GameRng::new(7);
        let mut g = generate_perfect(&mut rng, 6, 6, EntranceAxis::Horizontal);
        g.map.connect();
        let total_path = g.map.path_cell_count();
        let result = bfs::search(&mut g.map, g.map.start_index());
        let reached = g
            .map
            .cells()
            .iter()
            .filter(|c| c.is_path() && c.distance != i64::MAX)
            .count();
        let _ = result;
        assert_eq!(reached, total_path);
    }

    #[test]
    fn braided_maze_still_fully_reachable() {
        let mut rng = GameRng::new(11);
        let mut g = generate_braided_default(&mut rng, 6, 6, EntranceAxis::Vertical);
        g.map.connect();
        let total_path = g.map.path_cell_count();
        bfs::search(&mut g.map, g.map.start_index());
        let reached = g
            .map
            .cells()
            .iter()
            .filter(|c| c.is_path() && c.distance != i64::MAX)
            .count();
        assert_eq!(reached, total_path);
    }

    #[test]
    fn seeded_five_by_five_yields_twentyfive_path_cells() {
        let mut rng = GameRng::new(42);
        let g = generate_perfect(&mut rng, 5, 5, EntranceAxis::Vertical);
        // A spanning tree over a 5x5 lattice of corridor cells visits
        // exactly 25 distinct odd-coordinate cells, plus the entrance and
        // exit border cells.
        let interior_path_cells = g
            .map
            .cells()
            .iter()
            .filter(|c| c.is_path() && c.location.x % 2 == 1 && c.location.y % 2 == 1)
            .count();
        assert_eq!(interior_path_cells, 25);
    }

    #[test]
    fn randomize_weights_stays_in_valid_range() {
        let mut rng = GameRng::new(3);
        let mut g = generate_perfect(&mut rng, 5, 5, EntranceAxis::Vertical);
        g.map.connect();
        randomize_weights(&mut rng, &mut g.map, 0.8);
        for cell in g.map.cells() {
            assert!((1..=9).contains(&cell.weight()));
        }
    }

    proptest! {
        /// §8: "for every generated map of each variant, every path cell is
        /// reachable from every other path cell" and "`connect(map)` yields
        /// symmetric adjacency", across arbitrary seeds and sizes for both
        /// generator variants.
        #[test]
        fn every_generated_maze_is_fully_connected_with_symmetric_adjacency(
            seed in any::<u32>(),
            w in 4usize..12,
            h in 4usize..12,
            braided in any::<bool>(),
            axis_vertical in any::<bool>(),
        ) {
            let mut rng = GameRng::new(seed as u64);
            let axis = if axis_vertical { EntranceAxis::Vertical } else { EntranceAxis::Horizontal };
            let mut g = if braided {
                generate_braided_default(&mut rng, w, h, axis)
            } else {
                generate_perfect(&mut rng, w, h, axis)
            };
            g.map.connect();

            for (idx, cell) in g.map.cells().iter().enumerate() {
                for (dir, n_idx) in cell.neighbours() {
                    let back = g.map.cells()[n_idx].adjacency(dir.opposite());
                    prop_assert_eq!(back, Some(idx));
                }
            }

            let total_path = g.map.path_cell_count();
            bfs::search(&mut g.map, g.map.start_index());
            let reached = g
                .map
                .cells()
                .iter()
                .filter(|c| c.is_path() && c.distance != i64::MAX)
                .count();
            prop_assert_eq!(reached, total_path);
        }
    }
}
