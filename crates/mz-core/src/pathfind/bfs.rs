//! Breadth-first search: unweighted shortest path, tie-broken N/E/S/W.

use crate::cell::Color;
use crate::containers::{Fifo, Stack};
use crate::map::Map;

use super::reconstruct;

/// Run BFS from `source` over the whole map, filling every reachable
/// path cell's `distance` (hop count) and `parent`. Does not stop early;
/// used both for single-target path-finding and for reachability checks.
pub fn search(map: &mut Map, source: usize) {
    map.clear_graph();
    let mut queue = Fifo::new();

    map.cell_at_index_mut(source).color = Color::Gray;
    map.cell_at_index_mut(source).distance = 0;
    queue.push(source);

    while let Some(current) = queue.pop() {
        let neighbours: Vec<usize> = map
            .cell_at_index(current)
            .neighbours()
            .map(|(_, idx)| idx)
            .collect();
        for n_idx in neighbours {
            if map.cell_at_index(n_idx).color == Color::White {
                map.cell_at_index_mut(n_idx).color = Color::Gray;
                map.cell_at_index_mut(n_idx).parent = Some(current);
                map.cell_at_index_mut(n_idx).distance = map.cell_at_index(current).distance + 1;
                queue.push(n_idx);
            }
        }
        map.cell_at_index_mut(current).color = Color::Black;
    }
}

/// BFS from `source` to `target`; returns the reconstructed travel-order
/// stack if `target` is reachable.
pub fn path(map: &mut Map, source: usize, target: usize) -> Option<Stack<usize>> {
    search(map, source);
    reconstruct(map, source, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Map;

    #[test]
    fn unreachable_target_returns_none() {
        // Two disconnected path cells with a wall between: no adjacency.
        let mut map = Map::from_layout("S#E\n").unwrap();
        map.connect();
        let result = path(&mut map, map.start_index(), map.end_index());
        assert!(result.is_none());
    }

    #[test]
    fn straight_corridor_path_length_matches_distance() {
        let mut map = Map::from_layout("S   E\n").unwrap();
        map.connect();
        let s = map.start_index();
        let e = map.end_index();
        let stack = path(&mut map, s, e).unwrap();
        assert_eq!(stack.len(), 5);
        assert_eq!(map.cell_at_index(e).distance, 4);
    }

    #[test]
    fn consecutive_path_cells_are_adjacent() {
        let mut map = Map::from_layout("S    \n     \n     \n     \n    E\n").unwrap();
        map.connect();
        let s = map.start_index();
        let e = map.end_index();
        let stack = path(&mut map, s, e).unwrap();
        let cells: Vec<usize> = stack.iter().copied().collect();
        for pair in cells.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let adjacent = map.cell_at_index(a).neighbours().any(|(_, idx)| idx == b);
            assert!(adjacent, "{a} and {b} are not adjacent");
        }
    }
}
