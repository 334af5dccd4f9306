//! Dijkstra's algorithm: weighted shortest path via an indexed min-heap.

use hashbrown::HashMap;

use crate::containers::{IndexedMinHeap, Stack};
use crate::containers::heap::Handle;
use crate::map::Map;

use super::reconstruct;

/// Run Dijkstra from `source` to `target`. Cost of entering a cell is its
/// weight; the source itself contributes no cost. Returns the
/// reconstructed travel-order stack if `target` is reachable.
pub fn path(map: &mut Map, source: usize, target: usize) -> Option<Stack<usize>> {
    map.clear_graph();

    let mut heap: IndexedMinHeap<usize> = IndexedMinHeap::new();
    let mut handles: HashMap<usize, Handle> = HashMap::new();

    map.cell_at_index_mut(source).distance = 0;
    handles.insert(source, heap.insert(source, 0));

    while let Some((current, dist)) = heap.extract_min() {
        if current == target {
            break;
        }
        if dist > map.cell_at_index(current).distance {
            continue;
        }
        let neighbours: Vec<usize> = map
            .cell_at_index(current)
            .neighbours()
            .map(|(_, idx)| idx)
            .collect();
        for n_idx in neighbours {
            let candidate = dist + map.cell_at_index(n_idx).weight() as i64;
            if candidate < map.cell_at_index(n_idx).distance {
                map.cell_at_index_mut(n_idx).distance = candidate;
                map.cell_at_index_mut(n_idx).parent = Some(current);
                match handles.get(&n_idx) {
                    Some(&h) => heap.decrease_key(h, candidate),
                    None => {
                        let h = heap.insert(n_idx, candidate);
                        handles.insert(n_idx, h);
                    }
                }
            }
        }
    }

    reconstruct(map, source, target)
}
