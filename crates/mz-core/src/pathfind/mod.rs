//! Shortest-path routines: BFS, Dijkstra, A*, and path reconstruction.

pub mod astar;
pub mod bfs;
pub mod dijkstra;

use crate::containers::Stack;
use crate::map::Map;

/// Walk parent links from `target` back to `source`, pushing each cell
/// index onto a LIFO stack so the caller pops cells in travel order
/// (source first, target last). Returns `None` if `target` was never
/// reached by the preceding search (no parent chain leads to `source`).
pub fn reconstruct(map: &Map, source: usize, target: usize) -> Option<Stack<usize>> {
    let mut stack = Stack::new();
    let mut cur = target;
    loop {
        stack.push(cur);
        if cur == source {
            return Some(stack);
        }
        match map.cell_at_index(cur).parent {
            Some(p) => cur = p,
            None => return None,
        }
    }
}

/// Which named pathfinding routine an AI character uses. Looked up
/// case-insensitively by name; unset or unknown names default to BFS
/// (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathFindingMethod {
    #[default]
    Bfs,
    Dijkstra,
    AStar,
}

impl PathFindingMethod {
    pub fn from_name(name: &str) -> PathFindingMethod {
        match name.to_ascii_lowercase().as_str() {
            "dijkstra" => PathFindingMethod::Dijkstra,
            "astar" | "a*" | "a_star" => PathFindingMethod::AStar,
            "bfs" => PathFindingMethod::Bfs,
            _ => PathFindingMethod::Bfs,
        }
    }

    /// Run the selected routine from `source` to `target`, returning the
    /// reconstructed travel-order stack if `target` is reachable.
    pub fn find(&self, map: &mut Map, source: usize, target: usize) -> Option<Stack<usize>> {
        match self {
            PathFindingMethod::Bfs => bfs::path(map, source, target),
            PathFindingMethod::Dijkstra => dijkstra::path(map, source, target),
            PathFindingMethod::AStar => astar::path(map, source, target, astar::manhattan),
        }
    }
}
