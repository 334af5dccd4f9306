//! Non-user character decision layer: target selection, chasing
//! strategies, wandering, and path-following (§4.4).

use crate::character::{cell_center, Character};
use crate::consts::{BOUNDED_SEARCH_MAX_ITERATIONS, CELL_SIZE, PREDICT_CHASE_MAX_CELLS, PREDICT_CHASE_MIN_CELLS};
use crate::geometry::{Direction, Location, Rect, Size};
use crate::map::Map;
use crate::rng::GameRng;

/// A rectangle of `size_cells` (in grid cells) centred on `center` and
/// clamped to the map's continuous bounds. Shared by target-rectangle
/// selection here and by the power-up "others" effect-area test.
pub(crate) fn area_rect(center: crate::geometry::Point, size_cells: Size, map: &Map) -> Rect {
    let px = Size::new(size_cells.width * CELL_SIZE as u32, size_cells.height * CELL_SIZE as u32);
    let bounds = Size::new(map.width() as u32 * CELL_SIZE as u32, map.height() as u32 * CELL_SIZE as u32);
    Rect::centered_clamped(center, px, bounds)
}

/// What an AI character should currently be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Chase,
    Exit,
    Wander,
}

/// Decide whether an AI should chase the user, head for the exit, or
/// wander, honouring the character's `chase_user` preference order
/// (§4.4's "two rectangles ... and a preference order between them").
pub fn select_target(map: &Map, ai: &Character, user: Option<&Character>) -> Target {
    let chase_rect = area_rect(ai.position, ai.chase_rect_size(), map);
    let exit_rect = area_rect(ai.position, ai.exit_search_rect_size(), map);
    let exit_center = cell_center(map.end().location);

    let user_in_chase = user.map(|u| chase_rect.contains_point(u.position)).unwrap_or(false);
    let exit_in_range = exit_rect.contains_point(exit_center);

    if ai.chase_user() {
        if user_in_chase {
            Target::Chase
        } else if exit_in_range {
            Target::Exit
        } else {
            Target::Wander
        }
    } else if exit_in_range {
        Target::Exit
    } else if user_in_chase {
        Target::Chase
    } else {
        Target::Wander
    }
}

/// Bounded outward random walk from `start_idx` looking for the nearest
/// path cell, capped by `BOUNDED_SEARCH_MAX_ITERATIONS` so a pathological
/// map can never hang the tick loop.
fn bounded_random_walk_to_path(rng: &mut GameRng, map: &Map, start_idx: usize) -> Option<usize> {
    let mut current = start_idx;
    for _ in 0..BOUNDED_SEARCH_MAX_ITERATIONS {
        if map.cell_at_index(current).is_path() {
            return Some(current);
        }
        let cardinals = Direction::cardinals();
        let dir = *rng.choose(&cardinals)?;
        let next_loc = map.cell_at_index(current).location.offset_by(dir);
        if let Some(next_idx) = map.index_of(next_loc) {
            current = next_idx;
        }
    }
    None
}

fn direction_between(from: Location, to: Location) -> Direction {
    match (to.x - from.x, to.y - from.y) {
        (0, -1) => Direction::North,
        (0, 1) => Direction::South,
        (1, 0) => Direction::East,
        (-1, 0) => Direction::West,
        _ => Direction::None,
    }
}

/// A chasing strategy: attempt to lay a path in `chaser.path` toward
/// `target`. Returns whether a path was committed.
pub trait Chaser {
    fn try_chase(
        &self,
        rng: &mut GameRng,
        map: &mut Map,
        chaser: &mut Character,
        target: &Character,
        decoy: Option<&Character>,
    ) -> bool;
}

/// Projects the target's travel a random distance ahead along its current
/// heading (stopping at the first wall) and paths toward that point,
/// unless the projection already shares an axis with the chaser or the
/// chaser is adjacent, in which case it aims straight at the target.
pub struct PredictPosition;

impl Chaser for PredictPosition {
    fn try_chase(
        &self,
        rng: &mut GameRng,
        map: &mut Map,
        chaser: &mut Character,
        target: &Character,
        _decoy: Option<&Character>,
    ) -> bool {
        let Some(chaser_idx) = map.index_of(chaser.location) else {
            return false;
        };
        let Some(mut projected_idx) = map.index_of(target.location) else {
            return false;
        };
        let mut projected = target.location;

        if target.direction != Direction::None {
            let distance = rng.rn_range(PREDICT_CHASE_MIN_CELLS as i64, PREDICT_CHASE_MAX_CELLS as i64);
            for _ in 0..distance {
                match map.cell_at_index(projected_idx).adjacency(target.direction) {
                    Some(n) => {
                        projected_idx = n;
                        projected = map.cell_at_index(n).location;
                    }
                    None => break,
                }
            }
        }

        let aim_directly = projected.x == chaser.location.x
            || projected.y == chaser.location.y
            || chaser.location.manhattan(&target.location) <= 1;
        let dest_idx = if aim_directly {
            match map.index_of(target.location) {
                Some(idx) => idx,
                None => return false,
            }
        } else {
            projected_idx
        };

        match chaser.path_finding_method().find(map, chaser_idx, dest_idx) {
            Some(path) => {
                chaser.path = path;
                true
            }
            None => false,
        }
    }
}

fn trap_offsets(dir: Direction) -> [(i32, i32); 3] {
    match dir {
        Direction::North => [(0, -2), (2, -2), (-2, -2)],
        Direction::South => [(0, 2), (2, 2), (-2, 2)],
        Direction::East => [(2, 0), (2, -2), (2, 2)],
        Direction::West => [(-2, 0), (-2, -2), (-2, 2)],
        Direction::None => [(0, 0), (0, -2), (0, 2)],
    }
}

/// Requires a third AI on the map (`decoy`) to triangulate an ambush
/// point: picks one of three offsets near the target's heading, then
/// reflects the decoy's position through that point to compute a
/// destination that sandwiches the target between the two AIs.
pub struct Trap;

impl Chaser for Trap {
    fn try_chase(
        &self,
        rng: &mut GameRng,
        map: &mut Map,
        chaser: &mut Character,
        target: &Character,
        decoy: Option<&Character>,
    ) -> bool {
        let Some(decoy) = decoy else {
            return false;
        };
        let Some(chaser_idx) = map.index_of(chaser.location) else {
            return false;
        };
        let offsets = trap_offsets(target.direction);
        let Some(&(ox, oy)) = rng.choose(&offsets) else {
            return false;
        };
        let pivot = Location::new(target.location.x + ox, target.location.y + oy);
        let dest = Location::new(2 * pivot.x - decoy.location.x, 2 * pivot.y - decoy.location.y);

        let dest_idx = match map.index_of(dest) {
            Some(idx) if map.cell_at_index(idx).is_path() => idx,
            Some(idx) => match bounded_random_walk_to_path(rng, map, idx) {
                Some(found) => found,
                None => return false,
            },
            None => return false,
        };

        match chaser.path_finding_method().find(map, chaser_idx, dest_idx) {
            Some(path) => {
                chaser.path = path;
                true
            }
            None => false,
        }
    }
}

/// Head for whichever corner of the exit-search rectangle sits closest to
/// the exit, clamping any out-of-grid corner back into the map with a
/// bounded random cardinal walk, then path-finds to the nearest reachable
/// path cell from there.
pub fn wander(rng: &mut GameRng, map: &mut Map, ai: &mut Character) -> bool {
    let exit_rect = area_rect(ai.position, ai.exit_search_rect_size(), map);
    let exit_point = cell_center(map.end().location);
    let corner = exit_rect.closest_corner_to(exit_point);
    let mut loc = Location::new((corner.x / CELL_SIZE) as i32, (corner.y / CELL_SIZE) as i32);

    let mut idx = map.index_of(loc);
    let mut iterations = 0;
    while idx.is_none() && iterations < BOUNDED_SEARCH_MAX_ITERATIONS {
        let cardinals = Direction::cardinals();
        let Some(&dir) = rng.choose(&cardinals) else {
            return false;
        };
        loc = loc.offset_by(dir);
        idx = map.index_of(loc);
        iterations += 1;
    }
    let Some(idx) = idx else {
        return false;
    };

    let dest_idx = if map.cell_at_index(idx).is_path() {
        idx
    } else {
        match bounded_random_walk_to_path(rng, map, idx) {
            Some(found) => found,
            None => return false,
        }
    };

    let Some(chaser_idx) = map.index_of(ai.location) else {
        return false;
    };
    match ai.path_finding_method().find(map, chaser_idx, dest_idx) {
        Some(path) => {
            ai.path = path;
            true
        }
        None => false,
    }
}

/// Pop the next cell off an AI's path stack and queue the corresponding
/// turn, returning whether anything was left to follow.
pub fn follow_path(ai: &mut Character, map: &Map) -> bool {
    match ai.path.pop() {
        Some(idx) => {
            let next_loc = map.cell_at_index(idx).location;
            let dir = direction_between(ai.location, next_loc);
            if dir != Direction::None {
                ai.queue_direction(dir);
            }
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Value;

    fn room(layout: &str) -> Map {
        let mut map = Map::from_layout(layout).unwrap();
        map.connect();
        map
    }

    #[test]
    fn chase_preferred_when_user_in_chase_rect_and_chase_user_enabled() {
        let map = room("S    \n     \n     \n     \n    E\n");
        let mut ai = Character::new(1, false, &map, map.start_index());
        ai.config.set("chase_rect_size", Value::Size(Size::new(4, 4)));
        let user = Character::new(0, true, &map, map.start_index());
        assert_eq!(select_target(&map, &ai, Some(&user)), Target::Chase);
    }

    #[test]
    fn exit_preferred_over_chase_when_chase_user_disabled() {
        let map = room("S    \n     \n     \n     \n    E\n");
        let mut ai = Character::new(1, false, &map, map.end_index());
        ai.config.set("chase_user", Value::Int(0));
        ai.config.set("exit_search_rect_size", Value::Size(Size::new(4, 4)));
        let user = Character::new(0, true, &map, map.start_index());
        assert_eq!(select_target(&map, &ai, Some(&user)), Target::Exit);
    }

    #[test]
    fn wander_when_neither_rect_matches() {
        let map = room("S    \n     \n     \n     \n    E\n");
        let ai = Character::new(1, false, &map, map.start_index());
        let user = Character::new(0, true, &map, map.end_index());
        assert_eq!(select_target(&map, &ai, Some(&user)), Target::Wander);
    }

    #[test]
    fn predict_aims_directly_when_adjacent() {
        let map = room("SE\n");
        let mut rng = GameRng::new(7);
        let mut map = map;
        let mut chaser = Character::new(1, false, &map, map.start_index());
        let target = Character::new(0, true, &map, map.end_index());
        assert!(PredictPosition.try_chase(&mut rng, &mut map, &mut chaser, &target, None));
        assert_eq!(chaser.path.len(), 2);
    }

    #[test]
    fn wander_lays_a_path_toward_the_exit_side() {
        let mut map = room("S    \n     \n     \n     \n    E\n");
        let mut rng = GameRng::new(3);
        let mut ai = Character::new(1, false, &map, map.start_index());
        assert!(wander(&mut rng, &mut map, &mut ai));
        assert!(!ai.path.is_empty());
    }

    #[test]
    fn follow_path_pops_and_queues_a_direction() {
        let map = room("SE\n");
        let mut ai = Character::new(1, false, &map, map.start_index());
        let target_idx = map.index_of(Location::new(1, 0)).unwrap();
        ai.path.push(target_idx);
        assert!(follow_path(&mut ai, &map));
        assert_eq!(ai.next_direction, Direction::East);
    }

    #[test]
    fn follow_path_reports_empty_when_nothing_queued() {
        let map = room("SE\n");
        let mut ai = Character::new(1, false, &map, map.start_index());
        assert!(!follow_path(&mut ai, &map));
    }
}
