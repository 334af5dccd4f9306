//! Character kinematics: continuous motion interpolated over the discrete
//! cell grid, turning rules at cell boundaries, toroidal wrap, wall
//! interaction, and pairwise collision resolution (§4.5).

use hashbrown::HashMap;

use crate::config::{Dict, Value};
use crate::consts::{
    ALPHA_FADE_STEP, CELL_SIZE, COLLISION_RATIO_THRESHOLD, DEFAULT_ALPHA, DEFAULT_LIVES,
    DEFAULT_RECT_SIZE_CELLS, DEFAULT_SPEED,
};
use crate::containers::Stack;
use crate::geometry::{Direction, Location, Point, Rect, Size};
use crate::map::Map;
use crate::pathfind::PathFindingMethod;
use crate::rng::GameRng;

/// Centre point of a grid location, in continuous rendering units.
pub fn cell_center(loc: Location) -> Point {
    Point::new(
        loc.x as f32 * CELL_SIZE + CELL_SIZE / 2.0,
        loc.y as f32 * CELL_SIZE + CELL_SIZE / 2.0,
    )
}

fn lerp_point(a: Point, b: Point, t: f32) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Result of one `advance` call, used by the caller to drive SFX/events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Still transiting the current segment.
    Moving,
    /// Crossed into a new, directly adjacent path cell.
    EnteredCell(usize),
    /// Crossed into a new cell via a toroidal wrap edge.
    WrappedTo(usize),
    /// Broke through a wall and entered the newly-carved cell.
    BrokeWall(usize),
    /// The next cell was impassable (or off-map); motion halted in place.
    SnappedBack,
}

/// A single character's continuous motion state and configuration.
#[derive(Debug, Clone)]
pub struct Character {
    pub id: u32,
    pub is_user: bool,

    pub position: Point,
    pub location: Location,
    pub last_position: Point,

    pub direction: Direction,
    pub next_direction: Direction,
    pub ratio: f32,

    pub alpha: f32,
    pub lives: u8,

    /// Path stack driving AI following, or the user's displayed route.
    pub path: Stack<usize>,
    /// Indices into the owning [`crate::powerup::PowerupStatus`] table for
    /// every status this character currently holds.
    pub held_powerups: Vec<usize>,

    pub config: Dict,
    pub default_config: Dict,

    /// Animation scheduler keys for the four facing directions.
    pub directional_animations: HashMap<Direction, String>,

    /// Whether this character currently occupies a cell. An AI character
    /// created beyond a map's `V` spawn-slot count starts `false` and is
    /// skipped by the per-tick AI step until placed explicitly (§6).
    pub positioned: bool,
}

impl Character {
    pub fn new(id: u32, is_user: bool, map: &Map, start_index: usize) -> Self {
        let loc = map.cell_at_index(start_index).location;
        let mut config = Dict::new();
        config.set("speed", Value::Float(DEFAULT_SPEED));
        config.set("alpha", Value::Float(DEFAULT_ALPHA));
        config.set("lives", Value::Int(DEFAULT_LIVES as i64));
        config.set(
            "chase_rect_size",
            Value::Size(Size::new(DEFAULT_RECT_SIZE_CELLS.0, DEFAULT_RECT_SIZE_CELLS.1)),
        );
        config.set(
            "exit_search_rect_size",
            Value::Size(Size::new(DEFAULT_RECT_SIZE_CELLS.0, DEFAULT_RECT_SIZE_CELLS.1)),
        );
        config.set("chase_user", Value::Int(1));

        Self {
            id,
            is_user,
            position: cell_center(loc),
            location: loc,
            last_position: Point::NULL,
            direction: Direction::None,
            next_direction: Direction::None,
            ratio: 0.0,
            alpha: DEFAULT_ALPHA,
            lives: DEFAULT_LIVES,
            path: Stack::new(),
            held_powerups: Vec::new(),
            default_config: config.clone(),
            config,
            directional_animations: HashMap::new(),
            positioned: true,
        }
    }

    /// An AI character with no map location yet, for when there are more
    /// enemy configs than a map has spawn slots (§6). Its per-tick AI step
    /// is skipped until [`Character::place_at`] gives it a real location.
    pub fn unplaced(id: u32) -> Self {
        let mut config = Dict::new();
        config.set("speed", Value::Float(DEFAULT_SPEED));
        config.set("alpha", Value::Float(DEFAULT_ALPHA));
        config.set("lives", Value::Int(DEFAULT_LIVES as i64));
        config.set(
            "chase_rect_size",
            Value::Size(Size::new(DEFAULT_RECT_SIZE_CELLS.0, DEFAULT_RECT_SIZE_CELLS.1)),
        );
        config.set(
            "exit_search_rect_size",
            Value::Size(Size::new(DEFAULT_RECT_SIZE_CELLS.0, DEFAULT_RECT_SIZE_CELLS.1)),
        );
        config.set("chase_user", Value::Int(1));

        Self {
            id,
            is_user: false,
            position: Point::NULL,
            location: Location::new(0, 0),
            last_position: Point::NULL,
            direction: Direction::None,
            next_direction: Direction::None,
            ratio: 0.0,
            alpha: DEFAULT_ALPHA,
            lives: DEFAULT_LIVES,
            path: Stack::new(),
            held_powerups: Vec::new(),
            default_config: config.clone(),
            config,
            directional_animations: HashMap::new(),
            positioned: false,
        }
    }

    pub fn cell_index(&self, map: &Map) -> Option<usize> {
        map.index_of(self.location)
    }

    /// Unconditionally place the character at `index`, resetting motion
    /// state (used on spawn, teleport, and level transitions).
    pub fn place_at(&mut self, map: &Map, index: usize) {
        let loc = map.cell_at_index(index).location;
        self.location = loc;
        self.position = cell_center(loc);
        self.last_position = Point::NULL;
        self.direction = Direction::None;
        self.next_direction = Direction::None;
        self.ratio = 0.0;
        self.alpha = 0.0;
        self.positioned = true;
    }

    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
    }

    /// Apply an additive lives delta (a power-up's `lives` effect, §4.6),
    /// clamped to `u8`'s range rather than wrapping.
    pub fn apply_lives_delta(&mut self, delta: i64) {
        let new_value = self.lives as i64 + delta;
        self.lives = new_value.clamp(0, u8::MAX as i64) as u8;
    }

    // -- config-backed behaviour knobs, §4.6's closed key list --

    pub fn speed(&self) -> f32 {
        self.config.get_float("speed", DEFAULT_SPEED)
    }

    pub fn breaks_walls(&self) -> bool {
        self.config.get_bool("breaks_walls", false)
    }

    pub fn ignores_collisions(&self) -> bool {
        self.config.get_bool("ignores_collisions", false)
    }

    pub fn chase_user(&self) -> bool {
        self.config.get_bool("chase_user", true)
    }

    pub fn chase_rect_size(&self) -> Size {
        self.config
            .get_size("chase_rect_size", Size::new(DEFAULT_RECT_SIZE_CELLS.0, DEFAULT_RECT_SIZE_CELLS.1))
    }

    pub fn exit_search_rect_size(&self) -> Size {
        self.config
            .get_size("exit_search_rect_size", Size::new(DEFAULT_RECT_SIZE_CELLS.0, DEFAULT_RECT_SIZE_CELLS.1))
    }

    pub fn path_finding_method(&self) -> PathFindingMethod {
        PathFindingMethod::from_name(self.config.get_string("path_finding_method", ""))
    }

    pub fn chasing_method_name(&self) -> &str {
        self.config.get_string("chasing_method", "predict")
    }

    pub fn bounding_rect(&self) -> Rect {
        Rect::new(
            self.position.x - CELL_SIZE / 2.0,
            self.position.y - CELL_SIZE / 2.0,
            CELL_SIZE,
            CELL_SIZE,
        )
    }

    /// Queue a turn. A reverse of the current direction is honoured right
    /// away (§4.5); any other direction is buffered until the character
    /// next crosses into a new cell.
    pub fn queue_direction(&mut self, dir: Direction) {
        if self.direction != Direction::None && dir == self.direction.opposite() {
            self.direction = dir;
            self.position = cell_center(self.location);
            self.ratio = 0.0;
            self.last_position = Point::NULL;
            self.next_direction = Direction::None;
        } else {
            self.next_direction = dir;
        }
    }

    fn candidate_passable(&self, map: &Map, dir: Direction) -> bool {
        let n_loc = self.location.offset_by(dir);
        match map.index_of(n_loc) {
            Some(idx) => map.cell_at_index(idx).is_path() || (self.breaks_walls() && !map.is_on_border(n_loc)),
            None => false,
        }
    }

    fn try_commit_turn(&mut self, map: &Map) {
        if self.next_direction == Direction::None {
            return;
        }
        if self.candidate_passable(map, self.next_direction) {
            self.direction = self.next_direction;
            self.next_direction = Direction::None;
            self.position = cell_center(self.location);
            self.ratio = 0.0;
            self.last_position = Point::NULL;
        }
    }

    /// Speed bias from the current cell's weight: lighter cells (`W < 5`)
    /// speed the character up, heavier cells (`W > 5`) slow it down, the
    /// default weight (5) leaves `base` unchanged.
    pub fn effective_speed(&self, cell_weight: u8) -> f32 {
        let base = self.speed();
        match cell_weight.cmp(&5) {
            std::cmp::Ordering::Equal => base,
            std::cmp::Ordering::Less => base + (5 - cell_weight) as f32 * 1.5,
            std::cmp::Ordering::Greater => base / ((cell_weight - 5) as f32 * 1.5),
        }
    }

    /// Advance motion by one tick. Returns the outcome so the caller (the
    /// owning [`crate::game::Game`]) can raise SFX/events; the character
    /// itself never touches the event bus.
    pub fn advance(&mut self, map: &mut Map, tick_seconds: f32) -> StepOutcome {
        self.try_commit_turn(map);
        if self.direction == Direction::None {
            return StepOutcome::Moving;
        }

        let cur_idx = map.index_of(self.location).expect("character stands on a valid cell");
        let weight = map.cell_at_index(cur_idx).weight();
        let speed = self.effective_speed(weight);
        let step = (speed * tick_seconds) / CELL_SIZE;

        if self.last_position.is_null() {
            self.last_position = self.position;
        }
        self.ratio = (self.ratio + step).min(1.0);
        let raw_target = cell_center(self.location.offset_by(self.direction));
        self.position = lerp_point(self.last_position, raw_target, self.ratio);

        if self.ratio < 1.0 {
            return StepOutcome::Moving;
        }

        self.ratio = 0.0;
        self.last_position = Point::NULL;

        if let Some(idx) = map.cell_at_index(cur_idx).adjacency(self.direction) {
            let next_loc = map.cell_at_index(idx).location;
            let wrapped = self.location.manhattan(&next_loc) > 1;
            self.location = next_loc;
            self.position = cell_center(next_loc);
            if wrapped {
                self.alpha = 0.0;
            }
            self.try_commit_turn(map);
            return if wrapped {
                StepOutcome::WrappedTo(idx)
            } else {
                StepOutcome::EnteredCell(idx)
            };
        }

        let raw_loc = self.location.offset_by(self.direction);
        if self.breaks_walls() {
            if let Some(widx) = map.index_of(raw_loc) {
                if !map.cell_at_index(widx).is_path() && !map.is_on_border(raw_loc) {
                    map.carve(raw_loc.x, raw_loc.y);
                    map.connect_cell(widx, true);
                    map.connect_cell(cur_idx, true);
                    self.location = raw_loc;
                    self.position = cell_center(raw_loc);
                    self.try_commit_turn(map);
                    return StepOutcome::BrokeWall(widx);
                }
            }
        }

        self.position = cell_center(self.location);
        self.direction = Direction::None;
        StepOutcome::SnappedBack
    }

    /// Fade the character's displayed alpha in by one animation tick's
    /// worth, toward fully opaque (§4.7's 0.1/tick rule).
    pub fn fade_in_tick(&mut self) {
        self.alpha = (self.alpha + ALPHA_FADE_STEP).min(1.0);
    }
}

/// Outcome of a resolved collision between two characters, for the caller
/// to turn into events/SFX.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionEvent {
    pub teleported: Vec<u32>,
    pub user_lost_life: bool,
}

pub(crate) fn teleport_to_random_path_cell(c: &mut Character, map: &Map, rng: &mut GameRng) {
    let path_indices: Vec<usize> = map
        .cells()
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.is_path())
        .map(|(i, _)| i)
        .collect();
    if let Some(&idx) = rng.choose(&path_indices) {
        c.place_at(map, idx);
    }
}

/// Check a pair of characters for a collision and resolve it per §4.5's
/// rule table. Returns `None` if they don't overlap enough to count.
pub fn check_and_resolve_collision(
    a: &mut Character,
    b: &mut Character,
    map: &Map,
    rng: &mut GameRng,
) -> Option<CollisionEvent> {
    if a.id == b.id {
        return None;
    }
    if a.bounding_rect().overlap_ratio(&b.bounding_rect()) < COLLISION_RATIO_THRESHOLD {
        return None;
    }

    if a.ignores_collisions() && b.ignores_collisions() {
        return Some(CollisionEvent {
            teleported: Vec::new(),
            user_lost_life: false,
        });
    }

    let mut teleported = Vec::new();
    let mut user_lost_life = false;

    if a.ignores_collisions() != b.ignores_collisions() {
        let victim = if a.ignores_collisions() { &mut *b } else { &mut *a };
        let id = victim.id;
        teleport_to_random_path_cell(victim, map, rng);
        teleported.push(id);
    } else {
        if a.is_user {
            a.lose_life();
            user_lost_life = true;
        }
        if b.is_user {
            b.lose_life();
            user_lost_life = true;
        }
        teleport_to_random_path_cell(a, map, rng);
        teleport_to_random_path_cell(b, map, rng);
        teleported.push(a.id);
        teleported.push(b.id);
    }

    Some(CollisionEvent {
        teleported,
        user_lost_life,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Map {
        let mut map = Map::from_layout("S    \n     \n     \n     \n    E\n").unwrap();
        map.connect();
        map
    }

    #[test]
    fn effective_speed_matches_weight_bias_formula() {
        let map = corridor();
        let c = Character::new(0, true, &map, map.start_index());
        assert_eq!(c.effective_speed(5), DEFAULT_SPEED);
        assert_eq!(c.effective_speed(3), DEFAULT_SPEED + 2.0 * 1.5);
        assert_eq!(c.effective_speed(7), DEFAULT_SPEED / (2.0 * 1.5));
    }

    #[test]
    fn advance_moves_toward_target_then_snaps_to_cell_centre() {
        let mut map = corridor();
        let mut c = Character::new(0, true, &map, map.start_index());
        c.queue_direction(Direction::East);
        // one full cell's worth of ticks at default speed, weight 5 (default).
        let ticks_needed = (CELL_SIZE / (DEFAULT_SPEED * (1.0 / 60.0))).ceil() as u32 + 1;
        let mut last_outcome = StepOutcome::Moving;
        for _ in 0..ticks_needed {
            last_outcome = c.advance(&mut map, 1.0 / 60.0);
            if !matches!(last_outcome, StepOutcome::Moving) {
                break;
            }
        }
        assert!(matches!(last_outcome, StepOutcome::EnteredCell(_)));
        assert_eq!(c.location, Location::new(1, 0));
        assert_eq!(c.position, cell_center(Location::new(1, 0)));
    }

    #[test]
    fn snaps_back_against_a_wall() {
        let mut map = Map::from_layout("S#   \n     \n").unwrap();
        map.connect();
        let mut c = Character::new(0, true, &map, map.start_index());
        c.queue_direction(Direction::East);
        let mut outcome = StepOutcome::Moving;
        for _ in 0..600 {
            outcome = c.advance(&mut map, 1.0 / 60.0);
            if !matches!(outcome, StepOutcome::Moving) {
                break;
            }
        }
        assert_eq!(outcome, StepOutcome::SnappedBack);
        assert_eq!(c.location, Location::new(0, 0));
    }

    #[test]
    fn breaks_wall_when_configured_to() {
        let mut map = Map::from_layout("S#   \n     \n").unwrap();
        map.connect();
        let mut c = Character::new(0, true, &map, map.start_index());
        c.config.set("breaks_walls", Value::Int(1));
        c.queue_direction(Direction::East);
        let mut outcome = StepOutcome::Moving;
        for _ in 0..600 {
            outcome = c.advance(&mut map, 1.0 / 60.0);
            if !matches!(outcome, StepOutcome::Moving) {
                break;
            }
        }
        assert!(matches!(outcome, StepOutcome::BrokeWall(_)));
        assert!(map.cell(Location::new(1, 0)).unwrap().is_path());
    }

    #[test]
    fn buffered_reverse_is_honoured_immediately() {
        let mut map = corridor();
        let mut c = Character::new(0, true, &map, map.start_index());
        c.queue_direction(Direction::East);
        c.advance(&mut map, 1.0 / 600.0);
        c.queue_direction(Direction::West);
        assert_eq!(c.direction, Direction::West);
    }

    #[test]
    fn non_overlapping_characters_do_not_collide() {
        let map = corridor();
        let mut rng = GameRng::new(1);
        let mut a = Character::new(0, true, &map, map.start_index());
        let mut b = Character::new(1, false, &map, map.end_index());
        a.position = Point::new(0.0, 0.0);
        b.position = Point::new(20.0 + CELL_SIZE, 0.0);
        assert!(check_and_resolve_collision(&mut a, &mut b, &map, &mut rng).is_none());
    }

    #[test]
    fn overlap_at_or_above_threshold_teleports_and_costs_a_life() {
        let map = corridor();
        let mut rng = GameRng::new(1);
        let mut a = Character::new(0, true, &map, map.start_index());
        let mut b = Character::new(1, false, &map, map.start_index());
        a.position = Point::new(0.0, 0.0);
        b.position = Point::new(12.0, 0.0);
        let lives_before = a.lives;
        let outcome = check_and_resolve_collision(&mut a, &mut b, &map, &mut rng).unwrap();
        assert!(outcome.user_lost_life);
        assert_eq!(a.lives, lives_before - 1);
        assert_eq!(outcome.teleported.len(), 2);
    }

    #[test]
    fn unplaced_character_becomes_positioned_once_placed() {
        let map = corridor();
        let mut c = Character::unplaced(9);
        assert!(!c.positioned);
        c.place_at(&map, map.start_index());
        assert!(c.positioned);
        assert_eq!(c.location, map.cell_at_index(map.start_index()).location);
    }

    #[test]
    fn mutual_ignore_is_a_no_op() {
        let map = corridor();
        let mut rng = GameRng::new(1);
        let mut a = Character::new(0, true, &map, map.start_index());
        let mut b = Character::new(1, false, &map, map.start_index());
        a.config.set("ignores_collisions", Value::Int(1));
        b.config.set("ignores_collisions", Value::Int(1));
        a.position = Point::new(0.0, 0.0);
        b.position = Point::new(12.0, 0.0);
        let outcome = check_and_resolve_collision(&mut a, &mut b, &map, &mut rng).unwrap();
        assert!(outcome.teleported.is_empty());
        assert!(!outcome.user_lost_life);
    }

    #[test]
    fn one_sided_ignore_only_teleports_the_other() {
        let map = corridor();
        let mut rng = GameRng::new(1);
        let mut a = Character::new(0, true, &map, map.start_index());
        let mut b = Character::new(1, false, &map, map.start_index());
        b.config.set("ignores_collisions", Value::Int(1));
        a.position = Point::new(0.0, 0.0);
        b.position = Point::new(12.0, 0.0);
        let outcome = check_and_resolve_collision(&mut a, &mut b, &map, &mut rng).unwrap();
        assert_eq!(outcome.teleported, vec![a.id]);
        assert!(!outcome.user_lost_life);
    }
}
