//! Engine-wide constants.

/// Size of a cell in rendering units; also the unit of continuous position.
pub const CELL_SIZE: f32 = 32.0;

/// Minimum width/height of a procedurally generated map, in cells.
pub const MIN_MAP_DIMENSION: usize = 9;

/// Default character weight stamped on a freshly carved cell.
pub const CELL_DEFAULT_WEIGHT: u8 = 5;

/// Valid range for a cell's pathfinding weight.
pub const CELL_WEIGHT_RANGE: core::ops::RangeInclusive<u8> = 1..=9;

/// Default base character speed (cells/second-equivalent), before weight bias.
pub const DEFAULT_SPEED: f32 = 3.5;

/// Default character alpha (fully opaque).
pub const DEFAULT_ALPHA: f32 = 1.0;

/// Default chase/exit search rectangle size, in cells.
pub const DEFAULT_RECT_SIZE_CELLS: (u32, u32) = (2, 2);

/// Default user lives.
pub const DEFAULT_LIVES: u8 = 5;

/// Fraction of average bounding-rect area that counts as a collision.
pub const COLLISION_RATIO_THRESHOLD: f32 = 0.6;

/// Principal tick rate driving redraw, motion and AI (Hz).
pub const PRINCIPAL_TICK_HZ: f32 = 60.0;

/// Slower tick rate driving directional sprite animation and alpha fade-in (Hz).
pub const ANIMATION_TICK_HZ: f32 = 5.0;

/// Per-tick alpha fade-in increment, at the animation tick rate.
pub const ALPHA_FADE_STEP: f32 = 0.1;

/// Random projection distance range used by the predictive chase strategy.
pub const PREDICT_CHASE_MIN_CELLS: u32 = 4;
pub const PREDICT_CHASE_MAX_CELLS: u32 = 8;

/// Number of offsets the trap (ambush) chase strategy picks from.
pub const TRAP_OFFSET_CHOICES: usize = 3;

/// Upper bound on iterations for bounded random-walk / nearest-path searches
/// (the trap strategy's destination repair walk, and the nearest-walkable
/// fallback search). Keeps those searches from looping forever against a
/// pathological or malformed map.
pub const BOUNDED_SEARCH_MAX_ITERATIONS: usize = 4096;

/// Default braided-maze dead-end knockout probability.
pub const DEFAULT_BRAID_PROBABILITY: f32 = 0.2;

/// Frame length of the level-next "title card" stage of the fade chain.
pub const LEVEL_TITLE_CARD_FRAMES: u32 = 90;

/// Power-up placement cadence (1 Hz, matching the activation/duration tick).
pub const POWERUP_PLACEMENT_TICK_SECONDS: f32 = 1.0;

/// 4-neighbour tile quadrant count used by background tiling.
pub const TILE_QUADRANTS: usize = 4;
