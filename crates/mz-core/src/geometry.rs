//! Points, sizes, rectangles and the cardinal directions they compose with.

use strum::{Display, EnumIter};

/// A 2-D point with floating coordinates.
///
/// `Point::NULL` (both coordinates `+inf`) stands in for "no location" the
/// way the source's `PointNull` does, so a `Point` never needs to be wrapped
/// in an `Option` just to express absence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const NULL: Point = Point {
        x: f32::INFINITY,
        y: f32::INFINITY,
    };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_null(&self) -> bool {
        self.x.is_infinite() && self.y.is_infinite()
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    pub fn offset_by(&self, direction: Direction) -> Point {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }
}

/// An integer grid location (a `Point` snapped to cell coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset_by(&self, direction: Direction) -> Location {
        let (dx, dy) = direction.delta_i();
        Location::new(self.x + dx, self.y + dy)
    }

    /// Manhattan distance between two grid locations.
    pub fn manhattan(&self, other: &Location) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn scaled_by(&self, factor: f32) -> (f32, f32) {
        (self.width as f32 * factor, self.height as f32 * factor)
    }
}

/// An axis-aligned rectangle, origin at top-left, floating coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    /// Intersection rectangle of two rects, with zero area if disjoint.
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.width).min(other.x + other.width);
        let y1 = (self.y + self.height).min(other.y + other.height);
        if x1 <= x0 || y1 <= y0 {
            Rect::new(x0, y0, 0.0, 0.0)
        } else {
            Rect::new(x0, y0, x1 - x0, y1 - y0)
        }
    }

    /// Fractional overlap used as the collision test: intersection area
    /// divided by the *average* of the two rectangles' areas (not their
    /// union — see DESIGN.md for why the average-area denominator is the
    /// one that reproduces the worked collision example).
    pub fn overlap_ratio(&self, other: &Rect) -> f32 {
        let avg_area = (self.area() + other.area()) / 2.0;
        if avg_area <= 0.0 {
            return 0.0;
        }
        self.intersection(other).area() / avg_area
    }

    /// A rectangle of `size` centred on `center`, clamped so it stays
    /// entirely within `[0, max_size]`.
    pub fn centered_clamped(center: Point, size: Size, max_size: Size) -> Rect {
        let half_w = size.width as f32 / 2.0;
        let half_h = size.height as f32 / 2.0;
        let mut x = center.x - half_w;
        let mut y = center.y - half_h;
        let max_w = max_size.width as f32;
        let max_h = max_size.height as f32;
        x = x.clamp(0.0, (max_w - size.width as f32).max(0.0));
        y = y.clamp(0.0, (max_h - size.height as f32).max(0.0));
        Rect::new(x, y, size.width as f32, size.height as f32)
    }

    /// The corner of this rectangle closest to `point`.
    pub fn closest_corner_to(&self, point: Point) -> Point {
        let corners = [
            Point::new(self.x, self.y),
            Point::new(self.x + self.width, self.y),
            Point::new(self.x, self.y + self.height),
            Point::new(self.x + self.width, self.y + self.height),
        ];
        corners
            .into_iter()
            .min_by(|a, b| {
                let da = (a.x - point.x).powi(2) + (a.y - point.y).powi(2);
                let db = (b.x - point.x).powi(2) + (b.y - point.y).powi(2);
                da.partial_cmp(&db).unwrap()
            })
            .unwrap()
    }
}

/// Facing / motion direction, including the "not moving" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum Direction {
    #[default]
    None,
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::None => Direction::None,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Direction::East | Direction::West)
    }

    /// Continuous (x, y) delta for one cell step in this direction.
    pub fn delta(&self) -> (f32, f32) {
        match self {
            Direction::None => (0.0, 0.0),
            Direction::North => (0.0, -1.0),
            Direction::South => (0.0, 1.0),
            Direction::East => (1.0, 0.0),
            Direction::West => (-1.0, 0.0),
        }
    }

    /// Integer grid delta for one cell step in this direction.
    pub fn delta_i(&self) -> (i32, i32) {
        let (dx, dy) = self.delta();
        (dx as i32, dy as i32)
    }

    /// The four cardinal directions, in the engine's canonical tie-break
    /// order: north, east, south, west.
    pub fn cardinals() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_point_roundtrip() {
        assert!(Point::NULL.is_null());
        assert!(!Point::new(0.0, 0.0).is_null());
    }

    #[test]
    fn manhattan_distance() {
        let a = Location::new(0, 0);
        let b = Location::new(3, -4);
        assert_eq!(a.manhattan(&b), 7);
    }

    #[test]
    fn overlap_ratio_matches_worked_example() {
        // Two 32x32 cells; offset 19 along x must read ~40% (below 0.6);
        // offset 12 must read above 0.6.
        let a = Rect::new(0.0, 0.0, 32.0, 32.0);
        let b_19 = Rect::new(19.0, 0.0, 32.0, 32.0);
        let b_12 = Rect::new(12.0, 0.0, 32.0, 32.0);
        let b_20 = Rect::new(20.0, 0.0, 32.0, 32.0);

        let ratio_19 = a.overlap_ratio(&b_19);
        let ratio_12 = a.overlap_ratio(&b_12);
        let ratio_20 = a.overlap_ratio(&b_20);

        assert!(ratio_19 < 0.6, "ratio at offset 19 was {ratio_19}");
        assert!(ratio_12 >= 0.6, "ratio at offset 12 was {ratio_12}");
        assert!(ratio_20 < 0.6, "ratio at offset 20 was {ratio_20}");
    }

    #[test]
    fn direction_opposite_is_involution() {
        for d in Direction::cardinals() {
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn centered_clamped_stays_in_bounds() {
        let r = Rect::centered_clamped(
            Point::new(0.0, 0.0),
            Size::new(4, 4),
            Size::new(10, 10),
        );
        assert_eq!(r.x, 0.0);
        assert_eq!(r.y, 0.0);
    }
}
