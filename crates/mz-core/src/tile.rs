//! Background-cell tiling: mapping a cell's 4-neighbour pattern to the
//! four 16x16 quadrant sub-tiles that compose its on-screen tile.
//!
//! The tile sheet is 64x96 pixels (a 4-column x 6-row grid of 16x16
//! quadrant images); this module only computes *which* grid cell each
//! on-screen quadrant should sample, not the actual blitting (out of
//! scope — an external renderer's job).

/// One quarter of a cell's on-screen square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub fn all() -> [Quadrant; 4] {
        [
            Quadrant::TopLeft,
            Quadrant::TopRight,
            Quadrant::BottomLeft,
            Quadrant::BottomRight,
        ]
    }
}

/// Which of a cell's 8 surrounding neighbours differ from it (e.g. a
/// path cell bordering a wall). Only the two cardinal neighbours and one
/// diagonal neighbour adjacent to a given quadrant actually matter to
/// that quadrant's sub-tile choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeighbourSignature {
    pub north: bool,
    pub east: bool,
    pub south: bool,
    pub west: bool,
    pub north_east: bool,
    pub north_west: bool,
    pub south_east: bool,
    pub south_west: bool,
}

/// The shape a quadrant renders, independent of which quadrant it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileVariant {
    /// Neither cardinal neighbour on this quadrant's two edges differs:
    /// a plain interior fill.
    Interior,
    /// Exactly one of the two cardinal neighbours differs: a straight
    /// edge.
    Edge,
    /// Both cardinal neighbours differ: an outer (convex) corner.
    OuterCorner,
    /// Neither cardinal neighbour differs but the diagonal between them
    /// does: the "special angle sub-tile" for a concave corner.
    InnerCorner,
}

/// `(column, row)` into the 4x6 grid of 16x16 quadrant images making up
/// the 64x96 tile sheet.
pub type SheetCoord = (u32, u32);

const SHEET_COLUMNS: u32 = 4;
const SHEET_ROWS: u32 = 6;

/// Resolve which (cardinal, cardinal, diagonal) neighbours are relevant
/// to a given quadrant.
fn relevant(sig: &NeighbourSignature, quadrant: Quadrant) -> (bool, bool, bool) {
    match quadrant {
        Quadrant::TopLeft => (sig.north, sig.west, sig.north_west),
        Quadrant::TopRight => (sig.north, sig.east, sig.north_east),
        Quadrant::BottomLeft => (sig.south, sig.west, sig.south_west),
        Quadrant::BottomRight => (sig.south, sig.east, sig.south_east),
    }
}

/// Classify a quadrant's shape from the cell's neighbour signature.
pub fn classify(sig: &NeighbourSignature, quadrant: Quadrant) -> TileVariant {
    let (cardinal_a, cardinal_b, diagonal) = relevant(sig, quadrant);
    match (cardinal_a, cardinal_b, diagonal) {
        (true, true, _) => TileVariant::OuterCorner,
        (true, false, _) | (false, true, _) => TileVariant::Edge,
        (false, false, true) => TileVariant::InnerCorner,
        (false, false, false) => TileVariant::Interior,
    }
}

/// The sheet coordinate for a quadrant's resolved sub-tile. Each
/// quadrant owns one column of the sheet; the four `TileVariant`s occupy
/// that column's first four rows (rows 4-5 are reserved for the wall
/// tile set, addressed the same way by a caller that classifies against
/// wall-vs-wall adjacency instead of path-vs-wall).
pub fn sheet_coord(sig: &NeighbourSignature, quadrant: Quadrant) -> SheetCoord {
    let column = match quadrant {
        Quadrant::TopLeft => 0,
        Quadrant::TopRight => 1,
        Quadrant::BottomLeft => 2,
        Quadrant::BottomRight => 3,
    };
    let row = match classify(sig, quadrant) {
        TileVariant::Interior => 0,
        TileVariant::Edge => 1,
        TileVariant::OuterCorner => 2,
        TileVariant::InnerCorner => 3,
    };
    debug_assert!(column < SHEET_COLUMNS && row < SHEET_ROWS);
    (column, row)
}

/// All four quadrant sheet coordinates for a cell, in `Quadrant::all()`
/// order.
pub fn cell_quadrants(sig: &NeighbourSignature) -> [SheetCoord; 4] {
    let mut out = [(0, 0); 4];
    for (i, q) in Quadrant::all().into_iter().enumerate() {
        out[i] = sheet_coord(sig, q);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_interior_cell_uses_interior_everywhere() {
        let sig = NeighbourSignature::default();
        for q in Quadrant::all() {
            assert_eq!(classify(&sig, q), TileVariant::Interior);
        }
    }

    #[test]
    fn single_cardinal_edge_yields_edge_variant() {
        let sig = NeighbourSignature {
            north: true,
            ..Default::default()
        };
        assert_eq!(classify(&sig, Quadrant::TopLeft), TileVariant::Edge);
        assert_eq!(classify(&sig, Quadrant::TopRight), TileVariant::Edge);
        assert_eq!(classify(&sig, Quadrant::BottomLeft), TileVariant::Interior);
    }

    #[test]
    fn both_cardinals_yield_outer_corner() {
        let sig = NeighbourSignature {
            north: true,
            west: true,
            ..Default::default()
        };
        assert_eq!(classify(&sig, Quadrant::TopLeft), TileVariant::OuterCorner);
    }

    #[test]
    fn diagonal_only_yields_inner_corner() {
        let sig = NeighbourSignature {
            north_west: true,
            ..Default::default()
        };
        assert_eq!(classify(&sig, Quadrant::TopLeft), TileVariant::InnerCorner);
        // The diagonal is irrelevant to quadrants that don't border it.
        assert_eq!(classify(&sig, Quadrant::TopRight), TileVariant::Interior);
    }

    #[test]
    fn sheet_coords_stay_within_sheet_bounds() {
        let sig = NeighbourSignature {
            north: true,
            east: true,
            south_west: true,
            ..Default::default()
        };
        for coord in cell_quadrants(&sig) {
            assert!(coord.0 < SHEET_COLUMNS);
            assert!(coord.1 < SHEET_ROWS);
        }
    }
}
