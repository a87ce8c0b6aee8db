//! Two-dimensional integer grid coordinate.

use std::fmt;

/// A cell address on the grid.
///
/// Coordinates are plain values. A coordinate produced by arithmetic may be
/// out of range; [`Graph::resolve`](crate::Graph::resolve) maps it back onto
/// the grid according to the graph's edge behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    /// Column.
    pub x: i32,
    /// Row. Increases upwards.
    pub y: i32,
}

/// Axis offsets for 4-connectivity: left, right, down, up.
pub(crate) const OFFSETS_4: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

impl Coordinate {
    /// Build a coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// This coordinate shifted by `(dx, dy)`. No wrapping is applied.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The four axis neighbours, unresolved.
    ///
    /// ```
    /// use prospect_grid::Coordinate;
    ///
    /// let adj = Coordinate::new(0, 0).adjacents();
    /// assert!(adj.contains(&Coordinate::new(-1, 0)));
    /// assert!(adj.contains(&Coordinate::new(0, 1)));
    /// ```
    pub fn adjacents(self) -> [Coordinate; 4] {
        OFFSETS_4.map(|(dx, dy)| self.offset(dx, dy))
    }

    /// Manhattan distance, ignoring any wrap.
    pub fn manhattan_distance(self, other: Coordinate) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Squared straight-line distance.
    pub fn squared_distance(self, other: Coordinate) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }

    /// Straight-line distance.
    pub fn euclidean_distance(self, other: Coordinate) -> f32 {
        (self.squared_distance(other) as f64).sqrt() as f32
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}
