//! Edge (boundary) behavior for the grid.

/// How a [`Graph`](crate::Graph) resolves coordinates that fall off its edges.
///
/// # Examples
///
/// ```
/// use prospect_grid::{Coordinate, EdgeBehavior, Graph, Terrain};
///
/// // Wrap: the corner's left neighbour is the far column.
/// let wrap = Graph::uniform(4, 4, 1.0, EdgeBehavior::Wrap, Terrain::Grass).unwrap();
/// assert!(wrap.adjacents(Coordinate::new(0, 0)).contains(&Coordinate::new(3, 0)));
///
/// // Clamp: the corner's left neighbour is the corner itself.
/// let clamp = Graph::uniform(4, 4, 1.0, EdgeBehavior::Clamp, Terrain::Grass).unwrap();
/// assert!(clamp.adjacents(Coordinate::new(0, 0)).contains(&Coordinate::new(0, 0)));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EdgeBehavior {
    /// Out-of-bounds coordinates saturate to the boundary cell (self-loop).
    Clamp,
    /// Out-of-bounds coordinates wrap to the opposite side (torus).
    #[default]
    Wrap,
}

impl EdgeBehavior {
    /// `true` for [`Wrap`](Self::Wrap).
    pub fn is_circumnavigable(self) -> bool {
        self == Self::Wrap
    }
}

/// Resolve one axis value into `[0, len)`.
pub(crate) fn resolve_axis(val: i32, len: u32, edge: EdgeBehavior) -> i32 {
    let n = len as i32;
    if val >= 0 && val < n {
        return val;
    }
    match edge {
        EdgeBehavior::Clamp => val.clamp(0, n - 1),
        EdgeBehavior::Wrap => val.rem_euclid(n),
    }
}

/// Cell distance along one axis of in-range values, accounting for wrap.
pub(crate) fn axis_distance(a: i32, b: i32, len: u32, edge: EdgeBehavior) -> u32 {
    let diff = a.abs_diff(b);
    match edge {
        EdgeBehavior::Wrap => diff.min(len - diff),
        EdgeBehavior::Clamp => diff,
    }
}

/// Of `b`, `b + len` and `b - len`, the image closest to `a`. Ties keep the
/// earlier candidate.
pub(crate) fn nearest_image(a: i32, b: i32, len: u32) -> i32 {
    let n = len as i32;
    let mut best = b;
    for cand in [b + n, b - n] {
        if cand.abs_diff(a) < best.abs_diff(a) {
            best = cand;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_is_non_negative() {
        assert_eq!(resolve_axis(-1, 5, EdgeBehavior::Wrap), 4);
        assert_eq!(resolve_axis(-11, 5, EdgeBehavior::Wrap), 4);
        assert_eq!(resolve_axis(5, 5, EdgeBehavior::Wrap), 0);
        assert_eq!(resolve_axis(12, 5, EdgeBehavior::Wrap), 2);
    }

    #[test]
    fn clamp_saturates() {
        assert_eq!(resolve_axis(-3, 5, EdgeBehavior::Clamp), 0);
        assert_eq!(resolve_axis(9, 5, EdgeBehavior::Clamp), 4);
        assert_eq!(resolve_axis(2, 5, EdgeBehavior::Clamp), 2);
    }

    #[test]
    fn wrapped_axis_distance_takes_short_way() {
        assert_eq!(axis_distance(0, 9, 10, EdgeBehavior::Wrap), 1);
        assert_eq!(axis_distance(0, 9, 10, EdgeBehavior::Clamp), 9);
        assert_eq!(axis_distance(2, 7, 10, EdgeBehavior::Wrap), 5);
    }

    #[test]
    fn nearest_image_prefers_direct_on_tie() {
        assert_eq!(nearest_image(0, 9, 10), -1);
        assert_eq!(nearest_image(9, 0, 10), 10);
        assert_eq!(nearest_image(0, 5, 10), 5);
    }
}
