//! Pairwise ownership policies for brute-force partitions.

use std::cmp::Ordering;

use glam::Vec2;
use prospect_grid::{Coordinate, Graph};

/// Decides which of two sites owns a point.
///
/// `Less` means `a` owns `point`, `Greater` means `b` does, `Equal` is a
/// tie. A tie leaves the current owner in place.
pub trait OwnershipPolicy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Compare `a` and `b` as owners of `point`.
    fn compare_ownership(
        &self,
        point: Coordinate,
        a: Coordinate,
        b: Coordinate,
        graph: &Graph,
    ) -> Ordering;
}

/// Straight-line distance. Ignores wrap.
#[derive(Clone, Copy, Debug, Default)]
pub struct Euclidean;

impl OwnershipPolicy for Euclidean {
    fn name(&self) -> &'static str {
        "euclidean"
    }

    fn compare_ownership(&self, point: Coordinate, a: Coordinate, b: Coordinate, _: &Graph) -> Ordering {
        point.squared_distance(a).cmp(&point.squared_distance(b))
    }
}

/// Grid distance through [`Graph::grid_distance`], so it follows the
/// graph's edge policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct Manhattan;

impl OwnershipPolicy for Manhattan {
    fn name(&self) -> &'static str {
        "manhattan"
    }

    fn compare_ownership(&self, point: Coordinate, a: Coordinate, b: Coordinate, graph: &Graph) -> Ordering {
        graph
            .grid_distance(point, a)
            .cmp(&graph.grid_distance(point, b))
    }
}

/// Euclidean distance to the nearest periodic image of each site.
#[derive(Clone, Copy, Debug, Default)]
pub struct ToroidalEuclidean;

impl ToroidalEuclidean {
    fn squared(point: Coordinate, site: Coordinate, graph: &Graph) -> i64 {
        let axis = |p: i32, s: i32, len: u32| -> i64 {
            let d = i64::from(p.abs_diff(s)) % i64::from(len);
            let d = d.min(i64::from(len) - d);
            d * d
        };
        axis(point.x, site.x, graph.width()) + axis(point.y, site.y, graph.height())
    }
}

impl OwnershipPolicy for ToroidalEuclidean {
    fn name(&self) -> &'static str {
        "toroidal-euclidean"
    }

    fn compare_ownership(&self, point: Coordinate, a: Coordinate, b: Coordinate, graph: &Graph) -> Ordering {
        Self::squared(point, a, graph).cmp(&Self::squared(point, b, graph))
    }
}

/// Which side of the perpendicular bisector between `a` and `b` the point
/// falls on.
#[derive(Clone, Copy, Debug, Default)]
pub struct BisectorSide;

impl OwnershipPolicy for BisectorSide {
    fn name(&self) -> &'static str {
        "bisector"
    }

    fn compare_ownership(&self, point: Coordinate, a: Coordinate, b: Coordinate, _: &Graph) -> Ordering {
        let (p, a, b) = (to_vec(point), to_vec(a), to_vec(b));
        let normal = a - b;
        let mid = (a + b) * 0.5;
        let side = (p - mid).dot(normal);
        // Positive side faces `a`.
        side.partial_cmp(&0.0)
            .map_or(Ordering::Equal, Ordering::reverse)
    }
}

pub(crate) fn to_vec(c: Coordinate) -> Vec2 {
    Vec2::new(c.x as f32, c.y as f32)
}
