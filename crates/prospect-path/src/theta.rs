//! A* with line-of-sight smoothing.

use prospect_core::PoolStats;
use prospect_grid::{Coordinate, Graph, TerrainCosts, TerrainSet};

use crate::astar::AStar;
use crate::path::Path;
use crate::pathfinder::Pathfinder;

/// Test a Bresenham line must pass before two waypoints are joined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SmoothingPolicy {
    /// Every cell on the line has the same terrain and is traversable.
    #[default]
    SameTerrain,
    /// Every cell on the line is traversable.
    NotBlocked,
}

/// Runs [`AStar`], then string-pulls the result.
///
/// From each kept waypoint the farthest later waypoint with a passing
/// line is kept next; when none passes, the following node is kept. The
/// output therefore has at most as many cells as the A\* path. Use
/// [`Path::expand`] to walk it cell by cell.
#[derive(Debug, Default)]
pub struct ThetaStar {
    inner: AStar,
    smoothing: SmoothingPolicy,
}

impl ThetaStar {
    /// Theta\* with the default [`SmoothingPolicy::SameTerrain`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Theta\* with an explicit smoothing test.
    pub fn with_smoothing(smoothing: SmoothingPolicy) -> Self {
        Self {
            inner: AStar::new(),
            smoothing,
        }
    }

    /// The smoothing test in use.
    pub fn smoothing(&self) -> SmoothingPolicy {
        self.smoothing
    }

    /// String-pull `path`. Paths shorter than three cells come back unchanged.
    pub fn smooth(&self, graph: &Graph, path: Path, blocked: TerrainSet) -> Path {
        let cells = path.as_slice();
        if cells.len() < 3 {
            return path;
        }
        let last = cells.len() - 1;
        let mut out = vec![cells[0]];
        let mut i = 0;
        while i < last {
            let mut j = last;
            while j > i + 1 && !self.line_passes(graph, cells[i], cells[j], blocked) {
                j -= 1;
            }
            out.push(cells[j]);
            i = j;
        }
        Path::new(out)
    }

    fn line_passes(&self, graph: &Graph, a: Coordinate, b: Coordinate, blocked: TerrainSet) -> bool {
        let line = graph.bresenham_nodes(a, b);
        let Some(first) = line.first() else {
            return false;
        };
        let terrain = first.terrain();
        line.iter().all(|node| {
            node.is_traversable(blocked)
                && match self.smoothing {
                    SmoothingPolicy::SameTerrain => node.terrain() == terrain,
                    SmoothingPolicy::NotBlocked => true,
                }
        })
    }
}

impl Pathfinder for ThetaStar {
    fn name(&self) -> &'static str {
        "theta-star"
    }

    fn find_path(
        &self,
        graph: &Graph,
        start: Coordinate,
        goal: Coordinate,
        blocked: TerrainSet,
        costs: &TerrainCosts,
    ) -> Option<Path> {
        let raw = self.inner.find_path(graph, start, goal, blocked, costs)?;
        Some(self.smooth(graph, raw, blocked))
    }

    fn scratch_stats(&self) -> PoolStats {
        self.inner.scratch_stats()
    }
}
