//! The pathfinder trait.

use prospect_core::PoolStats;
use prospect_grid::{Coordinate, Graph, TerrainCosts, TerrainSet};

use crate::path::Path;

/// A search from one cell to another.
///
/// Implementations are `Send + Sync` so one instance can be shared by
/// every agent ticking on the worker pool.
///
/// # Contract
///
/// - `start == goal` yields a one-cell path.
/// - A goal whose terrain is in `blocked`, or whose node is flagged
///   blocked, yields `None`.
/// - The start cell is never tested against `blocked`.
/// - The returned path begins at the resolved `start` and ends at the
///   resolved `goal`.
pub trait Pathfinder: Send + Sync {
    /// Short name for logs and benches.
    fn name(&self) -> &'static str;

    /// Find a path, or `None` if the goal cannot be reached.
    fn find_path(
        &self,
        graph: &Graph,
        start: Coordinate,
        goal: Coordinate,
        blocked: TerrainSet,
        costs: &TerrainCosts,
    ) -> Option<Path>;

    /// Scratch buffer reuse counters.
    fn scratch_stats(&self) -> PoolStats {
        PoolStats::default()
    }
}
