//! Uniform-cost search.

use prospect_core::{Pool, PoolStats};
use prospect_grid::{Coordinate, Graph, Node, TerrainCosts, TerrainSet};

use crate::path::Path;
use crate::pathfinder::Pathfinder;
use crate::search::{Search, SearchScratch};

/// Every step costs 1, so the result is shortest by edge count.
///
/// Terrain costs are ignored; only `blocked` shapes the search.
#[derive(Debug, Default)]
pub struct Dijkstra {
    scratch: Pool<SearchScratch>,
}

impl Dijkstra {
    /// A search with an empty scratch pool.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pathfinder for Dijkstra {
    fn name(&self) -> &'static str {
        "dijkstra"
    }

    fn find_path(
        &self,
        graph: &Graph,
        start: Coordinate,
        goal: Coordinate,
        blocked: TerrainSet,
        _costs: &TerrainCosts,
    ) -> Option<Path> {
        let search = Search {
            graph,
            blocked,
            step_cost: |_: &Node| 1,
            heuristic: |_: Coordinate| 0,
        };
        let mut scratch = self.scratch.take();
        search.run(start, goal, &mut scratch, |_, _| {})
    }

    fn scratch_stats(&self) -> PoolStats {
        self.scratch.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospect_grid::{EdgeBehavior, Terrain};
    use prospect_test_utils::{open_grid, walled_goal};

    fn c(x: i32, y: i32) -> Coordinate {
        Coordinate::new(x, y)
    }

    #[test]
    fn ignores_terrain_costs() {
        let mut g = open_grid(5, 1, EdgeBehavior::Clamp);
        g.set_terrain(c(2, 0), Terrain::Water);
        let costs = TerrainCosts::uniform(1).with(Terrain::Water, 1000);
        let p = Dijkstra::new()
            .find_path(&g, c(0, 0), c(4, 0), TerrainSet::EMPTY, &costs)
            .unwrap();
        assert_eq!(p.len(), 5);
    }

    #[test]
    fn walled_goal_is_unreachable() {
        let (g, goal) = walled_goal(7, 7);
        let p = Dijkstra::new().find_path(
            &g,
            c(0, 0),
            goal,
            TerrainSet::of(&[Terrain::Water]),
            &TerrainCosts::default(),
        );
        assert!(p.is_none());
    }

    #[test]
    fn wraps_when_shorter() {
        let g = open_grid(10, 3, EdgeBehavior::Wrap);
        let p = Dijkstra::new()
            .find_path(&g, c(0, 1), c(8, 1), TerrainSet::EMPTY, &TerrainCosts::default())
            .unwrap();
        assert_eq!(p.as_slice(), &[c(0, 1), c(9, 1), c(8, 1)]);
    }

    #[test]
    fn scratch_is_reused() {
        let g = open_grid(4, 4, EdgeBehavior::Clamp);
        let d = Dijkstra::new();
        for _ in 0..3 {
            d.find_path(&g, c(0, 0), c(3, 3), TerrainSet::EMPTY, &TerrainCosts::default());
        }
        let stats = d.scratch_stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.reused, 2);
    }
}
