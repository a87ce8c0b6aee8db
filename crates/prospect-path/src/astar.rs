//! Terrain-weighted A*.

use prospect_core::{Pool, PoolStats};
use prospect_grid::{Coordinate, Graph, Node, TerrainCosts, TerrainSet};

use crate::path::Path;
use crate::pathfinder::Pathfinder;
use crate::search::{Search, SearchScratch};

/// A* over terrain costs.
///
/// Entering a node costs its [`enter_cost`](Node::enter_cost). The
/// heuristic is the wrap-aware grid distance times the cheapest step any
/// traversable node can charge, so it never overestimates.
///
/// ```
/// use prospect_grid::{Coordinate, EdgeBehavior, Graph, Terrain, TerrainCosts, TerrainSet};
/// use prospect_path::{AStar, Pathfinder};
///
/// let g = Graph::uniform(10, 10, 1.0, EdgeBehavior::Clamp, Terrain::Grass).unwrap();
/// let path = AStar::new()
///     .find_path(
///         &g,
///         Coordinate::new(0, 0),
///         Coordinate::new(9, 9),
///         TerrainSet::EMPTY,
///         &TerrainCosts::default(),
///     )
///     .unwrap();
/// assert_eq!(path.len(), 19);
/// ```
#[derive(Debug, Default)]
pub struct AStar {
    scratch: Pool<SearchScratch>,
}

impl AStar {
    /// A search with an empty scratch pool.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn search_with(
        &self,
        graph: &Graph,
        start: Coordinate,
        goal: Coordinate,
        blocked: TerrainSet,
        costs: &TerrainCosts,
        observe: impl FnMut(Coordinate, u64),
    ) -> Option<Path> {
        let scale = heuristic_scale(graph, blocked, costs)?;
        let goal_resolved = graph.resolve(goal);
        let search = Search {
            graph,
            blocked,
            step_cost: |node: &Node| node.enter_cost(costs),
            heuristic: |c: Coordinate| graph.grid_distance(c, goal_resolved).saturating_mul(scale),
        };
        let mut scratch = self.scratch.take();
        search.run(start, goal, &mut scratch, observe)
    }
}

/// Lowest enter cost over traversable nodes. Per-node overrides can
/// undercut the terrain table, so they are folded in.
fn heuristic_scale(graph: &Graph, blocked: TerrainSet, costs: &TerrainCosts) -> Option<u32> {
    let by_terrain = costs.cheapest(blocked);
    let by_override = graph
        .nodes()
        .iter()
        .filter(|n| n.is_traversable(blocked))
        .filter_map(Node::cost_override)
        .min();
    match (by_terrain, by_override) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

impl Pathfinder for AStar {
    fn name(&self) -> &'static str {
        "a-star"
    }

    fn find_path(
        &self,
        graph: &Graph,
        start: Coordinate,
        goal: Coordinate,
        blocked: TerrainSet,
        costs: &TerrainCosts,
    ) -> Option<Path> {
        if graph.resolve(start) == graph.resolve(goal) {
            return Some(Path::new(vec![graph.resolve(start)]));
        }
        self.search_with(graph, start, goal, blocked, costs, |_, _| {})
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

    fn path_cost(g: &Graph, p: &Path, costs: &TerrainCosts) -> u32 {
        p.iter()
            .skip(1)
            .map(|c| g.node_at(c).unwrap().enter_cost(costs))
            .sum()
    }

    // ── Optimality tests ────────────────────────────────────────

    #[test]
    fn open_grid_corner_to_corner() {
        let g = open_grid(10, 10, EdgeBehavior::Clamp);
        let mut last_f = 0;
        let p = AStar::new()
            .search_with(
                &g,
                c(0, 0),
                c(9, 9),
                TerrainSet::EMPTY,
                &TerrainCosts::default(),
                |_, f| {
                    assert!(f >= last_f);
                    last_f = f;
                },
            )
            .unwrap();
        assert_eq!(p.len(), 19);
        assert_eq!(p.first(), Some(c(0, 0)));
        assert_eq!(p.last(), Some(c(9, 9)));
    }

    #[test]
    fn prefers_road_detour() {
        // Water costs 4, so walking round it on the road is cheaper.
        let mut g = open_grid(3, 2, EdgeBehavior::Clamp);
        for x in 0..3 {
            g.set_terrain(c(x, 1), Terrain::Road);
        }
        g.set_terrain(c(1, 0), Terrain::Water);
        let costs = TerrainCosts::default();
        let p = AStar::new()
            .find_path(&g, c(0, 0), c(2, 0), TerrainSet::EMPTY, &costs)
            .unwrap();
        assert_eq!(p.as_slice(), &[c(0, 0), c(0, 1), c(1, 1), c(2, 1), c(2, 0)]);
        assert_eq!(path_cost(&g, &p, &costs), 5);
    }

    #[test]
    fn cost_override_is_honoured() {
        let mut g = open_grid(3, 3, EdgeBehavior::Clamp);
        g.node_at_mut(c(1, 0)).unwrap().set_cost(Some(50));
        let p = AStar::new()
            .find_path(&g, c(0, 0), c(2, 0), TerrainSet::EMPTY, &TerrainCosts::uniform(1))
            .unwrap();
        assert!(!p.as_slice().contains(&c(1, 0)));
        assert_eq!(p.len(), 5);
    }

    // ── Failure tests ───────────────────────────────────────────

    #[test]
    fn start_equals_goal() {
        let g = open_grid(3, 3, EdgeBehavior::Wrap);
        let p = AStar::new()
            .find_path(&g, c(1, 1), c(4, 1), TerrainSet::EMPTY, &TerrainCosts::default())
            .unwrap();
        assert_eq!(p.as_slice(), &[c(1, 1)]);
    }

    #[test]
    fn enclosed_goal_is_none() {
        let (g, goal) = walled_goal(9, 9);
        let p = AStar::new().find_path(
            &g,
            c(0, 0),
            goal,
            TerrainSet::of(&[Terrain::Water]),
            &TerrainCosts::default(),
        );
        assert!(p.is_none());
    }

    #[test]
    fn blocked_goal_is_none() {
        let mut g = open_grid(4, 4, EdgeBehavior::Clamp);
        g.node_at_mut(c(3, 3)).unwrap().set_blocked(true);
        let p = AStar::new().find_path(
            &g,
            c(0, 0),
            c(3, 3),
            TerrainSet::EMPTY,
            &TerrainCosts::default(),
        );
        assert!(p.is_none());
    }

    #[test]
    fn everything_blocked_is_none() {
        let g = open_grid(4, 4, EdgeBehavior::Clamp);
        let p = AStar::new().find_path(
            &g,
            c(0, 0),
            c(3, 3),
            TerrainSet::of(&Terrain::ALL),
            &TerrainCosts::default(),
        );
        assert!(p.is_none());
    }
}
