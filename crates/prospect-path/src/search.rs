//! Best-first search core shared by Dijkstra and A*.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use prospect_core::Resettable;
use prospect_grid::{Coordinate, Graph, Node, TerrainSet};
use tracing::trace;

use crate::path::Path;

const NO_PARENT: u32 = u32::MAX;

/// Open-set key. Ordered by `f`, then `h`, then push order, so equal-cost
/// frontiers pop deterministically.
type OpenKey = Reverse<(u64, u64, u64, u32)>;

/// Reusable buffers for one search.
#[derive(Debug, Default)]
pub(crate) struct SearchScratch {
    g: Vec<u64>,
    parent: Vec<u32>,
    closed: Vec<bool>,
    open: BinaryHeap<OpenKey>,
    seq: u64,
}

impl Resettable for SearchScratch {
    fn reset(&mut self) {
        self.g.clear();
        self.parent.clear();
        self.closed.clear();
        self.open.clear();
        self.seq = 0;
    }
}

impl SearchScratch {
    fn prepare(&mut self, len: usize) {
        self.reset();
        self.g.resize(len, u64::MAX);
        self.parent.resize(len, NO_PARENT);
        self.closed.resize(len, false);
    }

    fn push(&mut self, f: u64, h: u64, index: u32) {
        self.open.push(Reverse((f, h, self.seq, index)));
        self.seq += 1;
    }
}

/// Inputs that distinguish one search flavour from another.
pub(crate) struct Search<'a, C, H> {
    pub graph: &'a Graph,
    pub blocked: TerrainSet,
    /// Cost to step onto a node.
    pub step_cost: C,
    /// Lower bound on the remaining cost from a cell.
    pub heuristic: H,
}

impl<C, H> Search<'_, C, H>
where
    C: Fn(&Node) -> u32,
    H: Fn(Coordinate) -> u32,
{
    /// Run the search. `observe` sees every expanded cell with its `f`.
    pub fn run(
        &self,
        start: Coordinate,
        goal: Coordinate,
        scratch: &mut SearchScratch,
        mut observe: impl FnMut(Coordinate, u64),
    ) -> Option<Path> {
        let graph = self.graph;
        let start = graph.resolve(start);
        let goal = graph.resolve(goal);
        if start == goal {
            return Some(Path::new(vec![start]));
        }
        let goal_node = graph.node_at(goal)?;
        if !goal_node.is_traversable(self.blocked) {
            trace!(%start, %goal, "goal not traversable");
            return None;
        }
        let start_index = graph.index_of(start)?;
        let goal_index = graph.index_of(goal)?;

        scratch.prepare(graph.len());
        scratch.g[start_index] = 0;
        let h0 = u64::from((self.heuristic)(start));
        scratch.push(h0, h0, start_index as u32);

        while let Some(Reverse((f, _, _, index))) = scratch.open.pop() {
            let index = index as usize;
            if scratch.closed[index] {
                continue;
            }
            scratch.closed[index] = true;
            let current = graph.nodes()[index].coordinate();
            observe(current, f);

            if index == goal_index {
                return Some(Path::new(walk_back(graph, scratch, goal_index)));
            }

            let g = scratch.g[index];
            for next in graph.adjacents(current) {
                let Some(next_index) = graph.index_of(next) else {
                    continue;
                };
                if next_index == index || scratch.closed[next_index] {
                    continue;
                }
                let node = &graph.nodes()[next_index];
                if !node.is_traversable(self.blocked) {
                    continue;
                }
                let tentative = g.saturating_add(u64::from((self.step_cost)(node)));
                if tentative < scratch.g[next_index] {
                    scratch.g[next_index] = tentative;
                    scratch.parent[next_index] = index as u32;
                    let h = u64::from((self.heuristic)(next));
                    scratch.push(tentative.saturating_add(h), h, next_index as u32);
                }
            }
        }
        trace!(%start, %goal, "goal unreachable");
        None
    }
}

fn walk_back(graph: &Graph, scratch: &SearchScratch, goal_index: usize) -> Vec<Coordinate> {
    let mut cells = Vec::new();
    let mut at = goal_index as u32;
    while at != NO_PARENT {
        cells.push(graph.nodes()[at as usize].coordinate());
        at = scratch.parent[at as usize];
    }
    cells.reverse();
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospect_grid::{EdgeBehavior, Terrain};

    fn open(w: u32, h: u32) -> Graph {
        Graph::uniform(w, h, 1.0, EdgeBehavior::Clamp, Terrain::Grass).unwrap()
    }

    #[test]
    fn prepare_sizes_buffers_and_clears_heap() {
        let mut s = SearchScratch::default();
        s.push(1, 1, 0);
        s.prepare(9);
        assert_eq!(s.g.len(), 9);
        assert!(s.open.is_empty());
        assert!(s.g.iter().all(|g| *g == u64::MAX));
    }

    #[test]
    fn equal_keys_pop_in_push_order() {
        let mut s = SearchScratch::default();
        s.push(5, 2, 7);
        s.push(5, 2, 3);
        s.push(5, 1, 9);
        let order: Vec<u32> = std::iter::from_fn(|| s.open.pop().map(|Reverse(k)| k.3)).collect();
        assert_eq!(order, vec![9, 7, 3]);
    }

    #[test]
    fn popped_f_never_decreases() {
        let g = open(8, 8);
        let goal = Coordinate::new(7, 7);
        let search = Search {
            graph: &g,
            blocked: TerrainSet::EMPTY,
            step_cost: |_: &Node| 1,
            heuristic: |c: Coordinate| g.grid_distance(c, goal),
        };
        let mut last = 0;
        let mut scratch = SearchScratch::default();
        let path = search.run(Coordinate::new(0, 0), goal, &mut scratch, |_, f| {
            assert!(f >= last, "f went from {last} to {f}");
            last = f;
        });
        assert_eq!(path.map(|p| p.len()), Some(15));
    }
}
