//! Site-by-site scan partition.

use std::cmp::Ordering;

use prospect_grid::{Coordinate, Graph};
use tracing::debug;

use crate::partition::{dedupe_sites, OwnerMap, Partition};
use crate::policy::OwnershipPolicy;

/// For every cell, scan every site and keep the winner under `P`.
///
/// The first site starts as the winner and is replaced only when the
/// policy strictly prefers the challenger, so ties go to the earlier
/// site. Cost is `O(cells × sites)` per generation; cells are spread over
/// the current rayon pool.
///
/// ```
/// use prospect_grid::{Coordinate, EdgeBehavior, Graph, Terrain};
/// use prospect_voronoi::{BruteForcePartition, Euclidean, Partition};
///
/// let g = Graph::uniform(10, 1, 1.0, EdgeBehavior::Clamp, Terrain::Grass).unwrap();
/// let mut p = BruteForcePartition::new(Euclidean);
/// p.generate(&g, &[Coordinate::new(0, 0), Coordinate::new(9, 0)]);
/// assert_eq!(p.closest_to(Coordinate::new(3, 0)), Coordinate::new(0, 0));
/// assert_eq!(p.closest_to(Coordinate::new(6, 0)), Coordinate::new(9, 0));
/// ```
#[derive(Debug, Default)]
pub struct BruteForcePartition<P> {
    policy: P,
    sites: Vec<Coordinate>,
    owners: OwnerMap,
}

impl<P: OwnershipPolicy> BruteForcePartition<P> {
    /// An empty partition using `policy`.
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            sites: Vec::new(),
            owners: OwnerMap::default(),
        }
    }

    /// The ownership policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    fn owner_of(&self, graph: &Graph, point: Coordinate) -> Coordinate {
        let mut winner = self.sites[0];
        for &challenger in &self.sites[1..] {
            if self.policy.compare_ownership(point, winner, challenger, graph) == Ordering::Greater {
                winner = challenger;
            }
        }
        winner
    }
}

impl<P: OwnershipPolicy> Partition for BruteForcePartition<P> {
    fn name(&self) -> &'static str {
        self.policy.name()
    }

    fn generate(&mut self, graph: &Graph, sites: &[Coordinate]) {
        self.sites = dedupe_sites(graph, sites);
        if self.sites.is_empty() {
            self.owners.clear();
            return;
        }
        let mut owners = OwnerMap::default();
        owners.fill(graph, |point| self.owner_of(graph, point));
        self.owners = owners;
        debug!(
            policy = self.policy.name(),
            sites = self.sites.len(),
            cells = graph.len(),
            "brute-force partition generated"
        );
    }

    fn closest_to(&self, coordinate: Coordinate) -> Coordinate {
        self.owners.lookup(coordinate)
    }

    fn sites(&self) -> &[Coordinate] {
        &self.sites
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Euclidean, Manhattan, ToroidalEuclidean};
    use prospect_grid::{EdgeBehavior, Terrain};

    fn c(x: i32, y: i32) -> Coordinate {
        Coordinate::new(x, y)
    }

    fn graph(w: u32, h: u32, edge: EdgeBehavior) -> Graph {
        Graph::uniform(w, h, 1.0, edge, Terrain::Grass).unwrap()
    }

    #[test]
    fn ties_go_to_earlier_site() {
        let g = graph(5, 1, EdgeBehavior::Clamp);
        let mut p = BruteForcePartition::new(Euclidean);
        p.generate(&g, &[c(0, 0), c(4, 0)]);
        assert_eq!(p.closest_to(c(2, 0)), c(0, 0));

        p.generate(&g, &[c(4, 0), c(0, 0)]);
        assert_eq!(p.closest_to(c(2, 0)), c(4, 0));
    }

    #[test]
    fn single_site_owns_everything() {
        let g = graph(6, 4, EdgeBehavior::Wrap);
        let mut p = BruteForcePartition::new(Manhattan);
        p.generate(&g, &[c(2, 3)]);
        assert!(g.cells().all(|cell| p.closest_to(cell) == c(2, 3)));
    }

    #[test]
    fn empty_sites_map_to_self() {
        let g = graph(3, 3, EdgeBehavior::Clamp);
        let mut p = BruteForcePartition::new(Manhattan);
        p.generate(&g, &[c(0, 0)]);
        p.generate(&g, &[]);
        assert_eq!(p.closest_to(c(2, 2)), c(2, 2));
        assert!(p.sites().is_empty());
    }

    #[test]
    fn duplicate_sites_are_dropped() {
        let g = graph(6, 6, EdgeBehavior::Wrap);
        let mut p = BruteForcePartition::new(ToroidalEuclidean);
        p.generate(&g, &[c(1, 1), c(4, 4), c(7, 1)]);
        assert_eq!(p.sites(), &[c(1, 1), c(4, 4)]);
    }

    #[test]
    fn regeneration_replaces_previous_map() {
        let g = graph(8, 1, EdgeBehavior::Clamp);
        let mut p = BruteForcePartition::new(Euclidean);
        p.generate(&g, &[c(0, 0), c(7, 0)]);
        assert_eq!(p.closest_to(c(6, 0)), c(7, 0));
        p.generate(&g, &[c(0, 0)]);
        assert_eq!(p.closest_to(c(6, 0)), c(0, 0));
    }
}
