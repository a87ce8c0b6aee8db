//! The partition trait and shared owner-map storage.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use prospect_grid::{Coordinate, Graph};
use rayon::prelude::*;

use crate::bisector::BisectorPartition;
use crate::brute::BruteForcePartition;
use crate::error::VoronoiError;
use crate::policy::{BisectorSide, Euclidean, Manhattan, ToroidalEuclidean};

/// A map from every cell to the site that owns it.
///
/// After [`generate`](Partition::generate) with a non-empty site list,
/// every in-range cell maps to one of the sites and each site maps to
/// itself. Coordinates the partition knows nothing about map to
/// themselves.
pub trait Partition: Send + Sync {
    /// Short name for logs and benches.
    fn name(&self) -> &'static str;

    /// Recompute ownership for `sites` over the whole graph. Duplicate
    /// sites are dropped, keeping the first.
    fn generate(&mut self, graph: &Graph, sites: &[Coordinate]);

    /// The site owning `coordinate`.
    fn closest_to(&self, coordinate: Coordinate) -> Coordinate;

    /// The sites of the last generation, deduplicated, in input order.
    fn sites(&self) -> &[Coordinate];
}

/// Which partition [`PartitionPolicy::build`] constructs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PartitionPolicy {
    /// Brute force with [`Euclidean`].
    Euclidean,
    /// Brute force with [`Manhattan`].
    #[default]
    Manhattan,
    /// Brute force with [`ToroidalEuclidean`].
    ToroidalEuclidean,
    /// Brute force with [`BisectorSide`].
    BisectorSide,
    /// Explicit half-plane cells, see [`BisectorPartition`].
    BisectorPlanes,
}

impl PartitionPolicy {
    /// Every policy.
    pub const ALL: [PartitionPolicy; 5] = [
        Self::Euclidean,
        Self::Manhattan,
        Self::ToroidalEuclidean,
        Self::BisectorSide,
        Self::BisectorPlanes,
    ];

    /// Name accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Manhattan => "manhattan",
            Self::ToroidalEuclidean => "toroidal-euclidean",
            Self::BisectorSide => "bisector",
            Self::BisectorPlanes => "bisector-planes",
        }
    }

    /// A fresh, empty partition of this kind.
    pub fn build(self) -> Box<dyn Partition> {
        match self {
            Self::Euclidean => Box::new(BruteForcePartition::new(Euclidean)),
            Self::Manhattan => Box::new(BruteForcePartition::new(Manhattan)),
            Self::ToroidalEuclidean => Box::new(BruteForcePartition::new(ToroidalEuclidean)),
            Self::BisectorSide => Box::new(BruteForcePartition::new(BisectorSide)),
            Self::BisectorPlanes => Box::new(BisectorPartition::new()),
        }
    }
}

impl fmt::Display for PartitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PartitionPolicy {
    type Err = VoronoiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| VoronoiError::UnknownPolicy { name: s.to_owned() })
    }
}

/// Row-major owner table shared by the partition implementations.
#[derive(Debug, Default)]
pub(crate) struct OwnerMap {
    width: u32,
    height: u32,
    owners: Vec<Coordinate>,
}

impl OwnerMap {
    /// Recompute every cell with `owner`, in parallel. The new table is
    /// built aside and replaces the old one in a single assignment.
    pub fn fill<F>(&mut self, graph: &Graph, owner: F)
    where
        F: Fn(Coordinate) -> Coordinate + Sync,
    {
        let mut owners = Vec::with_capacity(graph.len());
        graph
            .nodes()
            .par_iter()
            .map(|node| owner(node.coordinate()))
            .collect_into_vec(&mut owners);
        *self = Self {
            width: graph.width(),
            height: graph.height(),
            owners,
        };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn lookup(&self, c: Coordinate) -> Coordinate {
        if c.x < 0 || c.y < 0 || c.x as u32 >= self.width || c.y as u32 >= self.height {
            return c;
        }
        self.owners
            .get(c.y as usize * self.width as usize + c.x as usize)
            .copied()
            .unwrap_or(c)
    }
}

/// Resolve `sites` onto the graph and drop repeats, keeping the first.
pub(crate) fn dedupe_sites(graph: &Graph, sites: &[Coordinate]) -> Vec<Coordinate> {
    sites
        .iter()
        .map(|s| graph.resolve(*s))
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospect_grid::{EdgeBehavior, Terrain};

    #[test]
    fn policy_names_parse_back() {
        for p in PartitionPolicy::ALL {
            assert_eq!(p.name().parse::<PartitionPolicy>(), Ok(p));
            assert_eq!(p.build().sites(), &[] as &[Coordinate]);
        }
        assert!(matches!(
            "voronoi?".parse::<PartitionPolicy>(),
            Err(VoronoiError::UnknownPolicy { .. })
        ));
    }

    #[test]
    fn owner_map_defaults_to_self() {
        let mut map = OwnerMap::default();
        assert_eq!(map.lookup(Coordinate::new(3, 3)), Coordinate::new(3, 3));
        let g = Graph::uniform(2, 2, 1.0, EdgeBehavior::Clamp, Terrain::Grass).unwrap();
        map.fill(&g, |_| Coordinate::new(1, 1));
        assert_eq!(map.lookup(Coordinate::new(0, 0)), Coordinate::new(1, 1));
        assert_eq!(map.lookup(Coordinate::new(5, 0)), Coordinate::new(5, 0));
        map.clear();
        assert_eq!(map.lookup(Coordinate::new(0, 0)), Coordinate::new(0, 0));
    }

    #[test]
    fn dedupe_keeps_first_resolved() {
        let g = Graph::uniform(4, 4, 1.0, EdgeBehavior::Wrap, Terrain::Grass).unwrap();
        let sites = [Coordinate::new(1, 1), Coordinate::new(5, 1), Coordinate::new(0, 2)];
        assert_eq!(
            dedupe_sites(&g, &sites),
            vec![Coordinate::new(1, 1), Coordinate::new(0, 2)]
        );
    }
}
