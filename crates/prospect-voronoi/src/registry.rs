//! Published partitions, keyed by owner kind.

use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use prospect_grid::{Coordinate, Graph};
use tracing::debug;

use crate::error::VoronoiError;
use crate::partition::Partition;

/// Finished partitions, one per owner kind.
///
/// [`generate`](Self::generate) builds a partition outside the lock and
/// then swaps the `Arc` in, so a reader sees either the previous map or
/// the new one, never a mixture.
///
/// ```
/// use prospect_grid::{Coordinate, EdgeBehavior, Graph, Terrain};
/// use prospect_voronoi::{PartitionPolicy, PartitionRegistry};
///
/// let g = Graph::uniform(8, 8, 1.0, EdgeBehavior::Wrap, Terrain::Grass).unwrap();
/// let registry: PartitionRegistry<&str> = PartitionRegistry::new();
/// assert!(registry.closest_to(&"mine", Coordinate::new(0, 0)).is_err());
///
/// registry.generate("mine", PartitionPolicy::Manhattan.build(), &g, &[Coordinate::new(6, 6)]);
/// assert_eq!(registry.closest_to(&"mine", Coordinate::new(0, 0)), Ok(Coordinate::new(6, 6)));
/// ```
pub struct PartitionRegistry<K> {
    partitions: RwLock<IndexMap<K, Arc<dyn Partition>>>,
}

impl<K> PartitionRegistry<K>
where
    K: Clone + Eq + Hash + fmt::Display,
{
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(IndexMap::new()),
        }
    }

    /// Build `partition` for `sites` and publish it under `kind`,
    /// replacing any earlier one.
    pub fn generate(
        &self,
        kind: K,
        mut partition: Box<dyn Partition>,
        graph: &Graph,
        sites: &[Coordinate],
    ) {
        partition.generate(graph, sites);
        debug!(%kind, partition = partition.name(), sites = partition.sites().len(), "partition published");
        self.publish(kind, Arc::from(partition));
    }

    /// Publish an already generated partition.
    pub fn publish(&self, kind: K, partition: Arc<dyn Partition>) {
        self.partitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, partition);
    }

    /// The current partition for `kind`.
    pub fn get(&self, kind: &K) -> Option<Arc<dyn Partition>> {
        self.partitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(kind)
            .cloned()
    }

    /// The site owning `coordinate` in the `kind` partition.
    pub fn closest_to(&self, kind: &K, coordinate: Coordinate) -> Result<Coordinate, VoronoiError> {
        self.get(kind)
            .map(|p| p.closest_to(coordinate))
            .ok_or_else(|| VoronoiError::NotGenerated {
                kind: kind.to_string(),
            })
    }

    /// Drop the partition for `kind`. Returns `false` if there was none.
    pub fn remove(&self, kind: &K) -> bool {
        self.partitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(kind)
            .is_some()
    }

    /// Whether `kind` has a published partition.
    pub fn contains(&self, kind: &K) -> bool {
        self.partitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(kind)
    }

    /// Number of published partitions.
    pub fn len(&self) -> usize {
        self.partitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// `true` if nothing is published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every partition.
    pub fn clear(&self) {
        self.partitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<K> Default for PartitionRegistry<K>
where
    K: Clone + Eq + Hash + fmt::Display,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for PartitionRegistry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.partitions.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("PartitionRegistry")
            .field("kinds", &guard.keys().collect::<Vec<_>>())
            .finish()
    }
}
