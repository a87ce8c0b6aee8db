//! Grid cells and the objects that occupy them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexSet;
use prospect_core::{ContainableId, ContainableKind};

use crate::coordinate::Coordinate;
use crate::terrain::{Terrain, TerrainCosts, TerrainSet};

/// Anything that stands on a grid cell.
///
/// The stored coordinate is written only by
/// [`Graph::move_containable_to`](crate::Graph::move_containable_to) and
/// [`Graph::place`](crate::Graph::place), which keep it in sync with the
/// node's occupant set.
pub trait NodeContainable: Send + Sync {
    /// Stable id recorded in the node's occupant set.
    fn containable_id(&self) -> ContainableId;

    /// Cell the object currently occupies.
    fn node_coordinate(&self) -> Coordinate;

    /// Overwrite the stored cell. Callers outside the graph should not
    /// need this.
    fn set_node_coordinate(&self, coordinate: Coordinate);
}

/// Thread-safe id plus coordinate, the usual backing for a
/// [`NodeContainable`].
#[derive(Debug)]
pub struct Placement {
    id: ContainableId,
    packed: AtomicU64,
}

fn pack(c: Coordinate) -> u64 {
    (u64::from(c.x as u32) << 32) | u64::from(c.y as u32)
}

fn unpack(v: u64) -> Coordinate {
    Coordinate::new((v >> 32) as u32 as i32, v as u32 as i32)
}

impl Placement {
    /// A placement for `id` recorded at `at`. The graph is not touched.
    pub fn new(id: ContainableId, at: Coordinate) -> Self {
        Self {
            id,
            packed: AtomicU64::new(pack(at)),
        }
    }

    /// Kind of the placed object.
    pub fn kind(&self) -> ContainableKind {
        self.id.kind
    }
}

impl NodeContainable for Placement {
    fn containable_id(&self) -> ContainableId {
        self.id
    }

    fn node_coordinate(&self) -> Coordinate {
        unpack(self.packed.load(Ordering::Acquire))
    }

    fn set_node_coordinate(&self, coordinate: Coordinate) {
        self.packed.store(pack(coordinate), Ordering::Release);
    }
}

/// One grid cell.
///
/// Terrain, cost override and the blocked flag change only through
/// `&mut` access. The occupant set has its own lock and may be mutated
/// through a shared reference from any thread.
#[derive(Debug)]
pub struct Node {
    coordinate: Coordinate,
    terrain: Terrain,
    cost: Option<u32>,
    blocked: bool,
    containables: Mutex<IndexSet<ContainableId>>,
}

impl Node {
    pub(crate) fn new(coordinate: Coordinate, terrain: Terrain) -> Self {
        Self {
            coordinate,
            terrain,
            cost: None,
            blocked: false,
            containables: Mutex::new(IndexSet::new()),
        }
    }

    fn occupants(&self) -> MutexGuard<'_, IndexSet<ContainableId>> {
        self.containables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// This cell's coordinate.
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// This cell's terrain.
    pub fn terrain(&self) -> Terrain {
        self.terrain
    }

    pub(crate) fn set_terrain(&mut self, terrain: Terrain) {
        self.terrain = terrain;
    }

    /// Per-node cost override, if any.
    pub fn cost_override(&self) -> Option<u32> {
        self.cost
    }

    /// Set or clear the per-node cost override.
    pub fn set_cost(&mut self, cost: Option<u32>) {
        self.cost = cost;
    }

    /// Cost to step onto this cell.
    pub fn enter_cost(&self, costs: &TerrainCosts) -> u32 {
        self.cost.unwrap_or_else(|| costs.cost(self.terrain))
    }

    /// Whether the cell is blocked regardless of terrain.
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Set the unconditional blocked flag.
    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    /// `true` unless the cell is blocked outright or its terrain is in `blocked`.
    pub fn is_traversable(&self, blocked: TerrainSet) -> bool {
        !self.blocked && !blocked.contains(self.terrain)
    }

    /// Record an occupant. Returns `false` if it was already present.
    pub fn add_containable(&self, id: ContainableId) -> bool {
        self.occupants().insert(id)
    }

    /// Forget an occupant. Returns `false` if it was not present.
    pub fn remove_containable(&self, id: ContainableId) -> bool {
        self.occupants().shift_remove(&id)
    }

    /// Whether `id` is on this cell.
    pub fn contains(&self, id: ContainableId) -> bool {
        self.occupants().contains(&id)
    }

    /// Snapshot of the occupants in arrival order.
    pub fn containables(&self) -> Vec<ContainableId> {
        self.occupants().iter().copied().collect()
    }

    /// Number of occupants.
    pub fn containable_count(&self) -> usize {
        self.occupants().len()
    }

    /// Whether any occupant is of `kind`.
    pub fn has_kind(&self, kind: ContainableKind) -> bool {
        self.occupants().iter().any(|id| id.kind == kind)
    }

    /// The most recently arrived occupant of `kind`.
    ///
    /// With several matches the last one wins.
    pub fn last_of_kind(&self, kind: ContainableKind) -> Option<ContainableId> {
        self.occupants().iter().rev().find(|id| id.kind == kind).copied()
    }

    /// The earliest-arrived occupant whose kind is in `kinds`.
    pub fn first_of_kinds(&self, kinds: &[ContainableKind]) -> Option<ContainableId> {
        self.occupants()
            .iter()
            .find(|id| kinds.contains(&id.kind))
            .copied()
    }

    pub(crate) fn clear_containables(&self) {
        self.occupants().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(kind: ContainableKind, slot: u32) -> ContainableId {
        ContainableId::new(kind, slot)
    }

    #[test]
    fn placement_round_trips_negative_coordinates() {
        let p = Placement::new(id(ContainableKind::Miner, 0), Coordinate::new(-5, 7));
        assert_eq!(p.node_coordinate(), Coordinate::new(-5, 7));
        p.set_node_coordinate(Coordinate::new(i32::MAX, i32::MIN));
        assert_eq!(p.node_coordinate(), Coordinate::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn occupants_keep_arrival_order() {
        let n = Node::new(Coordinate::new(0, 0), Terrain::Grass);
        assert!(n.add_containable(id(ContainableKind::Mine, 0)));
        assert!(n.add_containable(id(ContainableKind::Miner, 0)));
        assert!(n.add_containable(id(ContainableKind::Mine, 1)));
        assert!(!n.add_containable(id(ContainableKind::Mine, 1)));
        assert!(n.remove_containable(id(ContainableKind::Mine, 0)));
        assert_eq!(
            n.containables(),
            vec![id(ContainableKind::Miner, 0), id(ContainableKind::Mine, 1)]
        );
    }

    #[test]
    fn last_of_kind_prefers_latest() {
        let n = Node::new(Coordinate::new(0, 0), Terrain::Grass);
        n.add_containable(id(ContainableKind::Mine, 4));
        n.add_containable(id(ContainableKind::Center, 0));
        n.add_containable(id(ContainableKind::Mine, 2));
        assert_eq!(
            n.last_of_kind(ContainableKind::Mine),
            Some(id(ContainableKind::Mine, 2))
        );
        assert_eq!(n.last_of_kind(ContainableKind::Caravan), None);
        assert_eq!(
            n.first_of_kinds(&[ContainableKind::Center, ContainableKind::Mine]),
            Some(id(ContainableKind::Mine, 4))
        );
    }

    #[test]
    fn traversable_respects_flag_and_set() {
        let mut n = Node::new(Coordinate::new(0, 0), Terrain::Water);
        assert!(n.is_traversable(TerrainSet::EMPTY));
        assert!(!n.is_traversable(TerrainSet::of(&[Terrain::Water])));
        n.set_blocked(true);
        assert!(!n.is_traversable(TerrainSet::EMPTY));
    }

    #[test]
    fn cost_override_beats_terrain() {
        let mut n = Node::new(Coordinate::new(0, 0), Terrain::Road);
        let costs = TerrainCosts::uniform(3);
        assert_eq!(n.enter_cost(&costs), 3);
        n.set_cost(Some(10));
        assert_eq!(n.enter_cost(&costs), 10);
    }
}
