//! The grid plus everything agents read while ticking.

use std::sync::Arc;

use prospect_core::{ContainableKind, PoolStats};
use prospect_fsm::ActionPool;
use prospect_grid::{Coordinate, Graph};
use prospect_path::{AStar, Pathfinder, ThetaStar};
use prospect_voronoi::VoronoiError;
use tracing::{debug, warn};

use crate::caravan::CaravanFlag;
use crate::config::SimulationConfig;
use crate::context::SimulationContext;
use crate::miner::MinerFlag;
use crate::structures::{Center, Mine};

/// Shared world state.
///
/// Agents hold an `Arc<World>` for the duration of their tick and only
/// need `&World`. Structural changes (placing or removing containables,
/// terrain edits) go through `&mut World` between steps.
pub struct World {
    graph: Graph,
    context: SimulationContext,
    config: SimulationConfig,
    miner_paths: AStar,
    caravan_paths: ThetaStar,
    miner_actions: Arc<ActionPool<MinerFlag, Coordinate>>,
    caravan_actions: Arc<ActionPool<CaravanFlag, Coordinate>>,
}

impl World {
    pub(crate) fn new(graph: Graph, context: SimulationContext, config: SimulationConfig) -> Self {
        let caravan_paths = ThetaStar::with_smoothing(config.pathing.smoothing);
        Self {
            graph,
            context,
            config,
            miner_paths: AStar::new(),
            caravan_paths,
            miner_actions: Arc::new(ActionPool::new()),
            caravan_actions: Arc::new(ActionPool::new()),
        }
    }

    /// The grid.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Registries, alarm, food requests and events.
    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    pub(crate) fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.context
    }

    /// The configuration the world was built from.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Pathfinder used by miners.
    pub fn miner_paths(&self) -> &AStar {
        &self.miner_paths
    }

    /// Pathfinder used by caravans.
    pub fn caravan_paths(&self) -> &ThetaStar {
        &self.caravan_paths
    }

    pub(crate) fn miner_actions(&self) -> &Arc<ActionPool<MinerFlag, Coordinate>> {
        &self.miner_actions
    }

    pub(crate) fn caravan_actions(&self) -> &Arc<ActionPool<CaravanFlag, Coordinate>> {
        &self.caravan_actions
    }

    /// Sum of every pool's counters: step buffers and search scratch.
    pub fn pool_stats(&self) -> PoolStats {
        [
            self.miner_actions.stats(),
            self.caravan_actions.stats(),
            self.miner_paths.scratch_stats(),
            self.caravan_paths.scratch_stats(),
        ]
        .into_iter()
        .fold(PoolStats::default(), |acc, s| PoolStats {
            created: acc.created + s.created,
            reused: acc.reused + s.reused,
        })
    }

    // ── Lookups ─────────────────────────────────────────────────

    /// The mine on `at`. With several, the latest arrival.
    pub fn mine_on(&self, at: Coordinate) -> Option<Arc<Mine>> {
        let id = self.graph.node_at(at)?.last_of_kind(ContainableKind::Mine)?;
        self.context.registry().mine(id).cloned()
    }

    /// The center on `at`. With several, the latest arrival.
    pub fn center_on(&self, at: Coordinate) -> Option<Arc<Center>> {
        let id = self.graph.node_at(at)?.last_of_kind(ContainableKind::Center)?;
        self.context.registry().center(id).cloned()
    }

    /// The town center agents use: the one in the lowest slot.
    pub fn center(&self) -> Option<Arc<Center>> {
        self.context.registry().centers().next().cloned()
    }

    /// The nearest workable mine to `from`.
    ///
    /// Asks the mine partition first. A missing partition, or an owner
    /// that is no longer workable, falls back to a scan by grid distance
    /// with ties going to the lower slot.
    pub fn closest_mine(&self, from: Coordinate) -> Option<Coordinate> {
        let registry = self.context.registry();
        if registry.count(ContainableKind::Mine) == 0 {
            return None;
        }
        match self.context.partitions().closest_to(&ContainableKind::Mine, from) {
            Ok(site) if self.mine_on(site).is_some_and(|m| m.is_workable()) => return Some(site),
            Ok(_) => {}
            Err(VoronoiError::NotGenerated { kind }) => {
                warn!(%kind, "mine partition missing, scanning mines directly");
            }
            Err(e) => warn!(error = %e, "mine partition lookup failed"),
        }
        registry
            .mines()
            .filter(|m| m.is_workable())
            .map(|m| m.coordinate())
            .min_by_key(|c| self.graph.grid_distance(from, *c))
    }

    /// Rebuild the mine partition from the workable mines, or drop it if
    /// there are none.
    pub(crate) fn regenerate_mine_partition(&self) {
        let sites: Vec<Coordinate> = self
            .context
            .registry()
            .mines()
            .filter(|m| m.is_workable())
            .map(|m| m.coordinate())
            .collect();
        let partitions = self.context.partitions();
        if sites.is_empty() {
            if partitions.remove(&ContainableKind::Mine) {
                debug!("mine partition dropped, no workable mines");
            }
            return;
        }
        partitions.generate(
            ContainableKind::Mine,
            self.config.partition.build(),
            &self.graph,
            &sites,
        );
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("width", &self.graph.width())
            .field("height", &self.graph.height())
            .field("context", &self.context)
            .finish()
    }
}
