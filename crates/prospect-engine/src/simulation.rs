//! The simulation driver: construction, the step loop, commands, teardown.

use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use prospect_core::{ContainableId, ContainableKind, EventBus, SubscriptionId, TickId};
use prospect_fsm::FsmError;
use prospect_grid::{Coordinate, Graph, GridError, TerrainMap};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::caravan::{Caravan, CaravanFlag};
use crate::command::{Command, CommandError, CommandReceipt};
use crate::config::{ConfigError, MapConfig, SimulationConfig, TerrainSource};
use crate::context::{defer_on, SimulationContext};
use crate::events::{
    AgentSpawned, AlarmChanged, CreateMine, GraphModified, MineCreated, MineRemoved, RaiseAlarm,
    RequestCaravanCreation, RequestMinerCreation,
};
use crate::lock;
use crate::metrics::StepMetrics;
use crate::miner::{Miner, MinerFlag};
use crate::registry::Removed;
use crate::structures::{Center, Mine};
use crate::world::World;

// ── SimulationError ────────────────────────────────────────────────

/// Errors from [`Simulation::new`].
#[derive(Debug)]
pub enum SimulationError {
    /// The configuration failed validation.
    Config(ConfigError),
    /// The grid could not be built or its map loaded.
    Grid(GridError),
    /// The worker pool could not be started.
    ThreadPool {
        /// Why the pool failed.
        reason: String,
    },
    /// An agent's state machine failed to build.
    Fsm(FsmError),
    /// Populating the initial world failed.
    Command(CommandError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Grid(e) => write!(f, "grid: {e}"),
            Self::ThreadPool { reason } => write!(f, "worker pool: {reason}"),
            Self::Fsm(e) => write!(f, "fsm: {e}"),
            Self::Command(e) => write!(f, "setup: {e}"),
        }
    }
}

impl Error for SimulationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Grid(e) => Some(e),
            Self::Fsm(e) => Some(e),
            Self::Command(e) => Some(e),
            Self::ThreadPool { .. } => None,
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<GridError> for SimulationError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<FsmError> for SimulationError {
    fn from(e: FsmError) -> Self {
        Self::Fsm(e)
    }
}

impl From<CommandError> for SimulationError {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::Fsm(e) => Self::Fsm(e),
            other => Self::Command(other),
        }
    }
}

// ── Event forwarding ───────────────────────────────────────────────

/// Subscriptions that turn request events into queued commands.
#[derive(Debug)]
struct Forwarders {
    miner: SubscriptionId,
    caravan: SubscriptionId,
    alarm: SubscriptionId,
    mine: SubscriptionId,
}

impl Forwarders {
    fn subscribe(events: &EventBus, sender: &Sender<Command>, start_food: u32) -> Self {
        let tx = sender.clone();
        let miner = events.subscribe(move |e: &RequestMinerCreation| {
            defer_on(&tx, Command::SpawnMiner { at: e.at });
        });
        let tx = sender.clone();
        let caravan = events.subscribe(move |e: &RequestCaravanCreation| {
            defer_on(&tx, Command::SpawnCaravan { at: e.at });
        });
        let tx = sender.clone();
        let alarm = events.subscribe(move |e: &RaiseAlarm| {
            defer_on(&tx, Command::SetAlarm { raised: e.raised });
        });
        let tx = sender.clone();
        let mine = events.subscribe(move |e: &CreateMine| {
            defer_on(
                &tx,
                Command::CreateMine {
                    at: e.at,
                    gold: e.gold,
                    food: start_food,
                    max_food: None,
                },
            );
        });
        Self {
            miner,
            caravan,
            alarm,
            mine,
        }
    }

    fn unsubscribe(&self, events: &EventBus) {
        events.unsubscribe::<RequestMinerCreation>(self.miner);
        events.unsubscribe::<RequestCaravanCreation>(self.caravan);
        events.unsubscribe::<RaiseAlarm>(self.alarm);
        events.unsubscribe::<CreateMine>(self.mine);
    }
}

// ── World mutation ─────────────────────────────────────────────────

fn open_cell(world: &World, at: Coordinate) -> Result<Coordinate, CommandError> {
    let graph = world.graph();
    let at = graph.resolve(at);
    match graph.node_at(at) {
        Some(node) if !node.is_blocked() => Ok(at),
        _ => Err(CommandError::CellBlocked { at }),
    }
}

fn create_mine(
    world: &mut World,
    at: Coordinate,
    gold: f32,
    food: u32,
    max_food: Option<u32>,
) -> Result<ContainableId, CommandError> {
    if !gold.is_finite() || gold < 0.0 {
        return Err(CommandError::InvalidQuantity { value: gold });
    }
    let at = open_cell(world, at)?;
    let max_food = max_food.unwrap_or(world.config().mines.max_food);
    let slot = world.context().registry().next_slot(ContainableKind::Mine);
    let mine = Arc::new(Mine::new(slot, at, gold, food, max_food));
    if world.config().remove_depleted_mines {
        let tx = world.context().command_sender();
        let id = mine.id();
        mine.gold().on_depleted(move || {
            defer_on(&tx, Command::Remove { id });
        });
    }
    let id = world.context_mut().registry_mut().insert_mine(Arc::clone(&mine));
    world.graph().place(&*mine);
    world.context().events().raise(MineCreated { id, at });
    debug!(%id, %at, gold, food, "mine created");
    Ok(id)
}

fn create_center(world: &mut World, at: Coordinate, food: u32) -> Result<ContainableId, CommandError> {
    let at = open_cell(world, at)?;
    let slot = world.context().registry().next_slot(ContainableKind::Center);
    let center = Arc::new(Center::new(slot, at, food));
    let id = world.context_mut().registry_mut().insert_center(Arc::clone(&center));
    world.graph().place(&*center);
    debug!(%id, %at, food, "center created");
    Ok(id)
}

fn spawn_point(world: &World, at: Option<Coordinate>) -> Result<Coordinate, CommandError> {
    match at {
        Some(at) => open_cell(world, at),
        None => world
            .center()
            .map(|c| c.coordinate())
            .ok_or(CommandError::NoCenter),
    }
}

fn spawn_miner(world: &mut World, at: Option<Coordinate>) -> Result<ContainableId, CommandError> {
    let at = spawn_point(world, at)?;
    let slot = world.context().registry().next_slot(ContainableKind::Miner);
    let miner = Miner::new(slot, at, &world.config().miner, Arc::clone(world.miner_actions()))?;
    world.graph().place(&**miner.body());
    let id = world
        .context_mut()
        .registry_mut()
        .insert_miner(Arc::new(Mutex::new(miner)));
    world.context().events().raise(AgentSpawned { id, at });
    debug!(%id, %at, "miner spawned");
    Ok(id)
}

fn spawn_caravan(world: &mut World, at: Option<Coordinate>) -> Result<ContainableId, CommandError> {
    let at = spawn_point(world, at)?;
    let slot = world.context().registry().next_slot(ContainableKind::Caravan);
    let caravan = Caravan::new(
        slot,
        at,
        world.graph(),
        &world.config().caravan,
        Arc::clone(world.caravan_actions()),
    )?;
    world.graph().place(&**caravan.body());
    let id = world
        .context_mut()
        .registry_mut()
        .insert_caravan(Arc::new(Mutex::new(caravan)));
    world.context().events().raise(AgentSpawned { id, at });
    debug!(%id, %at, "caravan spawned");
    Ok(id)
}

/// Take `id` off the map. Returns `true` if it was a mine.
fn remove_containable(world: &mut World, id: ContainableId) -> Result<bool, CommandError> {
    let removed = world
        .context_mut()
        .registry_mut()
        .remove(id)
        .ok_or(CommandError::UnknownContainable { id })?;
    let graph = world.graph();
    let context = world.context();
    let was_mine = match removed {
        Removed::Mine(mine) => {
            let at = mine.coordinate();
            graph.detach(&*mine);
            mine.mark_removed();
            mine.gold().clear_listeners();
            context.food_requests().cancel(at);
            context.events().raise(MineRemoved { id, at });
            true
        }
        Removed::Center(center) => {
            graph.detach(&*center);
            false
        }
        Removed::Miner(miner) => {
            graph.detach(&**lock(&miner).body());
            false
        }
        Removed::Caravan(caravan) => {
            graph.detach(&**lock(&caravan).body());
            context.food_requests().release(id);
            false
        }
    };
    debug!(%id, "containable removed");
    Ok(was_mine)
}

/// Set the alarm and reroute every agent. Returns transitions taken.
fn set_alarm(world: &Arc<World>, raised: bool) -> u64 {
    let context = world.context();
    if context.alarm().set(raised) == raised {
        return 0;
    }
    context.events().raise(AlarmChanged { raised });
    let (miner_flag, caravan_flag) = if raised {
        (MinerFlag::AlarmRaised, CaravanFlag::AlarmRaised)
    } else {
        (MinerFlag::AlarmCleared, CaravanFlag::AlarmCleared)
    };
    let registry = context.registry();
    let mut taken = 0;
    for miner in registry.miners() {
        taken += lock(miner).raise(miner_flag, world) as u64;
    }
    for caravan in registry.caravans() {
        taken += lock(caravan).raise(caravan_flag, world) as u64;
    }
    info!(raised, agents = registry.agent_count(), "alarm changed");
    taken
}

fn tick_agent(world: &Arc<World>, id: ContainableId, dt: f32) -> Option<usize> {
    let registry = world.context().registry();
    match id.kind {
        ContainableKind::Miner => registry.miner(id).map(|m| lock(m).tick(world, dt)),
        ContainableKind::Caravan => registry.caravan(id).map(|c| lock(c).tick(world, dt)),
        ContainableKind::Mine | ContainableKind::Center => None,
    }
}

fn build_graph(map: &MapConfig, rng: &mut ChaCha8Rng) -> Result<Graph, GridError> {
    match &map.terrain {
        TerrainSource::Random => Graph::random(map.width, map.height, map.node_distance, map.edge, rng),
        TerrainSource::Uniform(terrain) => {
            Graph::uniform(map.width, map.height, map.node_distance, map.edge, *terrain)
        }
        TerrainSource::Map(path) => {
            let terrain = TerrainMap::load(path)?;
            Graph::from_map(&terrain, map.node_distance, map.edge)
        }
    }
}

// ── Simulation ─────────────────────────────────────────────────────

/// A running simulation.
///
/// Each [`step`](Self::step) applies queued commands, then ticks every
/// agent once on the worker pool.
///
/// ```
/// use prospect_engine::{Simulation, SimulationConfig};
///
/// let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
/// let metrics = sim.step();
/// assert_eq!(metrics.agents_ticked, 3);
/// sim.end();
/// ```
pub struct Simulation {
    world: Arc<World>,
    pool: rayon::ThreadPool,
    sender: Sender<Command>,
    commands: Receiver<Command>,
    internal: Receiver<Command>,
    forwarders: Forwarders,
    tick: TickId,
    receipts: Vec<CommandReceipt>,
    metrics: StepMetrics,
    regenerations: u32,
    alarm_transitions: u64,
    ended: bool,
}

impl Simulation {
    /// Validate `config`, build the grid and place the initial center,
    /// mines and agents.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let graph = build_graph(&config.map, &mut rng)?;
        let center_at = match config.center.position {
            Some(at) => {
                config.check_center(at, graph.width(), graph.height())?;
                at
            }
            None => Coordinate::new((graph.width() / 2) as i32, (graph.height() / 2) as i32),
        };

        let workers = config.resolved_worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("prospect-worker-{i}"))
            .build()
            .map_err(|e| SimulationError::ThreadPool {
                reason: e.to_string(),
            })?;

        let (sender, commands) = crossbeam_channel::bounded(config.command_queue_capacity);
        // Listener-raised commands must not be lost to a full queue.
        let (internal_sender, internal) = crossbeam_channel::unbounded();
        let context = SimulationContext::new(internal_sender.clone());
        let forwarders = Forwarders::subscribe(context.events(), &internal_sender, config.mines.start_food);
        let mut world = World::new(graph, context, config);
        populate(&mut world, center_at, &mut rng)?;

        let world = Arc::new(world);
        pool.install(|| world.regenerate_mine_partition());
        let registry = world.context().registry();
        info!(
            width = world.graph().width(),
            height = world.graph().height(),
            mines = registry.count(ContainableKind::Mine),
            miners = registry.count(ContainableKind::Miner),
            caravans = registry.count(ContainableKind::Caravan),
            workers,
            "simulation started"
        );

        Ok(Self {
            world,
            pool,
            sender,
            commands,
            internal,
            forwarders,
            tick: TickId(0),
            receipts: Vec::new(),
            metrics: StepMetrics::default(),
            regenerations: 0,
            alarm_transitions: 0,
            ended: false,
        })
    }

    /// Queue `command` for the next step.
    pub fn submit(&self, command: Command) -> Result<(), CommandError> {
        if self.ended {
            return Err(CommandError::Ended);
        }
        self.sender.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => CommandError::QueueFull,
            TrySendError::Disconnected(_) => CommandError::Ended,
        })
    }

    /// Run one step and return its metrics.
    pub fn step(&mut self) -> StepMetrics {
        let started = Instant::now();
        let tick = TickId(self.tick.0 + 1);
        let mut metrics = StepMetrics::default();
        let reuse_before = self.world.pool_stats().reused;

        // 1. Commands.
        self.receipts.clear();
        self.alarm_transitions = 0;
        self.regenerations = 0;
        let drained: Vec<Command> = self.internal.try_iter().chain(self.commands.try_iter()).collect();
        for (index, command) in drained.into_iter().enumerate() {
            let name = command.name();
            match self.apply(command) {
                Ok(created) => {
                    metrics.commands_applied += 1;
                    debug!(command = name, %tick, "command applied");
                    self.receipts.push(CommandReceipt::applied(tick, index, created));
                }
                Err(reason) => {
                    metrics.commands_rejected += 1;
                    warn!(command = name, %tick, %reason, "command rejected");
                    self.receipts.push(CommandReceipt::rejected(index, reason));
                }
            }
        }
        metrics.partition_regenerations = self.regenerations;
        metrics.command_us = started.elapsed().as_micros() as u64;

        // 2. Agents.
        let agents_started = Instant::now();
        let (ticked, transitions) = self.tick_agents();
        metrics.agent_tick_us = agents_started.elapsed().as_micros() as u64;
        metrics.agents_ticked = ticked;
        metrics.transitions = transitions + self.alarm_transitions;

        metrics.pool_reuse_hits = self.world.pool_stats().reused - reuse_before;
        metrics.total_us = started.elapsed().as_micros() as u64;
        self.tick = tick;
        self.metrics = metrics.clone();
        metrics
    }

    /// Snapshot agent ids per node, then tick each node's agents on the
    /// pool. An agent that moves mid-step is only in its old node's
    /// snapshot, so it ticks once.
    fn tick_agents(&self) -> (u32, u64) {
        let world = &self.world;
        let dt = world.config().dt;
        let occupied: Vec<SmallVec<[ContainableId; 4]>> = world
            .graph()
            .nodes()
            .iter()
            .map(|node| {
                node.containables()
                    .into_iter()
                    .filter(|id| id.kind.is_agent())
                    .collect::<SmallVec<[ContainableId; 4]>>()
            })
            .filter(|ids| !ids.is_empty())
            .collect();
        self.pool.install(|| {
            occupied
                .par_iter()
                .map(|ids| {
                    ids.iter()
                        .filter_map(|&id| tick_agent(world, id, dt))
                        .fold((0u32, 0u64), |(n, t), taken| (n + 1, t + taken as u64))
                })
                .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
        })
    }

    fn world_mut(&mut self) -> Result<&mut World, CommandError> {
        Arc::get_mut(&mut self.world).ok_or(CommandError::WorldShared)
    }

    fn apply(&mut self, command: Command) -> Result<Option<ContainableId>, CommandError> {
        match command {
            Command::SetAlarm { raised } => {
                self.alarm_transitions += set_alarm(&self.world, raised);
                Ok(None)
            }
            Command::CreateMine {
                at,
                gold,
                food,
                max_food,
            } => {
                let id = create_mine(self.world_mut()?, at, gold, food, max_food)?;
                self.regenerate_mines();
                Ok(Some(id))
            }
            Command::CreateCenter { at, food } => create_center(self.world_mut()?, at, food).map(Some),
            Command::SpawnMiner { at } => spawn_miner(self.world_mut()?, at).map(Some),
            Command::SpawnCaravan { at } => spawn_caravan(self.world_mut()?, at).map(Some),
            Command::Remove { id } => {
                if remove_containable(self.world_mut()?, id)? {
                    self.regenerate_mines();
                }
                Ok(None)
            }
            Command::SetTerrain { at, terrain } => {
                let world = self.world_mut()?;
                let at = world.graph().resolve(at);
                world.graph_mut().set_terrain(at, terrain);
                raise_graph_modified(world, at);
                Ok(None)
            }
            Command::SetBlocked { at, blocked } => {
                let world = self.world_mut()?;
                let at = world.graph().resolve(at);
                if let Some(node) = world.graph_mut().node_at_mut(at) {
                    node.set_blocked(blocked);
                }
                raise_graph_modified(world, at);
                Ok(None)
            }
        }
    }

    /// Rebuild the mine partition before the next command or agent sees
    /// the mine set.
    fn regenerate_mines(&mut self) {
        let world = &self.world;
        self.pool.install(|| world.regenerate_mine_partition());
        self.regenerations += 1;
    }

    /// Remove a containable immediately, outside the step loop.
    pub fn remove(&mut self, id: ContainableId) -> Result<(), CommandError> {
        if remove_containable(self.world_mut()?, id)? {
            let world = &self.world;
            self.pool.install(|| world.regenerate_mine_partition());
        }
        Ok(())
    }

    /// Tear the simulation down: unsubscribe listeners, detach every
    /// containable and clear the shared context. Later submits fail with
    /// [`CommandError::Ended`].
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        let dropped = self.internal.try_iter().count() + self.commands.try_iter().count();
        let world = &self.world;
        self.forwarders.unsubscribe(world.context().events());
        for mine in world.context().registry().mines() {
            mine.mark_removed();
            mine.gold().clear_listeners();
        }
        world.graph().clear_containables();
        match Arc::get_mut(&mut self.world) {
            Some(world) => world.context_mut().clear(),
            None => {
                warn!("world still shared at end, registry left in place");
                let context = self.world.context();
                context.partitions().clear();
                context.food_requests().clear();
                context.events().clear();
            }
        }
        info!(tick = %self.tick, dropped, "simulation ended");
    }

    /// Whether [`end`](Self::end) has run.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Receipts for the commands drained by the last step.
    pub fn receipts(&self) -> &[CommandReceipt] {
        &self.receipts
    }

    /// Metrics of the last step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.metrics
    }

    /// The world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The event bus.
    pub fn events(&self) -> &EventBus {
        self.world.context().events()
    }

    /// Steps completed so far.
    pub fn tick_id(&self) -> TickId {
        self.tick
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("world", &self.world)
            .field("ended", &self.ended)
            .finish()
    }
}

fn raise_graph_modified(world: &World, at: Coordinate) {
    if let Some(node) = world.graph().node_at(at) {
        world.context().events().raise(GraphModified {
            at,
            terrain: node.terrain(),
            blocked: node.is_blocked(),
        });
    }
}

/// Place the center, the configured mines and the starting agents.
fn populate(world: &mut World, center_at: Coordinate, rng: &mut ChaCha8Rng) -> Result<(), SimulationError> {
    let config = world.config().clone();
    create_center(world, center_at, config.center.food)?;

    let blocked = config.caravan.blocked;
    let candidates: Vec<Coordinate> = world
        .graph()
        .nodes()
        .iter()
        .filter(|n| n.coordinate() != center_at && n.is_traversable(blocked))
        .map(|n| n.coordinate())
        .collect();
    if candidates.len() < config.mines.count {
        warn!(
            wanted = config.mines.count,
            available = candidates.len(),
            "not enough open cells for every mine"
        );
    }
    let sites: Vec<Coordinate> = candidates
        .choose_multiple(rng, config.mines.count)
        .copied()
        .collect();
    for at in sites {
        let gold = rng.gen_range(config.mines.min_gold..=config.mines.max_gold);
        create_mine(world, at, gold, config.mines.start_food, None)?;
    }

    for _ in 0..config.miner.count {
        spawn_miner(world, None)?;
    }
    for _ in 0..config.caravan.count {
        spawn_caravan(world, None)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospect_grid::Terrain;

    fn empty_config() -> SimulationConfig {
        let mut cfg = SimulationConfig::default();
        cfg.map.width = 6;
        cfg.map.height = 6;
        cfg.map.terrain = TerrainSource::Uniform(Terrain::Grass);
        cfg.mines.count = 0;
        cfg.miner.count = 0;
        cfg.caravan.count = 0;
        cfg.max_workers = Some(2);
        cfg
    }

    // ── Construction tests ──────────────────────────────────────

    #[test]
    fn defaults_populate_the_world() {
        let sim = Simulation::new(SimulationConfig::default()).unwrap();
        let registry = sim.world().context().registry();
        assert_eq!(registry.count(ContainableKind::Center), 1);
        assert_eq!(registry.count(ContainableKind::Mine), 5);
        assert_eq!(registry.count(ContainableKind::Miner), 2);
        assert_eq!(registry.count(ContainableKind::Caravan), 1);
        assert!(sim.world().context().partitions().contains(&ContainableKind::Mine));
    }

    #[test]
    fn same_seed_places_same_mines() {
        let coords = |sim: &Simulation| -> Vec<Coordinate> {
            sim.world().context().registry().mines().map(|m| m.coordinate()).collect()
        };
        let a = Simulation::new(SimulationConfig::default()).unwrap();
        let b = Simulation::new(SimulationConfig::default()).unwrap();
        assert_eq!(coords(&a), coords(&b));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = SimulationConfig::default();
        cfg.dt = 0.0;
        assert!(matches!(Simulation::new(cfg), Err(SimulationError::Config(_))));
    }

    #[test]
    fn missing_map_is_a_grid_error() {
        let mut cfg = SimulationConfig::default();
        cfg.map.terrain = TerrainSource::Map("/nonexistent/prospect-map.csv".into());
        match Simulation::new(cfg) {
            Err(SimulationError::Grid(GridError::MapIo { .. })) => {}
            other => panic!("expected Grid(MapIo), got {other:?}"),
        }
    }

    // ── Command tests ───────────────────────────────────────────

    #[test]
    fn commands_yield_receipts_in_order() {
        let mut sim = Simulation::new(empty_config()).unwrap();
        sim.submit(Command::SpawnMiner { at: None }).unwrap();
        sim.submit(Command::Remove {
            id: ContainableId::new(ContainableKind::Caravan, 7),
        })
        .unwrap();
        let metrics = sim.step();
        assert_eq!(metrics.commands_applied, 1);
        assert_eq!(metrics.commands_rejected, 1);
        let receipts = sim.receipts();
        assert_eq!(receipts.len(), 2);
        assert!(receipts[0].accepted);
        assert_eq!(receipts[0].applied_tick_id, Some(TickId(1)));
        assert_eq!(
            receipts[0].created,
            Some(ContainableId::new(ContainableKind::Miner, 0))
        );
        assert!(matches!(
            receipts[1].reason,
            Some(CommandError::UnknownContainable { .. })
        ));
    }

    #[test]
    fn blocked_cell_rejects_mine() {
        let mut sim = Simulation::new(empty_config()).unwrap();
        let at = Coordinate::new(1, 1);
        sim.submit(Command::SetBlocked { at, blocked: true }).unwrap();
        sim.submit(Command::CreateMine {
            at,
            gold: 10.0,
            food: 0,
            max_food: None,
        })
        .unwrap();
        sim.step();
        assert_eq!(
            sim.receipts()[1].reason,
            Some(CommandError::CellBlocked { at })
        );
    }

    #[test]
    fn mine_commands_regenerate_partition() {
        let mut sim = Simulation::new(empty_config()).unwrap();
        assert!(!sim.world().context().partitions().contains(&ContainableKind::Mine));
        sim.submit(Command::CreateMine {
            at: Coordinate::new(0, 0),
            gold: 10.0,
            food: 0,
            max_food: None,
        })
        .unwrap();
        let metrics = sim.step();
        assert_eq!(metrics.partition_regenerations, 1);
        let id = sim.receipts()[0].created.unwrap();
        assert_eq!(
            sim.world().closest_mine(Coordinate::new(4, 4)),
            Some(Coordinate::new(0, 0))
        );
        sim.remove(id).unwrap();
        assert!(!sim.world().context().partitions().contains(&ContainableKind::Mine));
        assert_eq!(sim.world().closest_mine(Coordinate::new(4, 4)), None);
    }

    #[test]
    fn each_mine_command_regenerates_in_turn() {
        let mut sim = Simulation::new(empty_config()).unwrap();
        for x in [0, 4] {
            sim.submit(Command::CreateMine {
                at: Coordinate::new(x, 0),
                gold: 10.0,
                food: 0,
                max_food: None,
            })
            .unwrap();
        }
        let first = ContainableId::new(ContainableKind::Mine, 0);
        sim.submit(Command::Remove { id: first }).unwrap();
        let metrics = sim.step();
        assert_eq!(metrics.commands_applied, 3);
        assert_eq!(metrics.partition_regenerations, 3);
        assert_eq!(
            sim.world().closest_mine(Coordinate::new(0, 0)),
            Some(Coordinate::new(4, 0))
        );
        assert_eq!(sim.step().partition_regenerations, 0);
    }

    #[test]
    fn depleted_mine_is_removed_with_a_full_queue() {
        let mut cfg = empty_config();
        cfg.command_queue_capacity = 1;
        cfg.miner.mine_speed = 20.0;
        let mut sim = Simulation::new(cfg).unwrap();
        let center = sim.world().center().unwrap().coordinate();
        sim.submit(Command::CreateMine {
            at: center,
            gold: 1.0,
            food: 10,
            max_food: None,
        })
        .unwrap();
        sim.step();
        sim.submit(Command::SpawnMiner { at: None }).unwrap();
        sim.step();

        for _ in 0..40 {
            sim.submit(Command::SetAlarm { raised: false }).unwrap();
            assert_eq!(
                sim.submit(Command::SetAlarm { raised: false }),
                Err(CommandError::QueueFull)
            );
            sim.step();
        }
        assert_eq!(sim.world().context().registry().count(ContainableKind::Mine), 0);
        assert!(sim.world().mine_on(center).is_none());
    }

    #[test]
    fn request_events_become_commands() {
        let mut sim = Simulation::new(empty_config()).unwrap();
        sim.events().raise(RequestMinerCreation { at: None });
        sim.events().raise(CreateMine {
            at: Coordinate::new(2, 2),
            gold: 5.0,
        });
        sim.step();
        let registry = sim.world().context().registry();
        assert_eq!(registry.count(ContainableKind::Miner), 1);
        assert_eq!(registry.count(ContainableKind::Mine), 1);
    }

    #[test]
    fn terrain_edit_is_published() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let mut sim = Simulation::new(empty_config()).unwrap();
        let seen = Arc::new(AtomicBool::new(false));
        let sink = Arc::clone(&seen);
        sim.events().subscribe(move |e: &GraphModified| {
            sink.store(e.terrain == Terrain::Water, Ordering::Relaxed);
        });
        sim.submit(Command::SetTerrain {
            at: Coordinate::new(7, 0),
            terrain: Terrain::Water,
        })
        .unwrap();
        sim.step();
        assert!(seen.load(Ordering::Relaxed));
        // Wrapped onto (1, 0).
        let node = sim.world().graph().node_at(Coordinate::new(1, 0)).unwrap();
        assert_eq!(node.terrain(), Terrain::Water);
    }

    // ── Teardown tests ──────────────────────────────────────────

    #[test]
    fn end_clears_everything() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        sim.step();
        sim.end();
        assert!(sim.is_ended());
        let world = sim.world();
        assert_eq!(world.context().registry().agent_count(), 0);
        assert!(world.context().partitions().is_empty());
        assert!(world.graph().nodes().iter().all(|n| n.containable_count() == 0));
        assert_eq!(sim.submit(Command::SetAlarm { raised: true }), Err(CommandError::Ended));
        assert_eq!(sim.events().subscriber_count::<RequestMinerCreation>(), 0);
    }
}
