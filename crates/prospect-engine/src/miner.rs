//! Miner agents: walk to mines, dig gold, carry it home.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use prospect_core::{ContainableId, ContainableKind, SubscriptionId};
use prospect_fsm::{ActionPool, BehaviourActions, Fsm, FsmBuilder, FsmError, Providers, State};
use prospect_grid::{Coordinate, NodeContainable, Placement, TerrainSet};
use prospect_path::Pathfinder;
use tracing::trace;

use crate::config::MinerConfig;
use crate::events::CenterGoldChanged;
use crate::lock;
use crate::resources::GoldContainer;
use crate::structures::Mine;
use crate::world::World;

/// Miner FSM states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MinerState {
    /// Waiting, and asking for food if the mine underfoot has none.
    Idle,
    /// Choosing the nearest workable mine.
    FindMine,
    /// Choosing the town center.
    FindCenter,
    /// Walking a path to the chosen target.
    Move,
    /// Digging gold.
    Mine,
    /// Emptying gold into the center.
    Deposit,
    /// Sitting out the alarm at the center.
    Hide,
}

/// Miner FSM flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MinerFlag {
    /// Idle time is over and there is food to work with.
    IdleEnded,
    /// A mine was chosen. Carries its cell.
    MineFound,
    /// The center was chosen. Carries its cell.
    CenterFound,
    /// No target exists, or the path ended somewhere else.
    TargetNotFound,
    /// Arrived on a mine.
    ReachedMine,
    /// Arrived at the center.
    ReachedCenter,
    /// Arrived at the center while the alarm is up.
    StayHidden,
    /// The mine is gone or out of gold.
    MineDepleted,
    /// The miner cannot carry more gold.
    GoldFilled,
    /// The mine has no food left.
    FoodDepleted,
    /// Gold handed over to the center.
    GoldDeposited,
    /// The town alarm went up.
    AlarmRaised,
    /// The town alarm was cleared.
    AlarmCleared,
}

/// The part of a miner states read and write while ticking.
#[derive(Debug)]
pub struct MinerBody {
    placement: Placement,
    gold: Mutex<GoldContainer>,
    gold_filled: Arc<AtomicBool>,
    homeward: AtomicBool,
    mine_speed: f32,
    move_speed: f32,
}

impl MinerBody {
    fn new(slot: u32, at: Coordinate, config: &MinerConfig) -> Self {
        Self {
            placement: Placement::new(ContainableId::new(ContainableKind::Miner, slot), at),
            gold: Mutex::new(GoldContainer::new(0.0, config.max_gold)),
            gold_filled: Arc::new(AtomicBool::new(false)),
            homeward: AtomicBool::new(false),
            mine_speed: config.mine_speed,
            move_speed: config.move_speed,
        }
    }

    /// Lock the carried gold.
    pub fn gold(&self) -> MutexGuard<'_, GoldContainer> {
        lock(&self.gold)
    }

    /// Whether the current trip ends at the center rather than a mine.
    pub fn is_homeward(&self) -> bool {
        self.homeward.load(Ordering::Acquire)
    }

    /// Gold dug per second.
    pub fn mine_speed(&self) -> f32 {
        self.mine_speed
    }

    /// Cells walked per second.
    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }
}

impl NodeContainable for MinerBody {
    fn containable_id(&self) -> ContainableId {
        self.placement.containable_id()
    }

    fn node_coordinate(&self) -> Coordinate {
        self.placement.node_coordinate()
    }

    fn set_node_coordinate(&self, coordinate: Coordinate) {
        self.placement.set_node_coordinate(coordinate);
    }
}

/// What miner states see: the body, the world and the step's `dt`.
pub(crate) struct MinerEnv {
    body: Arc<MinerBody>,
    world: Arc<World>,
    dt: f32,
}

type Actions<'a> = BehaviourActions<'a, MinerFlag, Coordinate>;

fn at(env: &MinerEnv) -> Coordinate {
    env.body.node_coordinate()
}

fn dt(env: &MinerEnv) -> f32 {
    env.dt
}

// ── States ─────────────────────────────────────────────────────────

struct Idle {
    idle_time: f32,
    request_interval: f32,
    at: Coordinate,
    elapsed: f32,
    since_request: f32,
}

impl State<MinerEnv, MinerFlag, Coordinate> for Idle {
    type Enter = Coordinate;
    type Tick = f32;
    type Exit = ();

    fn on_enter<'a>(&'a mut self, _: &'a MinerEnv, at: Coordinate, _: Option<Coordinate>, _: &mut Actions<'a>) {
        self.at = at;
        self.elapsed = 0.0;
        self.since_request = self.request_interval;
    }

    fn on_tick<'a>(&'a mut self, env: &'a MinerEnv, dt: f32, actions: &mut Actions<'a>) {
        let Idle {
            idle_time,
            request_interval,
            at,
            elapsed,
            since_request,
        } = self;
        let (at, idle_time, interval) = (*at, *idle_time, *request_interval);
        actions.add_parallel(0, move |_| {
            let Some(mine) = env.world.mine_on(at) else {
                return;
            };
            if !mine.food().is_empty() {
                return;
            }
            *since_request += dt;
            if *since_request >= interval {
                *since_request = 0.0;
                env.world.context().food_requests().request(mine.coordinate());
            }
        });
        actions.add_main(0, move |flags| {
            *elapsed += dt;
            let fed = env.world.mine_on(at).map_or(true, |m| !m.food().is_empty());
            if *elapsed >= idle_time && fed {
                flags.raise(MinerFlag::IdleEnded);
            }
        });
    }
}

struct FindMine;

impl State<MinerEnv, MinerFlag, Coordinate> for FindMine {
    type Enter = ();
    type Tick = Coordinate;
    type Exit = ();

    fn on_tick<'a>(&'a mut self, env: &'a MinerEnv, at: Coordinate, actions: &mut Actions<'a>) {
        actions.add_parallel(0, move |flags| {
            env.body.homeward.store(false, Ordering::Release);
            match env.world.closest_mine(at) {
                Some(mine) => flags.raise_with(MinerFlag::MineFound, mine),
                None => flags.raise(MinerFlag::TargetNotFound),
            }
        });
    }
}

struct FindCenter;

impl State<MinerEnv, MinerFlag, Coordinate> for FindCenter {
    type Enter = ();
    type Tick = ();
    type Exit = ();

    fn on_tick<'a>(&'a mut self, env: &'a MinerEnv, _: (), actions: &mut Actions<'a>) {
        actions.add_parallel(0, move |flags| {
            env.body.homeward.store(true, Ordering::Release);
            match env.world.center() {
                Some(center) => flags.raise_with(MinerFlag::CenterFound, center.coordinate()),
                None => flags.raise(MinerFlag::TargetNotFound),
            }
        });
    }
}

#[derive(Default)]
struct Move {
    path: Vec<Coordinate>,
    elapsed: f32,
}

impl State<MinerEnv, MinerFlag, Coordinate> for Move {
    type Enter = Coordinate;
    type Tick = f32;
    type Exit = ();

    fn on_enter<'a>(&'a mut self, env: &'a MinerEnv, at: Coordinate, target: Option<Coordinate>, _: &mut Actions<'a>) {
        let world = &env.world;
        let goal = target.unwrap_or(at);
        let found = world.miner_paths().find_path(
            world.graph(),
            at,
            goal,
            TerrainSet::EMPTY,
            &world.config().pathing.costs,
        );
        self.path.clear();
        self.elapsed = 0.0;
        match found {
            Some(path) => self.path.extend(path.iter()),
            None => {
                trace!(miner = %env.body.containable_id(), %goal, "no path");
                self.path.push(at);
            }
        }
    }

    fn on_tick<'a>(&'a mut self, env: &'a MinerEnv, dt: f32, actions: &mut Actions<'a>) {
        let Move { path, elapsed } = self;
        actions.add_parallel(0, move |flags| {
            *elapsed += dt;
            let last = path.len().saturating_sub(1);
            let index = ((*elapsed * env.body.move_speed) as usize).min(last);
            let Some(&cell) = path.get(index) else {
                flags.raise(MinerFlag::TargetNotFound);
                return;
            };
            env.world.graph().move_containable_to(&*env.body, cell);
            if index == last {
                flags.raise(arrival(env, cell));
            }
        });
    }
}

/// What the miner found where its path ended.
///
/// A trip out stops at a workable mine even when a center shares the
/// cell. A trip home stops at the center even when a mine shares it.
/// Otherwise the earliest arrival of either kind decides.
fn arrival(env: &MinerEnv, cell: Coordinate) -> MinerFlag {
    let world = &env.world;
    let Some(node) = world.graph().node_at(cell) else {
        return MinerFlag::TargetNotFound;
    };
    let preferred = if env.body.is_homeward() {
        node.last_of_kind(ContainableKind::Center)
    } else {
        node.last_of_kind(ContainableKind::Mine)
            .filter(|_| world.mine_on(cell).is_some_and(|m| m.is_workable()))
    };
    let found = preferred.or_else(|| node.first_of_kinds(&[ContainableKind::Mine, ContainableKind::Center]));
    match found {
        Some(id) if id.kind == ContainableKind::Mine => MinerFlag::ReachedMine,
        Some(_) if world.context().alarm().is_raised() => MinerFlag::StayHidden,
        Some(_) => MinerFlag::ReachedCenter,
        None => MinerFlag::TargetNotFound,
    }
}

struct Mining {
    gold_per_food: f32,
    mine: Option<Arc<Mine>>,
    listener: Option<SubscriptionId>,
    gold_until_food: Mutex<f32>,
}

impl State<MinerEnv, MinerFlag, Coordinate> for Mining {
    type Enter = Coordinate;
    type Tick = f32;
    type Exit = ();

    fn on_enter<'a>(&'a mut self, env: &'a MinerEnv, at: Coordinate, _: Option<Coordinate>, _: &mut Actions<'a>) {
        self.mine = env.world.mine_on(at);
        *self
            .gold_until_food
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner) = 0.0;
        let filled = Arc::clone(&env.body.gold_filled);
        let mut gold = env.body.gold();
        filled.store(gold.is_full(), Ordering::Release);
        self.listener = Some(gold.on_filled(move || filled.store(true, Ordering::Release)));
    }

    fn on_tick<'a>(&'a mut self, env: &'a MinerEnv, dt: f32, actions: &mut Actions<'a>) {
        let per_food = self.gold_per_food;
        let mine = self.mine.as_ref();
        let budget = &self.gold_until_food;
        actions.add_parallel(0, move |flags| {
            let Some(mine) = mine.filter(|m| m.is_workable()) else {
                flags.raise(MinerFlag::MineDepleted);
                return;
            };
            let body = &env.body;
            let want = (body.mine_speed * dt).min(body.gold().space_available());
            let taken = mine.gold().take(want);
            let overflow = body.gold().add(taken);
            if overflow > 0.0 {
                mine.gold().add(overflow);
            }
            *lock(budget) -= taken - overflow;
            if body.gold_filled.swap(false, Ordering::AcqRel) {
                flags.raise(MinerFlag::GoldFilled);
            }
        });
        actions.add_parallel(1, move |flags| {
            let Some(mine) = mine else {
                return;
            };
            let mut food = mine.food();
            if food.is_empty() {
                flags.raise(MinerFlag::FoodDepleted);
                return;
            }
            let mut budget = lock(budget);
            if *budget <= 0.0 {
                food.take(1);
                *budget += per_food;
            }
        });
    }

    fn on_exit<'a>(&'a mut self, env: &'a MinerEnv, _: (), _: &mut Actions<'a>) {
        if let Some(id) = self.listener.take() {
            env.body.gold().remove_listener(id);
        }
        self.mine = None;
    }
}

struct Deposit;

impl State<MinerEnv, MinerFlag, Coordinate> for Deposit {
    type Enter = Coordinate;
    type Tick = ();
    type Exit = ();

    fn on_enter<'a>(&'a mut self, env: &'a MinerEnv, at: Coordinate, _: Option<Coordinate>, actions: &mut Actions<'a>) {
        actions.add_main(0, move |flags| {
            let world = &env.world;
            if let Some(center) = world.center_on(at).or_else(|| world.center()) {
                let gold = env.body.gold().take_all();
                let total = {
                    let mut treasury = center.gold();
                    treasury.add(gold);
                    treasury.contained()
                };
                world.context().events().raise(CenterGoldChanged { total });
            }
            flags.raise(MinerFlag::GoldDeposited);
        });
    }
}

struct Hide;

impl State<MinerEnv, MinerFlag, Coordinate> for Hide {
    type Enter = ();
    type Tick = ();
    type Exit = ();
}

// ── Miner ──────────────────────────────────────────────────────────

type MinerFsm = Fsm<MinerState, MinerFlag, MinerEnv, Coordinate>;

fn build_fsm(config: &MinerConfig, pool: Arc<ActionPool<MinerFlag, Coordinate>>) -> Result<MinerFsm, FsmError> {
    use MinerFlag as F;
    use MinerState as S;

    let idle = Idle {
        idle_time: config.idle_time,
        request_interval: config.food_request_interval,
        at: Coordinate::new(0, 0),
        elapsed: 0.0,
        since_request: 0.0,
    };
    let mining = Mining {
        gold_per_food: config.gold_per_food,
        mine: None,
        listener: None,
        gold_until_food: Mutex::new(0.0),
    };
    FsmBuilder::<S, F, MinerEnv, Coordinate>::new(S::Idle)
        .add_state(S::Idle, idle, Providers::new().on_enter(at).on_tick(dt))
        .add_state(S::FindMine, FindMine, Providers::new().on_tick(at))
        .add_state(S::FindCenter, FindCenter, Providers::new())
        .add_state(S::Move, Move::default(), Providers::new().on_enter(at).on_tick(dt))
        .add_state(S::Mine, mining, Providers::new().on_enter(at).on_tick(dt))
        .add_state(S::Deposit, Deposit, Providers::new().on_enter(at))
        .add_state(S::Hide, Hide, Providers::new())
        .set_transition(S::Idle, F::IdleEnded, S::FindMine)
        .set_transition(S::Idle, F::AlarmRaised, S::FindCenter)
        .set_transition(S::FindMine, F::MineFound, S::Move)
        .set_transition(S::FindMine, F::TargetNotFound, S::Idle)
        .set_transition(S::FindMine, F::AlarmRaised, S::FindCenter)
        .set_transition(S::FindCenter, F::CenterFound, S::Move)
        .set_transition(S::FindCenter, F::TargetNotFound, S::Idle)
        .set_transition(S::Move, F::ReachedMine, S::Mine)
        .set_transition(S::Move, F::ReachedCenter, S::Deposit)
        .set_transition(S::Move, F::StayHidden, S::Hide)
        .set_transition(S::Move, F::TargetNotFound, S::FindMine)
        .set_transition(S::Move, F::AlarmRaised, S::FindCenter)
        .set_transition(S::Mine, F::MineDepleted, S::FindMine)
        .set_transition(S::Mine, F::GoldFilled, S::FindCenter)
        .set_transition(S::Mine, F::FoodDepleted, S::Idle)
        .set_transition(S::Mine, F::AlarmRaised, S::FindCenter)
        .set_transition(S::Deposit, F::GoldDeposited, S::FindMine)
        .set_transition(S::Deposit, F::AlarmRaised, S::Hide)
        .set_transition(S::Hide, F::AlarmCleared, S::FindMine)
        .action_pool(pool)
        .build()
}

/// A miner: its body plus the state machine driving it.
pub struct Miner {
    body: Arc<MinerBody>,
    fsm: MinerFsm,
}

impl Miner {
    pub(crate) fn new(
        slot: u32,
        at: Coordinate,
        config: &MinerConfig,
        pool: Arc<ActionPool<MinerFlag, Coordinate>>,
    ) -> Result<Self, FsmError> {
        Ok(Self {
            body: Arc::new(MinerBody::new(slot, at, config)),
            fsm: build_fsm(config, pool)?,
        })
    }

    /// This miner's id.
    pub fn id(&self) -> ContainableId {
        self.body.containable_id()
    }

    /// Cell the miner stands on.
    pub fn coordinate(&self) -> Coordinate {
        self.body.node_coordinate()
    }

    /// Current FSM state.
    pub fn state(&self) -> MinerState {
        self.fsm.current()
    }

    /// Gold carried.
    pub fn gold(&self) -> f32 {
        self.body.gold().contained()
    }

    /// The shared body.
    pub fn body(&self) -> &Arc<MinerBody> {
        &self.body
    }

    /// Transitions taken since spawn.
    pub fn transitions_taken(&self) -> u64 {
        self.fsm.transitions_taken()
    }

    fn env(&self, world: &Arc<World>, dt: f32) -> MinerEnv {
        MinerEnv {
            body: Arc::clone(&self.body),
            world: Arc::clone(world),
            dt,
        }
    }

    pub(crate) fn tick(&mut self, world: &Arc<World>, dt: f32) -> usize {
        let env = self.env(world, dt);
        self.fsm.tick(&env)
    }

    pub(crate) fn raise(&mut self, flag: MinerFlag, world: &Arc<World>) -> usize {
        let env = self.env(world, 0.0);
        self.fsm.start(&env) + self.fsm.raise(flag, &env)
    }
}

impl std::fmt::Debug for Miner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Miner")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("gold", &self.gold())
            .finish()
    }
}
