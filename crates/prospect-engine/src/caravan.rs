//! Caravans: carry food from the center to mines that asked for it.

use std::sync::{Arc, Mutex, MutexGuard};

use glam::Vec2;
use prospect_core::{ContainableId, ContainableKind};
use prospect_fsm::{ActionPool, BehaviourActions, Fsm, FsmBuilder, FsmError, Providers, State};
use prospect_grid::{Coordinate, Graph, NodeContainable, Placement, TerrainSet};
use prospect_path::Pathfinder;
use tracing::trace;

use crate::config::CaravanConfig;
use crate::lock;
use crate::resources::FoodContainer;
use crate::structures::{Center, Mine};
use crate::world::World;

/// Caravan FSM states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaravanState {
    /// Sitting out the alarm at the center.
    Hide,
    /// Choosing the center to load at.
    FindCenter,
    /// Waiting for a food request.
    FindMine,
    /// Travelling to the chosen target.
    Move,
    /// Loading food at the center.
    Collect,
    /// Unloading food into a mine.
    Deposit,
}

/// Caravan FSM flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaravanFlag {
    /// Loaded as much as there is room for, or as the center had.
    FoodFilled,
    /// Nothing to load or unload.
    FoodDepleted,
    /// The town alarm went up.
    AlarmRaised,
    /// The town alarm was cleared.
    AlarmCleared,
    /// A food request was claimed. Carries the mine's cell.
    MineFound,
    /// Arrived at the center.
    ReachedCenter,
    /// Arrived on a mine.
    ReachedMine,
    /// Arrived at the center while the alarm is up.
    StayHidden,
    /// The route ended somewhere unexpected.
    TargetNotFound,
    /// The center was chosen. Carries its cell.
    CenterFound,
    /// The mine's food request is met.
    FoodDeposited,
}

/// The part of a caravan states read and write while ticking.
///
/// Caravans move continuously; `position` is in world units and may run
/// past the grid edge on a wrapping grid. The node coordinate follows it.
#[derive(Debug)]
pub struct CaravanBody {
    placement: Placement,
    food: Mutex<FoodContainer>,
    position: Mutex<Vec2>,
    move_speed: f32,
    blocked: TerrainSet,
}

impl CaravanBody {
    fn new(slot: u32, at: Coordinate, graph: &Graph, config: &CaravanConfig) -> Self {
        Self {
            placement: Placement::new(ContainableId::new(ContainableKind::Caravan, slot), at),
            food: Mutex::new(FoodContainer::new(0, config.capacity)),
            position: Mutex::new(cell_centre(graph, at)),
            move_speed: config.move_speed,
            blocked: config.blocked,
        }
    }

    /// Lock the carried food.
    pub fn food(&self) -> MutexGuard<'_, FoodContainer> {
        lock(&self.food)
    }

    /// Current world position.
    pub fn position(&self) -> Vec2 {
        *lock(&self.position)
    }

    /// World units travelled per second.
    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    /// Terrain this caravan routes around.
    pub fn blocked(&self) -> TerrainSet {
        self.blocked
    }
}

impl NodeContainable for CaravanBody {
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

fn cell_centre(graph: &Graph, c: Coordinate) -> Vec2 {
    let (x, y) = graph.position_of(c);
    Vec2::new(x, y)
}

/// Shortest signed cell offset from `a` to `b` along one axis of length `len`.
fn axis_step(a: i32, b: i32, len: u32, wrap: bool) -> i32 {
    let d = b - a;
    let n = len as i32;
    if !wrap {
        return d;
    }
    if d > n / 2 {
        d - n
    } else if d < -(n / 2) {
        d + n
    } else {
        d
    }
}

/// World positions of `cells`, unwrapped so each waypoint is the image
/// of its cell nearest the previous one.
fn waypoints(graph: &Graph, cells: &[Coordinate]) -> Vec<Vec2> {
    let mut out = Vec::with_capacity(cells.len());
    let Some(&first) = cells.first() else {
        return out;
    };
    let wrap = graph.is_circumnavigable();
    let mut pos = cell_centre(graph, first);
    let mut prev = graph.resolve(first);
    out.push(pos);
    for &cell in &cells[1..] {
        let cell = graph.resolve(cell);
        let dx = axis_step(prev.x, cell.x, graph.width(), wrap);
        let dy = axis_step(prev.y, cell.y, graph.height(), wrap);
        pos += Vec2::new(dx as f32, dy as f32) * graph.node_distance();
        out.push(pos);
        prev = cell;
    }
    out
}

pub(crate) struct CaravanEnv {
    body: Arc<CaravanBody>,
    world: Arc<World>,
    dt: f32,
}

type Actions<'a> = BehaviourActions<'a, CaravanFlag, Coordinate>;

fn at(env: &CaravanEnv) -> Coordinate {
    env.body.node_coordinate()
}

fn dt(env: &CaravanEnv) -> f32 {
    env.dt
}

// ── States ─────────────────────────────────────────────────────────

struct FindCenter;

impl State<CaravanEnv, CaravanFlag, Coordinate> for FindCenter {
    type Enter = ();
    type Tick = ();
    type Exit = ();

    fn on_tick<'a>(&'a mut self, env: &'a CaravanEnv, _: (), actions: &mut Actions<'a>) {
        actions.add_parallel(0, move |flags| {
            if let Some(center) = env.world.center() {
                flags.raise_with(CaravanFlag::CenterFound, center.coordinate());
            }
        });
    }
}

struct FindMine;

impl State<CaravanEnv, CaravanFlag, Coordinate> for FindMine {
    type Enter = ();
    type Tick = ();
    type Exit = ();

    fn on_tick<'a>(&'a mut self, env: &'a CaravanEnv, _: (), actions: &mut Actions<'a>) {
        actions.add_parallel(0, move |flags| {
            let requests = env.world.context().food_requests();
            if let Some(mine) = requests.next_for(env.body.containable_id()) {
                flags.raise_with(CaravanFlag::MineFound, mine);
            }
        });
    }
}

#[derive(Default)]
struct Move {
    goal: Coordinate,
    waypoints: Vec<Vec2>,
    next: usize,
}

impl State<CaravanEnv, CaravanFlag, Coordinate> for Move {
    type Enter = Coordinate;
    type Tick = f32;
    type Exit = ();

    fn on_enter<'a>(&'a mut self, env: &'a CaravanEnv, at: Coordinate, target: Option<Coordinate>, _: &mut Actions<'a>) {
        let world = &env.world;
        let graph = world.graph();
        self.goal = target.unwrap_or(at);
        let cells = world
            .caravan_paths()
            .find_path(graph, at, self.goal, env.body.blocked, &world.config().pathing.costs)
            .map(|p| p.into_vec())
            .unwrap_or_else(|| {
                trace!(caravan = %env.body.containable_id(), goal = %self.goal, "no path, heading straight");
                vec![at, self.goal]
            });
        self.waypoints = waypoints(graph, &cells);
        self.next = 0;
        *lock(&env.body.position) = cell_centre(graph, at);
    }

    fn on_tick<'a>(&'a mut self, env: &'a CaravanEnv, dt: f32, actions: &mut Actions<'a>) {
        let Move {
            goal,
            waypoints,
            next,
        } = self;
        let goal = *goal;
        actions.add_parallel(0, move |flags| {
            let graph = env.world.graph();
            let mut pos = env.body.position();
            let mut budget = env.body.move_speed * dt;
            while let Some(&target) = waypoints.get(*next) {
                let offset = target - pos;
                let dist = offset.length();
                if dist > budget {
                    pos += offset / dist * budget;
                    break;
                }
                pos = target;
                budget -= dist;
                *next += 1;
            }
            *lock(&env.body.position) = pos;
            graph.move_containable_to(&*env.body, graph.coordinate_from_position(pos.x, pos.y));
            if *next >= waypoints.len() {
                flags.raise(arrival(env, goal));
            }
        });
    }
}

fn arrival(env: &CaravanEnv, cell: Coordinate) -> CaravanFlag {
    let found = env
        .world
        .graph()
        .node_at(cell)
        .and_then(|n| n.first_of_kinds(&[ContainableKind::Mine, ContainableKind::Center]));
    match found {
        Some(id) if id.kind == ContainableKind::Mine => CaravanFlag::ReachedMine,
        Some(_) if env.world.context().alarm().is_raised() => CaravanFlag::StayHidden,
        Some(_) => CaravanFlag::ReachedCenter,
        None => CaravanFlag::TargetNotFound,
    }
}

#[derive(Default)]
struct Collect {
    center: Option<Arc<Center>>,
}

impl State<CaravanEnv, CaravanFlag, Coordinate> for Collect {
    type Enter = Coordinate;
    type Tick = ();
    type Exit = ();

    fn on_enter<'a>(&'a mut self, env: &'a CaravanEnv, at: Coordinate, _: Option<Coordinate>, actions: &mut Actions<'a>) {
        self.center = env.world.center_on(at);
        if self.center.is_none() {
            actions.add_main(0, |flags| flags.raise(CaravanFlag::FoodDepleted));
        }
    }

    fn on_tick<'a>(&'a mut self, env: &'a CaravanEnv, _: (), actions: &mut Actions<'a>) {
        let center = self.center.as_ref();
        actions.add_parallel(0, move |flags| {
            let Some(center) = center else {
                flags.raise(CaravanFlag::FoodDepleted);
                return;
            };
            let mut food = env.body.food();
            let gained = center.food().take(food.space_available());
            let overflow = food.add(gained);
            if overflow > 0 {
                center.food().add(overflow);
            }
            if food.is_full() || (gained == 0 && !food.is_empty()) {
                flags.raise(CaravanFlag::FoodFilled);
            } else if gained == 0 {
                flags.raise(CaravanFlag::FoodDepleted);
            }
        });
    }

    fn on_exit<'a>(&'a mut self, _: &'a CaravanEnv, _: (), _: &mut Actions<'a>) {
        self.center = None;
    }
}

#[derive(Default)]
struct Deposit {
    mine: Option<Arc<Mine>>,
}

impl State<CaravanEnv, CaravanFlag, Coordinate> for Deposit {
    type Enter = Coordinate;
    type Tick = ();
    type Exit = ();

    fn on_enter<'a>(&'a mut self, env: &'a CaravanEnv, at: Coordinate, _: Option<Coordinate>, actions: &mut Actions<'a>) {
        self.mine = env.world.mine_on(at).filter(|m| !m.is_removed());
        if self.mine.is_none() {
            env.world.context().food_requests().complete(env.body.containable_id());
            actions.add_main(0, |flags| flags.raise(CaravanFlag::FoodDepleted));
        }
    }

    fn on_tick<'a>(&'a mut self, env: &'a CaravanEnv, _: (), actions: &mut Actions<'a>) {
        let mine = self.mine.as_ref();
        actions.add_parallel(0, move |flags| {
            let Some(mine) = mine else {
                flags.raise(CaravanFlag::FoodDepleted);
                return;
            };
            let mut food = env.body.food();
            let mut stock = mine.food();
            let given = food.take(stock.space_available());
            let overflow = stock.add(given);
            food.add(overflow);
            if food.is_empty() || stock.is_full() {
                env.world.context().food_requests().complete(env.body.containable_id());
                flags.raise(CaravanFlag::FoodDeposited);
            }
        });
    }

    fn on_exit<'a>(&'a mut self, env: &'a CaravanEnv, _: (), _: &mut Actions<'a>) {
        env.world.context().food_requests().release(env.body.containable_id());
        self.mine = None;
    }
}

struct Hide;

impl State<CaravanEnv, CaravanFlag, Coordinate> for Hide {
    type Enter = ();
    type Tick = ();
    type Exit = ();
}

// ── Caravan ────────────────────────────────────────────────────────

type CaravanFsm = Fsm<CaravanState, CaravanFlag, CaravanEnv, Coordinate>;

fn build_fsm(pool: Arc<ActionPool<CaravanFlag, Coordinate>>) -> Result<CaravanFsm, FsmError> {
    use CaravanFlag as F;
    use CaravanState as S;

    FsmBuilder::<S, F, CaravanEnv, Coordinate>::new(S::FindCenter)
        .add_state(S::Hide, Hide, Providers::new())
        .add_state(S::FindCenter, FindCenter, Providers::new())
        .add_state(S::FindMine, FindMine, Providers::new())
        .add_state(S::Move, Move::default(), Providers::new().on_enter(at).on_tick(dt))
        .add_state(S::Collect, Collect::default(), Providers::new().on_enter(at))
        .add_state(S::Deposit, Deposit::default(), Providers::new().on_enter(at))
        .set_transition(S::Collect, F::FoodFilled, S::FindMine)
        .set_transition(S::Collect, F::FoodDepleted, S::FindCenter)
        .set_transition(S::Collect, F::AlarmRaised, S::FindCenter)
        .set_transition(S::FindMine, F::MineFound, S::Move)
        .set_transition(S::FindMine, F::AlarmRaised, S::FindCenter)
        .set_transition(S::Move, F::ReachedCenter, S::Collect)
        .set_transition(S::Move, F::ReachedMine, S::Deposit)
        .set_transition(S::Move, F::StayHidden, S::Hide)
        .set_transition(S::Move, F::AlarmCleared, S::FindCenter)
        .set_transition(S::Move, F::AlarmRaised, S::FindCenter)
        .set_transition(S::Move, F::TargetNotFound, S::FindMine)
        .set_transition(S::FindCenter, F::CenterFound, S::Move)
        .set_transition(S::FindCenter, F::AlarmRaised, S::FindCenter)
        .set_transition(S::FindCenter, F::AlarmCleared, S::FindMine)
        .set_transition(S::Hide, F::AlarmCleared, S::FindCenter)
        .set_transition(S::Deposit, F::FoodDeposited, S::FindCenter)
        .set_transition(S::Deposit, F::FoodDepleted, S::FindCenter)
        .set_transition(S::Deposit, F::AlarmRaised, S::FindCenter)
        .action_pool(pool)
        .build()
}

/// A caravan: its body plus the state machine driving it.
pub struct Caravan {
    body: Arc<CaravanBody>,
    fsm: CaravanFsm,
}

impl Caravan {
    pub(crate) fn new(
        slot: u32,
        at: Coordinate,
        graph: &Graph,
        config: &CaravanConfig,
        pool: Arc<ActionPool<CaravanFlag, Coordinate>>,
    ) -> Result<Self, FsmError> {
        Ok(Self {
            body: Arc::new(CaravanBody::new(slot, at, graph, config)),
            fsm: build_fsm(pool)?,
        })
    }

    /// This caravan's id.
    pub fn id(&self) -> ContainableId {
        self.body.containable_id()
    }

    /// Cell the caravan is on.
    pub fn coordinate(&self) -> Coordinate {
        self.body.node_coordinate()
    }

    /// Current FSM state.
    pub fn state(&self) -> CaravanState {
        self.fsm.current()
    }

    /// Food carried.
    pub fn food(&self) -> u32 {
        self.body.food().contained()
    }

    /// The shared body.
    pub fn body(&self) -> &Arc<CaravanBody> {
        &self.body
    }

    /// Transitions taken since spawn.
    pub fn transitions_taken(&self) -> u64 {
        self.fsm.transitions_taken()
    }

    fn env(&self, world: &Arc<World>, dt: f32) -> CaravanEnv {
        CaravanEnv {
            body: Arc::clone(&self.body),
            world: Arc::clone(world),
            dt,
        }
    }

    pub(crate) fn tick(&mut self, world: &Arc<World>, dt: f32) -> usize {
        let env = self.env(world, dt);
        self.fsm.tick(&env)
    }

    pub(crate) fn raise(&mut self, flag: CaravanFlag, world: &Arc<World>) -> usize {
        let env = self.env(world, 0.0);
        self.fsm.start(&env) + self.fsm.raise(flag, &env)
    }
}

impl std::fmt::Debug for Caravan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Caravan")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("food", &self.food())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospect_grid::{EdgeBehavior, Terrain};

    fn grid(edge: EdgeBehavior) -> Graph {
        Graph::uniform(10, 10, 1.0, edge, Terrain::Grass).unwrap()
    }

    #[test]
    fn axis_step_takes_short_way_round() {
        assert_eq!(axis_step(0, 9, 10, true), -1);
        assert_eq!(axis_step(9, 0, 10, true), 1);
        assert_eq!(axis_step(2, 5, 10, true), 3);
        assert_eq!(axis_step(0, 9, 10, false), 9);
    }

    #[test]
    fn waypoints_unwrap_across_the_seam() {
        let g = grid(EdgeBehavior::Wrap);
        let cells = [Coordinate::new(1, 0), Coordinate::new(0, 0), Coordinate::new(9, 0)];
        let w = waypoints(&g, &cells);
        assert_eq!(w, vec![Vec2::new(1.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(-1.0, 0.0)]);
        // The unwrapped position still lands on the wrapped cell.
        assert_eq!(g.coordinate_from_position(w[2].x, w[2].y), Coordinate::new(9, 0));
    }

    #[test]
    fn clamped_waypoints_are_plain_positions() {
        let g = grid(EdgeBehavior::Clamp);
        let cells = [Coordinate::new(0, 0), Coordinate::new(9, 9)];
        assert_eq!(waypoints(&g, &cells), vec![Vec2::ZERO, Vec2::new(9.0, 9.0)]);
    }
}
