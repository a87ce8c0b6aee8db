//! The state machine and its builder.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::actions::{ActionPool, BehaviourActions, Raised};
use crate::error::FsmError;
use crate::state::{Provide, Providers, State};

/// Maximum transitions applied by one call to [`Fsm::tick`],
/// [`Fsm::start`] or [`Fsm::raise`]. Further flags are dropped with a
/// warning.
pub const MAX_CASCADE: usize = 64;

/// Object-safe view of a registered state with its providers bound.
trait Slot<E: ?Sized, F, M>: Send {
    fn enter<'a>(&'a mut self, env: &'a E, handoff: Option<M>, actions: &mut BehaviourActions<'a, F, M>);
    fn tick<'a>(&'a mut self, env: &'a E, actions: &mut BehaviourActions<'a, F, M>);
    fn exit<'a>(&'a mut self, env: &'a E, actions: &mut BehaviourActions<'a, F, M>);
}

struct Registered<T, PE, PT, PX> {
    state: T,
    providers: Providers<PE, PT, PX>,
}

impl<E, F, M, T, PE, PT, PX> Slot<E, F, M> for Registered<T, PE, PT, PX>
where
    E: ?Sized,
    T: State<E, F, M>,
    PE: Provide<E, T::Enter>,
    PT: Provide<E, T::Tick>,
    PX: Provide<E, T::Exit>,
{
    fn enter<'a>(&'a mut self, env: &'a E, handoff: Option<M>, actions: &mut BehaviourActions<'a, F, M>) {
        let params = self.providers.enter.provide(env);
        self.state.on_enter(env, params, handoff, actions);
    }

    fn tick<'a>(&'a mut self, env: &'a E, actions: &mut BehaviourActions<'a, F, M>) {
        let params = self.providers.tick.provide(env);
        self.state.on_tick(env, params, actions);
    }

    fn exit<'a>(&'a mut self, env: &'a E, actions: &mut BehaviourActions<'a, F, M>) {
        let params = self.providers.exit.provide(env);
        self.state.on_exit(env, params, actions);
    }
}

enum Phase<M> {
    Enter(Option<M>),
    Tick,
    Exit,
}

fn run_phase<'a, E, F, M>(
    pool: &ActionPool<F, M>,
    slot: &'a mut (dyn Slot<E, F, M> + 'static),
    env: &'a E,
    phase: Phase<M>,
) -> Vec<Raised<F, M>>
where
    E: ?Sized,
    F: Send,
    M: Send,
{
    let mut actions = BehaviourActions::with_buffer(pool.get());
    match phase {
        Phase::Enter(handoff) => slot.enter(env, handoff, &mut actions),
        Phase::Tick => slot.tick(env, &mut actions),
        Phase::Exit => slot.exit(env, &mut actions),
    }
    let (raised, buffer) = actions.execute();
    pool.put(buffer);
    raised
}

/// Collects states and transitions, then validates them into an [`Fsm`].
///
/// ```
/// use prospect_fsm::{BehaviourActions, FsmBuilder, Providers, State};
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// enum Light { Red, Green }
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// enum Flag { Timer }
///
/// struct Wait;
/// impl State<(), Flag> for Wait {
///     type Enter = ();
///     type Tick = ();
///     type Exit = ();
///     fn on_tick<'a>(&'a mut self, _: &'a (), _: (), actions: &mut BehaviourActions<'a, Flag>) {
///         actions.add_main(0, |flags| flags.raise(Flag::Timer));
///     }
/// }
///
/// let mut fsm = FsmBuilder::new(Light::Red)
///     .add_state(Light::Red, Wait, Providers::new())
///     .add_state(Light::Green, Wait, Providers::new())
///     .set_transition(Light::Red, Flag::Timer, Light::Green)
///     .set_transition(Light::Green, Flag::Timer, Light::Red)
///     .build()
///     .unwrap();
///
/// fsm.start(&());
/// fsm.tick(&());
/// assert_eq!(fsm.current(), Light::Green);
/// ```
pub struct FsmBuilder<S, F, E: ?Sized, M = ()> {
    initial: S,
    states: IndexMap<S, Box<dyn Slot<E, F, M>>>,
    duplicate: Option<S>,
    transitions: IndexMap<(S, F), S>,
    pool: Option<Arc<ActionPool<F, M>>>,
}

impl<S, F, E, M> FsmBuilder<S, F, E, M>
where
    S: Copy + Eq + Hash + fmt::Debug + Send,
    F: Copy + Eq + Hash + fmt::Debug + Send,
    E: ?Sized,
    M: Send,
{
    /// A builder whose machine starts in `initial`.
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            states: IndexMap::new(),
            duplicate: None,
            transitions: IndexMap::new(),
            pool: None,
        }
    }

    /// Register the handler for `key`.
    ///
    /// Registering the same key twice makes [`build`](Self::build) fail.
    pub fn add_state<T, PE, PT, PX>(mut self, key: S, state: T, providers: Providers<PE, PT, PX>) -> Self
    where
        T: State<E, F, M> + 'static,
        PE: Provide<E, T::Enter> + 'static,
        PT: Provide<E, T::Tick> + 'static,
        PX: Provide<E, T::Exit> + 'static,
        E: 'static,
        F: 'static,
        M: 'static,
    {
        let slot = Box::new(Registered { state, providers });
        if self.states.insert(key, slot).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(key);
        }
        self
    }

    /// Move from `from` to `to` when `flag` is raised in `from`.
    /// A later call for the same `(from, flag)` replaces the target.
    pub fn set_transition(mut self, from: S, flag: F, to: S) -> Self {
        self.transitions.insert((from, flag), to);
        self
    }

    /// Share a step buffer pool with other machines.
    pub fn action_pool(mut self, pool: Arc<ActionPool<F, M>>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Validate and build the machine.
    pub fn build(self) -> Result<Fsm<S, F, E, M>, FsmError> {
        if let Some(state) = self.duplicate {
            return Err(FsmError::DuplicateState {
                state: format!("{state:?}"),
            });
        }
        if !self.states.contains_key(&self.initial) {
            return Err(FsmError::UnknownInitialState {
                state: format!("{:?}", self.initial),
            });
        }
        for (&(from, flag), &to) in &self.transitions {
            let missing = [from, to].into_iter().find(|s| !self.states.contains_key(s));
            if let Some(missing) = missing {
                return Err(FsmError::UnknownTransitionState {
                    from: format!("{from:?}"),
                    flag: format!("{flag:?}"),
                    missing: format!("{missing:?}"),
                });
            }
        }
        Ok(Fsm {
            current: self.initial,
            initial: self.initial,
            started: false,
            states: self.states,
            transitions: self.transitions,
            pool: self.pool.unwrap_or_default(),
            transitions_taken: 0,
        })
    }
}

impl<S: fmt::Debug, F: fmt::Debug, E: ?Sized, M> fmt::Debug for FsmBuilder<S, F, E, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsmBuilder")
            .field("initial", &self.initial)
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .field("transitions", &self.transitions)
            .finish()
    }
}

/// A flag-driven state machine over environment `E`.
///
/// See the [crate docs](crate) for how steps and flags are scheduled.
pub struct Fsm<S, F, E: ?Sized, M = ()> {
    current: S,
    initial: S,
    started: bool,
    states: IndexMap<S, Box<dyn Slot<E, F, M>>>,
    transitions: IndexMap<(S, F), S>,
    pool: Arc<ActionPool<F, M>>,
    transitions_taken: u64,
}

impl<S, F, E, M> Fsm<S, F, E, M>
where
    S: Copy + Eq + Hash + fmt::Debug + Send,
    F: Copy + Eq + Hash + fmt::Debug + Send,
    E: ?Sized,
    M: Send,
{
    /// Run the current state's enter hook. A no-op once started.
    ///
    /// Returns the number of transitions the enter flags triggered.
    pub fn start(&mut self, env: &E) -> usize {
        if self.started {
            return 0;
        }
        self.started = true;
        let raised = self.run(self.current, env, Phase::Enter(None));
        self.apply(raised, env)
    }

    /// Run the current state's tick hook and apply the flags it raised.
    /// Starts the machine first if needed.
    ///
    /// Returns the number of transitions taken.
    pub fn tick(&mut self, env: &E) -> usize {
        let started = self.start(env);
        let raised = self.run(self.current, env, Phase::Tick);
        started + self.apply(raised, env)
    }

    /// Apply an externally raised flag.
    pub fn raise(&mut self, flag: F, env: &E) -> usize {
        self.inject(flag, None, env)
    }

    /// Apply an externally raised flag carrying a handoff message.
    pub fn raise_with(&mut self, flag: F, message: M, env: &E) -> usize {
        self.inject(flag, Some(message), env)
    }

    fn inject(&mut self, flag: F, message: Option<M>, env: &E) -> usize {
        let raised = vec![Raised {
            step: 0,
            flag,
            message,
        }];
        self.apply(raised, env)
    }

    fn run(&mut self, key: S, env: &E, phase: Phase<M>) -> Vec<Raised<F, M>> {
        let pool = &self.pool;
        match self.states.get_mut(&key) {
            Some(slot) => run_phase(pool, slot.as_mut(), env, phase),
            // Keys are validated in `build`.
            None => Vec::new(),
        }
    }

    /// Apply `raised` against the current state. The first flag with a
    /// transition fires. The new state's enter flags come next, followed
    /// by the flags raised after the one that fired, all checked against
    /// whatever state the machine is in by then.
    fn apply(&mut self, mut raised: Vec<Raised<F, M>>, env: &E) -> usize {
        let mut taken = 0;
        loop {
            let hit = raised
                .iter()
                .position(|r| self.transitions.contains_key(&(self.current, r.flag)));
            let Some(pos) = hit else {
                for r in &raised {
                    trace!(state = ?self.current, flag = ?r.flag, "flag ignored");
                }
                return taken;
            };
            if taken == MAX_CASCADE {
                warn!(
                    state = ?self.current,
                    flag = ?raised[pos].flag,
                    limit = MAX_CASCADE,
                    "transition cascade capped"
                );
                return taken;
            }

            let pending = raised.split_off(pos + 1);
            let Some(fired) = raised.pop() else {
                return taken;
            };
            for r in &raised {
                trace!(state = ?self.current, flag = ?r.flag, "flag ignored");
            }
            let from = self.current;
            let to = match self.transitions.get(&(from, fired.flag)) {
                Some(&to) => to,
                None => return taken,
            };

            // Exit flags are not applied.
            let _ = self.run(from, env, Phase::Exit);
            self.current = to;
            taken += 1;
            self.transitions_taken += 1;
            trace!(from = ?from, flag = ?fired.flag, to = ?to, "transition");
            raised = self.run(to, env, Phase::Enter(fired.message));
            raised.extend(pending);
        }
    }

    /// The current state.
    pub fn current(&self) -> S {
        self.current
    }

    /// `true` once [`start`](Self::start) (or the first tick) has run.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Transitions taken since the machine was built.
    pub fn transitions_taken(&self) -> u64 {
        self.transitions_taken
    }

    /// Whether `flag` raised in `from` moves the machine.
    pub fn has_transition(&self, from: S, flag: F) -> bool {
        self.transitions.contains_key(&(from, flag))
    }

    /// The step buffer pool this machine draws from.
    pub fn action_pool(&self) -> &Arc<ActionPool<F, M>> {
        &self.pool
    }
}

impl<S: fmt::Debug, F: fmt::Debug, E: ?Sized, M> fmt::Debug for Fsm<S, F, E, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fsm")
            .field("current", &self.current)
            .field("started", &self.started)
            .field("states", &self.states.len())
            .field("transitions", &self.transitions.len())
            .field("transitions_taken", &self.transitions_taken)
            .finish()
    }
}
