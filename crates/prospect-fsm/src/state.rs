//! State handlers and their typed parameter providers.

use crate::actions::BehaviourActions;

/// One state of an [`Fsm`](crate::Fsm).
///
/// Each hook receives a parameter computed by the matching provider and
/// fills `actions` with the steps to run. Steps may borrow `self` and
/// `env` for the duration of the hook's step set.
///
/// The associated types are the state's parameter contract. For a type
/// other than `()` the state must be registered with a provider for it;
/// see [`Providers`].
pub trait State<E: ?Sized, F, M = ()>: Send {
    /// Parameter for [`on_enter`](Self::on_enter).
    type Enter;
    /// Parameter for [`on_tick`](Self::on_tick).
    type Tick;
    /// Parameter for [`on_exit`](Self::on_exit).
    type Exit;

    /// Called when the machine moves into this state. `handoff` is the
    /// message raised alongside the transition's flag, if any.
    fn on_enter<'a>(
        &'a mut self,
        env: &'a E,
        params: Self::Enter,
        handoff: Option<M>,
        actions: &mut BehaviourActions<'a, F, M>,
    ) {
        let _ = (env, params, handoff, actions);
    }

    /// Called once per [`Fsm::tick`](crate::Fsm::tick) while current.
    fn on_tick<'a>(
        &'a mut self,
        env: &'a E,
        params: Self::Tick,
        actions: &mut BehaviourActions<'a, F, M>,
    ) {
        let _ = (env, params, actions);
    }

    /// Called when the machine leaves this state. Flags raised here are
    /// discarded.
    fn on_exit<'a>(
        &'a mut self,
        env: &'a E,
        params: Self::Exit,
        actions: &mut BehaviourActions<'a, F, M>,
    ) {
        let _ = (env, params, actions);
    }
}

/// Computes a hook parameter from the environment.
pub trait Provide<E: ?Sized, P>: Send {
    /// Produce the parameter. Called on every hook invocation.
    fn provide(&self, env: &E) -> P;
}

/// Placeholder provider; only satisfies `()` parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProvider;

impl<E: ?Sized> Provide<E, ()> for NoProvider {
    fn provide(&self, _env: &E) {}
}

/// A provider backed by a closure.
#[derive(Clone, Copy, Debug)]
pub struct Provided<G>(pub G);

impl<E: ?Sized, P, G> Provide<E, P> for Provided<G>
where
    G: Fn(&E) -> P + Send,
{
    fn provide(&self, env: &E) -> P {
        (self.0)(env)
    }
}

/// Enter, tick and exit providers for one state.
///
/// ```
/// use prospect_fsm::Providers;
///
/// struct Body {
///     speed: f32,
/// }
///
/// let providers = Providers::new().on_tick(|body: &Body| body.speed * 2.0);
/// # let _ = providers;
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Providers<PE = NoProvider, PT = NoProvider, PX = NoProvider> {
    pub(crate) enter: PE,
    pub(crate) tick: PT,
    pub(crate) exit: PX,
}

impl Providers {
    /// No providers; for states whose parameters are all `()`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<PE, PT, PX> Providers<PE, PT, PX> {
    /// Supply the enter parameter.
    pub fn on_enter<G>(self, provider: G) -> Providers<Provided<G>, PT, PX> {
        Providers {
            enter: Provided(provider),
            tick: self.tick,
            exit: self.exit,
        }
    }

    /// Supply the tick parameter.
    pub fn on_tick<G>(self, provider: G) -> Providers<PE, Provided<G>, PX> {
        Providers {
            enter: self.enter,
            tick: Provided(provider),
            exit: self.exit,
        }
    }

    /// Supply the exit parameter.
    pub fn on_exit<G>(self, provider: G) -> Providers<PE, PT, Provided<G>> {
        Providers {
            enter: self.enter,
            tick: self.tick,
            exit: Provided(provider),
        }
    }
}
