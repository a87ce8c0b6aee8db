//! FSM fixtures: a state that journals its hooks and a small scripted
//! machine built from it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use prospect_fsm::{BehaviourActions, Fsm, FsmBuilder, Providers, State};

/// Shared log of hook calls, one line per event.
#[derive(Clone, Debug, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: impl Into<String>) {
        self.0.lock().unwrap().push(line.into());
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Lines recorded so far, leaving the journal empty.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn count(&self, line: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|l| *l == line).count()
    }
}

/// Journals `enter NAME`, `tick NAME` and `exit NAME`, and raises
/// scripted flags.
///
/// Each tick pops one entry from `tick_script` and raises its flags from
/// one parallel step per flag. `enter_flags` are raised on every enter.
pub struct RecordingState<F> {
    pub name: &'static str,
    pub journal: Journal,
    pub enter_flags: Vec<F>,
    pub tick_script: VecDeque<Vec<F>>,
}

impl<F> RecordingState<F> {
    pub fn new(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            journal: journal.clone(),
            enter_flags: Vec::new(),
            tick_script: VecDeque::new(),
        }
    }

    pub fn on_enter_raise(mut self, flags: Vec<F>) -> Self {
        self.enter_flags = flags;
        self
    }

    pub fn then_tick(mut self, flags: Vec<F>) -> Self {
        self.tick_script.push_back(flags);
        self
    }
}

impl<E, F, M> State<E, F, M> for RecordingState<F>
where
    E: ?Sized,
    F: Copy + Send + Sync,
    M: fmt::Debug,
{
    type Enter = ();
    type Tick = ();
    type Exit = ();

    fn on_enter<'a>(
        &'a mut self,
        _env: &'a E,
        _: (),
        handoff: Option<M>,
        actions: &mut BehaviourActions<'a, F, M>,
    ) {
        match handoff {
            Some(m) => self.journal.push(format!("enter {} {m:?}", self.name)),
            None => self.journal.push(format!("enter {}", self.name)),
        }
        let flags = &self.enter_flags;
        actions.add_main(0, move |raiser| flags.iter().for_each(|f| raiser.raise(*f)));
    }

    fn on_tick<'a>(&'a mut self, _env: &'a E, _: (), actions: &mut BehaviourActions<'a, F, M>) {
        self.journal.push(format!("tick {}", self.name));
        for flag in self.tick_script.pop_front().unwrap_or_default() {
            actions.add_parallel(0, move |raiser| raiser.raise(flag));
        }
    }

    fn on_exit<'a>(&'a mut self, _env: &'a E, _: (), _actions: &mut BehaviourActions<'a, F, M>) {
        self.journal.push(format!("exit {}", self.name));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptState {
    Start,
    Middle,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptFlag {
    Advance,
    Reset,
    Noise,
}

/// Start -Advance-> Middle -Advance-> End, and Reset from Middle or End
/// back to Start. `start` drives the Start state; the others are silent
/// recorders named `middle` and `end`.
pub fn scripted_fsm(
    journal: &Journal,
    start: RecordingState<ScriptFlag>,
) -> Fsm<ScriptState, ScriptFlag, (), u32> {
    use ScriptFlag::*;
    use ScriptState::*;

    FsmBuilder::new(Start)
        .add_state(Start, start, Providers::new())
        .add_state(Middle, RecordingState::new("middle", journal), Providers::new())
        .add_state(End, RecordingState::new("end", journal), Providers::new())
        .set_transition(Start, Advance, Middle)
        .set_transition(Middle, Advance, End)
        .set_transition(Middle, Reset, Start)
        .set_transition(End, Reset, Start)
        .build()
        .expect("scripted machine is well formed")
}
