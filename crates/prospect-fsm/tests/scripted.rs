//! Scripted machines driven through the public API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use prospect_fsm::{BehaviourActions, FsmBuilder, FsmError, Providers, State, MAX_CASCADE};
use prospect_test_utils::{scripted_fsm, Journal, RecordingState, ScriptFlag, ScriptState};

// ── Transition tests ────────────────────────────────────────────

#[test]
fn advance_exits_once_and_enters_once() {
    let journal = Journal::new();
    let start = RecordingState::new("start", &journal).then_tick(vec![ScriptFlag::Advance]);
    let mut fsm = scripted_fsm(&journal, start);

    fsm.tick(&());
    assert_eq!(fsm.current(), ScriptState::Middle);
    assert_eq!(journal.count("exit start"), 1);
    assert_eq!(journal.count("enter middle"), 1);
    assert_eq!(
        journal.lines(),
        vec!["enter start", "tick start", "exit start", "enter middle"]
    );
}

#[test]
fn unconfigured_flag_is_a_no_op() {
    let journal = Journal::new();
    let start = RecordingState::new("start", &journal).then_tick(vec![ScriptFlag::Reset]);
    let mut fsm = scripted_fsm(&journal, start);
    fsm.start(&());
    journal.take();

    assert_eq!(fsm.tick(&()), 0);
    assert_eq!(fsm.current(), ScriptState::Start);
    assert_eq!(journal.lines(), vec!["tick start"]);
}

#[test]
fn external_flags_walk_the_table() {
    let journal = Journal::new();
    let mut fsm = scripted_fsm(&journal, RecordingState::new("start", &journal));
    fsm.start(&());
    fsm.raise(ScriptFlag::Advance, &());
    fsm.raise_with(ScriptFlag::Advance, 42, &());
    assert_eq!(fsm.current(), ScriptState::End);
    assert_eq!(journal.lines().last().map(String::as_str), Some("enter end 42"));

    fsm.raise(ScriptFlag::Noise, &());
    assert_eq!(fsm.current(), ScriptState::End);
    fsm.raise(ScriptFlag::Reset, &());
    assert_eq!(fsm.current(), ScriptState::Start);
    assert_eq!(fsm.transitions_taken(), 3);
}

#[test]
fn enter_flags_cascade() {
    let journal = Journal::new();
    let start = RecordingState::new("start", &journal).on_enter_raise(vec![ScriptFlag::Advance]);
    let mut fsm = scripted_fsm(&journal, start);
    // Start enters, raises Advance, lands in Middle, which raises nothing.
    assert_eq!(fsm.start(&()), 1);
    assert_eq!(fsm.current(), ScriptState::Middle);
}

#[test]
fn self_loop_cascade_is_capped() {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    struct Only;

    let journal = Journal::new();
    let looping = RecordingState::new("loop", &journal).on_enter_raise(vec![ScriptFlag::Advance]);
    let mut fsm = FsmBuilder::<Only, ScriptFlag, (), ()>::new(Only)
        .add_state(Only, looping, Providers::new())
        .set_transition(Only, ScriptFlag::Advance, Only)
        .build()
        .unwrap();
    assert_eq!(fsm.start(&()), MAX_CASCADE);
    assert_eq!(journal.count("enter loop"), MAX_CASCADE + 1);
}

// ── Group tests ─────────────────────────────────────────────────

struct Body {
    counter: AtomicU32,
    order: Mutex<Vec<&'static str>>,
}

struct Grouped;

impl State<Body, ScriptFlag> for Grouped {
    type Enter = ();
    type Tick = u32;
    type Exit = ();

    fn on_tick<'a>(
        &'a mut self,
        body: &'a Body,
        step: u32,
        actions: &mut BehaviourActions<'a, ScriptFlag>,
    ) {
        actions
            .add_main(1, move |_| {
                let seen = body.counter.load(Ordering::SeqCst);
                body.order.lock().unwrap().push(if seen == 4 * step { "sum" } else { "early" });
            })
            .add_parallel(2, |flags| flags.raise(ScriptFlag::Advance));
        for _ in 0..4 {
            actions.add_parallel(0, move |_| {
                body.counter.fetch_add(step, Ordering::SeqCst);
            });
        }
    }
}

#[test]
fn later_groups_see_earlier_groups_finished() {
    let body = Body {
        counter: AtomicU32::new(0),
        order: Mutex::new(Vec::new()),
    };
    let mut fsm = FsmBuilder::new(ScriptState::Start)
        .add_state(ScriptState::Start, Grouped, Providers::new().on_tick(|_: &Body| 3u32))
        .add_state(ScriptState::Middle, Grouped, Providers::new().on_tick(|_: &Body| 0u32))
        .set_transition(ScriptState::Start, ScriptFlag::Advance, ScriptState::Middle)
        .build()
        .unwrap();

    assert_eq!(fsm.tick(&body), 1);
    assert_eq!(body.counter.load(Ordering::SeqCst), 12);
    assert_eq!(*body.order.lock().unwrap(), vec!["sum"]);
    assert_eq!(fsm.current(), ScriptState::Middle);
}

// ── Build tests ─────────────────────────────────────────────────

#[test]
fn builder_reports_missing_target() {
    let journal = Journal::new();
    let err = FsmBuilder::<ScriptState, ScriptFlag, (), ()>::new(ScriptState::Start)
        .add_state(ScriptState::Start, RecordingState::new("start", &journal), Providers::new())
        .set_transition(ScriptState::Start, ScriptFlag::Advance, ScriptState::End)
        .build()
        .unwrap_err();
    assert!(matches!(err, FsmError::UnknownTransitionState { .. }));
    assert!(err.to_string().contains("End"));
}
