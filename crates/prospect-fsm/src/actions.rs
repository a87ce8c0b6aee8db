//! Behaviour steps, their execution, and step buffer recycling.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use prospect_core::{Pool, PoolStats};

/// Where a step runs within its group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Alongside the group's other parallel steps, on the rayon pool.
    #[default]
    Parallel,
    /// On the calling thread, after the group's parallel steps.
    Main,
}

type StepFn<'a, F, M> = Box<dyn FnOnce(&FlagRaiser<'_, F, M>) + Send + 'a>;

pub(crate) struct Step<'a, F, M> {
    group: u32,
    lane: Lane,
    index: usize,
    run: StepFn<'a, F, M>,
}

/// A flag raised by a step, tagged with the step's registration index.
pub(crate) struct Raised<F, M> {
    pub step: usize,
    pub flag: F,
    pub message: Option<M>,
}

/// Handle through which a running step raises flags.
pub struct FlagRaiser<'s, F, M = ()> {
    step: usize,
    sink: &'s Mutex<Vec<Raised<F, M>>>,
}

impl<F, M> FlagRaiser<'_, F, M> {
    /// Raise `flag` without a handoff message.
    pub fn raise(&self, flag: F) {
        self.push(flag, None);
    }

    /// Raise `flag` and hand `message` to the next state's enter hook.
    pub fn raise_with(&self, flag: F, message: M) {
        self.push(flag, Some(message));
    }

    fn push(&self, flag: F, message: Option<M>) {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Raised {
                step: self.step,
                flag,
                message,
            });
    }
}

/// The steps one hook wants run.
///
/// Steps may borrow the state and the environment for `'a`; they are
/// consumed before the hook's borrows end.
pub struct BehaviourActions<'a, F, M = ()> {
    steps: Vec<Step<'a, F, M>>,
}

impl<'a, F, M> BehaviourActions<'a, F, M> {
    /// An empty step set.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub(crate) fn with_buffer(mut steps: Vec<Step<'a, F, M>>) -> Self {
        steps.clear();
        Self { steps }
    }

    /// Add a step that may run concurrently with others in `group`.
    pub fn add_parallel<S>(&mut self, group: u32, step: S) -> &mut Self
    where
        S: FnOnce(&FlagRaiser<'_, F, M>) + Send + 'a,
    {
        self.push(group, Lane::Parallel, Box::new(step))
    }

    /// Add a step that runs on the calling thread after `group`'s
    /// parallel steps.
    pub fn add_main<S>(&mut self, group: u32, step: S) -> &mut Self
    where
        S: FnOnce(&FlagRaiser<'_, F, M>) + Send + 'a,
    {
        self.push(group, Lane::Main, Box::new(step))
    }

    fn push(&mut self, group: u32, lane: Lane, run: StepFn<'a, F, M>) -> &mut Self {
        let index = self.steps.len();
        self.steps.push(Step {
            group,
            lane,
            index,
            run,
        });
        self
    }

    /// Number of queued steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// `true` if no step is queued.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step, group by group. Returns the raised flags in step
    /// registration order, plus the emptied buffer.
    pub(crate) fn execute(self) -> (Vec<Raised<F, M>>, Vec<Step<'a, F, M>>)
    where
        F: Send,
        M: Send,
    {
        let mut steps = self.steps;
        let sink = Mutex::new(Vec::new());
        steps.sort_by_key(|s| s.group);

        let mut parallel = Vec::new();
        let mut main = Vec::new();
        let mut drain = steps.drain(..).peekable();
        while let Some(first) = drain.next() {
            let group = first.group;
            let mut split = |s: Step<'a, F, M>| match s.lane {
                Lane::Parallel => parallel.push(s),
                Lane::Main => main.push(s),
            };
            split(first);
            while let Some(s) = drain.next_if(|s| s.group == group) {
                split(s);
            }

            if parallel.len() == 1 {
                run_step(parallel.remove(0), &sink);
            } else if !parallel.is_empty() {
                let sink = &sink;
                rayon::scope(|scope| {
                    for s in parallel.drain(..) {
                        scope.spawn(move |_| run_step(s, sink));
                    }
                });
            }
            for s in main.drain(..) {
                run_step(s, &sink);
            }
        }
        drop(drain);

        let mut raised = sink.into_inner().unwrap_or_else(PoisonError::into_inner);
        // Stable: flags from one step keep their raise order.
        raised.sort_by_key(|r| r.step);
        (raised, steps)
    }
}

fn run_step<F, M>(step: Step<'_, F, M>, sink: &Mutex<Vec<Raised<F, M>>>) {
    let raiser = FlagRaiser {
        step: step.index,
        sink,
    };
    (step.run)(&raiser);
}

impl<F, M> Default for BehaviourActions<'_, F, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, M> fmt::Debug for BehaviourActions<'_, F, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups: Vec<(u32, Lane)> = self.steps.iter().map(|s| (s.group, s.lane)).collect();
        f.debug_struct("BehaviourActions")
            .field("steps", &groups)
            .finish()
    }
}

/// Recycles step buffers between ticks.
///
/// One pool can be shared by many machines with the same flag and
/// message types.
pub struct ActionPool<F, M = ()> {
    buffers: Pool<Vec<Step<'static, F, M>>>,
}

impl<F, M> ActionPool<F, M> {
    /// A pool with the default retention.
    pub fn new() -> Self {
        Self {
            buffers: Pool::new(),
        }
    }

    pub(crate) fn get<'a>(&self) -> Vec<Step<'a, F, M>> {
        self.buffers.get()
    }

    pub(crate) fn put(&self, buffer: Vec<Step<'_, F, M>>) {
        // The buffer is empty; collecting in place keeps its allocation
        // while dropping the borrowed lifetime.
        let buffer: Vec<Step<'static, F, M>> = buffer.into_iter().filter_map(|_| None).collect();
        self.buffers.release(buffer);
    }

    /// Buffer reuse counters.
    pub fn stats(&self) -> PoolStats {
        self.buffers.stats()
    }
}

impl<F, M> Default for ActionPool<F, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, M> fmt::Debug for ActionPool<F, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionPool")
            .field("stats", &self.buffers.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    fn flags<F: Copy, M>(raised: &[Raised<F, M>]) -> Vec<F> {
        raised.iter().map(|r| r.flag).collect()
    }

    // ── Ordering tests ──────────────────────────────────────────

    #[test]
    fn groups_run_in_ascending_order() {
        let log = Mutex::new(Vec::new());
        let mut actions: BehaviourActions<'_, u8> = BehaviourActions::new();
        actions.add_parallel(2, |_| log.lock().unwrap().push(2));
        actions.add_parallel(0, |_| log.lock().unwrap().push(0));
        actions.add_main(1, |_| log.lock().unwrap().push(1));
        let _ = actions.execute();
        assert_eq!(log.into_inner().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn main_lane_runs_after_parallel_in_same_group() {
        let log = Mutex::new(Vec::new());
        let mut actions: BehaviourActions<'_, u8> = BehaviourActions::new();
        actions.add_main(0, |_| log.lock().unwrap().push("main-a"));
        actions.add_parallel(0, |_| log.lock().unwrap().push("par"));
        actions.add_main(0, |_| log.lock().unwrap().push("main-b"));
        let _ = actions.execute();
        assert_eq!(log.into_inner().unwrap(), vec!["par", "main-a", "main-b"]);
    }

    #[test]
    fn parallel_steps_overlap() {
        // Two steps that each wait for the other can only finish if they
        // run at the same time.
        let barrier = Barrier::new(2);
        let done = AtomicUsize::new(0);
        let mut actions: BehaviourActions<'_, u8> = BehaviourActions::new();
        for _ in 0..2 {
            actions.add_parallel(0, |_| {
                barrier.wait();
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .unwrap()
            .install(|| {
                let _ = actions.execute();
            });
        assert_eq!(done.load(Ordering::SeqCst), 2);
    }

    // ── Flag tests ──────────────────────────────────────────────

    #[test]
    fn flags_come_back_in_registration_order() {
        let mut actions: BehaviourActions<'_, char, u32> = BehaviourActions::new();
        actions.add_parallel(1, |f| f.raise('a'));
        actions.add_parallel(0, |f| {
            f.raise('b');
            f.raise_with('c', 7);
        });
        actions.add_main(0, |f| f.raise('d'));
        let (raised, buffer) = actions.execute();
        assert_eq!(flags(&raised), vec!['a', 'b', 'c', 'd']);
        assert_eq!(raised[2].message, Some(7));
        assert!(buffer.is_empty());
    }

    #[test]
    fn empty_set_raises_nothing() {
        let actions: BehaviourActions<'_, u8> = BehaviourActions::default();
        assert!(actions.is_empty());
        let (raised, _) = actions.execute();
        assert!(raised.is_empty());
    }

    // ── Pool tests ──────────────────────────────────────────────

    #[test]
    fn pool_recycles_buffers() {
        let pool: ActionPool<u8> = ActionPool::new();
        for _ in 0..3 {
            let mut actions = BehaviourActions::with_buffer(pool.get());
            actions.add_parallel(0, |f| f.raise(1));
            let (_, buffer) = actions.execute();
            pool.put(buffer);
        }
        let stats = pool.stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.reused, 2);
    }
}
