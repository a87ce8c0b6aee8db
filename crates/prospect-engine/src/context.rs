//! Shared simulation state: registries, the alarm, food requests, events.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crossbeam_channel::{Sender, TrySendError};
use indexmap::IndexMap;
use prospect_core::{ContainableId, ContainableKind, EventBus};
use prospect_grid::Coordinate;
use prospect_voronoi::PartitionRegistry;
use tracing::{debug, warn};

use crate::command::Command;
use crate::lock;
use crate::registry::ContainableRegistry;

/// Town-wide alarm. Agents hide while it is raised.
#[derive(Debug, Default)]
pub struct AlarmFlag(AtomicBool);

impl AlarmFlag {
    /// Whether the alarm is up.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Set the alarm. Returns the previous value.
    pub fn set(&self, raised: bool) -> bool {
        self.0.swap(raised, Ordering::AcqRel)
    }
}

#[derive(Debug, Default)]
struct FoodQueue {
    pending: VecDeque<Coordinate>,
    claimed: IndexMap<ContainableId, Coordinate>,
}

impl FoodQueue {
    fn contains(&self, at: Coordinate) -> bool {
        self.pending.contains(&at) || self.claimed.values().any(|c| *c == at)
    }
}

/// Mines waiting for a food delivery, oldest first.
///
/// A request is pending until a caravan claims it with
/// [`next_for`](Self::next_for), then claimed until the caravan
/// [`complete`](Self::complete)s or [`release`](Self::release)s it.
#[derive(Debug, Default)]
pub struct FoodRequests {
    inner: Mutex<FoodQueue>,
}

impl FoodRequests {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// File a request for `at`. Returns `false` if `at` is already
    /// pending or claimed.
    pub fn request(&self, at: Coordinate) -> bool {
        let mut q = lock(&self.inner);
        if q.contains(at) {
            return false;
        }
        q.pending.push_back(at);
        debug!(x = at.x, y = at.y, "food requested");
        true
    }

    /// Claim the oldest pending request for `caravan`. A caravan that
    /// already holds a claim gets the same one back.
    pub fn next_for(&self, caravan: ContainableId) -> Option<Coordinate> {
        let mut q = lock(&self.inner);
        if let Some(&at) = q.claimed.get(&caravan) {
            return Some(at);
        }
        let at = q.pending.pop_front()?;
        q.claimed.insert(caravan, at);
        Some(at)
    }

    /// The delivery for `caravan` is done; forget its claim.
    pub fn complete(&self, caravan: ContainableId) -> Option<Coordinate> {
        lock(&self.inner).claimed.shift_remove(&caravan)
    }

    /// Give up `caravan`'s claim and put it back at the head of the queue.
    pub fn release(&self, caravan: ContainableId) -> bool {
        let mut q = lock(&self.inner);
        match q.claimed.shift_remove(&caravan) {
            Some(at) => {
                q.pending.push_front(at);
                true
            }
            None => false,
        }
    }

    /// Drop every pending or claimed request for `at`.
    pub fn cancel(&self, at: Coordinate) {
        let mut q = lock(&self.inner);
        q.pending.retain(|c| *c != at);
        q.claimed.retain(|_, c| *c != at);
    }

    /// Whether `at` is pending or claimed.
    pub fn contains(&self, at: Coordinate) -> bool {
        lock(&self.inner).contains(at)
    }

    /// Number of unclaimed requests.
    pub fn pending(&self) -> usize {
        lock(&self.inner).pending.len()
    }

    /// Number of claimed requests.
    pub fn claimed(&self) -> usize {
        lock(&self.inner).claimed.len()
    }

    /// Forget everything.
    pub fn clear(&self) {
        let mut q = lock(&self.inner);
        q.pending.clear();
        q.claimed.clear();
    }
}

/// Everything agents share, owned by one [`Simulation`](crate::Simulation).
pub struct SimulationContext {
    registry: ContainableRegistry,
    partitions: PartitionRegistry<ContainableKind>,
    alarm: AlarmFlag,
    food_requests: FoodRequests,
    events: EventBus,
    commands: Sender<Command>,
}

impl SimulationContext {
    pub(crate) fn new(commands: Sender<Command>) -> Self {
        Self {
            registry: ContainableRegistry::new(),
            partitions: PartitionRegistry::new(),
            alarm: AlarmFlag::default(),
            food_requests: FoodRequests::new(),
            events: EventBus::new(),
            commands,
        }
    }

    /// Live containables by kind and slot.
    pub fn registry(&self) -> &ContainableRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ContainableRegistry {
        &mut self.registry
    }

    /// Published spatial partitions, keyed by site kind.
    pub fn partitions(&self) -> &PartitionRegistry<ContainableKind> {
        &self.partitions
    }

    /// The town alarm.
    pub fn alarm(&self) -> &AlarmFlag {
        &self.alarm
    }

    /// Pending food deliveries.
    pub fn food_requests(&self) -> &FoodRequests {
        &self.food_requests
    }

    /// The simulation's event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// A sender that queues commands for the next step. It is unbounded
    /// and drained ahead of [`Simulation::submit`](crate::Simulation::submit)
    /// commands.
    pub fn command_sender(&self) -> Sender<Command> {
        self.commands.clone()
    }

    /// Queue `command` without blocking. Returns `false`, with a warning,
    /// if the simulation is gone.
    pub fn defer(&self, command: Command) -> bool {
        defer_on(&self.commands, command)
    }

    pub(crate) fn clear(&mut self) {
        self.registry.clear();
        self.partitions.clear();
        self.food_requests.clear();
        self.alarm.set(false);
        self.events.clear();
    }
}

/// Queue `command` on `sender`, logging instead of blocking.
pub(crate) fn defer_on(sender: &Sender<Command>, command: Command) -> bool {
    match sender.try_send(command) {
        Ok(()) => true,
        Err(TrySendError::Full(command)) => {
            warn!(?command, "command queue full, command dropped");
            false
        }
        Err(TrySendError::Disconnected(command)) => {
            warn!(?command, "simulation gone, command dropped");
            false
        }
    }
}

impl std::fmt::Debug for SimulationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationContext")
            .field("registry", &self.registry)
            .field("partitions", &self.partitions.len())
            .field("alarm", &self.alarm.is_raised())
            .field("food_requests", &self.food_requests)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caravan(slot: u32) -> ContainableId {
        ContainableId::new(ContainableKind::Caravan, slot)
    }

    // ── Food request tests ──────────────────────────────────────

    #[test]
    fn requests_are_deduplicated() {
        let q = FoodRequests::new();
        let at = Coordinate::new(1, 1);
        assert!(q.request(at));
        assert!(!q.request(at));
        assert_eq!(q.next_for(caravan(0)), Some(at));
        // Still outstanding while claimed.
        assert!(!q.request(at));
        assert_eq!(q.pending(), 0);
        assert_eq!(q.claimed(), 1);
    }

    #[test]
    fn oldest_request_served_first() {
        let q = FoodRequests::new();
        q.request(Coordinate::new(5, 0));
        q.request(Coordinate::new(1, 0));
        assert_eq!(q.next_for(caravan(0)), Some(Coordinate::new(5, 0)));
        assert_eq!(q.next_for(caravan(1)), Some(Coordinate::new(1, 0)));
        assert_eq!(q.next_for(caravan(2)), None);
    }

    #[test]
    fn claim_is_sticky_until_completed() {
        let q = FoodRequests::new();
        q.request(Coordinate::new(2, 2));
        q.request(Coordinate::new(3, 3));
        let first = q.next_for(caravan(0));
        assert_eq!(q.next_for(caravan(0)), first);
        assert_eq!(q.complete(caravan(0)), first);
        assert_eq!(q.next_for(caravan(0)), Some(Coordinate::new(3, 3)));
    }

    #[test]
    fn released_claim_goes_to_front() {
        let q = FoodRequests::new();
        q.request(Coordinate::new(0, 0));
        q.request(Coordinate::new(1, 1));
        q.next_for(caravan(0));
        assert!(q.release(caravan(0)));
        assert!(!q.release(caravan(0)));
        assert_eq!(q.next_for(caravan(1)), Some(Coordinate::new(0, 0)));
    }

    #[test]
    fn cancel_drops_pending_and_claimed() {
        let q = FoodRequests::new();
        let at = Coordinate::new(4, 4);
        q.request(at);
        q.next_for(caravan(0));
        q.cancel(at);
        assert!(!q.contains(at));
        assert_eq!(q.complete(caravan(0)), None);
    }

    // ── Alarm tests ─────────────────────────────────────────────

    #[test]
    fn alarm_set_returns_previous() {
        let alarm = AlarmFlag::default();
        assert!(!alarm.set(true));
        assert!(alarm.is_raised());
        assert!(alarm.set(false));
    }
}
