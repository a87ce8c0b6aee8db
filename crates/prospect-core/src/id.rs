//! Strongly-typed identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// What a containable is, as seen by the node that holds it.
///
/// Nodes store the kind next to the id so lookups like "the mine on
/// this cell" never need to resolve the object first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainableKind {
    /// A gold mine. Also a partition site.
    Mine,
    /// The town center where gold is deposited and food is stocked.
    Center,
    /// A gold-harvesting agent.
    Miner,
    /// A food-hauling agent.
    Caravan,
}

impl ContainableKind {
    /// All kinds, in declaration order.
    pub const ALL: [ContainableKind; 4] = [Self::Mine, Self::Center, Self::Miner, Self::Caravan];

    /// Registry name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Mine => "Mine",
            Self::Center => "Center",
            Self::Miner => "Miner",
            Self::Caravan => "Caravan",
        }
    }

    /// Whether objects of this kind tick an FSM.
    pub fn is_agent(self) -> bool {
        matches!(self, Self::Miner | Self::Caravan)
    }
}

impl fmt::Display for ContainableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies a containable within a simulation.
///
/// Slots are allocated per kind, lowest free slot first, so `Miner 0`
/// and `Mine 0` can coexist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainableId {
    /// Kind of the object.
    pub kind: ContainableKind,
    /// Per-kind slot.
    pub slot: u32,
}

impl ContainableId {
    /// Build an id from its parts.
    pub const fn new(kind: ContainableKind, slot: u32) -> Self {
        Self { kind, slot }
    }
}

impl fmt::Display for ContainableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.slot)
    }
}

/// Counter for unique [`SubscriptionId`] allocation.
static SUBSCRIPTION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Handle returned by [`EventBus::subscribe`](crate::EventBus::subscribe).
///
/// Allocated from a process-wide monotonic counter, so a handle is never
/// reused even across buses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocate a fresh, unique id. Thread-safe.
    pub fn next() -> Self {
        Self(SUBSCRIPTION_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing tick counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
