//! Event payloads carried on the simulation's [`EventBus`](prospect_core::EventBus).
//!
//! The first group is published by the engine. The `Request*`,
//! [`RaiseAlarm`] and [`CreateMine`] events are consumed: the simulation
//! subscribes to them at construction and turns each into a queued
//! [`Command`](crate::Command), applied at the start of the next step.

use prospect_core::ContainableId;
use prospect_grid::{Coordinate, Terrain};

// ── Published ──────────────────────────────────────────────────────

/// A cell's terrain or blocked flag changed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphModified {
    /// The changed cell.
    pub at: Coordinate,
    /// Its terrain after the change.
    pub terrain: Terrain,
    /// Its blocked flag after the change.
    pub blocked: bool,
}

/// The town alarm was raised or cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlarmChanged {
    /// New alarm state.
    pub raised: bool,
}

/// Gold was deposited at the center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenterGoldChanged {
    /// Treasury after the deposit.
    pub total: f32,
}

/// A mine was placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MineCreated {
    /// The new mine.
    pub id: ContainableId,
    /// Where it stands.
    pub at: Coordinate,
}

/// A mine was taken off the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MineRemoved {
    /// The removed mine.
    pub id: ContainableId,
    /// Where it stood.
    pub at: Coordinate,
}

/// A miner or caravan joined the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentSpawned {
    /// The new agent.
    pub id: ContainableId,
    /// Where it was placed.
    pub at: Coordinate,
}

// ── Consumed ───────────────────────────────────────────────────────

/// Ask for a miner. `None` spawns at the center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestMinerCreation {
    /// Spawn cell.
    pub at: Option<Coordinate>,
}

/// Ask for a caravan. `None` spawns at the center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestCaravanCreation {
    /// Spawn cell.
    pub at: Option<Coordinate>,
}

/// Raise or clear the town alarm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaiseAlarm {
    /// Desired alarm state.
    pub raised: bool,
}

/// Ask for a mine with the configured food stock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreateMine {
    /// Cell to place it on.
    pub at: Coordinate,
    /// Gold deposit.
    pub gold: f32,
}
