//! Commands queued against a running simulation, and their receipts.

use std::error::Error;
use std::fmt;

use prospect_core::{ContainableId, TickId};
use prospect_fsm::FsmError;
use prospect_grid::{Coordinate, Terrain};

/// A change to the world, applied at the start of the next
/// [`Simulation::step`](crate::Simulation::step).
///
/// Coordinates are resolved through the grid's edge policy before use.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Place a mine.
    CreateMine {
        /// Cell to place it on.
        at: Coordinate,
        /// Gold deposit.
        gold: f32,
        /// Food stocked at start.
        food: u32,
        /// Food capacity. `None` = the configured default.
        max_food: Option<u32>,
    },
    /// Place a center. Only the first center is used by agents.
    CreateCenter {
        /// Cell to place it on.
        at: Coordinate,
        /// Food in stock.
        food: u32,
    },
    /// Spawn a miner. `None` spawns at the center.
    SpawnMiner {
        /// Spawn cell.
        at: Option<Coordinate>,
    },
    /// Spawn a caravan. `None` spawns at the center.
    SpawnCaravan {
        /// Spawn cell.
        at: Option<Coordinate>,
    },
    /// Take a containable off the map and drop it.
    Remove {
        /// The containable.
        id: ContainableId,
    },
    /// Raise or clear the town alarm.
    SetAlarm {
        /// Desired state.
        raised: bool,
    },
    /// Change a cell's terrain.
    SetTerrain {
        /// The cell.
        at: Coordinate,
        /// New terrain.
        terrain: Terrain,
    },
    /// Set or clear a cell's blocked flag.
    SetBlocked {
        /// The cell.
        at: Coordinate,
        /// New flag.
        blocked: bool,
    },
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateMine { .. } => "create_mine",
            Self::CreateCenter { .. } => "create_center",
            Self::SpawnMiner { .. } => "spawn_miner",
            Self::SpawnCaravan { .. } => "spawn_caravan",
            Self::Remove { .. } => "remove",
            Self::SetAlarm { .. } => "set_alarm",
            Self::SetTerrain { .. } => "set_terrain",
            Self::SetBlocked { .. } => "set_blocked",
        }
    }
}

/// Why a command was not queued or not applied.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandError {
    /// The command queue is at capacity.
    QueueFull,
    /// The simulation has ended.
    Ended,
    /// No live containable has this id.
    UnknownContainable {
        /// The rejected id.
        id: ContainableId,
    },
    /// The target cell is flagged blocked.
    CellBlocked {
        /// The cell.
        at: Coordinate,
    },
    /// The spawn needs a center and none exists.
    NoCenter,
    /// A gold quantity was negative or not finite.
    InvalidQuantity {
        /// The rejected value.
        value: f32,
    },
    /// Another holder of the world blocks mutation this step.
    WorldShared,
    /// An agent's state machine failed to build.
    Fsm(FsmError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "command queue full"),
            Self::Ended => write!(f, "simulation has ended"),
            Self::UnknownContainable { id } => write!(f, "unknown containable {id}"),
            Self::CellBlocked { at } => write!(f, "cell {at} is blocked"),
            Self::NoCenter => write!(f, "no center to spawn at"),
            Self::InvalidQuantity { value } => {
                write!(f, "quantity must be finite and non-negative, got {value}")
            }
            Self::WorldShared => write!(f, "world is shared and cannot be mutated"),
            Self::Fsm(e) => write!(f, "agent fsm: {e}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fsm(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FsmError> for CommandError {
    fn from(e: FsmError) -> Self {
        Self::Fsm(e)
    }
}

/// Outcome of one drained command.
///
/// # Examples
///
/// ```
/// use prospect_core::TickId;
/// use prospect_engine::CommandReceipt;
///
/// let receipt = CommandReceipt {
///     accepted: true,
///     applied_tick_id: Some(TickId(3)),
///     reason: None,
///     command_index: 0,
///     created: None,
/// };
/// assert!(receipt.accepted);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CommandReceipt {
    /// Whether the command was applied.
    pub accepted: bool,
    /// The step in which it was applied.
    pub applied_tick_id: Option<TickId>,
    /// Why it was rejected.
    pub reason: Option<CommandError>,
    /// Position of the command among those drained this step.
    pub command_index: usize,
    /// The containable the command created, if any.
    pub created: Option<ContainableId>,
}

impl CommandReceipt {
    pub(crate) fn applied(tick: TickId, index: usize, created: Option<ContainableId>) -> Self {
        Self {
            accepted: true,
            applied_tick_id: Some(tick),
            reason: None,
            command_index: index,
            created,
        }
    }

    pub(crate) fn rejected(index: usize, reason: CommandError) -> Self {
        Self {
            accepted: false,
            applied_tick_id: None,
            reason: Some(reason),
            command_index: index,
            created: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospect_core::ContainableKind;

    #[test]
    fn rejected_receipt_carries_reason() {
        let id = ContainableId::new(ContainableKind::Mine, 9);
        let r = CommandReceipt::rejected(4, CommandError::UnknownContainable { id });
        assert!(!r.accepted);
        assert_eq!(r.applied_tick_id, None);
        assert_eq!(r.command_index, 4);
        assert_eq!(r.reason, Some(CommandError::UnknownContainable { id }));
    }

    #[test]
    fn fsm_error_is_the_source() {
        let e = CommandError::from(FsmError::UnknownInitialState {
            state: "Idle".to_string(),
        });
        assert!(e.source().is_some());
        assert!(e.to_string().starts_with("agent fsm:"));
    }
}
