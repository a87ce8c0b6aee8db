//! Agents, resources, and the tick loop for Prospect simulations.
//!
//! A [`Simulation`] owns a [`World`]: the grid, every containable, and the
//! shared [`SimulationContext`] (registry, partitions, alarm, food
//! requests, event bus). Each [`step`](Simulation::step) drains queued
//! [`Command`]s, then ticks every [`Miner`] and [`Caravan`] once on a
//! rayon pool.
//!
//! Miners walk to the nearest workable [`Mine`], dig gold until full or
//! out of food, and carry it to the [`Center`]. Caravans answer the food
//! requests starving mines raise. Raising the alarm sends everyone into
//! hiding.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod caravan;
pub mod command;
pub mod config;
pub mod context;
pub mod events;
pub mod metrics;
pub mod miner;
pub mod registry;
pub mod resources;
pub mod simulation;
pub mod structures;
pub mod world;

pub use caravan::{Caravan, CaravanBody, CaravanFlag, CaravanState};
pub use command::{Command, CommandError, CommandReceipt};
pub use config::{
    CaravanConfig, CenterConfig, ConfigError, MapConfig, MineConfig, MinerConfig, PathingConfig,
    SimulationConfig, TerrainSource, MAX_WORKERS,
};
pub use context::{AlarmFlag, FoodRequests, SimulationContext};
pub use metrics::StepMetrics;
pub use miner::{Miner, MinerBody, MinerFlag, MinerState};
pub use registry::ContainableRegistry;
pub use resources::{Container, FoodContainer, GoldContainer, Quantity};
pub use simulation::{Simulation, SimulationError};
pub use structures::{Center, Mine};
pub use world::World;

/// Lock `m`, recovering the data if a panicking holder poisoned it.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
