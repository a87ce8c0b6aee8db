//! Prospect: a gold-rush agent simulation.
//!
//! This is the facade crate that re-exports the public API of the Prospect
//! sub-crates. Most users only need this one dependency.
//!
//! # Quick start
//!
//! ```rust
//! use prospect::prelude::*;
//!
//! let mut config = SimulationConfig::default();
//! config.map.terrain = TerrainSource::Uniform(Terrain::Grass);
//! config.max_workers = Some(2);
//!
//! let mut sim = Simulation::new(config).unwrap();
//! sim.submit(Command::SetAlarm { raised: true }).unwrap();
//! let metrics = sim.step();
//! assert_eq!(metrics.commands_applied, 1);
//! assert_eq!(sim.tick_id(), TickId(1));
//! sim.end();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `prospect-core` | IDs, the event bus, object pools |
//! | [`grid`] | `prospect-grid` | Coordinates, terrain, the grid graph, line of sight |
//! | [`path`] | `prospect-path` | Dijkstra, A\* and Theta\* |
//! | [`voronoi`] | `prospect-voronoi` | Voronoi partitions and their registry |
//! | [`fsm`] | `prospect-fsm` | The flag-driven state machine |
//! | [`engine`] | `prospect-engine` | Miners, caravans, resources, the step loop |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identifiers, the event bus and pools (`prospect-core`).
pub use prospect_core as types;

/// The grid world model (`prospect-grid`).
///
/// [`grid::Graph`] is the lattice every other crate works on.
pub use prospect_grid as grid;

/// Pathfinders (`prospect-path`).
///
/// All searches implement [`path::Pathfinder`].
pub use prospect_path as path;

/// Voronoi partitions (`prospect-voronoi`).
pub use prospect_voronoi as voronoi;

/// The agent state machine (`prospect-fsm`).
pub use prospect_fsm as fsm;

/// The simulation engine (`prospect-engine`).
///
/// Start at [`engine::Simulation`].
pub use prospect_engine as engine;

/// Common imports for typical Prospect usage.
///
/// ```rust
/// use prospect::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use prospect_core::{ContainableId, ContainableKind, EventBus, TickId};

    // Grid
    pub use prospect_grid::{Coordinate, EdgeBehavior, Graph, Terrain, TerrainCosts, TerrainSet};

    // Pathfinding
    pub use prospect_path::{AStar, Dijkstra, Path, Pathfinder, SmoothingPolicy, ThetaStar};

    // Partitions
    pub use prospect_voronoi::{Partition, PartitionPolicy, PartitionRegistry};

    // State machine
    pub use prospect_fsm::{Fsm, FsmBuilder, Providers, State};

    // Engine
    pub use prospect_engine::{
        Command, CommandError, CommandReceipt, Simulation, SimulationConfig, SimulationError,
        StepMetrics, TerrainSource,
    };
}
