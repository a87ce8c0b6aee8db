//! Simulation configuration, validation, and error types.
//!
//! [`SimulationConfig`] is the input to
//! [`Simulation::new`](crate::Simulation::new).
//! [`validate()`](SimulationConfig::validate) checks every value the
//! constructor relies on before any world state is built.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use prospect_grid::{Coordinate, EdgeBehavior, Terrain, TerrainCosts, TerrainSet};
use prospect_path::SmoothingPolicy;
use prospect_voronoi::PartitionPolicy;

/// Upper bound on [`SimulationConfig::resolved_worker_count`].
pub const MAX_WORKERS: usize = 32;

// ── MapConfig ──────────────────────────────────────────────────────

/// Where cell terrain comes from.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TerrainSource {
    /// Uniformly random terrain drawn from the simulation seed.
    #[default]
    Random,
    /// Every cell has the same terrain.
    Uniform(Terrain),
    /// A terrain map file. Its dimensions replace the configured ones.
    Map(PathBuf),
}

/// Grid shape and terrain.
#[derive(Clone, Debug)]
pub struct MapConfig {
    /// Cells per row. Default: 10.
    pub width: u32,
    /// Number of rows. Default: 10.
    pub height: u32,
    /// World units per cell. Default: 1.0.
    pub node_distance: f32,
    /// Boundary policy. Default: [`EdgeBehavior::Wrap`].
    pub edge: EdgeBehavior,
    /// Terrain source. Default: [`TerrainSource::Random`].
    pub terrain: TerrainSource,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            node_distance: 1.0,
            edge: EdgeBehavior::Wrap,
            terrain: TerrainSource::Random,
        }
    }
}

// ── CenterConfig ───────────────────────────────────────────────────

/// The town center.
#[derive(Clone, Debug)]
pub struct CenterConfig {
    /// Cell of the center. `None` = the middle of the grid.
    pub position: Option<Coordinate>,
    /// Food in stock at start. Default: 100.
    pub food: u32,
}

impl Default for CenterConfig {
    fn default() -> Self {
        Self {
            position: None,
            food: 100,
        }
    }
}

// ── MineConfig ─────────────────────────────────────────────────────

/// Mines placed at start.
#[derive(Clone, Debug)]
pub struct MineConfig {
    /// Number of mines. Default: 5.
    pub count: usize,
    /// Smallest gold deposit. Default: 10.0.
    pub min_gold: f32,
    /// Largest gold deposit. Default: 100.0.
    pub max_gold: f32,
    /// Food capacity of each mine. Default: 1000.
    pub max_food: u32,
    /// Food stocked in each mine at start. Default: 10.
    pub start_food: u32,
}

impl Default for MineConfig {
    fn default() -> Self {
        Self {
            count: 5,
            min_gold: 10.0,
            max_gold: 100.0,
            max_food: 1000,
            start_food: 10,
        }
    }
}

// ── MinerConfig ────────────────────────────────────────────────────

/// Miner agents.
#[derive(Clone, Debug)]
pub struct MinerConfig {
    /// Miners spawned at the center at start. Default: 2.
    pub count: usize,
    /// Gold mined per second. Default: 1.0.
    pub mine_speed: f32,
    /// Cells walked per second. Default: 1.0.
    pub move_speed: f32,
    /// Gold carried before heading home. Default: 15.0.
    pub max_gold: f32,
    /// Gold mined per unit of food eaten. Default: 5.0.
    pub gold_per_food: f32,
    /// Seconds spent in Idle before looking for a mine. Default: 1.0.
    pub idle_time: f32,
    /// Seconds between food requests from a starving mine. Default: 5.0.
    pub food_request_interval: f32,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            count: 2,
            mine_speed: 1.0,
            move_speed: 1.0,
            max_gold: 15.0,
            gold_per_food: 5.0,
            idle_time: 1.0,
            food_request_interval: 5.0,
        }
    }
}

// ── CaravanConfig ──────────────────────────────────────────────────

/// Food caravans.
#[derive(Clone, Debug)]
pub struct CaravanConfig {
    /// Caravans spawned at the center at start. Default: 1.
    pub count: usize,
    /// World units travelled per second. Default: 2.0.
    pub move_speed: f32,
    /// Food carried per trip. Default: 10.
    pub capacity: u32,
    /// Terrain caravans cannot cross. Default: water.
    pub blocked: TerrainSet,
}

impl Default for CaravanConfig {
    fn default() -> Self {
        Self {
            count: 1,
            move_speed: 2.0,
            capacity: 10,
            blocked: TerrainSet::of(&[Terrain::Water]),
        }
    }
}

// ── PathingConfig ──────────────────────────────────────────────────

/// Pathfinder tuning shared by every agent.
#[derive(Clone, Copy, Debug, Default)]
pub struct PathingConfig {
    /// Per-terrain step costs. Default: [`TerrainCosts::default`].
    pub costs: TerrainCosts,
    /// Caravan line-of-sight test. Default: [`SmoothingPolicy::SameTerrain`].
    pub smoothing: SmoothingPolicy,
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SimulationConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Width or height is zero.
    EmptyMap {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// A value that must be finite and positive is not.
    NotPositive {
        /// Name of the setting.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// A value that must be finite and non-negative is not.
    Negative {
        /// Name of the setting.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// A count or capacity that must be at least 1 is zero.
    Zero {
        /// Name of the setting.
        field: &'static str,
    },
    /// `mines.min_gold` exceeds `mines.max_gold`.
    GoldRange {
        /// Configured minimum.
        min: f32,
        /// Configured maximum.
        max: f32,
    },
    /// Mines would start with more food than they can hold.
    StartFoodOverCapacity {
        /// Configured start food.
        start: u32,
        /// Configured capacity.
        max: u32,
    },
    /// The center lies outside the grid.
    CenterOutOfBounds {
        /// Configured center.
        at: Coordinate,
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMap { width, height } => {
                write!(f, "map must have at least one cell, got {width}x{height}")
            }
            Self::NotPositive { field, value } => {
                write!(f, "{field} must be finite and positive, got {value}")
            }
            Self::Negative { field, value } => {
                write!(f, "{field} must be finite and non-negative, got {value}")
            }
            Self::Zero { field } => write!(f, "{field} must be at least 1"),
            Self::GoldRange { min, max } => {
                write!(f, "mines.min_gold ({min}) exceeds mines.max_gold ({max})")
            }
            Self::StartFoodOverCapacity { start, max } => {
                write!(f, "mines.start_food ({start}) exceeds mines.max_food ({max})")
            }
            Self::CenterOutOfBounds { at, width, height } => {
                write!(f, "center {at} is outside the {width}x{height} grid")
            }
        }
    }
}

impl Error for ConfigError {}

// ── SimulationConfig ───────────────────────────────────────────────

/// Complete configuration for a [`Simulation`](crate::Simulation).
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Grid shape and terrain.
    pub map: MapConfig,
    /// The town center.
    pub center: CenterConfig,
    /// Mines placed at start.
    pub mines: MineConfig,
    /// Miner agents.
    pub miner: MinerConfig,
    /// Food caravans.
    pub caravan: CaravanConfig,
    /// Pathfinder tuning.
    pub pathing: PathingConfig,
    /// Partition used for mine lookups. Default: [`PartitionPolicy::Manhattan`].
    pub partition: PartitionPolicy,
    /// Simulated seconds per step. Default: 0.1.
    pub dt: f32,
    /// Seed for terrain and mine placement. Default: 42.
    pub seed: u64,
    /// Worker threads. `None` = auto-detect. See
    /// [`resolved_worker_count`](Self::resolved_worker_count).
    pub max_workers: Option<usize>,
    /// Commands buffered between steps. Default: 1024.
    pub command_queue_capacity: usize,
    /// Take a mine off the map once its gold runs out. Default: true.
    pub remove_depleted_mines: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            center: CenterConfig::default(),
            mines: MineConfig::default(),
            miner: MinerConfig::default(),
            caravan: CaravanConfig::default(),
            pathing: PathingConfig::default(),
            partition: PartitionPolicy::default(),
            dt: 0.1,
            seed: 42,
            max_workers: None,
            command_queue_capacity: 1024,
            remove_depleted_mines: true,
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

impl SimulationConfig {
    /// Validate every setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Grid must have cells, unless a map file supplies them.
        let from_file = matches!(self.map.terrain, TerrainSource::Map(_));
        if !from_file && (self.map.width == 0 || self.map.height == 0) {
            return Err(ConfigError::EmptyMap {
                width: self.map.width,
                height: self.map.height,
            });
        }
        // 2. Node distance and timestep.
        positive("map.node_distance", self.map.node_distance)?;
        positive("dt", self.dt)?;
        // 3. Mine deposits.
        positive("mines.min_gold", self.mines.min_gold)?;
        positive("mines.max_gold", self.mines.max_gold)?;
        if self.mines.min_gold > self.mines.max_gold {
            return Err(ConfigError::GoldRange {
                min: self.mines.min_gold,
                max: self.mines.max_gold,
            });
        }
        if self.mines.start_food > self.mines.max_food {
            return Err(ConfigError::StartFoodOverCapacity {
                start: self.mines.start_food,
                max: self.mines.max_food,
            });
        }
        // 4. Miner rates.
        let m = &self.miner;
        positive("miner.mine_speed", m.mine_speed)?;
        positive("miner.move_speed", m.move_speed)?;
        positive("miner.max_gold", m.max_gold)?;
        positive("miner.gold_per_food", m.gold_per_food)?;
        positive("miner.food_request_interval", m.food_request_interval)?;
        non_negative("miner.idle_time", m.idle_time)?;
        // 5. Caravans.
        positive("caravan.move_speed", self.caravan.move_speed)?;
        if self.caravan.capacity == 0 {
            return Err(ConfigError::Zero {
                field: "caravan.capacity",
            });
        }
        // 6. Command queue.
        if self.command_queue_capacity == 0 {
            return Err(ConfigError::Zero {
                field: "command_queue_capacity",
            });
        }
        // 7. Center inside the grid. Map files are checked once loaded.
        if let (Some(at), false) = (self.center.position, from_file) {
            self.check_center(at, self.map.width, self.map.height)?;
        }
        Ok(())
    }

    pub(crate) fn check_center(&self, at: Coordinate, width: u32, height: u32) -> Result<(), ConfigError> {
        let inside = at.x >= 0 && at.y >= 0 && (at.x as u32) < width && (at.y as u32) < height;
        if inside {
            Ok(())
        } else {
            Err(ConfigError::CenterOutOfBounds { at, width, height })
        }
    }

    /// Resolve the worker thread count.
    ///
    /// Explicit values are clamped to `[1, MAX_WORKERS]`. `None` uses
    /// `available_parallelism`, clamped the same way.
    pub fn resolved_worker_count(&self) -> usize {
        match self.max_workers {
            Some(n) => n.clamp(1, MAX_WORKERS),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .clamp(1, MAX_WORKERS),
        }
    }
}
