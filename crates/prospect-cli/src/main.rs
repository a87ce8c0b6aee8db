//! Run a Prospect simulation headless and print a summary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use prospect_core::ContainableKind;
use prospect_engine::{Command, Simulation, SimulationConfig, StepMetrics, TerrainSource};
use prospect_grid::EdgeBehavior;
use prospect_voronoi::PartitionPolicy;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prospect")]
#[command(about = "Run a gold-rush simulation headless")]
struct Cli {
    /// Terrain map CSV (0 grass, 1 road, 2 water). Random terrain if absent.
    #[arg(long)]
    map: Option<PathBuf>,

    /// Grid width when no map is given.
    #[arg(long, default_value_t = 10)]
    width: u32,

    /// Grid height when no map is given.
    #[arg(long, default_value_t = 10)]
    height: u32,

    /// Clamp at the grid edges instead of wrapping.
    #[arg(long)]
    clamp: bool,

    /// Number of steps to run.
    #[arg(long, default_value_t = 100)]
    ticks: u64,

    /// Seconds per step.
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// Seed for terrain and mine placement.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Mines placed at start.
    #[arg(long, default_value_t = 5)]
    mines: usize,

    /// Miners spawned at start.
    #[arg(long, default_value_t = 2)]
    miners: usize,

    /// Caravans spawned at start.
    #[arg(long, default_value_t = 1)]
    caravans: usize,

    /// Worker threads. Defaults to the available parallelism.
    #[arg(long)]
    workers: Option<usize>,

    /// Mine partition: euclidean, manhattan, toroidal-euclidean, bisector, bisector-planes.
    #[arg(long, default_value = "manhattan")]
    partition: PartitionPolicy,

    /// Raise the alarm at this step.
    #[arg(long)]
    alarm_at: Option<u64>,

    /// Steps the alarm stays up.
    #[arg(long, default_value_t = 20)]
    alarm_for: u64,
}

impl Cli {
    fn config(&self) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.map.width = self.width;
        config.map.height = self.height;
        config.map.edge = if self.clamp {
            EdgeBehavior::Clamp
        } else {
            EdgeBehavior::Wrap
        };
        if let Some(path) = &self.map {
            config.map.terrain = TerrainSource::Map(path.clone());
        }
        config.dt = self.dt;
        config.seed = self.seed;
        config.mines.count = self.mines;
        config.miner.count = self.miners;
        config.caravan.count = self.caravans;
        config.max_workers = self.workers;
        config.partition = self.partition;
        config
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[derive(Default)]
struct Totals {
    transitions: u64,
    commands_applied: u64,
    commands_rejected: u64,
    agent_tick_us: u64,
    total_us: u64,
}

impl Totals {
    fn add(&mut self, m: &StepMetrics) {
        self.transitions += m.transitions;
        self.commands_applied += u64::from(m.commands_applied);
        self.commands_rejected += u64::from(m.commands_rejected);
        self.agent_tick_us += m.agent_tick_us;
        self.total_us += m.total_us;
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut sim = Simulation::new(cli.config()).context("failed to start simulation")?;

    let mut totals = Totals::default();
    for tick in 0..cli.ticks {
        if let Some(at) = cli.alarm_at {
            if tick == at {
                sim.submit(Command::SetAlarm { raised: true })
                    .context("failed to raise alarm")?;
            } else if tick == at + cli.alarm_for {
                sim.submit(Command::SetAlarm { raised: false })
                    .context("failed to clear alarm")?;
            }
        }
        totals.add(&sim.step());
    }

    let world = sim.world();
    let registry = world.context().registry();
    let gold = world.center().map_or(0.0, |c| c.gold().contained());
    println!("steps:            {}", sim.tick_id());
    println!("center gold:      {gold:.2}");
    println!("mines left:       {}", registry.count(ContainableKind::Mine));
    println!(
        "agents:           {} miners, {} caravans",
        registry.count(ContainableKind::Miner),
        registry.count(ContainableKind::Caravan)
    );
    println!("transitions:      {}", totals.transitions);
    println!(
        "commands:         {} applied, {} rejected",
        totals.commands_applied, totals.commands_rejected
    );
    let steps = cli.ticks.max(1);
    println!(
        "mean step:        {} us ({} us agents)",
        totals.total_us / steps,
        totals.agent_tick_us / steps
    );
    info!(ticks = cli.ticks, "run complete");

    sim.end();
    Ok(())
}
