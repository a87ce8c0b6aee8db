//! Benchmark profiles for the Prospect simulation.
//!
//! - [`reference_profile`]: 64x64 random map, 20 mines, 32 miners, 8 caravans
//! - [`stress_profile`]: 256x256 random map at eight times the population
//! - [`random_grid`] and [`site_sample`]: seeded inputs for the
//!   pathfinding and partition benches

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use prospect_engine::{SimulationConfig, TerrainSource};
use prospect_grid::{Coordinate, EdgeBehavior, Graph};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A 64x64 wrapping map with a mid-sized population.
pub fn reference_profile(seed: u64) -> SimulationConfig {
    profile(64, 20, 32, 8, seed)
}

/// A 256x256 wrapping map with eight times the reference population.
pub fn stress_profile(seed: u64) -> SimulationConfig {
    profile(256, 160, 256, 64, seed)
}

fn profile(side: u32, mines: usize, miners: usize, caravans: usize, seed: u64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.map.width = side;
    config.map.height = side;
    config.map.terrain = TerrainSource::Random;
    config.mines.count = mines;
    config.miner.count = miners;
    config.caravan.count = caravans;
    config.seed = seed;
    config
}

/// A `side x side` map of seeded random terrain.
pub fn random_grid(side: u32, edge: EdgeBehavior, seed: u64) -> Graph {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    // Benchmark sizes are fixed and valid.
    Graph::random(side, side, 1.0, edge, &mut rng).unwrap()
}

/// `n` distinct cells of `graph`, picked with a seeded shuffle.
pub fn site_sample(graph: &Graph, n: usize, seed: u64) -> Vec<Coordinate> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let cells: Vec<Coordinate> = graph.nodes().iter().map(|n| n.coordinate()).collect();
    cells.choose_multiple(&mut rng, n).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_validate() {
        assert!(reference_profile(1).validate().is_ok());
        assert!(stress_profile(1).validate().is_ok());
    }

    #[test]
    fn site_sample_is_distinct_and_seeded() {
        let graph = random_grid(16, EdgeBehavior::Wrap, 3);
        let a = site_sample(&graph, 10, 9);
        let mut dedup = a.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), 10);
        assert_eq!(a, site_sample(&graph, 10, 9));
    }
}
