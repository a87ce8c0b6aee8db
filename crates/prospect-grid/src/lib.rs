//! Grid world model for Prospect simulations.
//!
//! This crate defines the addressing scheme ([`Coordinate`]), the terrain
//! vocabulary ([`Terrain`], [`TerrainSet`], [`TerrainCosts`]), and the
//! [`Graph`]: a dense `width × height` lattice of [`Node`]s with a
//! configurable [`EdgeBehavior`].
//!
//! # Queries
//!
//! - [`Graph::adjacents`]: 4-connected neighbours after wrap or clamp
//! - [`Graph::bresenham`]: orthogonally-stepping line rasterization
//! - [`Graph::distance_between`]: wrap-aware Manhattan distance in world units
//!
//! # Occupancy
//!
//! Nodes track the ids of the [`NodeContainable`]s standing on them. The
//! only sanctioned way to change an occupant's cell is
//! [`Graph::move_containable_to`], which is safe to call concurrently for
//! different occupants.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod coordinate;
pub mod edge;
pub mod error;
pub mod graph;
pub mod map;
pub mod node;
pub mod terrain;

#[cfg(test)]
pub(crate) mod compliance;

pub use coordinate::Coordinate;
pub use edge::EdgeBehavior;
pub use error::GridError;
pub use graph::Graph;
pub use map::TerrainMap;
pub use node::{Node, NodeContainable, Placement};
pub use terrain::{Terrain, TerrainCosts, TerrainSet};
