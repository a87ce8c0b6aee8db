//! Discrete Voronoi partitions for Prospect simulations.
//!
//! A [`Partition`] maps every grid cell to the *site* that owns it. Two
//! families are provided:
//!
//! - [`BruteForcePartition`]: scans every site for every cell, asking an
//!   [`OwnershipPolicy`] which of two sites wins
//! - [`BisectorPartition`]: builds each site's cell from perpendicular
//!   bisector half-planes and tests membership geometrically
//!
//! Finished partitions are published through a [`PartitionRegistry`],
//! which swaps them in whole so concurrent readers never see a partial
//! map.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bisector;
pub mod brute;
pub mod error;
pub mod partition;
pub mod policy;
pub mod registry;

pub use bisector::{BisectorPartition, Plane};
pub use brute::BruteForcePartition;
pub use error::VoronoiError;
pub use partition::{Partition, PartitionPolicy};
pub use policy::{BisectorSide, Euclidean, Manhattan, OwnershipPolicy, ToroidalEuclidean};
pub use registry::PartitionRegistry;
