//! Pathfinding over a Prospect [`Graph`](prospect_grid::Graph).
//!
//! Three searches share one open-set core:
//!
//! - [`Dijkstra`]: uniform move cost, shortest by edge count
//! - [`AStar`]: terrain-weighted with an admissible Manhattan heuristic
//! - [`ThetaStar`]: A\* followed by line-of-sight string-pulling
//!
//! All of them implement [`Pathfinder`] and report an unreachable goal as
//! `None`. Search scratch (scores, parents, the open heap) is recycled
//! through a [`Pool`](prospect_core::Pool) owned by each pathfinder, so
//! one instance can serve many threads.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod astar;
pub mod dijkstra;
pub mod path;
pub mod pathfinder;
mod search;
pub mod theta;

pub use astar::AStar;
pub use dijkstra::Dijkstra;
pub use path::Path;
pub use pathfinder::Pathfinder;
pub use theta::{SmoothingPolicy, ThetaStar};
