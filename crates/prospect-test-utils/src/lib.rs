//! Test fixtures for Prospect development.
//!
//! Grid builders for pathfinding tests and, in [`fixtures`], FSM states
//! that record every hook call.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{scripted_fsm, Journal, RecordingState, ScriptFlag, ScriptState};

use prospect_grid::{Coordinate, EdgeBehavior, Graph, Terrain};

/// An all-grass `width × height` graph with unit node distance.
///
/// # Panics
///
/// If either dimension is zero.
pub fn open_grid(width: u32, height: u32, edge: EdgeBehavior) -> Graph {
    Graph::uniform(width, height, 1.0, edge, Terrain::Grass).expect("valid test grid")
}

/// A clamped grass grid whose centre cell is ringed by water.
///
/// Returns the graph and the enclosed goal. With water blocked the goal
/// is unreachable from anywhere outside the ring.
///
/// # Panics
///
/// If the grid is smaller than 3×3.
pub fn walled_goal(width: u32, height: u32) -> (Graph, Coordinate) {
    assert!(width >= 3 && height >= 3, "walled_goal needs at least 3x3");
    let goal = Coordinate::new((width / 2) as i32, (height / 2) as i32);
    let mut graph = open_grid(width, height, EdgeBehavior::Clamp);
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx != 0 || dy != 0 {
                graph.set_terrain(Coordinate::new(goal.x + dx, goal.y + dy), Terrain::Water);
            }
        }
    }
    (graph, goal)
}
