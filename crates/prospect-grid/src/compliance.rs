//! Graph invariant test helpers.
//!
//! Shared by the unit tests of every module that builds a [`Graph`].

use crate::coordinate::Coordinate;
use crate::graph::Graph;
use indexmap::IndexSet;

/// Assert that `b in adjacents(a)` implies `a in adjacents(b)` for every cell.
pub fn assert_adjacency_symmetric(graph: &Graph) {
    for a in graph.cells() {
        for b in graph.adjacents(a) {
            assert!(
                graph.adjacents(b).contains(&a),
                "adjacency symmetry violated: {b} in N({a}) but {a} not in N({b})"
            );
        }
    }
}

/// Like [`assert_adjacency_symmetric`], but only for cells off the boundary.
pub fn assert_adjacency_symmetric_interior(graph: &Graph) {
    let interior = |c: Coordinate| {
        c.x > 0 && c.y > 0 && (c.x as u32) < graph.width() - 1 && (c.y as u32) < graph.height() - 1
    };
    for a in graph.cells().filter(|c| interior(*c)) {
        let adj = graph.adjacents(a);
        assert_eq!(adj.len(), 4, "interior cell {a} has {} neighbours", adj.len());
        for b in adj {
            assert!(
                graph.adjacents(b).contains(&a),
                "adjacency symmetry violated: {b} in N({a}) but {a} not in N({b})"
            );
        }
    }
}

/// Assert that consecutive cells of `path` are distinct neighbours.
pub fn assert_path_adjacent(graph: &Graph, path: &[Coordinate]) {
    for pair in path.windows(2) {
        assert_ne!(pair[0], pair[1], "path repeats {}", pair[0]);
        assert!(
            graph.adjacents(pair[0]).contains(&pair[1]),
            "path step {} -> {} is not adjacent",
            pair[0],
            pair[1]
        );
    }
}

/// Assert that `cells()` yields every node once, in index order.
pub fn assert_cells_complete(graph: &Graph) {
    let cells: IndexSet<Coordinate> = graph.cells().collect();
    assert_eq!(cells.len(), graph.len(), "cells() yielded duplicates");
    for (i, c) in cells.iter().enumerate() {
        assert_eq!(graph.index_of(*c), Some(i), "{c} out of order");
    }
}
