//! Paths returned by the pathfinders.

use prospect_grid::{Coordinate, Graph};

/// An ordered list of cells from start to goal, both included.
///
/// Paths from [`Dijkstra`](crate::Dijkstra) and [`AStar`](crate::AStar)
/// step between adjacent cells. A smoothed [`ThetaStar`](crate::ThetaStar)
/// path holds only waypoints; [`Path::expand`] turns it back into steps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    cells: Vec<Coordinate>,
}

impl Path {
    /// Wrap a list of cells.
    pub fn new(cells: Vec<Coordinate>) -> Self {
        Self { cells }
    }

    /// Number of cells, endpoints included.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// `true` if the path holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Starting cell.
    pub fn first(&self) -> Option<Coordinate> {
        self.cells.first().copied()
    }

    /// Goal cell.
    pub fn last(&self) -> Option<Coordinate> {
        self.cells.last().copied()
    }

    /// Cell at `index`.
    pub fn get(&self, index: usize) -> Option<Coordinate> {
        self.cells.get(index).copied()
    }

    /// Cells in travel order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Coordinate> + '_ {
        self.cells.iter().copied()
    }

    /// Borrow the cells.
    pub fn as_slice(&self) -> &[Coordinate] {
        &self.cells
    }

    /// Take the cells.
    pub fn into_vec(self) -> Vec<Coordinate> {
        self.cells
    }

    /// Replace every segment between waypoints with its Bresenham line.
    ///
    /// The result steps one adjacent cell at a time. Waypoints already
    /// adjacent are left as they are.
    pub fn expand(&self, graph: &Graph) -> Path {
        let mut out = Vec::with_capacity(self.cells.len());
        let mut waypoints = self.cells.iter().copied();
        let Some(mut from) = waypoints.next() else {
            return Path::default();
        };
        out.push(graph.resolve(from));
        for to in waypoints {
            out.extend(graph.bresenham(from, to).into_iter().skip(1));
            from = to;
        }
        Path::new(out)
    }
}

impl From<Vec<Coordinate>> for Path {
    fn from(cells: Vec<Coordinate>) -> Self {
        Self::new(cells)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = Coordinate;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Coordinate>>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter().copied()
    }
}

impl IntoIterator for Path {
    type Item = Coordinate;
    type IntoIter = std::vec::IntoIter<Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}
