//! Dense 2D grid graph with wrap or clamp edges.

use rand::Rng;
use smallvec::SmallVec;

use crate::coordinate::{Coordinate, OFFSETS_4};
use crate::edge::{axis_distance, nearest_image, resolve_axis, EdgeBehavior};
use crate::error::GridError;
use crate::map::TerrainMap;
use crate::node::{Node, NodeContainable};
use crate::terrain::Terrain;

/// A `width × height` lattice of [`Node`]s.
///
/// Nodes are stored row-major (`index = y * width + x`). Every coordinate
/// passed to a query is first resolved with the graph's [`EdgeBehavior`],
/// so lookups never fail for a non-empty grid.
#[derive(Debug)]
pub struct Graph {
    width: u32,
    height: u32,
    node_distance: f32,
    edge: EdgeBehavior,
    nodes: Vec<Node>,
}

impl Graph {
    /// Build a graph, asking `terrain` for each cell's terrain.
    ///
    /// Returns `Err` for an empty grid, a dimension outside `i32`, or a
    /// node distance that is not finite and positive.
    pub fn new(
        width: u32,
        height: u32,
        node_distance: f32,
        edge: EdgeBehavior,
        mut terrain: impl FnMut(Coordinate) -> Terrain,
    ) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyGrid);
        }
        if i32::try_from(width).is_err()
            || i32::try_from(height).is_err()
            || (width as usize).checked_mul(height as usize).is_none()
        {
            return Err(GridError::DimensionsTooLarge { width, height });
        }
        if !node_distance.is_finite() || node_distance <= 0.0 {
            return Err(GridError::InvalidNodeDistance {
                value: node_distance,
            });
        }
        let mut nodes = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let c = Coordinate::new(x, y);
                nodes.push(Node::new(c, terrain(c)));
            }
        }
        Ok(Self {
            width,
            height,
            node_distance,
            edge,
            nodes,
        })
    }

    /// Every cell has the same terrain.
    pub fn uniform(
        width: u32,
        height: u32,
        node_distance: f32,
        edge: EdgeBehavior,
        terrain: Terrain,
    ) -> Result<Self, GridError> {
        Self::new(width, height, node_distance, edge, |_| terrain)
    }

    /// Each cell draws its terrain uniformly from [`Terrain::ALL`].
    pub fn random<R: Rng + ?Sized>(
        width: u32,
        height: u32,
        node_distance: f32,
        edge: EdgeBehavior,
        rng: &mut R,
    ) -> Result<Self, GridError> {
        Self::new(width, height, node_distance, edge, |_| {
            Terrain::ALL[rng.gen_range(0..Terrain::ALL.len())]
        })
    }

    /// Build from a loaded map. Map row 0 is the top line, so it becomes
    /// `y = height - 1`.
    pub fn from_map(
        map: &TerrainMap,
        node_distance: f32,
        edge: EdgeBehavior,
    ) -> Result<Self, GridError> {
        let height = map.height();
        Self::new(map.width(), height, node_distance, edge, |c| {
            let row = height as i32 - 1 - c.y;
            map.get(c.x as u32, row as u32).unwrap_or_default()
        })
    }

    // ── Shape ───────────────────────────────────────────────────

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: construction rejects empty grids.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// World units per cell.
    pub fn node_distance(&self) -> f32 {
        self.node_distance
    }

    /// Edge policy.
    pub fn edge(&self) -> EdgeBehavior {
        self.edge
    }

    /// `true` when edges wrap.
    pub fn is_circumnavigable(&self) -> bool {
        self.edge.is_circumnavigable()
    }

    /// All nodes in row-major order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All in-range coordinates in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.nodes.iter().map(Node::coordinate)
    }

    // ── Lookup ──────────────────────────────────────────────────

    /// Map any coordinate onto the grid using the edge policy.
    pub fn resolve(&self, c: Coordinate) -> Coordinate {
        Coordinate::new(
            resolve_axis(c.x, self.width, self.edge),
            resolve_axis(c.y, self.height, self.edge),
        )
    }

    /// Row-major index of an in-range coordinate. No resolution is applied.
    pub fn index_of(&self, c: Coordinate) -> Option<usize> {
        let in_range =
            c.x >= 0 && c.y >= 0 && (c.x as u32) < self.width && (c.y as u32) < self.height;
        in_range.then(|| c.y as usize * self.width as usize + c.x as usize)
    }

    /// The node for `c` after wrap or clamp.
    pub fn node_at(&self, c: Coordinate) -> Option<&Node> {
        self.index_of(self.resolve(c)).map(|i| &self.nodes[i])
    }

    /// Mutable node for `c` after wrap or clamp.
    pub fn node_at_mut(&mut self, c: Coordinate) -> Option<&mut Node> {
        let i = self.index_of(self.resolve(c))?;
        Some(&mut self.nodes[i])
    }

    /// Change one cell's terrain. Returns the previous terrain.
    pub fn set_terrain(&mut self, c: Coordinate, terrain: Terrain) -> Option<Terrain> {
        let node = self.node_at_mut(c)?;
        let previous = node.terrain();
        node.set_terrain(terrain);
        Some(previous)
    }

    /// The up-to-four neighbours of `c`.
    ///
    /// Offsets are resolved with the edge policy. Under
    /// [`Clamp`](EdgeBehavior::Clamp) a boundary cell lists itself.
    /// Duplicates (possible on grids one or two cells wide) appear once.
    pub fn adjacents(&self, c: Coordinate) -> SmallVec<[Coordinate; 4]> {
        let c = self.resolve(c);
        let mut out = SmallVec::new();
        for (dx, dy) in OFFSETS_4 {
            let n = self.resolve(c.offset(dx, dy));
            if self.index_of(n).is_some() && !out.contains(&n) {
                out.push(n);
            }
        }
        out
    }

    /// Neighbour nodes of `c`.
    pub fn adjacent_nodes(&self, c: Coordinate) -> SmallVec<[&Node; 4]> {
        self.adjacents(c)
            .into_iter()
            .filter_map(|n| self.node_at(n))
            .collect()
    }

    // ── Distance ────────────────────────────────────────────────

    /// Manhattan distance in cells, taking the short way round when wrapping.
    pub fn grid_distance(&self, a: Coordinate, b: Coordinate) -> u32 {
        let a = self.resolve(a);
        let b = self.resolve(b);
        axis_distance(a.x, b.x, self.width, self.edge)
            + axis_distance(a.y, b.y, self.height, self.edge)
    }

    /// Manhattan distance in world units.
    pub fn distance_between(&self, a: Coordinate, b: Coordinate) -> f32 {
        self.grid_distance(a, b) as f32 * self.node_distance
    }

    /// Straight-line distance in world units. Ignores wrap.
    pub fn euclidean_distance(&self, a: Coordinate, b: Coordinate) -> f32 {
        self.resolve(a).euclidean_distance(self.resolve(b)) * self.node_distance
    }

    /// World position of a cell.
    pub fn position_of(&self, c: Coordinate) -> (f32, f32) {
        let c = self.resolve(c);
        (
            c.x as f32 * self.node_distance,
            c.y as f32 * self.node_distance,
        )
    }

    /// Cell containing a world position.
    pub fn coordinate_from_position(&self, x: f32, y: f32) -> Coordinate {
        self.resolve(Coordinate::new(
            (x / self.node_distance).round() as i32,
            (y / self.node_distance).round() as i32,
        ))
    }

    // ── Line of sight ───────────────────────────────────────────

    /// Cells on the line from `start` to `end`, both included.
    ///
    /// Each step moves along exactly one axis, so consecutive cells are
    /// always adjacent. On a wrapping grid the image of `end` closest to
    /// `start` is rasterized and every point is wrapped back.
    ///
    /// ```
    /// use prospect_grid::{Coordinate, EdgeBehavior, Graph, Terrain};
    ///
    /// let g = Graph::uniform(10, 10, 1.0, EdgeBehavior::Wrap, Terrain::Grass).unwrap();
    /// let line = g.bresenham(Coordinate::new(0, 0), Coordinate::new(9, 0));
    /// assert_eq!(line, vec![Coordinate::new(0, 0), Coordinate::new(9, 0)]);
    /// ```
    pub fn bresenham(&self, start: Coordinate, end: Coordinate) -> Vec<Coordinate> {
        let start = self.resolve(start);
        let mut end = self.resolve(end);
        if self.is_circumnavigable() {
            end = Coordinate::new(
                nearest_image(start.x, end.x, self.width),
                nearest_image(start.y, end.y, self.height),
            );
        }

        let dx = (end.x - start.x).abs();
        let dy = -(end.y - start.y).abs();
        let sx = if start.x < end.x { 1 } else { -1 };
        let sy = if start.y < end.y { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (start.x, start.y);

        let mut out = Vec::with_capacity((dx - dy + 1) as usize);
        self.push_line_point(&mut out, x, y);
        while x != end.x || y != end.y {
            let e2 = 2 * err;
            let step_x = if x == end.x {
                false
            } else if y == end.y {
                true
            } else {
                e2 - dy > dx - e2
            };
            if step_x {
                err += dy;
                x += sx;
            } else {
                err += dx;
                y += sy;
            }
            self.push_line_point(&mut out, x, y);
        }
        out
    }

    /// Nodes on the line from `start` to `end`.
    pub fn bresenham_nodes(&self, start: Coordinate, end: Coordinate) -> Vec<&Node> {
        self.bresenham(start, end)
            .into_iter()
            .filter_map(|c| self.node_at(c))
            .collect()
    }

    fn push_line_point(&self, out: &mut Vec<Coordinate>, x: i32, y: i32) {
        let c = self.resolve(Coordinate::new(x, y));
        if self.index_of(c).is_none() {
            return;
        }
        if out.last() != Some(&c) {
            out.push(c);
        }
    }

    // ── Occupancy ───────────────────────────────────────────────

    /// Record `item` on the cell it claims to occupy.
    pub fn place<C: NodeContainable + ?Sized>(&self, item: &C) -> Coordinate {
        let at = self.resolve(item.node_coordinate());
        if let Some(node) = self.node_at(at) {
            node.add_containable(item.containable_id());
        }
        item.set_node_coordinate(at);
        at
    }

    /// Move `item` from its current cell to `to`.
    ///
    /// Returns the resolved destination. The two nodes are locked one
    /// after the other, never together, so concurrent moves of different
    /// items cannot deadlock.
    pub fn move_containable_to<C: NodeContainable + ?Sized>(
        &self,
        item: &C,
        to: Coordinate,
    ) -> Coordinate {
        let id = item.containable_id();
        let to = self.resolve(to);
        let from = item.node_coordinate();
        if from != to {
            if let Some(node) = self.node_at(from) {
                node.remove_containable(id);
            }
        }
        if let Some(node) = self.node_at(to) {
            node.add_containable(id);
        }
        item.set_node_coordinate(to);
        to
    }

    /// Remove `item` from its cell. Returns `false` if it was not recorded there.
    pub fn detach<C: NodeContainable + ?Sized>(&self, item: &C) -> bool {
        self.node_at(item.node_coordinate())
            .is_some_and(|node| node.remove_containable(item.containable_id()))
    }

    /// Forget every occupant on every cell.
    pub fn clear_containables(&self) {
        for node in &self.nodes {
            node.clear_containables();
        }
    }
}
