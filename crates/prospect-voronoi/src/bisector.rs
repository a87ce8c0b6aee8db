//! Half-plane Voronoi cells.

use glam::Vec2;
use prospect_grid::{Coordinate, Graph};
use tracing::debug;

use crate::partition::{dedupe_sites, OwnerMap, Partition};
use crate::policy::to_vec;

/// Membership slack for points on a bisector.
const TOLERANCE: f32 = 1e-5;

/// A perpendicular bisector between two sites, as a half-plane.
///
/// The normal points towards the owning site; points with a non-negative
/// signed distance (within [`TOLERANCE`]) are on the owner's side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal facing the owning site.
    pub normal: Vec2,
    /// Midpoint of the two sites; lies on the plane.
    pub point: Vec2,
    /// The other site this plane separates from.
    pub neighbour: Coordinate,
}

impl Plane {
    /// Bisector of `owner` and `other`, facing `owner`.
    pub fn between(owner: Coordinate, other: Coordinate) -> Self {
        let (a, b) = (to_vec(owner), to_vec(other));
        Self {
            normal: (a - b).normalize_or_zero(),
            point: (a + b) * 0.5,
            neighbour: other,
        }
    }

    /// Signed distance of `p` from the plane, positive on the owner's side.
    pub fn signed_distance(&self, p: Vec2) -> f32 {
        (p - self.point).dot(self.normal)
    }

    /// Whether `p` is on the owner's side.
    pub fn contains(&self, p: Vec2) -> bool {
        self.signed_distance(p) >= -TOLERANCE
    }
}

#[derive(Debug)]
struct SiteCell {
    site: Coordinate,
    planes: Vec<Plane>,
    polygon: Vec<Vec2>,
}

impl SiteCell {
    fn contains(&self, p: Vec2) -> bool {
        self.planes.iter().all(|plane| plane.contains(p))
    }
}

/// Voronoi partition built from explicit bisector half-planes.
///
/// For each site a half-plane is built against every other site. The
/// grid's bounding rectangle is then clipped by those planes; planes that
/// contribute no edge to the clipped polygon are redundant and dropped.
/// The polygon is kept and exposed through [`cell_polygon`](Self::cell_polygon).
///
/// A cell belongs to the first site, in site order, whose planes all
/// contain it. A cell no site claims maps to itself.
///
/// Geometry is planar: wrap edges are not taken into account.
#[derive(Debug, Default)]
pub struct BisectorPartition {
    sites: Vec<Coordinate>,
    cells: Vec<SiteCell>,
    owners: OwnerMap,
}

impl BisectorPartition {
    /// An empty partition.
    pub fn new() -> Self {
        Self::default()
    }

    /// The clipped cell of `site`, counter-clockwise, if it is a site.
    pub fn cell_polygon(&self, site: Coordinate) -> Option<&[Vec2]> {
        self.cells
            .iter()
            .find(|cell| cell.site == site)
            .map(|cell| cell.polygon.as_slice())
    }

    /// The planes kept for `site` after pruning.
    pub fn planes(&self, site: Coordinate) -> Option<&[Plane]> {
        self.cells
            .iter()
            .find(|cell| cell.site == site)
            .map(|cell| cell.planes.as_slice())
    }

    fn build_cell(site: Coordinate, others: impl Iterator<Item = Coordinate>, bounds: [Vec2; 4]) -> SiteCell {
        let candidates: Vec<Plane> = others.map(|other| Plane::between(site, other)).collect();

        // Each vertex carries the source of the edge leaving it: `None`
        // for the bounding rectangle, otherwise a candidate index.
        let mut polygon: Vec<(Vec2, Option<usize>)> = bounds.iter().map(|v| (*v, None)).collect();
        for (index, plane) in candidates.iter().enumerate() {
            polygon = clip(&polygon, plane, index);
            if polygon.is_empty() {
                break;
            }
        }

        let mut keep = vec![false; candidates.len()];
        for (i, (from, source)) in polygon.iter().enumerate() {
            let (to, _) = polygon[(i + 1) % polygon.len()];
            if let Some(index) = source {
                if from.distance(to) > TOLERANCE {
                    keep[*index] = true;
                }
            }
        }

        SiteCell {
            site,
            planes: candidates
                .into_iter()
                .zip(keep)
                .filter_map(|(plane, keep)| keep.then_some(plane))
                .collect(),
            polygon: polygon.into_iter().map(|(v, _)| v).collect(),
        }
    }
}

/// One Sutherland–Hodgman pass, tracking which plane each edge came from.
fn clip(polygon: &[(Vec2, Option<usize>)], plane: &Plane, index: usize) -> Vec<(Vec2, Option<usize>)> {
    let mut out = Vec::with_capacity(polygon.len() + 1);
    for (i, &(cur, source)) in polygon.iter().enumerate() {
        let (next, _) = polygon[(i + 1) % polygon.len()];
        let (dc, dn) = (plane.signed_distance(cur), plane.signed_distance(next));
        let (cur_in, next_in) = (dc >= -TOLERANCE, dn >= -TOLERANCE);
        let crossing = || cur + (next - cur) * (dc / (dc - dn));
        match (cur_in, next_in) {
            (true, true) => out.push((cur, source)),
            (true, false) => {
                out.push((cur, source));
                out.push((crossing(), Some(index)));
            }
            (false, true) => out.push((crossing(), source)),
            (false, false) => {}
        }
    }
    out
}

impl Partition for BisectorPartition {
    fn name(&self) -> &'static str {
        "bisector-planes"
    }

    fn generate(&mut self, graph: &Graph, sites: &[Coordinate]) {
        let sites = dedupe_sites(graph, sites);
        let (w, h) = (graph.width() as f32, graph.height() as f32);
        let bounds = [
            Vec2::new(-0.5, -0.5),
            Vec2::new(w - 0.5, -0.5),
            Vec2::new(w - 0.5, h - 0.5),
            Vec2::new(-0.5, h - 0.5),
        ];
        let cells: Vec<SiteCell> = sites
            .iter()
            .map(|&site| {
                let others = sites.iter().copied().filter(move |o| *o != site);
                Self::build_cell(site, others, bounds)
            })
            .collect();

        let mut owners = OwnerMap::default();
        if !cells.is_empty() {
            owners.fill(graph, |point| {
                let p = to_vec(point);
                cells
                    .iter()
                    .find(|cell| cell.contains(p))
                    .map_or(point, |cell| cell.site)
            });
        }

        let planes: usize = cells.iter().map(|cell| cell.planes.len()).sum();
        debug!(sites = sites.len(), planes, "bisector partition generated");
        self.sites = sites;
        self.cells = cells;
        self.owners = owners;
    }

    fn closest_to(&self, coordinate: Coordinate) -> Coordinate {
        self.owners.lookup(coordinate)
    }

    fn sites(&self) -> &[Coordinate] {
        &self.sites
    }
}
