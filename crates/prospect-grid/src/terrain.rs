//! Terrain types, terrain sets, and per-terrain move costs.

use std::fmt;

/// Terrain of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Terrain {
    /// Open ground.
    #[default]
    Grass,
    /// Paved road.
    Road,
    /// Open water.
    Water,
}

impl Terrain {
    /// Every terrain, in map-digit order.
    pub const ALL: [Terrain; 3] = [Self::Grass, Self::Road, Self::Water];

    /// Parse a terrain map digit (`0` grass, `1` road, `2` water).
    pub fn from_digit(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::Grass),
            '1' => Some(Self::Road),
            '2' => Some(Self::Water),
            _ => None,
        }
    }

    /// The terrain map digit for this terrain.
    pub fn digit(self) -> char {
        match self {
            Self::Grass => '0',
            Self::Road => '1',
            Self::Water => '2',
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Grass => "grass",
            Self::Road => "road",
            Self::Water => "water",
        };
        f.write_str(name)
    }
}

/// A small set of terrains, used for blocked-type lists.
///
/// ```
/// use prospect_grid::{Terrain, TerrainSet};
///
/// let blocked = TerrainSet::of(&[Terrain::Water]);
/// assert!(blocked.contains(Terrain::Water));
/// assert!(!blocked.contains(Terrain::Road));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TerrainSet(u8);

impl TerrainSet {
    /// The empty set.
    pub const EMPTY: TerrainSet = TerrainSet(0);

    /// A set holding exactly `terrains`.
    pub fn of(terrains: &[Terrain]) -> Self {
        terrains.iter().copied().collect()
    }

    /// Add a terrain. Returns `true` if it was not present.
    pub fn insert(&mut self, terrain: Terrain) -> bool {
        let bit = 1 << terrain.index();
        let fresh = self.0 & bit == 0;
        self.0 |= bit;
        fresh
    }

    /// Remove a terrain. Returns `true` if it was present.
    pub fn remove(&mut self, terrain: Terrain) -> bool {
        let bit = 1 << terrain.index();
        let present = self.0 & bit != 0;
        self.0 &= !bit;
        present
    }

    /// Membership test.
    pub fn contains(self, terrain: Terrain) -> bool {
        self.0 & (1 << terrain.index()) != 0
    }

    /// `true` if no terrain is in the set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in [`Terrain::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = Terrain> {
        Terrain::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

impl FromIterator<Terrain> for TerrainSet {
    fn from_iter<I: IntoIterator<Item = Terrain>>(iter: I) -> Self {
        let mut set = TerrainSet::EMPTY;
        for t in iter {
            set.insert(t);
        }
        set
    }
}

/// Cost to enter a cell, per terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TerrainCosts([u32; 3]);

impl TerrainCosts {
    /// Every terrain costs `cost`.
    pub const fn uniform(cost: u32) -> Self {
        Self([cost; 3])
    }

    /// Copy of `self` with `terrain` set to `cost`.
    #[must_use]
    pub fn with(mut self, terrain: Terrain, cost: u32) -> Self {
        self.0[terrain.index()] = cost;
        self
    }

    /// Cost to enter a cell of `terrain`.
    pub fn cost(&self, terrain: Terrain) -> u32 {
        self.0[terrain.index()]
    }

    /// Cheapest cost over terrains not in `blocked`, or `None` if every
    /// terrain is blocked.
    pub fn cheapest(&self, blocked: TerrainSet) -> Option<u32> {
        Terrain::ALL
            .into_iter()
            .filter(|t| !blocked.contains(*t))
            .map(|t| self.cost(t))
            .min()
    }
}

impl Default for TerrainCosts {
    /// Roads are cheapest, water is slowest.
    fn default() -> Self {
        Self([2, 1, 4])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_round_trip() {
        for t in Terrain::ALL {
            assert_eq!(Terrain::from_digit(t.digit()), Some(t));
        }
        assert_eq!(Terrain::from_digit('7'), None);
    }

    #[test]
    fn set_insert_remove() {
        let mut s = TerrainSet::EMPTY;
        assert!(s.is_empty());
        assert!(s.insert(Terrain::Road));
        assert!(!s.insert(Terrain::Road));
        assert!(s.contains(Terrain::Road));
        assert!(s.remove(Terrain::Road));
        assert!(!s.remove(Terrain::Road));
        assert!(s.is_empty());
    }

    #[test]
    fn set_iterates_in_terrain_order() {
        let s = TerrainSet::of(&[Terrain::Water, Terrain::Grass]);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![Terrain::Grass, Terrain::Water]);
    }

    #[test]
    fn cheapest_skips_blocked() {
        let costs = TerrainCosts::default();
        assert_eq!(costs.cheapest(TerrainSet::EMPTY), Some(1));
        assert_eq!(costs.cheapest(TerrainSet::of(&[Terrain::Road])), Some(2));
        assert_eq!(costs.cheapest(TerrainSet::of(&Terrain::ALL)), None);
    }

    #[test]
    fn with_overrides_single_terrain() {
        let costs = TerrainCosts::uniform(1).with(Terrain::Water, 9);
        assert_eq!(costs.cost(Terrain::Water), 9);
        assert_eq!(costs.cost(Terrain::Grass), 1);
    }
}
