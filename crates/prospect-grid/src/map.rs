//! Terrain arrays used to seed a [`Graph`](crate::Graph).

use std::path::Path;

use crate::error::GridError;
use crate::terrain::Terrain;

/// A `width × height` array of terrain, stored top row first.
///
/// # File format
///
/// One line per row, cells separated by commas, each cell a single digit
/// (`0` grass, `1` road, `2` water). Whitespace around cells is ignored,
/// as are blank trailing lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainMap {
    width: u32,
    height: u32,
    cells: Vec<Terrain>,
}

impl TerrainMap {
    /// A map filled with `fill`.
    pub fn new(width: u32, height: u32, fill: Terrain) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyGrid);
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(GridError::DimensionsTooLarge { width, height })?;
        Ok(Self {
            width,
            height,
            cells: vec![fill; len],
        })
    }

    /// Build from explicit rows, top row first.
    pub fn from_rows(rows: Vec<Vec<Terrain>>) -> Result<Self, GridError> {
        let expected = rows.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(GridError::EmptyGrid);
        }
        let mut cells = Vec::with_capacity(expected * rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(GridError::RaggedMap {
                    line: i + 1,
                    expected,
                    found: row.len(),
                });
            }
            cells.extend_from_slice(row);
        }
        let width = u32::try_from(expected).map_err(|_| GridError::DimensionsTooLarge {
            width: u32::MAX,
            height: 0,
        })?;
        let height = u32::try_from(rows.len()).map_err(|_| GridError::DimensionsTooLarge {
            width,
            height: u32::MAX,
        })?;
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Parse the comma-separated digit format.
    pub fn parse_csv(text: &str) -> Result<Self, GridError> {
        let lines: Vec<&str> = text.lines().collect();
        let used = lines
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .map_or(0, |i| i + 1);

        let mut rows = Vec::with_capacity(used);
        for (i, line) in lines[..used].iter().enumerate() {
            let mut row = Vec::new();
            for (j, cell) in line.split(',').enumerate() {
                let cell = cell.trim();
                let mut chars = cell.chars();
                let terrain = match (chars.next(), chars.next()) {
                    (Some(c), None) => Terrain::from_digit(c),
                    _ => None,
                };
                let terrain = terrain.ok_or_else(|| GridError::MapParse {
                    line: i + 1,
                    column: j + 1,
                    reason: format!("expected a terrain digit 0-2, got {cell:?}"),
                })?;
                row.push(terrain);
            }
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    /// Read and parse a map file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GridError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GridError::MapIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_csv(&text)
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Terrain at column `x` of row `row` (row 0 is the top line).
    pub fn get(&self, x: u32, row: u32) -> Option<Terrain> {
        if x >= self.width || row >= self.height {
            return None;
        }
        self.cells
            .get(row as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Overwrite one cell. Returns `false` if out of range.
    pub fn set(&mut self, x: u32, row: u32, terrain: Terrain) -> bool {
        if x >= self.width || row >= self.height {
            return false;
        }
        let i = row as usize * self.width as usize + x as usize;
        self.cells[i] = terrain;
        true
    }

    /// Render in the format accepted by [`parse_csv`](Self::parse_csv).
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() * 2);
        for row in self.cells.chunks(self.width as usize) {
            for (i, t) in row.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push(t.digit());
            }
            out.push('\n');
        }
        out
    }
}
