//! Error types for grid construction and terrain loading.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Errors arising from graph construction or terrain map loading.
#[derive(Debug)]
pub enum GridError {
    /// Attempted to construct a grid with zero cells.
    EmptyGrid,
    /// Width or height does not fit the coordinate range.
    DimensionsTooLarge {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// World units per cell must be finite and positive.
    InvalidNodeDistance {
        /// The offending value.
        value: f32,
    },
    /// The terrain map file could not be read.
    MapIo {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// A terrain map cell could not be parsed.
    MapParse {
        /// 1-based line number.
        line: usize,
        /// 1-based cell index within the line.
        column: usize,
        /// What went wrong.
        reason: String,
    },
    /// A terrain map row has a different width than the first row.
    RaggedMap {
        /// 1-based line number.
        line: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of this row.
        found: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "grid must have at least one cell"),
            Self::DimensionsTooLarge { width, height } => {
                write!(f, "grid dimensions {width}x{height} exceed the coordinate range")
            }
            Self::InvalidNodeDistance { value } => {
                write!(f, "node distance must be finite and positive, got {value}")
            }
            Self::MapIo { path, source } => {
                write!(f, "cannot read terrain map {}: {source}", path.display())
            }
            Self::MapParse {
                line,
                column,
                reason,
            } => write!(f, "terrain map line {line}, cell {column}: {reason}"),
            Self::RaggedMap {
                line,
                expected,
                found,
            } => write!(
                f,
                "terrain map line {line} has {found} cells, expected {expected}"
            ),
        }
    }
}

impl Error for GridError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MapIo { source, .. } => Some(source),
            _ => None,
        }
    }
}
