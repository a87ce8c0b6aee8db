//! Error types for partition queries.

use std::error::Error;
use std::fmt;

/// Errors from partition queries and policy parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoronoiError {
    /// No partition has been generated for this owner kind.
    NotGenerated {
        /// Display form of the requested kind.
        kind: String,
    },
    /// A partition policy name was not recognised.
    UnknownPolicy {
        /// The rejected name.
        name: String,
    },
}

impl fmt::Display for VoronoiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotGenerated { kind } => write!(f, "no partition generated for {kind}"),
            Self::UnknownPolicy { name } => write!(f, "unknown partition policy {name:?}"),
        }
    }
}

impl Error for VoronoiError {}
