//! Error types for field map loading, lookup and evaluation

use std::fmt;
use thiserror::Error;

/// Component/row/slice indices declared at the head of a map data line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexTriple {
    pub ax: usize,
    pub iy: usize,
    pub iz: usize,
}

impl IndexTriple {
    pub fn new(ax: usize, iy: usize, iz: usize) -> Self {
        Self { ax, iy, iz }
    }
}

impl fmt::Display for IndexTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(ax={}, iy={}, iz={})", self.ax, self.iy, self.iz)
    }
}

#[derive(Debug, Error)]
pub enum FieldMapError {
    /// Malformed header or data line
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A data line declares indices that do not match its position in the file
    #[error("line {line}: expected map line {expected} but found {actual}")]
    DataIntegrity {
        line: usize,
        expected: IndexTriple,
        actual: IndexTriple,
    },

    /// The stream ended before all data lines were read
    #[error("map truncated: expected {expected} data lines, found {found}")]
    TruncatedInput { expected: usize, found: usize },

    #[error("invalid map handle {handle} (registry holds {len} maps)")]
    InvalidHandle { handle: usize, len: usize },

    /// Only raised when the configured field does not zero out-of-map points
    #[error("position ({x}, {y}, {z}) m lies outside the field map")]
    OutsideMap { x: f64, y: f64, z: f64 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FieldMapError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        FieldMapError::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FieldMapError>;
