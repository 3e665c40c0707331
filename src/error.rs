use std::fmt::Debug;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum KdIndexError {
    #[error("General error: {0}")]
    General(String),

    #[error("Cannot index an empty point set.")]
    EmptyInput,

    #[error("Expected {expected} dimensions, got {actual}.")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Axis {axis} out of range for {dimensionality}-dimensional points.")]
    InvalidAxis { axis: usize, dimensionality: usize },

    #[error("Coordinate {axis} of point {index} is not finite.")]
    NonFiniteCoordinate { index: usize, axis: usize },

    #[error("Coordinate {axis} of the query is not finite.")]
    NonFiniteQuery { axis: usize },

    #[error("Point index {index} out of range for {len} points.")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Point index {0} given more than once.")]
    DuplicateIndex(u32),

    #[error("Got {0} points, at most u32::MAX can be indexed.")]
    TooManyPoints(usize),

    #[error("Truncated tree buffer: needed {needed} more bytes at offset {offset}.")]
    Truncated { offset: usize, needed: usize },

    #[error("Unknown node tag {tag} at offset {offset}.")]
    UnknownNodeTag { tag: u8, offset: usize },

    #[error("Corrupt tree buffer: {0}")]
    Corrupt(String),

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KdIndexError>;
