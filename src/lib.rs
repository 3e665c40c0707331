#![doc = include_str!("../README.md")]

pub mod csv;
mod error;
pub mod geometry;
pub mod kdtree;
mod r#type;

pub use error::{KdIndexError, Result};
pub use r#type::{CoordType, IndexableNum};
