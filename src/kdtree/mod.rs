//! An immutable k-d tree over points of any dimensionality, with exact nearest-point search and a
//! compact binary serialization.

#![warn(missing_docs)]

mod builder;
pub(crate) mod constants;
mod index;
mod node;
mod serialize;
mod r#trait;
mod traversal;

pub use builder::KDTreeBuilder;
pub use index::{KDTree, KDTreeMetadata};
pub use node::Node;
pub use r#trait::{KDTreeIndex, Neighbor};
pub use traversal::Leaves;
