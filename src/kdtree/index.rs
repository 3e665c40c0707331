use crate::error::Result;
use crate::kdtree::{KDTreeBuilder, Node};
use crate::r#type::IndexableNum;

/// The fixed facts about a tree, stored once in the serialized header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KDTreeMetadata {
    pub(crate) dimensionality: usize,
    pub(crate) num_items: u32,
}

impl KDTreeMetadata {
    pub(crate) fn new(dimensionality: usize, num_items: u32) -> Self {
        Self {
            dimensionality,
            num_items,
        }
    }

    /// The number of coordinates of every point in the tree.
    pub fn dimensionality(&self) -> usize {
        self.dimensionality
    }

    /// The number of points (leaves) in the tree.
    pub fn num_items(&self) -> u32 {
        self.num_items
    }
}

/// An immutable k-d tree.
///
/// The tree stores only the positions of points in the caller's point array, never their
/// coordinates, so the same array must be handed to every query. Create one with
/// [`KDTree::build`] or [`KDTreeBuilder`], or reload one with [`KDTree::from_bytes`].
///
/// ```
/// use kd_index::kdtree::{KDTree, KDTreeIndex};
///
/// let points = vec![[0., 0.], [5., 5.], [9., 1.]];
/// let tree = KDTree::build(&points).unwrap();
/// assert_eq!(tree.nearest(&points, &[8., 2.]).unwrap(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct KDTree<N: IndexableNum> {
    pub(crate) metadata: KDTreeMetadata,
    pub(crate) root: Node<N>,
}

impl<N: IndexableNum> KDTree<N> {
    /// Build a tree over every point of `points`, using each point's position as its index.
    pub fn build<P: AsRef<[N]>>(points: &[P]) -> Result<Self> {
        KDTreeBuilder::new(points).finish()
    }

    /// Take the node graph out of the tree.
    pub fn into_root(self) -> Node<N> {
        self.root
    }
}
