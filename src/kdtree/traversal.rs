//! Utilities to traverse the KDTree structure.

use crate::kdtree::Node;
use crate::r#type::IndexableNum;

/// Iterator over the point indices stored in a subtree, in left-to-right order.
///
/// Created by [`Node::leaves`].
#[derive(Debug, Clone)]
pub struct Leaves<'a, N: IndexableNum> {
    stack: Vec<&'a Node<N>>,
}

impl<'a, N: IndexableNum> Leaves<'a, N> {
    pub(crate) fn new(root: &'a Node<N>) -> Self {
        Self { stack: vec![root] }
    }
}

impl<N: IndexableNum> Iterator for Leaves<'_, N> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf { point_index } => return Some(*point_index),
                Node::Interior { left, right, .. } => {
                    // pushed in backwards order to what gets popped
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }
        None
    }
}
