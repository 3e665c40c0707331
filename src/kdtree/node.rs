use std::fmt;

use crate::geometry::Hyperplane;
use crate::kdtree::traversal::Leaves;
use crate::r#type::IndexableNum;

/// A node of a [`KDTree`][crate::kdtree::KDTree].
///
/// Interior nodes own both children outright; nothing in a tree is shared, and nothing can be
/// changed once the builder has returned it.
///
/// Trees can be as deep as they have points, so comparing and dropping nodes walk the tree with an
/// explicit stack.
#[derive(Debug, Clone)]
pub enum Node<N: IndexableNum> {
    /// A split of the points below this node into two halves.
    Interior {
        /// Points with `coord[axis] <= value` are in `left`, the rest in `right`.
        hyperplane: Hyperplane<N>,
        /// The lower half.
        left: Box<Node<N>>,
        /// The upper half.
        right: Box<Node<N>>,
    },
    /// A single stored point.
    Leaf {
        /// Position of the point in the caller's point array.
        point_index: u32,
    },
}

impl<N: IndexableNum> Node<N> {
    pub(crate) fn interior(hyperplane: Hyperplane<N>, left: Node<N>, right: Node<N>) -> Self {
        Node::Interior {
            hyperplane,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Returns `true` if this is a leaf node without children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Returns `true` if this is an intermediate node with children.
    #[inline]
    pub fn is_parent(&self) -> bool {
        !self.is_leaf()
    }

    /// The splitting plane of an interior node.
    pub fn hyperplane(&self) -> Option<&Hyperplane<N>> {
        match self {
            Node::Interior { hyperplane, .. } => Some(hyperplane),
            Node::Leaf { .. } => None,
        }
    }

    /// The `(left, right)` children of an interior node.
    pub fn children(&self) -> Option<(&Node<N>, &Node<N>)> {
        match self {
            Node::Interior { left, right, .. } => Some((&**left, &**right)),
            Node::Leaf { .. } => None,
        }
    }

    /// The point referenced by a leaf.
    pub fn point_index(&self) -> Option<u32> {
        match self {
            Node::Leaf { point_index } => Some(*point_index),
            Node::Interior { .. } => None,
        }
    }

    /// Number of edges on the longest path down to a leaf. A lone leaf has depth 0.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self, 0)];
        while let Some((node, depth)) = stack.pop() {
            match node {
                Node::Leaf { .. } => max_depth = max_depth.max(depth),
                Node::Interior { left, right, .. } => {
                    stack.push((&**right, depth + 1));
                    stack.push((&**left, depth + 1));
                }
            }
        }
        max_depth
    }

    /// Number of leaves, i.e. points, below this node.
    pub fn num_leaves(&self) -> usize {
        self.leaves().count()
    }

    /// The point indices of all leaves below this node, left to right.
    pub fn leaves(&self) -> Leaves<'_, N> {
        Leaves::new(self)
    }
}

impl<N: IndexableNum> PartialEq for Node<N> {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some(pair) = stack.pop() {
            match pair {
                (Node::Leaf { point_index: a }, Node::Leaf { point_index: b }) => {
                    if a != b {
                        return false;
                    }
                }
                (
                    Node::Interior {
                        hyperplane: a,
                        left: a_left,
                        right: a_right,
                    },
                    Node::Interior {
                        hyperplane: b,
                        left: b_left,
                        right: b_right,
                    },
                ) => {
                    if a != b {
                        return false;
                    }
                    stack.push((&**a_right, &**b_right));
                    stack.push((&**a_left, &**b_left));
                }
                _ => return false,
            }
        }
        true
    }
}

impl<N: IndexableNum> Drop for Node<N> {
    fn drop(&mut self) {
        let Node::Interior { left, right, .. } = self else {
            return;
        };
        if left.is_leaf() && right.is_leaf() {
            return;
        }

        // move every grandchild out before its parent is freed, so no drop recurses
        let mut stack = vec![take(&mut **left), take(&mut **right)];
        while let Some(mut node) = stack.pop() {
            if let Node::Interior { left, right, .. } = &mut node {
                stack.push(take(&mut **left));
                stack.push(take(&mut **right));
            }
        }
    }
}

fn take<N: IndexableNum>(node: &mut Node<N>) -> Node<N> {
    std::mem::replace(node, Node::Leaf { point_index: 0 })
}

impl<N: IndexableNum> fmt::Display for Node<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Leaf { point_index } => write!(f, "Leaf(point {})", point_index),
            Node::Interior { hyperplane, .. } => {
                write!(f, "Interior({}, {} points)", hyperplane, self.num_leaves())
            }
        }
    }
}
