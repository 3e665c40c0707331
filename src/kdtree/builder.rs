use std::marker::PhantomData;

use log::{debug, trace};

use crate::error::{KdIndexError, Result};
use crate::geometry::{axis_of_highest_variance, cmp_coord, median_value_in_axis, Hyperplane};
use crate::kdtree::index::KDTreeMetadata;
use crate::kdtree::{KDTree, Node};
use crate::r#type::IndexableNum;

/// A builder to create a [`KDTree`].
///
/// The builder only borrows the points; the finished tree refers to them by position.
///
/// ```
/// use kd_index::kdtree::{KDTreeBuilder, KDTreeIndex};
///
/// let points = vec![vec![0., 0.], vec![5., 5.], vec![9., 1.], vec![100., 100.]];
///
/// // index only the first three points
/// let tree = KDTreeBuilder::new(&points)
///     .indices(vec![0, 1, 2])
///     .finish()
///     .unwrap();
/// assert_eq!(tree.num_items(), 3);
/// assert_eq!(tree.nearest(&points, &[90., 90.]).unwrap(), 1);
/// ```
pub struct KDTreeBuilder<'a, N: IndexableNum, P: AsRef<[N]>> {
    points: &'a [P],
    indices: Option<Vec<u32>>,
    phantom: PhantomData<N>,
}

impl<'a, N: IndexableNum, P: AsRef<[N]>> KDTreeBuilder<'a, N, P> {
    /// Create a new builder over all of `points`.
    pub fn new(points: &'a [P]) -> Self {
        Self {
            points,
            indices: None,
            phantom: PhantomData,
        }
    }

    /// Only index the points at these positions of the point array.
    pub fn indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Consume this builder, recursively splitting the points and generating a KDTree ready for
    /// queries.
    pub fn finish(self) -> Result<KDTree<N>> {
        let points = self.points;
        let ids = match self.indices {
            Some(ids) => {
                check_indices(&ids, points.len())?;
                ids
            }
            None => {
                let len = u32::try_from(points.len())
                    .map_err(|_| KdIndexError::TooManyPoints(points.len()))?;
                (0..len).collect()
            }
        };
        if ids.is_empty() {
            return Err(KdIndexError::EmptyInput);
        }
        let num_items =
            u32::try_from(ids.len()).map_err(|_| KdIndexError::TooManyPoints(ids.len()))?;

        let dimensionality = check_points(points, &ids)?;
        let root = build_nodes(points, ids)?;

        debug!(
            "built kd-tree over {} points of dimensionality {}, depth {}",
            num_items,
            dimensionality,
            root.depth()
        );

        Ok(KDTree {
            metadata: KDTreeMetadata::new(dimensionality, num_items),
            root,
        })
    }
}

fn check_indices(ids: &[u32], len: usize) -> Result<()> {
    let mut seen = vec![false; len];
    for &id in ids {
        match seen.get_mut(id as usize) {
            Some(true) => return Err(KdIndexError::DuplicateIndex(id)),
            Some(slot) => *slot = true,
            None => {
                return Err(KdIndexError::IndexOutOfRange {
                    index: id as usize,
                    len,
                })
            }
        }
    }
    Ok(())
}

/// Checks every indexed point has the same dimensionality and only finite coordinates, returning the
/// dimensionality.
fn check_points<N: IndexableNum, P: AsRef<[N]>>(points: &[P], ids: &[u32]) -> Result<usize> {
    let dimensionality = points[ids[0] as usize].as_ref().len();
    if dimensionality == 0 {
        return Err(KdIndexError::InvalidAxis {
            axis: 0,
            dimensionality,
        });
    }
    if u32::try_from(dimensionality).is_err() {
        return Err(KdIndexError::DimensionMismatch {
            expected: u32::MAX as usize,
            actual: dimensionality,
        });
    }

    for &id in ids {
        let point = points[id as usize].as_ref();
        if point.len() != dimensionality {
            return Err(KdIndexError::DimensionMismatch {
                expected: dimensionality,
                actual: point.len(),
            });
        }
        if let Some(axis) = point.iter().position(|v| !v.is_finite()) {
            return Err(KdIndexError::NonFiniteCoordinate {
                index: id as usize,
                axis,
            });
        }
    }
    Ok(dimensionality)
}

#[inline]
fn coord<N: IndexableNum, P: AsRef<[N]>>(points: &[P], id: u32, axis: usize) -> N {
    points[id as usize].as_ref()[axis]
}

enum Task<N: IndexableNum> {
    /// Build the subtree over these points.
    Split(Vec<u32>),
    /// Join the two most recently built subtrees under this plane.
    Join(Hyperplane<N>),
}

/// Split `ids` at the median of their widest axis, again and again, down to single points.
///
/// Ties at the median can leave one side with all but one point, so the tree may be as deep as
/// it has points; the pending work is kept on the heap rather than the call stack.
fn build_nodes<N: IndexableNum, P: AsRef<[N]>>(points: &[P], ids: Vec<u32>) -> Result<Node<N>> {
    let mut tasks = vec![Task::Split(ids)];
    let mut built: Vec<Node<N>> = vec![];

    while let Some(task) = tasks.pop() {
        match task {
            Task::Split(ids) if ids.len() == 1 => built.push(Node::Leaf {
                point_index: ids[0],
            }),
            Task::Split(ids) => {
                let (hyperplane, left, right) = split(points, ids)?;
                // pushed in backwards order to what gets popped
                tasks.push(Task::Join(hyperplane));
                tasks.push(Task::Split(right));
                tasks.push(Task::Split(left));
            }
            Task::Join(hyperplane) => {
                let (Some(right), Some(left)) = (built.pop(), built.pop()) else {
                    return Err(KdIndexError::General(
                        "Subtree missing while joining a split.".to_string(),
                    ));
                };
                built.push(Node::interior(hyperplane, left, right));
            }
        }
    }

    match (built.pop(), built.is_empty()) {
        (Some(root), true) => Ok(root),
        _ => Err(KdIndexError::General(
            "Build did not end in a single root.".to_string(),
        )),
    }
}

/// Partition at least two `ids` into the points left and right of a plane on their widest axis.
fn split<N: IndexableNum, P: AsRef<[N]>>(
    points: &[P],
    ids: Vec<u32>,
) -> Result<(Hyperplane<N>, Vec<u32>, Vec<u32>)> {
    let axis = axis_of_highest_variance(ids.iter().map(|&id| points[id as usize].as_ref()))?;
    let median = median_value_in_axis(ids.iter().map(|&id| points[id as usize].as_ref()), axis)?;

    let n = ids.len();
    let (left, right): (Vec<u32>, Vec<u32>) = ids
        .into_iter()
        .partition(|&id| coord(points, id, axis) <= median);

    if left.is_empty() || right.is_empty() {
        // Every point landed on one side: the median is the maximum. Split positionally in axis
        // order instead; the plane sits on the last left point, so left <= value <= right.
        let mut ids = if left.is_empty() { right } else { left };
        ids.sort_by(|&a, &b| cmp_coord(&coord(points, a, axis), &coord(points, b, axis)));
        let right = ids.split_off(n.div_ceil(2));
        let value = coord(points, ids[ids.len() - 1], axis);
        trace!(
            "degenerate split of {} points on axis {}, splitting at position {}",
            n,
            axis,
            ids.len()
        );
        Ok((Hyperplane::new(axis, value), ids, right))
    } else {
        Ok((Hyperplane::new(axis, median), left, right))
    }
}
