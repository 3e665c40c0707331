#[cfg(feature = "rayon")]
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tinyvec::TinyVec;

use crate::error::{KdIndexError, Result};
use crate::geometry::{euclidean, plane_gap};
use crate::kdtree::{KDTree, KDTreeMetadata, Node};
use crate::r#type::IndexableNum;

/// The closest indexed point to a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the point in the caller's point array.
    pub index: u32,
    /// Euclidean distance from the query to the point.
    pub distance: f64,
}

/// A trait for searching and accessing data out of a KDTree.
pub trait KDTreeIndex<N: IndexableNum>: Sized {
    /// The root node of the tree, for manual traversal.
    fn root(&self) -> &Node<N>;

    /// Access the metadata describing this KDTree
    fn metadata(&self) -> &KDTreeMetadata;

    /// The number of coordinates of every point in this KDTree
    fn dimensionality(&self) -> usize {
        self.metadata().dimensionality()
    }

    /// The number of items in this KDTree
    fn num_items(&self) -> u32 {
        self.metadata().num_items()
    }

    /// Number of edges on the longest root-to-leaf path.
    fn depth(&self) -> usize {
        self.root().depth()
    }

    /// Find the index of the indexed point closest to `query`.
    ///
    /// `points` must be the array the tree was built from. If several points are equally close,
    /// the first one reached wins. Every coordinate of `query` must be finite.
    fn nearest<P: AsRef<[N]>>(&self, points: &[P], query: &[N]) -> Result<u32> {
        Ok(self.nearest_neighbor(points, query)?.index)
    }

    /// Find the indexed point closest to `query`, along with its distance.
    ///
    /// Descends to the leaf on the query's side of every split, then backtracks through the
    /// remembered far sides, skipping any whose splitting plane is at least as far away as the
    /// best match found so far.
    fn nearest_neighbor<P: AsRef<[N]>>(&self, points: &[P], query: &[N]) -> Result<Neighbor> {
        let dimensionality = self.dimensionality();
        if query.len() != dimensionality {
            return Err(KdIndexError::DimensionMismatch {
                expected: dimensionality,
                actual: query.len(),
            });
        }
        if let Some(axis) = query.iter().position(|v| !v.is_finite()) {
            return Err(KdIndexError::NonFiniteQuery { axis });
        }

        // Use TinyVec to avoid heap allocations
        let mut stack: TinyVec<[Frame<'_, N>; 32]> = TinyVec::new();
        stack.push(Frame {
            node: Some(self.root()),
            plane_distance: 0.0,
        });

        let mut best: Option<Neighbor> = None;
        let mut best_distance = f64::INFINITY;

        while let Some(frame) = stack.pop() {
            if frame.plane_distance >= best_distance {
                continue;
            }
            let Some(mut node) = frame.node else {
                continue;
            };

            loop {
                match node {
                    Node::Interior {
                        hyperplane,
                        left,
                        right,
                    } => {
                        let (near, far) = if hyperplane.is_left(query) {
                            (&**left, &**right)
                        } else {
                            (&**right, &**left)
                        };
                        stack.push(Frame {
                            node: Some(far),
                            plane_distance: plane_gap(query[hyperplane.axis], hyperplane.value),
                        });
                        node = near;
                    }
                    Node::Leaf { point_index } => {
                        let index = *point_index as usize;
                        let point = points
                            .get(index)
                            .ok_or(KdIndexError::IndexOutOfRange {
                                index,
                                len: points.len(),
                            })?
                            .as_ref();
                        if point.len() != dimensionality {
                            return Err(KdIndexError::DimensionMismatch {
                                expected: dimensionality,
                                actual: point.len(),
                            });
                        }

                        // the first leaf always counts, even if its distance overflowed
                        let distance = euclidean(query, point);
                        if best.is_none() || distance < best_distance {
                            best_distance = distance;
                            best = Some(Neighbor {
                                index: *point_index,
                                distance,
                            });
                        }
                        break;
                    }
                }
            }
        }

        best.ok_or_else(|| {
            KdIndexError::General("Search reached no leaf.".to_string())
        })
    }

    /// Answer many queries against the same tree.
    ///
    /// With the `rayon` feature the queries are answered in parallel; the tree is only read.
    fn nearest_batch<P, Q>(&self, points: &[P], queries: &[Q]) -> Result<Vec<Neighbor>>
    where
        Self: Sync,
        P: AsRef<[N]> + Sync,
        Q: AsRef<[N]> + Sync,
    {
        #[cfg(feature = "rayon")]
        let results = queries
            .par_iter()
            .map(|query| self.nearest_neighbor(points, query.as_ref()))
            .collect();

        #[cfg(not(feature = "rayon"))]
        let results = queries
            .iter()
            .map(|query| self.nearest_neighbor(points, query.as_ref()))
            .collect();

        results
    }
}

/// A far side remembered for backtracking.
#[derive(Debug, Clone, Copy)]
struct Frame<'a, N: IndexableNum> {
    node: Option<&'a Node<N>>,
    /// Distance from the query to the plane separating `node` from the side already searched.
    plane_distance: f64,
}

impl<N: IndexableNum> Default for Frame<'_, N> {
    fn default() -> Self {
        Self {
            node: None,
            plane_distance: 0.0,
        }
    }
}

impl<N: IndexableNum> KDTreeIndex<N> for KDTree<N> {
    fn root(&self) -> &Node<N> {
        &self.root
    }

    fn metadata(&self) -> &KDTreeMetadata {
        &self.metadata
    }
}
