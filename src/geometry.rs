//! Point-set geometry used to choose and evaluate k-d tree splits.
//!
//! Every function takes points as coordinate slices, so callers can pass any subset of their own
//! point storage (`points.iter().map(AsRef::as_ref)`) without copying it.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{KdIndexError, Result};
use crate::r#type::IndexableNum;

/// An axis-aligned splitting plane: all points with `coord[axis] <= value` lie on its left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperplane<N: IndexableNum> {
    /// The coordinate dimension the plane is perpendicular to.
    pub axis: usize,
    /// Where along `axis` the plane sits.
    pub value: N,
}

impl<N: IndexableNum> Hyperplane<N> {
    pub fn new(axis: usize, value: N) -> Self {
        Self { axis, value }
    }

    /// `true` if `point` is routed to the left subtree of a node split on this plane.
    #[inline]
    pub(crate) fn is_left(&self, point: &[N]) -> bool {
        point[self.axis] <= self.value
    }
}

impl<N: IndexableNum> fmt::Display for Hyperplane<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x[{}] <= {:?}", self.axis, self.value)
    }
}

/// The `(min, max)` of every axis, in one pass.
///
/// The number of axes is taken from the first point. Returns an empty vector for an empty input.
pub fn min_max_per_axis<'a, N: IndexableNum>(
    points: impl IntoIterator<Item = &'a [N]>,
) -> Vec<(N, N)> {
    let mut points = points.into_iter();
    let Some(first) = points.next() else {
        return vec![];
    };

    let mut extents: Vec<(N, N)> = first.iter().map(|&v| (v, v)).collect();
    for point in points {
        for (extent, &v) in extents.iter_mut().zip(point) {
            if v < extent.0 {
                extent.0 = v;
            }
            if v > extent.1 {
                extent.1 = v;
            }
        }
    }
    extents
}

/// The axis whose coordinates span the widest range.
///
/// Ties go to the lowest axis.
pub fn axis_of_highest_variance<'a, N: IndexableNum>(
    points: impl IntoIterator<Item = &'a [N]>,
) -> Result<usize> {
    let extents = min_max_per_axis(points);
    if extents.is_empty() {
        return Err(KdIndexError::EmptyInput);
    }

    // spreads are widened first: `max - min` can overflow the narrow signed types
    let mut axis = 0;
    let mut largest = extents[0].1.as_f64() - extents[0].0.as_f64();
    for (i, (min, max)) in extents.iter().enumerate().skip(1) {
        let spread = max.as_f64() - min.as_f64();
        if spread > largest {
            largest = spread;
            axis = i;
        }
    }
    Ok(axis)
}

/// The lower median of the points' coordinates on `axis`: the element at position `n / 2` of the
/// sorted values. Even counts do not average the two middles.
pub fn median_value_in_axis<'a, N: IndexableNum>(
    points: impl IntoIterator<Item = &'a [N]>,
    axis: usize,
) -> Result<N> {
    let mut values = vec![];
    for point in points {
        let Some(&value) = point.get(axis) else {
            return Err(KdIndexError::InvalidAxis {
                axis,
                dimensionality: point.len(),
            });
        };
        values.push(value);
    }
    if values.is_empty() {
        return Err(KdIndexError::EmptyInput);
    }

    let n = values.len() / 2;
    let (_, median, _) = values.select_nth_unstable_by(n, cmp_coord);
    Ok(*median)
}

/// Euclidean distance between two points of the same dimensionality.
pub fn distance<N: IndexableNum>(a: &[N], b: &[N]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(KdIndexError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(euclidean(a, b))
}

/// Distance from a point to an axis-aligned plane, i.e. `|point[axis] - value|`.
pub fn distance_to_plane<N: IndexableNum>(point: &[N], plane: &Hyperplane<N>) -> Result<f64> {
    match point.get(plane.axis) {
        Some(&v) => Ok(plane_gap(v, plane.value)),
        None => Err(KdIndexError::InvalidAxis {
            axis: plane.axis,
            dimensionality: point.len(),
        }),
    }
}

#[inline]
pub(crate) fn euclidean<N: IndexableNum>(a: &[N], b: &[N]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x.as_f64() - y.as_f64();
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[inline]
pub(crate) fn plane_gap<N: IndexableNum>(v: N, value: N) -> f64 {
    (v.as_f64() - value.as_f64()).abs()
}

/// Total order for coordinates. NaN never reaches a tree, so it is treated as equal.
#[inline]
pub(crate) fn cmp_coord<N: IndexableNum>(a: &N, b: &N) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    fn sample() -> Vec<[f64; 2]> {
        vec![[0., 0.], [5., 5.], [9., 1.]]
    }

    fn slices<N: IndexableNum, const D: usize>(points: &[[N; D]]) -> impl Iterator<Item = &[N]> {
        points.iter().map(|p| p.as_slice())
    }

    #[test]
    fn extents_per_axis() {
        let points = sample();
        assert_eq!(min_max_per_axis(slices(&points)), vec![(0., 9.), (0., 5.)]);

        let empty: Vec<[f64; 2]> = vec![];
        assert!(min_max_per_axis(slices(&empty)).is_empty());
    }

    #[test]
    fn widest_axis() {
        let points = sample();
        assert_eq!(axis_of_highest_variance(slices(&points)).unwrap(), 0);

        let tall = vec![[0, 0], [1, 10], [2, 3]];
        assert_eq!(axis_of_highest_variance(slices(&tall)).unwrap(), 1);
    }

    #[test]
    fn widest_axis_ties_go_low() {
        let points = vec![[0., 0., 0.], [5., 5., 5.]];
        assert_eq!(axis_of_highest_variance(slices(&points)).unwrap(), 0);

        let points = vec![[0., 0., 0.], [1., 5., 5.]];
        assert_eq!(axis_of_highest_variance(slices(&points)).unwrap(), 1);
    }

    #[test]
    fn widest_axis_does_not_overflow() {
        let points: Vec<[i8; 2]> = vec![[-128, 0], [127, 100]];
        assert_eq!(axis_of_highest_variance(slices(&points)).unwrap(), 0);
    }

    #[test]
    fn widest_axis_of_nothing() {
        let empty: Vec<[f64; 2]> = vec![];
        assert!(matches!(
            axis_of_highest_variance(slices(&empty)),
            Err(KdIndexError::EmptyInput)
        ));
    }

    #[test]
    fn median_is_element_at_half() {
        let points = sample();
        assert_eq!(median_value_in_axis(slices(&points), 0).unwrap(), 5.);
        assert_eq!(median_value_in_axis(slices(&points), 1).unwrap(), 1.);

        // even count picks the upper of the two middles, no averaging
        let points = vec![[4], [1], [3], [2]];
        assert_eq!(median_value_in_axis(slices(&points), 0).unwrap(), 3);
    }

    #[test]
    fn median_errors() {
        let points = sample();
        assert!(matches!(
            median_value_in_axis(slices(&points), 2),
            Err(KdIndexError::InvalidAxis {
                axis: 2,
                dimensionality: 2
            })
        ));

        let empty: Vec<[f64; 2]> = vec![];
        assert!(matches!(
            median_value_in_axis(slices(&empty), 0),
            Err(KdIndexError::EmptyInput)
        ));
    }

    #[test]
    fn plane_display() {
        assert_eq!(Hyperplane::new(1, 4.5).to_string(), "x[1] <= 4.5");
        assert_eq!(Hyperplane::new(0, 7u8).to_string(), "x[0] <= 7");
    }

    #[test]
    fn point_distance() {
        assert_relative_eq!(distance(&[8., 2.], &[9., 1.]).unwrap(), 2f64.sqrt());
        assert_relative_eq!(distance(&[0u8, 0], &[3, 4]).unwrap(), 5.);
        assert_relative_eq!(distance(&[-100i8], &[100]).unwrap(), 200.);
        assert!(matches!(
            distance(&[0., 0.], &[0., 0., 0.]),
            Err(KdIndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn plane_distance() {
        let plane = Hyperplane::new(1, 4.);
        assert_relative_eq!(distance_to_plane(&[100., 1.5], &plane).unwrap(), 2.5);
        assert_relative_eq!(distance_to_plane(&[0., 6.], &plane).unwrap(), 2.);
        assert!(matches!(
            distance_to_plane(&[1.], &plane),
            Err(KdIndexError::InvalidAxis { axis: 1, .. })
        ));
    }
}
