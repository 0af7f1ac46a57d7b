//! Point correspondence across a shared face.
//!
//! Two elements sharing a face number its points independently. The matcher
//! pairs them by coordinates: two points coincide when every component
//! agrees within [`MATCH_TOLERANCE`].

use thiserror::Error;

/// Absolute per-component tolerance for coincident points.
pub const MATCH_TOLERANCE: f64 = 100.0 * f64::EPSILON;

/// Failure to pair two face point sets.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FaceMatchError {
    /// The two sets hold a different number of points.
    #[error("face point count mismatch: {left} against {right}")]
    CountMismatch { left: usize, right: usize },

    /// A point has no coincident partner.
    #[error("no coincident point for face point {point} at {coord:?}")]
    Unmatched { point: usize, coord: Vec<f64> },
}

/// Coordinate-proximity face point matcher.
#[derive(Clone, Copy, Debug, Default)]
pub struct FaceMatcher;

impl FaceMatcher {
    /// For every point of `left`, the index of the coincident point of
    /// `right`.
    ///
    /// The result is a bijection: a point of `right` already paired is not
    /// reused, so duplicated coordinates fail as unmatched. A single point per
    /// face matches trivially.
    pub fn match_points<const NDIM: usize>(
        left: &[[f64; NDIM]],
        right: &[[f64; NDIM]],
    ) -> Result<Vec<usize>, FaceMatchError> {
        if left.len() != right.len() {
            return Err(FaceMatchError::CountMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        if left.len() == 1 {
            return Ok(vec![0]);
        }

        // Each point of `right` pairs with at most one point of `left`
        let mut taken = vec![false; right.len()];
        left.iter()
            .enumerate()
            .map(|(point, a)| -> Result<usize, FaceMatchError> {
                let j = (0..right.len())
                    .find(|&j| !taken[j] && coincident(a, &right[j]))
                    .ok_or_else(|| FaceMatchError::Unmatched {
                        point,
                        coord: a.to_vec(),
                    })?;
                taken[j] = true;
                Ok(j)
            })
            .collect()
    }
}

#[inline]
fn coincident<const NDIM: usize>(a: &[f64; NDIM], b: &[f64; NDIM]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() <= MATCH_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_point_identity() {
        // Coordinates are not compared at order 0
        let m = FaceMatcher::match_points(&[[0.0, 1.0]], &[[5.0, 5.0]]).unwrap();
        assert_eq!(m, vec![0]);
    }

    #[test]
    fn test_reversed_sets() {
        let a = [[0.0, 0.1], [0.0, 0.5], [0.0, 0.9]];
        let b = [[0.0, 0.9], [0.0, 0.5], [0.0, 0.1]];
        assert_eq!(FaceMatcher::match_points(&a, &b).unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn test_bijection_and_idempotence() {
        let a = [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0]];
        let b = [a[3], a[0], a[2], a[1]];
        let first = FaceMatcher::match_points(&a, &b).unwrap();
        let second = FaceMatcher::match_points(&a, &b).unwrap();
        assert_eq!(first, second);

        let mut seen = first.clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
        for (i, &j) in first.iter().enumerate() {
            assert_eq!(a[i], b[j]);
        }
    }

    #[test]
    fn test_within_tolerance() {
        let a = [[0.25], [0.75]];
        let b = [[0.75 + 10.0 * f64::EPSILON], [0.25 - 10.0 * f64::EPSILON]];
        assert_eq!(FaceMatcher::match_points(&a, &b).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_beyond_tolerance() {
        let a = [[0.0, 0.25], [0.0, 0.75]];
        let b = [[0.0, 0.25], [0.0, 0.75 + 1e-10]];
        let err = FaceMatcher::match_points(&a, &b).unwrap_err();
        assert_eq!(
            err,
            FaceMatchError::Unmatched {
                point: 1,
                coord: vec![0.0, 0.75]
            }
        );
    }

    #[test]
    fn test_duplicate_points_are_not_reused() {
        // Degenerate face: two coincident points on the left
        let a = [[0.0, 0.5], [0.0, 0.5]];
        let b = [[0.0, 0.5], [0.0, 0.9]];
        let err = FaceMatcher::match_points(&a, &b).unwrap_err();
        assert_eq!(
            err,
            FaceMatchError::Unmatched {
                point: 1,
                coord: vec![0.0, 0.5]
            }
        );

        // Duplicates on both sides still pair one to one
        let m = FaceMatcher::match_points(&a, &a).unwrap();
        assert_eq!(m, vec![0, 1]);
    }

    #[test]
    fn test_count_mismatch() {
        let err = FaceMatcher::match_points(&[[0.0], [1.0]], &[[0.0]]).unwrap_err();
        assert_eq!(err, FaceMatchError::CountMismatch { left: 2, right: 1 });
    }
}
