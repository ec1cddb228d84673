//! Removal of items with missing distances
//!
//! Linkage needs a complete distance matrix. [`repair`] drops items until no
//! missing entry is left, always dropping the item involved in the most
//! missing entries first. This greedy rule is not guaranteed to drop the
//! fewest possible items (that is a minimum vertex cover of the
//! missing-entry graph), but it is fast and deterministic.

use crate::distance::DistanceMatrix;

/// A distance matrix without missing entries, plus which items survived.
#[derive(Debug, Clone, PartialEq)]
pub struct Repaired {
    /// Distances between the kept items, in their original relative order.
    pub distances: DistanceMatrix,
    /// One flag per original item, `true` if the item was kept.
    pub keep: Vec<bool>,
    /// Number of dropped items.
    pub removed: usize,
}

/// Original indices of the `true` entries of a retention mask.
#[must_use]
pub fn kept_indices(keep: &[bool]) -> Vec<usize> {
    keep.iter()
        .enumerate()
        .filter_map(|(i, kept)| kept.then_some(i))
        .collect()
}

/// Drops items until `distances` has no missing entry.
///
/// While a missing entry remains, the kept item with the most missing
/// entries in its row is dropped (the lowest index wins ties) and the counts
/// are updated. Diagonal entries are ignored. A matrix without missing
/// entries is returned unchanged with every item kept.
///
/// Dropping items is reported as a warning, not an error.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use seriate_cluster::{distance::DistanceMatrix, repair::repair};
///
/// let nan = f64::NAN;
/// let distances = DistanceMatrix::from_square(
///     array![[0.0, nan, 1.0], [nan, 0.0, nan], [1.0, nan, 0.0]].view(),
/// )?;
/// let repaired = repair(&distances);
/// assert_eq!(repaired.keep, vec![true, false, true]);
/// assert_eq!(repaired.distances.len(), 2);
/// assert_eq!(repaired.removed, 1);
/// # Ok::<(), seriate_cluster::ClusterError>(())
/// ```
#[must_use]
pub fn repair(distances: &DistanceMatrix) -> Repaired {
    let n = distances.len();
    let is_missing = |i: usize, j: usize| i != j && distances.get(i, j).is_nan();

    let mut missing_counts = (0..n)
        .map(|i| (0..n).filter(|&j| is_missing(i, j)).count())
        .collect::<Vec<_>>();
    let mut keep = vec![true; n];
    let mut removed = 0;

    loop {
        // first maximum wins ties
        let worst = (0..n)
            .filter(|&i| keep[i] && missing_counts[i] > 0)
            .fold(None, |best: Option<usize>, i| match best {
                Some(b) if missing_counts[b] >= missing_counts[i] => Some(b),
                _ => Some(i),
            });
        let Some(worst) = worst else {
            break;
        };
        keep[worst] = false;
        removed += 1;
        missing_counts[worst] = 0;
        for j in (0..n).filter(|&j| keep[j] && is_missing(worst, j)) {
            missing_counts[j] -= 1;
        }
    }

    if removed == 0 {
        return Repaired {
            distances: distances.clone(),
            keep,
            removed,
        };
    }

    tracing::warn!(
        removed,
        kept = n - removed,
        "dropped items with missing distances"
    );
    let distances = distances.select(&kept_indices(&keep));
    Repaired {
        distances,
        keep,
        removed,
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, array};

    use super::*;

    const NAN: f64 = f64::NAN;

    fn from_condensed(values: &[f64]) -> DistanceMatrix {
        DistanceMatrix::from_condensed(Array1::from(values.to_vec()).view()).unwrap()
    }

    #[test]
    fn test_complete_matrix_is_unchanged() {
        let distances = from_condensed(&[1.0, 2.0, 3.0]);
        let repaired = repair(&distances);
        assert_eq!(repaired.distances, distances);
        assert_eq!(repaired.keep, vec![true; 3]);
        assert_eq!(repaired.removed, 0);
    }

    #[test]
    fn test_single_offender_is_dropped() {
        let distances = DistanceMatrix::from_square(
            array![[0.0, NAN, 4.0], [NAN, 0.0, NAN], [4.0, NAN, 0.0]].view(),
        )
        .unwrap();
        let repaired = repair(&distances);
        assert_eq!(repaired.keep, vec![true, false, true]);
        assert_eq!(repaired.distances.len(), 2);
        assert_eq!(repaired.distances.get(0, 1), 4.0);
        assert!(!repaired.distances.has_missing());
        assert_eq!(kept_indices(&repaired.keep), vec![0, 2]);
    }

    #[test]
    fn test_worst_offender_goes_first() {
        // pairs of 5 items: (0,1) (0,2) (0,3) (0,4) (1,2) (1,3) (1,4) (2,3) (2,4) (3,4)
        // item 3 misses distances to 0, 1 and 4; items 2 and 4 miss each other
        let distances = from_condensed(&[1.0, 1.0, NAN, 1.0, 1.0, NAN, 1.0, 1.0, NAN, NAN]);
        let repaired = repair(&distances);
        assert_eq!(repaired.keep, vec![true, true, false, false, true]);
        assert_eq!(repaired.removed, 2);
        assert!(!repaired.distances.has_missing());
    }

    #[test]
    fn test_tie_drops_lowest_index_only() {
        let distances = from_condensed(&[NAN, 1.0, 1.0]);
        let repaired = repair(&distances);
        assert_eq!(repaired.keep, vec![false, true, true]);
        assert_eq!(repaired.removed, 1);
    }

    #[test]
    fn test_all_missing_leaves_one_item() {
        let distances = from_condensed(&[NAN; 6]);
        let repaired = repair(&distances);
        assert_eq!(repaired.removed, 3);
        assert_eq!(repaired.distances.len(), 1);
    }

    #[test]
    fn test_empty() {
        let distances = from_condensed(&[]);
        let repaired = repair(&distances);
        assert!(repaired.distances.is_empty() || repaired.distances.len() == 1);
        assert_eq!(repaired.removed, 0);
    }
}
