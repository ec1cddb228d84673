//! Seriation of items by hierarchical clustering
//!
//! [`reorder`] runs the whole pipeline:
//!
//! 1. build a [`DistanceMatrix`] from the [`ReorderInput`]
//! 2. [`repair`] it, dropping items with missing distances
//! 3. cluster the kept items with [`linkage`]
//! 4. order the leaves optimally when the problem is small enough, otherwise
//!    (or if optimal ordering fails) in dendrogram order
//! 5. map the order back to the original item indices

use ndarray::{ArrayView1, ArrayView2, Axis};

use crate::{
    ClusterError,
    distance::{DistanceMatrix, Metric, condensed_len, items_for_condensed_len, pairwise},
    linkage::{LinkageMethod, LinkageTree, linkage},
    ordering::{dendrogram_order, optimal_leaf_order},
    repair::{Repaired, kept_indices, repair},
};

/// Items to reorder, described either by features or by distances.
#[derive(Debug, Clone, Copy)]
pub enum ReorderInput<'a> {
    /// One item per row; distances are computed with [`ReorderOptions::metric`].
    Features(ArrayView2<'a, f64>),
    /// Square distance matrix; the upper triangle is used.
    Square(ArrayView2<'a, f64>),
    /// Condensed upper-triangular distances.
    Condensed(ArrayView1<'a, f64>),
}

impl<'a> ReorderInput<'a> {
    /// Guesses what kind of data `data` holds.
    ///
    /// - a square matrix that is symmetric (missing entries match each other)
    ///   with a zero or missing diagonal is a square distance matrix
    /// - otherwise a single row whose length is the condensed length for
    ///   three or more items is a condensed distance vector
    /// - anything else, including a single feature row, is a feature matrix
    ///
    /// # Examples
    ///
    /// ```
    /// use ndarray::array;
    /// use seriate_cluster::reorder::ReorderInput;
    ///
    /// let square = array![[0.0, 2.0], [2.0, 0.0]];
    /// assert!(matches!(ReorderInput::infer(square.view()), ReorderInput::Square(_)));
    ///
    /// let condensed = array![[2.0, 3.0, 4.0]];
    /// assert!(matches!(ReorderInput::infer(condensed.view()), ReorderInput::Condensed(_)));
    ///
    /// let features = array![[1.0, 2.0], [3.0, 4.0]];
    /// assert!(matches!(ReorderInput::infer(features.view()), ReorderInput::Features(_)));
    /// ```
    #[must_use]
    pub fn infer(data: ArrayView2<'a, f64>) -> Self {
        if is_distance_matrix(data) {
            Self::Square(data)
        } else if data.nrows() == 1 && is_condensed_len(data.ncols()) {
            Self::Condensed(data.index_axis_move(Axis(0), 0))
        } else {
            Self::Features(data)
        }
    }

    fn into_distances(self, metric: Metric) -> Result<DistanceMatrix, ClusterError> {
        match self {
            Self::Features(features) => Ok(pairwise(features, metric)),
            Self::Square(square) => DistanceMatrix::from_square(square),
            Self::Condensed(condensed) => DistanceMatrix::from_condensed(condensed),
        }
    }
}

/// Lengths 0 and 1 (zero or two items) are read as a single feature row.
fn is_condensed_len(len: usize) -> bool {
    items_for_condensed_len(len).is_some_and(|items| items >= 3)
}

fn is_distance_matrix(data: ArrayView2<'_, f64>) -> bool {
    let (rows, cols) = data.dim();
    if rows != cols {
        return false;
    }
    let same = |a: f64, b: f64| a == b || (a.is_nan() && b.is_nan());
    (0..rows).all(|i| {
        let diagonal = data[[i, i]];
        (diagonal == 0.0 || diagonal.is_nan())
            && (i + 1..rows).all(|j| same(data[[i, j]], data[[j, i]]))
    })
}

/// Options for [`reorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderOptions {
    /// Metric for [`ReorderInput::Features`]; ignored for distance input.
    pub metric: Metric,
    pub linkage: LinkageMethod,
    /// Optimal leaf ordering is attempted only while the square root of the
    /// number of item pairs is below this value. `None` disables it.
    pub optimal_ordering_limit: Option<usize>,
}

impl Default for ReorderOptions {
    fn default() -> Self {
        Self {
            metric: Metric::default(),
            linkage: LinkageMethod::default(),
            optimal_ordering_limit: Some(1000),
        }
    }
}

impl ReorderOptions {
    fn attempts_optimal_ordering(&self, items: usize) -> bool {
        self.optimal_ordering_limit
            .is_some_and(|limit| condensed_len(items) < limit.saturating_mul(limit))
    }
}

/// How the final leaf order was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum LeafOrdering {
    /// [`optimal_leaf_order`]
    #[display("optimal")]
    Optimal,
    /// [`dendrogram_order`]
    #[display("natural")]
    Natural,
}

/// Result of [`reorder`].
#[derive(Debug, Clone)]
pub struct Reordering {
    /// Original indices of the kept items, in their new order.
    pub order: Vec<usize>,
    /// Distances between the kept items, indexed by kept position.
    pub distances: DistanceMatrix,
    /// One flag per original item, `true` if the item was kept.
    pub keep: Vec<bool>,
    /// Number of items dropped because of missing distances.
    pub removed: usize,
    /// Linkage tree over the kept items, indexed by kept position.
    pub tree: LinkageTree,
    pub leaf_ordering: LeafOrdering,
}

/// Reorders items so that similar items end up next to each other.
///
/// # Errors
///
/// Fails on malformed distance input. A failed or skipped optimal leaf
/// ordering is not an error: the dendrogram order is used instead and
/// [`Reordering::leaf_ordering`] says so.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use seriate_cluster::reorder::{ReorderInput, ReorderOptions, reorder};
///
/// // rows 0 and 2 rise together, row 1 falls
/// let features = array![[1.0, 2.0, 3.0, 4.0], [4.0, 3.0, 1.0, 1.0], [1.0, 2.0, 3.5, 4.5]];
/// let reordering = reorder(ReorderInput::Features(features.view()), &ReorderOptions::default())?;
///
/// let position = |item| reordering.order.iter().position(|&i| i == item).unwrap();
/// assert_eq!(position(0).abs_diff(position(2)), 1);
/// # Ok::<(), seriate_cluster::ClusterError>(())
/// ```
pub fn reorder(
    input: ReorderInput<'_>,
    options: &ReorderOptions,
) -> Result<Reordering, ClusterError> {
    let distances = input.into_distances(options.metric)?;
    let Repaired {
        distances,
        keep,
        removed,
    } = repair(&distances);
    let tree = linkage(&distances, options.linkage)?;

    let (local_order, leaf_ordering) = order_leaves(&tree, &distances, options);
    let kept = kept_indices(&keep);
    let order = local_order.into_iter().map(|i| kept[i]).collect::<Vec<_>>();
    tracing::debug!(
        items = keep.len(),
        removed,
        linkage = %options.linkage,
        %leaf_ordering,
        "reordered items"
    );

    Ok(Reordering {
        order,
        distances,
        keep,
        removed,
        tree,
        leaf_ordering,
    })
}

fn order_leaves(
    tree: &LinkageTree,
    distances: &DistanceMatrix,
    options: &ReorderOptions,
) -> (Vec<usize>, LeafOrdering) {
    let items = distances.len();
    let Some(limit) = options.optimal_ordering_limit else {
        tracing::debug!("optimal leaf ordering disabled");
        return (dendrogram_order(tree), LeafOrdering::Natural);
    };
    if !options.attempts_optimal_ordering(items) {
        tracing::warn!(
            items,
            limit,
            "too many items for optimal leaf ordering, using dendrogram order"
        );
        return (dendrogram_order(tree), LeafOrdering::Natural);
    }
    match optimal_leaf_order(tree, distances) {
        Ok(order) => (order, LeafOrdering::Optimal),
        Err(err) => {
            tracing::warn!(%err, "optimal leaf ordering failed, using dendrogram order");
            (dendrogram_order(tree), LeafOrdering::Natural)
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, aview1, array};
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg32;

    use super::*;

    const NAN: f64 = f64::NAN;

    fn euclidean() -> ReorderOptions {
        ReorderOptions {
            metric: Metric::Euclidean,
            ..ReorderOptions::default()
        }
    }

    fn position(order: &[usize], item: usize) -> usize {
        order.iter().position(|&i| i == item).unwrap()
    }

    fn assert_permutation_of_kept(reordering: &Reordering) {
        let mut sorted = reordering.order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, kept_indices(&reordering.keep));
        assert_eq!(
            reordering.order.len() + reordering.removed,
            reordering.keep.len()
        );
    }

    #[test]
    fn test_close_items_are_adjacent() {
        // A and B are close, C is far from both
        let features = array![[0.0, 0.0], [10.0, 10.0], [0.1, 0.0], [9.0, 11.0], [20.0, 0.0]];
        let reordering = reorder(ReorderInput::Features(features.view()), &euclidean()).unwrap();
        assert_eq!(reordering.leaf_ordering, LeafOrdering::Optimal);
        assert_permutation_of_kept(&reordering);
        let order = &reordering.order;
        assert_eq!(position(order, 0).abs_diff(position(order, 2)), 1);
        assert_eq!(position(order, 1).abs_diff(position(order, 3)), 1);
    }

    #[test]
    fn test_distance_inputs_agree() {
        let square = array![
            [0.0, 1.0, 8.0, 9.0],
            [1.0, 0.0, 7.0, 8.5],
            [8.0, 7.0, 0.0, 2.0],
            [9.0, 8.5, 2.0, 0.0],
        ];
        let condensed = DistanceMatrix::from_square(square.view())
            .unwrap()
            .to_condensed();
        let options = ReorderOptions::default();

        let from_square = reorder(ReorderInput::Square(square.view()), &options).unwrap();
        let from_condensed =
            reorder(ReorderInput::Condensed(aview1(&condensed)), &options).unwrap();
        assert_eq!(from_square.order, from_condensed.order);
        assert_eq!(from_square.tree, from_condensed.tree);
        assert_eq!(position(&from_square.order, 0).abs_diff(position(&from_square.order, 1)), 1);
    }

    #[test]
    fn test_dropped_items_are_remapped() {
        let square = array![
            [0.0, 1.0, NAN, 4.0],
            [1.0, 0.0, NAN, 3.0],
            [NAN, NAN, 0.0, NAN],
            [4.0, 3.0, NAN, 0.0],
        ];
        let reordering = reorder(ReorderInput::Square(square.view()), &euclidean()).unwrap();
        assert_eq!(reordering.keep, vec![true, true, false, true]);
        assert_eq!(reordering.removed, 1);
        assert_eq!(reordering.distances.len(), 3);
        assert!(!reordering.order.contains(&2));
        assert_permutation_of_kept(&reordering);
    }

    #[test]
    fn test_valid_permutation_on_both_paths() {
        let mut rng = Pcg32::seed_from_u64(2024);
        let mut features = Array2::from_shape_fn((30, 6), |_| rng.random_range(-1.0..1.0));
        features[[4, 2]] = NAN;
        features[[17, 0]] = NAN;

        for limit in [Some(1000), Some(3), None] {
            let options = ReorderOptions {
                optimal_ordering_limit: limit,
                ..ReorderOptions::default()
            };
            let reordering = reorder(ReorderInput::Features(features.view()), &options).unwrap();
            assert_eq!(reordering.removed, 2);
            assert_permutation_of_kept(&reordering);
            let expected = if limit == Some(1000) {
                LeafOrdering::Optimal
            } else {
                LeafOrdering::Natural
            };
            assert_eq!(reordering.leaf_ordering, expected);
        }
    }

    #[test]
    fn test_fallback_on_non_finite_distance() {
        let condensed = [1.0, f64::INFINITY, 3.0];
        let reordering =
            reorder(ReorderInput::Condensed(aview1(&condensed)), &ReorderOptions::default())
                .unwrap();
        assert_eq!(reordering.leaf_ordering, LeafOrdering::Natural);
        assert_eq!(reordering.order, dendrogram_order(&reordering.tree));
        assert_permutation_of_kept(&reordering);
    }

    #[test]
    fn test_malformed_distance_input() {
        let rect = array![[0.0, 1.0, 2.0], [1.0, 0.0, 3.0]];
        let err = reorder(ReorderInput::Square(rect.view()), &ReorderOptions::default())
            .unwrap_err();
        assert_eq!(err, ClusterError::NotSquare { rows: 2, cols: 3 });

        let err = reorder(
            ReorderInput::Condensed(aview1(&[1.0, 2.0])),
            &ReorderOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, ClusterError::InvalidCondensedLength { len: 2 });
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_infer() {
        let with_missing = array![[NAN, 1.0, NAN], [1.0, 0.0, 2.0], [NAN, 2.0, 0.0]];
        assert!(matches!(
            ReorderInput::infer(with_missing.view()),
            ReorderInput::Square(_)
        ));

        let asymmetric = array![[0.0, 1.0], [2.0, 0.0]];
        assert!(matches!(
            ReorderInput::infer(asymmetric.view()),
            ReorderInput::Features(_)
        ));

        let row = array![[1.0, 2.0, 3.0]];
        let ReorderInput::Condensed(condensed) = ReorderInput::infer(row.view()) else {
            panic!("a single row is condensed");
        };
        assert_eq!(condensed.to_vec(), vec![1.0, 2.0, 3.0]);

        let six = array![[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]];
        assert!(matches!(
            ReorderInput::infer(six.view()),
            ReorderInput::Condensed(_)
        ));
    }

    #[test]
    fn test_infer_single_feature_row() {
        // 4 is not a condensed length, 1 would mean two items
        for row in [array![[1.0, 2.0, 3.0, 4.0]], array![[5.0]]] {
            let input = ReorderInput::infer(row.view());
            assert!(matches!(input, ReorderInput::Features(_)));

            let reordering = reorder(input, &euclidean()).unwrap();
            assert_eq!(reordering.keep, vec![true]);
            assert_eq!(reordering.order, vec![0]);
        }
    }

    #[test]
    fn test_two_close_items_and_one_far() {
        // A and B are close, C is far from both
        let square = array![[0.0, 1.0, 10.0], [1.0, 0.0, 10.0], [10.0, 10.0, 0.0]];
        let reordering =
            reorder(ReorderInput::Square(square.view()), &ReorderOptions::default()).unwrap();
        assert_eq!(reordering.leaf_ordering, LeafOrdering::Optimal);
        assert_permutation_of_kept(&reordering);
        let order = &reordering.order;
        assert_eq!(position(order, 0).abs_diff(position(order, 1)), 1);
        assert_eq!(reordering.tree.merges()[0].distance, 1.0);
    }

    #[test]
    fn test_optimal_ordering_limit() {
        let options = ReorderOptions::default();
        // 1000 items have 499500 pairs, 1415 have 1000405
        assert!(options.attempts_optimal_ordering(1000));
        assert!(!options.attempts_optimal_ordering(1415));
        assert!(!ReorderOptions {
            optimal_ordering_limit: None,
            ..options
        }
        .attempts_optimal_ordering(3));
    }
}
