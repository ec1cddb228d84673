//! Pairwise distance matrices
//!
//! A [`DistanceMatrix`] is always held in full square form. It can be built
//! from a square array, from a condensed (upper-triangular) vector, or by
//! measuring the rows of a feature matrix with a [`Metric`].
//!
//! Missing distances are `NaN` and survive every conversion, so they can be
//! found and removed by [`repair`](crate::repair::repair).

use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use seriate_stats::{descriptive::DescriptiveStats, is_missing};

use crate::ClusterError;

/// Symmetric pairwise distance matrix with a zero diagonal.
///
/// # Examples
///
/// ```
/// use ndarray::aview1;
/// use seriate_cluster::distance::DistanceMatrix;
///
/// let distances = DistanceMatrix::from_condensed(aview1(&[1.0, 2.0, 3.0]))?;
/// assert_eq!(distances.len(), 3);
/// assert_eq!(distances.get(2, 1), 3.0);
/// assert_eq!(distances.to_condensed(), vec![1.0, 2.0, 3.0]);
/// # Ok::<(), seriate_cluster::ClusterError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    square: Array2<f64>,
}

impl DistanceMatrix {
    /// Builds a distance matrix from a square array.
    ///
    /// The upper triangle is authoritative: it is mirrored into the lower
    /// triangle and the diagonal is forced to zero.
    pub fn from_square(square: ArrayView2<'_, f64>) -> Result<Self, ClusterError> {
        let (rows, cols) = square.dim();
        if rows != cols {
            return Err(ClusterError::NotSquare { rows, cols });
        }
        let mut symmetric = Array2::zeros((rows, rows));
        for i in 0..rows {
            for j in i + 1..rows {
                let d = square[[i, j]];
                symmetric[[i, j]] = d;
                symmetric[[j, i]] = d;
            }
        }
        Ok(Self { square: symmetric })
    }

    /// Builds a distance matrix from its condensed upper-triangular form.
    ///
    /// The entry for items `i < j` is stored at [`condensed_index`]`(n, i, j)`.
    pub fn from_condensed(condensed: ArrayView1<'_, f64>) -> Result<Self, ClusterError> {
        let len = condensed.len();
        let n = items_for_condensed_len(len).ok_or(ClusterError::InvalidCondensedLength { len })?;
        let mut square = Array2::zeros((n, n));
        let mut values = condensed.iter();
        for i in 0..n {
            for j in i + 1..n {
                // length checked above
                let d = values.next().copied().unwrap_or(f64::NAN);
                square[[i, j]] = d;
                square[[j, i]] = d;
            }
        }
        Ok(Self { square })
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.square.nrows()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distance between items `i` and `j`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.square[[i, j]]
    }

    #[must_use]
    pub fn as_square(&self) -> ArrayView2<'_, f64> {
        self.square.view()
    }

    /// Returns the upper triangle as a flat vector, row by row.
    #[must_use]
    pub fn to_condensed(&self) -> Vec<f64> {
        let n = self.len();
        let mut condensed = Vec::with_capacity(condensed_len(n));
        for i in 0..n {
            condensed.extend(self.square.row(i).iter().skip(i + 1));
        }
        condensed
    }

    /// Returns `true` if any off-diagonal entry is missing.
    #[must_use]
    pub fn has_missing(&self) -> bool {
        self.square.iter().any(|d| d.is_nan())
    }

    /// Restricts the matrix to `items`, in the given order.
    #[must_use]
    pub fn select(&self, items: &[usize]) -> Self {
        let square = self
            .square
            .select(Axis(0), items)
            .select(Axis(1), items);
        Self { square }
    }
}

/// Length of the condensed form for `n` items.
#[must_use]
pub fn condensed_len(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Position of the pair `i < j` in the condensed form for `n` items.
///
/// # Examples
///
/// ```
/// use seriate_cluster::distance::condensed_index;
///
/// // pairs of 4 items: (0,1) (0,2) (0,3) (1,2) (1,3) (2,3)
/// assert_eq!(condensed_index(4, 0, 1), 0);
/// assert_eq!(condensed_index(4, 1, 2), 3);
/// assert_eq!(condensed_index(4, 2, 3), 5);
/// ```
#[must_use]
pub fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i < j && j < n);
    n * i - i * (i + 1) / 2 + (j - i - 1)
}

/// Inverts [`condensed_len`].
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
pub(crate) fn items_for_condensed_len(len: usize) -> Option<usize> {
    let estimate = ((1.0 + (1.0 + 8.0 * len as f64).sqrt()) / 2.0).round() as usize;
    (estimate.saturating_sub(1)..=estimate + 1).find(|&n| condensed_len(n) == len)
}

/// Distance between two feature rows.
///
/// Correlation-type metrics are one minus the corresponding similarity, so
/// identical profiles are at distance zero. A missing feature value or an
/// undefined similarity (for instance, a constant row under `corr`) makes
/// the distance missing.
///
/// # Examples
///
/// ```
/// use seriate_cluster::distance::Metric;
///
/// let metric: Metric = "correlation".parse()?;
/// assert_eq!(metric, Metric::Correlation);
/// assert_eq!(metric.to_string(), "corr");
/// assert_eq!(Metric::default(), Metric::Correlation);
/// # Ok::<(), seriate_cluster::ClusterError>(())
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Metric {
    /// One minus the Pearson correlation
    #[default]
    #[display("corr")]
    Correlation,
    /// One minus the Spearman rank correlation
    #[display("spearman")]
    Spearman,
    #[display("euclidean")]
    Euclidean,
    #[display("sqeuclidean")]
    SqEuclidean,
    /// Sum of absolute differences
    #[display("cityblock")]
    Cityblock,
    /// Largest absolute difference
    #[display("chebyshev")]
    Chebyshev,
    /// One minus the cosine of the angle between rows
    #[display("cosine")]
    Cosine,
}

impl Metric {
    pub const ALL: [Self; 7] = [
        Self::Correlation,
        Self::Spearman,
        Self::Euclidean,
        Self::SqEuclidean,
        Self::Cityblock,
        Self::Chebyshev,
        Self::Cosine,
    ];
}

impl FromStr for Metric {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "correlation" {
            return Ok(Self::Correlation);
        }
        Self::ALL
            .into_iter()
            .find(|metric| metric.to_string() == s)
            .ok_or_else(|| ClusterError::UnknownMetric { name: s.to_owned() })
    }
}

/// Computes the distances between every pair of rows of `features`.
#[must_use]
pub fn pairwise(features: ArrayView2<'_, f64>, metric: Metric) -> DistanceMatrix {
    let n = features.nrows();
    let prepared = prepare_rows(features, metric);
    let mut square = Array2::zeros((n, n));
    for i in 0..n {
        for j in i + 1..n {
            let d = row_distance(prepared.row(i), prepared.row(j), metric);
            square[[i, j]] = d;
            square[[j, i]] = d;
        }
    }
    tracing::debug!(items = n, %metric, "computed pairwise distances");
    DistanceMatrix { square }
}

/// Replaces each row by the representation its metric compares.
///
/// Correlation metrics compare centered (and, for Spearman, ranked) rows so
/// the pairwise step only needs a cosine.
fn prepare_rows(features: ArrayView2<'_, f64>, metric: Metric) -> Array2<f64> {
    let mut prepared = features.to_owned();
    match metric {
        Metric::Correlation => {
            for mut row in prepared.rows_mut() {
                center(&mut row);
            }
        }
        Metric::Spearman => {
            for mut row in prepared.rows_mut() {
                let ranked = ranks(row.view());
                row.assign(&ranked);
                center(&mut row);
            }
        }
        Metric::Euclidean
        | Metric::SqEuclidean
        | Metric::Cityblock
        | Metric::Chebyshev
        | Metric::Cosine => {}
    }
    prepared
}

/// Subtracts the mean of the present values; missing values stay missing.
fn center(row: &mut ndarray::ArrayViewMut1<'_, f64>) {
    if let Some(stats) = DescriptiveStats::new(row.iter().copied()) {
        row.mapv_inplace(|x| x - stats.mean);
    }
}

/// Average ranks (1-based) of a row; any missing value makes every rank missing.
#[expect(clippy::cast_precision_loss)]
fn ranks(row: ArrayView1<'_, f64>) -> Array1<f64> {
    if row.iter().any(|&x| is_missing(x)) {
        return Array1::from_elem(row.len(), f64::NAN);
    }
    let mut order = (0..row.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| row[a].total_cmp(&row[b]));
    let mut ranked = Array1::zeros(row.len());
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && row[order[end]] == row[order[start]] {
            end += 1;
        }
        // ties share the mean of the 1-based ranks start+1..=end
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranked[idx] = rank;
        }
        start = end;
    }
    ranked
}

fn row_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>, metric: Metric) -> f64 {
    let diffs = a.iter().zip(b).map(|(x, y)| x - y);
    let d = match metric {
        Metric::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
        Metric::SqEuclidean => diffs.map(|d| d * d).sum::<f64>(),
        Metric::Cityblock => diffs.map(f64::abs).sum::<f64>(),
        Metric::Chebyshev => diffs.map(f64::abs).fold(0.0_f64, |acc, d| {
            if d.is_nan() || acc.is_nan() {
                f64::NAN
            } else {
                acc.max(d)
            }
        }),
        Metric::Correlation | Metric::Spearman | Metric::Cosine => {
            let dot = a.dot(&b);
            let norm = (a.dot(&a) * b.dot(&b)).sqrt();
            1.0 - dot / norm
        }
    };
    // rounding can push `1 - similarity` just below zero; keep NaN as is
    if d < 0.0 { 0.0 } else { d }
}
